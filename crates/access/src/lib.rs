//! Role-based repository visibility.
//!
//! Retrieval results are filtered after ranking so that a caller only sees
//! repositories its role may access. Roles are named glob allow/deny lists
//! over repository names; resolution prefers an exact role name, then the
//! longest matching `prefix/*` role, then the `default` role, and with no
//! configuration at all the filter allows everything.

pub mod config;
pub mod error;
pub mod filter;

pub use config::{resolve_role, AccessConfig, RoleConfig, ROLE_ENV_VAR};
pub use error::{AccessError, Result};
pub use filter::RoleFilter;
