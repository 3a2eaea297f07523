//! Access configuration: named roles with glob allow/deny lists.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The environment variable consulted when no role is passed explicitly.
pub const ROLE_ENV_VAR: &str = "WEFT_ROLE";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccessConfig {
    #[serde(default)]
    pub roles: BTreeMap<String, RoleConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Repo-name globs this role may see. Empty means everything not denied.
    #[serde(default)]
    pub allow: Vec<String>,
    /// Repo-name globs this role must not see. Deny wins over allow.
    #[serde(default)]
    pub deny: Vec<String>,
}

impl AccessConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Role keys that apply to `role`, most specific first.
    ///
    /// An exact key beats every wildcard; wildcard keys of the form
    /// `prefix/*` match roles under that prefix, longer prefixes first.
    /// Keys of equal specificity are all returned so their lists can be
    /// merged. Falls back to the `default` key when nothing else matches.
    pub fn matching_roles(&self, role: &str) -> Vec<&RoleConfig> {
        if let Some(exact) = self.roles.get(role) {
            return vec![exact];
        }
        let mut best_len = 0;
        let mut matched: Vec<&RoleConfig> = Vec::new();
        for (key, config) in &self.roles {
            let Some(prefix) = key.strip_suffix("/*") else {
                continue;
            };
            if !role.starts_with(prefix) || !role[prefix.len()..].starts_with('/') {
                continue;
            }
            match prefix.len().cmp(&best_len) {
                std::cmp::Ordering::Greater => {
                    best_len = prefix.len();
                    matched = vec![config];
                }
                std::cmp::Ordering::Equal => matched.push(config),
                std::cmp::Ordering::Less => {}
            }
        }
        if matched.is_empty() {
            if let Some(default) = self.roles.get("default") {
                return vec![default];
            }
        }
        matched
    }
}

/// Resolves the effective role name: explicit argument, then the
/// `WEFT_ROLE` environment variable, then `default`.
pub fn resolve_role(explicit: Option<&str>) -> String {
    if let Some(role) = explicit {
        return role.to_string();
    }
    std::env::var(ROLE_ENV_VAR).unwrap_or_else(|_| "default".to_string())
}
