use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("invalid glob pattern {pattern:?} in role {role:?}: {source}")]
    InvalidPattern {
        role: String,
        pattern: String,
        source: globset::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, AccessError>;
