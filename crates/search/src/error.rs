use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("access control error: {0}")]
    Access(#[from] weft_access::AccessError),

    #[error("{name} collaborator failed: {source}")]
    Collaborator {
        name: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

pub type Result<T> = std::result::Result<T, SearchError>;
