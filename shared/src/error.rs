use thiserror::Error;

/// Failures reported by a remote evite store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The table (or equivalent) does not exist. Operator misconfiguration; never retried.
    #[error("Remote store misconfigured: {0}")]
    Configuration(String),

    #[error("Remote store unreachable: {0}")]
    Transport(String),

    #[error("Failed to decode remote record: {0}")]
    Decode(String),
}

impl RemoteError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, RemoteError::Configuration(_))
    }
}

/// Failures of the local slot storage backing the evite cache.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Local cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode local cache: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum EviteError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("A guest with email {0} is already on the list")]
    DuplicateGuest(String),

    #[error("Failed to save evite {id}: remote: {remote}; local: {local}")]
    SaveFailed {
        id: String,
        remote: RemoteError,
        local: CacheError,
    },

    #[error("Failed to delete evite {id}: {source}")]
    DeletionFailed {
        id: String,
        #[source]
        source: RemoteError,
    },
}
