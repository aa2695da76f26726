use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transport failure during {operation}: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("document store rejected {operation} with status {status}: {message}")]
    Rejected {
        operation: &'static str,
        status: u16,
        message: String,
    },
    #[error("document store unavailable: {0}")]
    Unavailable(String),
    #[error("invalid document store url '{0}'")]
    InvalidUrl(String),
    #[error("document '{key}' could not be decoded: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("todo item could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("todo item has no id")]
    MissingId,
    #[error("'{0}' is not a valid document key")]
    InvalidKey(String),
}

impl StoreError {
    /// Network or backend failures, as opposed to bad data on either side.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport { .. } | Self::Rejected { .. } | Self::Unavailable(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("todo item name must not be empty")]
    EmptyName,
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}
