use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("provider returned HTTP {status}")]
    Status { status: reqwest::StatusCode },
    #[error("provider rejected the request: {0}")]
    Api(String),
    #[error("no provider API key configured")]
    MissingKey,
}

/// A user referenced a position outside the list they were last shown.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum IndexError {
    #[error("no item at position {index}; the last list shown had {len} items")]
    OutOfRange { index: usize, len: usize },
    #[error("the last shown list has expired; request a fresh one")]
    Expired,
}
