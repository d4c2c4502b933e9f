use thiserror::Error;

/// Startup configuration problems. Always fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
}

/// Failure talking to a completion or image provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Malformed(String),
    #[error("response contained no image")]
    MissingImage,
    #[error("image payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
}
