use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error from {0}: {1}")]
    ApiError(String, String),

    #[error("no match for title: {0}")]
    NoMatch(String),

    #[error("unexpected response shape from {0}: {1}")]
    UnexpectedShape(String, String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("listing error: {0}")]
    Listing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] marquee_core::CoreError),
}

pub type Result<T> = std::result::Result<T, EnrichError>;
