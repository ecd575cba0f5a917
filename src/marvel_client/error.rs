use thiserror::Error;

/// Failure classes at the upstream API boundary.
///
/// Callers above the client never see these: feed and detail loading degrade
/// every variant to "no data".
#[derive(Debug, Error)]
pub enum ApiError {
    /// Credentials are missing or the base URL is unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// DNS, connect, timeout or body-read failure.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Body is not JSON, or `data.results` is missing or has the wrong shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The server answered with a non-success status other than 404.
    #[error("upstream rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("resource not found")]
    NotFound,
}

impl ApiError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, ApiError::Configuration(_))
    }
}
