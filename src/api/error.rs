use thiserror::Error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Failures talking to the prediction backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Worth retrying later, as opposed to a request the backend will never accept.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Http(e) => e.is_timeout() || e.is_connect(),
            ApiError::Status { status, .. } => status.is_server_error(),
            ApiError::Decode(_) | ApiError::InvalidUrl(_) => false,
        }
    }
}
