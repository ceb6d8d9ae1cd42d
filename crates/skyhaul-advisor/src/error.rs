use thiserror::Error;

/// Failure of an advisory or directions call.
///
/// Never fatal for planning: the service logs it and falls back to the
/// locally computed answer.
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("index {index} is outside 0..{len}")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("advisor unavailable: {0}")]
    Unavailable(String),
}

impl AdvisorError {
    /// Short tag used in structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            AdvisorError::Http(_) => "http",
            AdvisorError::Status { .. } => "status",
            AdvisorError::InvalidResponse(_) => "invalid_response",
            AdvisorError::IndexOutOfRange { .. } => "index_out_of_range",
            AdvisorError::Unavailable(_) => "unavailable",
        }
    }
}
