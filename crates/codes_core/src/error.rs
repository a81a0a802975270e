use crate::normalize::NormalizeError;

/// Transport failure as seen by the core. The shell maps engine errors into this.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportFailure {
    #[error("no endpoint URL configured")]
    EmptyUrl,
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),
    #[error("server returned HTTP {status}")]
    HttpStatus { status: u16 },
    #[error("network connection failed: {0}")]
    Network(String),
    #[error("request timed out")]
    Timeout,
    #[error("response too large")]
    TooLarge,
    #[error("response is not valid JSON: {0}")]
    InvalidBody(String),
    #[error("unknown error: {0}")]
    Unknown(String),
}

/// Everything that can end up in the banner. None of it is fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    #[error("configure an endpoint URL in settings first")]
    EmptyUrl,
    #[error(transparent)]
    Transport(TransportFailure),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error("bulk delete failed: {0}")]
    DeleteFailed(TransportFailure),
}

impl From<TransportFailure> for AppError {
    fn from(failure: TransportFailure) -> Self {
        match failure {
            TransportFailure::EmptyUrl => AppError::EmptyUrl,
            other => AppError::Transport(other),
        }
    }
}
