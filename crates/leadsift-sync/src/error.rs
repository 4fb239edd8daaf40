use leadsift_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("mail server error: {0}")]
    Command(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("message not found: {0}")]
    MissingMessage(String),
}

impl SyncError {
    /// Transient failures worth another attempt. Malformed data and missing
    /// features fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Io(_) | SyncError::Command(_))
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::SyncError;

    #[test]
    fn only_transport_errors_are_retryable() {
        assert!(SyncError::Command("BYE".to_string()).is_retryable());
        assert!(SyncError::Io(std::io::Error::other("reset")).is_retryable());
        assert!(!SyncError::Parse("bad header".to_string()).is_retryable());
        assert!(!SyncError::Unavailable("imap".to_string()).is_retryable());
    }
}
