/// Errors from block store operations.
///
/// "Not found" is deliberately absent: a missing block is reported as
/// `Ok(None)` or `Ok(false)` by the operations that can observe it.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store has not been started, or has been stopped.
    #[error("store is not started")]
    NotStarted,

    /// Construction or configuration failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// No factory is registered for the location's scheme.
    #[error("unsupported store scheme: {0}")]
    UnsupportedScheme(String),

    /// The storage backend rejected or failed the request.
    #[error("backend error: {message}")]
    Backend {
        status: Option<u16>,
        message: String,
    },

    /// A byte range starts past the end of the content.
    #[error("range offset {offset} is beyond content size {size}")]
    InvalidRange { offset: u64, size: u64 },

    /// I/O error while transferring block content.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Backend status code, if the error carries one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Backend { status, .. } => *status,
            _ => None,
        }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_exposes_status() {
        let err = StoreError::Backend {
            status: Some(503),
            message: "server busy".into(),
        };
        assert_eq!(err.to_string(), "backend error: server busy");
        assert_eq!(err.status_code(), Some(503));
    }

    #[test]
    fn backend_error_without_status() {
        let err = StoreError::Backend {
            status: None,
            message: "connection reset".into(),
        };
        assert_eq!(err.to_string(), "backend error: connection reset");
        assert_eq!(err.status_code(), None);
    }
}
