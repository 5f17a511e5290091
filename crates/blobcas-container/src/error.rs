use blobcas_store::StoreError;

/// Errors reported by an object-storage container.
///
/// Variants that correspond to an HTTP status expose it through
/// [`status_code`](ContainerError::status_code), so callers can branch on
/// e.g. 404 without matching on transport details.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// No object exists under this name (404).
    #[error("blob not found: {name}")]
    NotFound { name: String },

    /// A conditional create found an existing object (409).
    #[error("blob already exists: {name}")]
    AlreadyExists { name: String },

    /// The requested range starts past the end of the object (416).
    #[error("range not satisfiable for {name}: offset {offset}, size {size}")]
    RangeNotSatisfiable { name: String, offset: u64, size: u64 },

    /// Any other failed request.
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    /// The container URI is malformed.
    #[error("invalid container URI: {0}")]
    InvalidUri(String),

    /// Transport or body stream failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContainerError {
    /// The HTTP-equivalent status code, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::AlreadyExists { .. } => Some(409),
            Self::RangeNotSatisfiable { .. } => Some(416),
            Self::Status { status, .. } => Some(*status),
            Self::InvalidUri(_) | Self::Io(_) => None,
        }
    }

    /// Returns `true` for "object not found" (404) failures.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    /// Build an error from a bare status code.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }
}

impl From<ContainerError> for StoreError {
    fn from(err: ContainerError) -> Self {
        match err {
            ContainerError::Io(e) => StoreError::Io(e),
            ContainerError::InvalidUri(msg) => StoreError::Config(msg),
            other => StoreError::Backend {
                status: other.status_code(),
                message: other.to_string(),
            },
        }
    }
}

/// Result alias for container operations.
pub type ContainerResult<T> = Result<T, ContainerError>;
