use thiserror::Error;

/// Errors produced by the guest session client.
///
/// None of these are fatal to the page: storage failures are absorbed by the
/// store itself, and network/upstream failures leave the current session in
/// place until the next monitor tick.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    #[error("Session storage unavailable during {operation}")]
    StorageUnavailable { operation: String },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Guest session rejected by upstream (HTTP {status}): {message}")]
    UpstreamRejected { status: u16, message: String },

    #[error("Malformed session duration hint: {value:?}")]
    MalformedHint { value: String },

    #[error("Configuration error: {field} - {message}")]
    Configuration { field: String, message: String },
}

impl ClientError {
    /// Whether a later attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClientError::NetworkError { .. } | ClientError::UpstreamRejected { .. }
        )
    }

    /// Get error severity for logging purposes
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ClientError::StorageUnavailable { .. } => ErrorSeverity::Low,
            ClientError::MalformedHint { .. } => ErrorSeverity::Low,
            ClientError::NetworkError { .. } => ErrorSeverity::Medium,
            ClientError::UpstreamRejected { .. } => ErrorSeverity::Medium,
            ClientError::Configuration { .. } => ErrorSeverity::High,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::NetworkError {
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
