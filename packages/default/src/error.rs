use thiserror::Error;

/// Root cause of every failure surfaced by the client.
///
/// Service methods return `anyhow::Result` and wrap these with the operation
/// and identifiers involved; callers recover the category with
/// [`ClientError::find`] or `err.downcast_ref::<ClientError>()`.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Rejected locally before any request was sent.
    #[error("{0}")]
    Validation(String),

    /// Connection refused, DNS failure, client-side timeout, broken body stream.
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The caller's cancellation token fired.
    #[error("request cancelled")]
    Cancelled,

    /// The caller's deadline elapsed.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// Hydra answered with a status code >= 400.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// A successful response carried a body that is not the expected JSON.
    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    /// The request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// Invalid client configuration (base URL, HTTP client setup).
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("no build found for job {0}")]
    NoBuildForJob(String),

    #[error("timeout waiting for evaluation")]
    EvaluationTimeout,
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Finds the `ClientError` at the root of a wrapped error chain.
    pub fn find(err: &anyhow::Error) -> Option<&ClientError> {
        err.downcast_ref::<ClientError>()
    }

    /// HTTP status for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Network-level failures, including caller cancellation and deadlines.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Cancelled | Self::DeadlineExceeded
        )
    }

    pub fn is_api(&self) -> bool {
        matches!(self, Self::Api { .. })
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

/// Rejects empty identifiers before any I/O happens.
pub(crate) fn require(value: &str, what: &str) -> Result<(), ClientError> {
    if value.is_empty() {
        return Err(ClientError::validation(format!("{what} is required")));
    }
    Ok(())
}
