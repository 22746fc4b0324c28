//! Error types for control-plane calls.

use thiserror::Error;

/// Errors raised while talking to the control-plane API.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ApiError {
    /// Raised when the request never produced a response.
    #[error("{command}: request failed: {message}")]
    Transport {
        /// Command that was being issued.
        command: String,
        /// Message returned by the HTTP client.
        message: String,
    },
    /// Raised when the service rejects the command.
    #[error("{command}: {message} (error {code})")]
    Rejected {
        /// Command that was rejected.
        command: String,
        /// Error code reported by the service.
        code: u32,
        /// Error text reported by the service.
        message: String,
    },
    /// Raised when the response cannot be interpreted.
    #[error("{command}: malformed response: {message}")]
    MalformedResponse {
        /// Command whose response could not be parsed.
        command: String,
        /// Description of what was wrong.
        message: String,
    },
}

impl ApiError {
    pub(crate) fn malformed(command: &str, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            command: command.to_owned(),
            message: message.into(),
        }
    }

    /// Returns the message a user should see for this error. Rejections
    /// surface the service's own error text.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
