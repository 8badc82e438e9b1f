//! Analysis client errors and their transport classification.

use thiserror::Error;

/// How a failed request is reported to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// No connection could be established.
    Unreachable,
    /// The service did not answer in time.
    Timeout,
    /// Anything else; the raw message is surfaced.
    Other,
}

/// Errors that can occur while talking to the analysis service.
#[derive(Debug, Error)]
pub enum ClientError {
    /// No connection could be made to `url`.
    #[error("service unreachable at {url}: {reason}")]
    Unreachable {
        /// Endpoint that was tried.
        url: String,
        /// Underlying connection error.
        reason: String,
    },

    /// Every attempt against `url` timed out.
    #[error("no response from {url} after {attempts} attempt(s)")]
    Timeout {
        /// Endpoint that was tried.
        url: String,
        /// Attempts made, including retries.
        attempts: u32,
    },

    /// The service answered with a non-2xx status.
    #[error("service returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, lossily decoded.
        body: String,
    },

    /// The body was not the expected JSON.
    #[error("invalid response body: {0}")]
    Body(#[from] serde_json::Error),

    /// Any other transport failure.
    #[error("request failed: {0}")]
    Transport(String),

    /// The client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Build(String),
}

impl ClientError {
    /// Classifies the error for user notification.
    pub fn kind(&self) -> TransportKind {
        match self {
            ClientError::Unreachable { .. } => TransportKind::Unreachable,
            ClientError::Timeout { .. } => TransportKind::Timeout,
            _ => TransportKind::Other,
        }
    }

    /// True for failures the retry policy may retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ClientError::Unreachable { .. } | ClientError::Timeout { .. }
        )
    }

    /// Maps a `reqwest` error for `url` into a classified error.
    ///
    /// Connect timeouts count as timeouts, not as unreachable.
    pub(crate) fn from_reqwest(url: &str, attempts: u32, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout {
                url: url.to_string(),
                attempts,
            }
        } else if err.is_connect() {
            ClientError::Unreachable {
                url: url.to_string(),
                reason: root_cause(&err),
            }
        } else {
            ClientError::Transport(root_cause(&err))
        }
    }
}

fn root_cause(err: &(dyn std::error::Error + 'static)) -> String {
    let mut source = err;
    while let Some(next) = source.source() {
        source = next;
    }
    source.to_string()
}
