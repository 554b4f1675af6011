//! Error types for the comment gateway

/// Outcome of a failed gateway call
///
/// Every call is a single best-effort attempt; the gateway never retries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// No bearer credential configured
    #[error("no bearer credential available")]
    Unauthenticated,

    /// Connection, TLS or timeout failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Remote API answered with a non-success status
    #[error("remote API error {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message reported by the API
        message: String,
    },

    /// Response body could not be decoded
    #[error("could not decode response: {0}")]
    Decode(String),

    /// Request refused before it was sent
    #[error("request rejected: {0}")]
    Rejected(String),
}

impl GatewayError {
    /// Create API error
    #[inline]
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Check if a later attempt could plausibly succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            Self::Unauthenticated | Self::Decode(_) | Self::Rejected(_) => false,
        }
    }

    /// HTTP status, when the remote answered
    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_error_display() {
        let err = GatewayError::api(403, "forbidden");
        assert_eq!(err.to_string(), "remote API error 403: forbidden");
        assert_eq!(err.status(), Some(403));
    }

    #[test]
    fn gateway_error_is_retryable() {
        assert!(GatewayError::Transport("reset".into()).is_retryable());
        assert!(GatewayError::api(503, "unavailable").is_retryable());
        assert!(GatewayError::api(429, "quota").is_retryable());
        assert!(!GatewayError::api(404, "gone").is_retryable());
        assert!(!GatewayError::Unauthenticated.is_retryable());
    }
}
