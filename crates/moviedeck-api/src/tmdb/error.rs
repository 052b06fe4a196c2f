//! Error taxonomy for TMDB API calls.

use thiserror::Error;

/// Generic connectivity message shown for transport-class failures.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Network connection error. Please check your internet and try again.";

/// Result alias for TMDB API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by the TMDB client.
#[derive(Debug, Error)]
#[allow(clippy::module_name_repetitions)]
pub enum ApiError {
    /// Input was rejected before any network call (empty key, query, or path).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No API key is available for an authenticated request.
    #[error("API key is not set")]
    MissingCredential,

    /// The API answered with a structured error payload.
    #[error("TMDB API error: code={status_code}, message={}", .message.as_deref().unwrap_or("-"))]
    Api {
        /// TMDB error code (0 when the payload carried none).
        status_code: u32,
        /// Server-supplied message, if any.
        message: Option<String>,
    },

    /// Network, DNS, connection, or timeout failure.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status without an error payload.
    #[error("HTTP {status} from {path}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Request path.
        path: String,
    },

    /// The response body was not the expected JSON.
    #[error("failed to decode JSON response: {path}")]
    Parse {
        /// Request path.
        path: String,
        /// Underlying decoder error.
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// Returns the server-supplied message of an API error payload.
    #[must_use]
    pub fn api_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Returns `true` for network-class failures, including malformed
    /// responses which have no separate recovery path.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::HttpStatus { .. } | Self::Parse { .. }
        )
    }

    /// Returns `true` when the user must (re-)enter an API key.
    #[must_use]
    pub fn is_credential_error(&self) -> bool {
        match self {
            Self::MissingCredential => true,
            Self::Api { message, .. } => message
                .as_deref()
                .is_some_and(|m| m.to_lowercase().contains("api key")),
            _ => false,
        }
    }

    /// Message suitable for display to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(message) => message.clone(),
            Self::MissingCredential => String::from("API Key is not set."),
            Self::Api { message, .. } => message
                .clone()
                .unwrap_or_else(|| String::from("An unknown error occurred.")),
            Self::Transport(_) | Self::HttpStatus { .. } | Self::Parse { .. } => {
                String::from(NETWORK_ERROR_MESSAGE)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_credential_error_matches_api_key_message() {
        // Arrange
        let err = ApiError::Api {
            status_code: 7,
            message: Some(String::from(
                "Invalid API key: You must be granted a valid key.",
            )),
        };

        // Act & Assert
        assert!(err.is_credential_error());
        assert!(!err.is_transport());
    }

    #[test]
    fn test_credential_error_ignores_other_api_errors() {
        // Arrange
        let err = ApiError::Api {
            status_code: 34,
            message: Some(String::from(
                "The resource you requested could not be found.",
            )),
        };

        // Act & Assert
        assert!(!err.is_credential_error());
    }

    #[test]
    fn test_missing_credential_is_credential_error() {
        assert!(ApiError::MissingCredential.is_credential_error());
    }

    #[test]
    fn test_parse_error_uses_network_message() {
        // Arrange
        let source = serde_json::from_str::<u32>("not json").unwrap_err();
        let err = ApiError::Parse {
            path: String::from("movie/popular"),
            source,
        };

        // Act & Assert
        assert!(err.is_transport());
        assert_eq!(err.user_message(), NETWORK_ERROR_MESSAGE);
    }

    #[test]
    fn test_api_error_without_message_uses_default() {
        // Arrange
        let err = ApiError::Api {
            status_code: 0,
            message: None,
        };

        // Act & Assert
        assert_eq!(err.user_message(), "An unknown error occurred.");
        assert!(err.api_message().is_none());
    }
}
