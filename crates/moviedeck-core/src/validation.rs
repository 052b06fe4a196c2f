//! API key validation state machine.

use moviedeck_api::tmdb::{ApiConfiguration, ApiError, NETWORK_ERROR_MESSAGE};
use thiserror::Error;

use crate::key_store::KeyStoreError;

/// Message used when the API rejects a key without saying why.
pub const INVALID_KEY_MESSAGE: &str = "Invalid API Key.";

/// Progress of a key submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValidationState {
    /// Nothing submitted yet.
    #[default]
    Idle,
    /// A candidate key is being checked.
    Validating,
    /// The key was accepted and stored.
    Valid,
    /// The API rejected the key.
    Invalid(String),
    /// The check could not reach the API.
    NetworkError(String),
}

impl ValidationState {
    /// Message to show next to the key input, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Invalid(message) | Self::NetworkError(message) => Some(message),
            Self::Idle | Self::Validating | Self::Valid => None,
        }
    }
}

/// Reasons a key submission is refused.
#[derive(Debug, Error)]
#[allow(clippy::module_name_repetitions)]
pub enum ValidationError {
    /// The trimmed key was empty.
    #[error("API Key cannot be empty.")]
    InvalidInput,

    /// Another submission is still being validated.
    #[error("API key validation is already in progress")]
    Busy,

    /// The accepted key could not be stored.
    #[error(transparent)]
    Storage(#[from] KeyStoreError),
}

/// Tracks one key submission at a time.
#[derive(Debug, Default)]
pub struct KeyValidator {
    state: ValidationState,
}

impl KeyValidator {
    /// Creates an idle validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &ValidationState {
        &self.state
    }

    /// Accepts a submission and returns the trimmed candidate key.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Busy`] while a check is outstanding and
    /// [`ValidationError::InvalidInput`] for a blank key. The state is left
    /// untouched in both cases.
    pub fn begin(&mut self, raw_key: &str) -> Result<String, ValidationError> {
        if self.state == ValidationState::Validating {
            return Err(ValidationError::Busy);
        }
        let candidate = raw_key.trim();
        if candidate.is_empty() {
            return Err(ValidationError::InvalidInput);
        }
        self.state = ValidationState::Validating;
        Ok(String::from(candidate))
    }

    /// Records the result of the `configuration` request.
    ///
    /// The caller persists the key when this returns [`ValidationState::Valid`].
    pub fn finish(
        &mut self,
        outcome: &Result<ApiConfiguration, ApiError>,
    ) -> &ValidationState {
        self.state = match outcome {
            Ok(_) => ValidationState::Valid,
            Err(ApiError::Api { message, .. }) => {
                tracing::warn!(reason = message.as_deref(), "API key rejected");
                ValidationState::Invalid(
                    message
                        .clone()
                        .unwrap_or_else(|| String::from(INVALID_KEY_MESSAGE)),
                )
            }
            Err(e @ (ApiError::InvalidInput(_) | ApiError::MissingCredential)) => {
                ValidationState::Invalid(e.user_message())
            }
            Err(e @ (ApiError::Transport(_) | ApiError::HttpStatus { .. } | ApiError::Parse { .. })) => {
                tracing::warn!(error = %e, "API key validation failed");
                ValidationState::NetworkError(String::from(NETWORK_ERROR_MESSAGE))
            }
        };
        &self.state
    }

    /// Marks an accepted key as unusable, e.g. when it could not be stored.
    pub fn reject(&mut self, message: String) {
        self.state = ValidationState::Invalid(message);
    }

    /// Returns to [`ValidationState::Idle`].
    pub fn reset(&mut self) {
        self.state = ValidationState::Idle;
    }
}
