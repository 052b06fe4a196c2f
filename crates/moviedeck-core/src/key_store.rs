//! Obfuscated API key storage.
//!
//! The key is stored as standard base64 of its UTF-8 bytes. This hides it
//! from casual inspection of the preference file and nothing more.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use moviedeck_api::tmdb::CredentialProvider;
use thiserror::Error;

use crate::prefs::PreferenceStore;

/// Preference slot holding the encoded key.
pub const API_KEY_SLOT: &str = "TMDB_API_KEY";

/// Errors from [`KeyStore`].
#[derive(Debug, Error)]
#[allow(clippy::module_name_repetitions)]
pub enum KeyStoreError {
    /// The key was empty after trimming.
    #[error("API Key cannot be empty.")]
    InvalidInput,

    /// The preference storage failed.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Encodes a key for storage.
#[must_use]
pub fn encode_key(key: &str) -> String {
    STANDARD.encode(key.as_bytes())
}

/// Decodes a stored key. Returns `None` for invalid base64 or UTF-8.
#[must_use]
pub fn decode_key(encoded: &str) -> Option<String> {
    let bytes = STANDARD.decode(encoded.trim()).ok()?;
    String::from_utf8(bytes).ok()
}

/// API key persisted in a [`PreferenceStore`].
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct KeyStore<P> {
    prefs: P,
}

impl<P: PreferenceStore> KeyStore<P> {
    /// Wraps a preference store.
    pub const fn new(prefs: P) -> Self {
        Self { prefs }
    }

    /// Trims and stores `raw_key`.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::InvalidInput`] for a blank key, or
    /// [`KeyStoreError::Storage`] if the preference write fails.
    pub fn save(&self, raw_key: &str) -> Result<(), KeyStoreError> {
        let key = raw_key.trim();
        if key.is_empty() {
            return Err(KeyStoreError::InvalidInput);
        }
        self.prefs.set(API_KEY_SLOT, &encode_key(key))?;
        tracing::info!("API key saved");
        Ok(())
    }

    /// Returns the stored key.
    ///
    /// Unset, empty, unreadable or corrupt data all read as `None`.
    pub fn load(&self) -> Option<String> {
        let encoded = match self.prefs.get(API_KEY_SLOT) {
            Ok(Some(encoded)) if !encoded.is_empty() => encoded,
            Ok(_) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored API key");
                return None;
            }
        };
        let decoded = decode_key(&encoded);
        if decoded.is_none() {
            tracing::warn!("Stored API key is corrupt, ignoring it");
        }
        decoded.filter(|key| !key.is_empty())
    }

    /// Removes the stored key.
    ///
    /// # Errors
    ///
    /// Returns [`KeyStoreError::Storage`] if the preference write fails.
    pub fn clear(&self) -> Result<(), KeyStoreError> {
        self.prefs.remove(API_KEY_SLOT)?;
        tracing::info!("API key cleared");
        Ok(())
    }
}

impl<P: PreferenceStore> CredentialProvider for KeyStore<P> {
    fn api_key(&self) -> Option<String> {
        self.load()
    }
}
