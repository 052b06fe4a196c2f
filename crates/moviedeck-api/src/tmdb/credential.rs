//! Credential source consulted on every authenticated request.

use std::fmt;

/// Supplies the TMDB API key on demand.
///
/// The client asks for the key on every request, so implementations backed by
/// persistent storage observe key changes without rebuilding the client.
pub trait CredentialProvider: Send + Sync + fmt::Debug {
    /// Returns the current API key, or `None` when unauthenticated.
    fn api_key(&self) -> Option<String>;
}

/// A fixed API key held in memory.
#[derive(Clone)]
pub struct StaticApiKey(String);

impl StaticApiKey {
    /// Wraps the given key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

impl fmt::Debug for StaticApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticApiKey(***)")
    }
}

impl CredentialProvider for StaticApiKey {
    fn api_key(&self) -> Option<String> {
        Some(self.0.clone())
    }
}
