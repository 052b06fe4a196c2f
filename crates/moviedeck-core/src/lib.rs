//! Session state and screen logic for moviedeck.
//!
//! Front-end independent: key storage and validation, search pagination,
//! the recently viewed registry, and the session coordinator that decides
//! which screen is visible.

/// Details screen loader.
pub mod details;
/// Display strings.
pub mod format;
/// Home screen loader.
pub mod home;
/// Obfuscated API key storage.
pub mod key_store;
/// Preference storage.
pub mod prefs;
/// Recently viewed registry.
pub mod recently_viewed;
/// Incremental search.
pub mod search;
/// Session coordinator.
pub mod session;
/// Key validation state machine.
pub mod validation;

#[cfg(test)]
mod test_support;
