//! Cross-screen session state and navigation.

use std::sync::Arc;

use moviedeck_api::tmdb::{ApiConfiguration, ApiError, MovieSummary, TmdbApi};

use crate::key_store::{KeyStore, KeyStoreError};
use crate::prefs::PreferenceStore;
use crate::recently_viewed::RecentlyViewed;
use crate::validation::{KeyValidator, ValidationError, ValidationState};

/// Visible screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// API key input.
    KeyEntry,
    /// Popular and trending lists.
    Home,
    /// Search box and results.
    Search,
    /// A single movie.
    Details {
        /// Movie shown.
        movie_id: u64,
    },
}

/// Action bound to one list row. Each row carries its own movie.
#[derive(Debug, Clone, PartialEq)]
pub enum MovieAction {
    /// Open the details screen for the movie.
    OpenDetails(MovieSummary),
}

/// Navigation and session state shared by all screens.
#[derive(Debug)]
pub struct Session<P> {
    key_store: Arc<KeyStore<P>>,
    active_key: Option<String>,
    screen: Screen,
    return_to: Screen,
    recently_viewed: RecentlyViewed,
    validator: KeyValidator,
}

impl<P: PreferenceStore> Session<P> {
    /// Creates a session and picks the first screen from the stored key.
    pub fn new(key_store: Arc<KeyStore<P>>) -> Self {
        let mut session = Self {
            key_store,
            active_key: None,
            screen: Screen::KeyEntry,
            return_to: Screen::Home,
            recently_viewed: RecentlyViewed::new(),
            validator: KeyValidator::new(),
        };
        session.derive_screen();
        session
    }

    /// Visible screen.
    #[must_use]
    pub const fn screen(&self) -> Screen {
        self.screen
    }

    /// Returns `true` when a key is cached for this session.
    #[must_use]
    pub const fn has_key(&self) -> bool {
        self.active_key.is_some()
    }

    /// Movies opened so far.
    #[must_use]
    pub const fn recently_viewed(&self) -> &RecentlyViewed {
        &self.recently_viewed
    }

    /// State of the last key submission.
    #[must_use]
    pub const fn validation_state(&self) -> &ValidationState {
        self.validator.state()
    }

    /// Shows `Home` when a key is stored, else `KeyEntry`.
    pub fn derive_screen(&mut self) -> Screen {
        self.active_key = self.key_store.load();
        self.screen = if self.active_key.is_some() {
            Screen::Home
        } else {
            Screen::KeyEntry
        };
        tracing::debug!(screen = ?self.screen, "Screen derived from stored key");
        self.screen
    }

    /// Starts a key submission and returns the trimmed candidate.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidInput`] for a blank key and
    /// [`ValidationError::Busy`] while another submission is outstanding.
    pub fn begin_key_submission(&mut self, raw_key: &str) -> Result<String, ValidationError> {
        self.validator.begin(raw_key)
    }

    /// Finishes a key submission with the `configuration` response.
    ///
    /// An accepted key is stored and the screen re-derived. A key that cannot
    /// be stored leaves the validator `Invalid` and the screen on key entry.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Storage`] if the accepted key cannot be stored.
    pub fn complete_key_submission(
        &mut self,
        candidate: &str,
        outcome: &Result<ApiConfiguration, ApiError>,
    ) -> Result<ValidationState, ValidationError> {
        let state = self.validator.finish(outcome).clone();
        if state == ValidationState::Valid {
            if let Err(e) = self.key_store.save(candidate) {
                tracing::warn!(error = %e, "Failed to store API key");
                self.validator.reject(e.to_string());
                return Err(e.into());
            }
            self.derive_screen();
        }
        Ok(state)
    }

    /// Validates `raw_key` against the API and stores it on success.
    ///
    /// # Errors
    ///
    /// See [`Self::begin_key_submission`] and [`Self::complete_key_submission`].
    pub async fn submit_key<A: TmdbApi>(
        &mut self,
        api: &A,
        raw_key: &str,
    ) -> Result<ValidationState, ValidationError> {
        let candidate = self.begin_key_submission(raw_key)?;
        let outcome = api.validate_key(&candidate).await;
        self.complete_key_submission(&candidate, &outcome)
    }

    /// Runs a row action.
    pub fn handle(&mut self, action: MovieAction) -> Screen {
        match action {
            MovieAction::OpenDetails(movie) => self.open_details(movie),
        }
    }

    /// Records `movie` as viewed and shows its details.
    pub fn open_details(&mut self, movie: MovieSummary) -> Screen {
        if !matches!(self.screen, Screen::Details { .. }) {
            self.return_to = self.screen;
        }
        self.screen = Screen::Details { movie_id: movie.id };
        self.recently_viewed.add(movie);
        self.screen
    }

    /// Leaves the details screen.
    ///
    /// Returns to the screen the details were opened from, or to `Search`
    /// when `show_search` is set.
    pub fn close_details(&mut self, show_search: bool) -> Screen {
        self.screen = if show_search {
            Screen::Search
        } else {
            self.return_to
        };
        self.screen
    }

    /// Shows the search screen.
    pub fn show_search(&mut self) -> Screen {
        self.screen = Screen::Search;
        self.screen
    }

    /// Leaves the search screen for `Home`.
    pub fn hide_search(&mut self) -> Screen {
        self.screen = Screen::Home;
        self.screen
    }

    /// Sends the user to key entry for credential errors.
    ///
    /// Returns `true` if the error was routed.
    pub fn route_error(&mut self, err: &ApiError) -> bool {
        if !err.is_credential_error() {
            return false;
        }
        tracing::info!("API key missing or rejected, showing key entry");
        self.require_key();
        true
    }

    /// Drops the cached key and shows key entry. The stored key is kept.
    pub fn require_key(&mut self) -> Screen {
        self.active_key = None;
        self.validator.reset();
        self.screen = Screen::KeyEntry;
        self.screen
    }

    /// Deletes the stored key and shows key entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the preference store cannot be written.
    pub fn forget_key(&mut self) -> Result<Screen, KeyStoreError> {
        self.key_store.clear()?;
        self.active_key = None;
        self.validator.reset();
        self.screen = Screen::KeyEntry;
        Ok(self.screen)
    }
}
