//! Interactive movie browser main loop.
//!
//! Network work runs in spawned tasks on the current-thread runtime; the loop
//! drains their replies, ticks the search controller with the list's scroll
//! position, redraws, and handles keys without blocking.

/// Browser state types.
pub mod state;
mod ui;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use moviedeck_api::tmdb::{ApiConfiguration, ApiError, MovieSummary, TmdbApi};
use moviedeck_core::details::{DetailsView, load_details};
use moviedeck_core::home::{HomeOutcome, load_home};
use moviedeck_core::prefs::PreferenceStore;
use moviedeck_core::search::SearchController;
use moviedeck_core::session::{MovieAction, Screen, Session};
use moviedeck_core::validation::ValidationState;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;

use self::state::{BrowserState, Cursor, HomeView, home_rows, scroll_position, search_rows};

/// Delay between loop iterations.
const TICK: Duration = Duration::from_millis(50);

/// Public page of a movie on themoviedb.org.
const MOVIE_PAGE_URL: &str = "https://www.themoviedb.org/movie";

/// Result of a spawned task.
enum TaskReply {
    Home(HomeOutcome),
    Details {
        movie_id: u64,
        result: std::result::Result<Box<DetailsView>, ApiError>,
    },
    KeyChecked {
        candidate: String,
        outcome: std::result::Result<ApiConfiguration, ApiError>,
    },
}

/// Browser application state.
struct Browser<A, P> {
    api: Arc<A>,
    session: Session<P>,
    search: SearchController<A>,
    state: BrowserState,
    cursor: Cursor,
    image_base: String,
    task_tx: mpsc::UnboundedSender<TaskReply>,
    task_rx: mpsc::UnboundedReceiver<TaskReply>,
}

/// Runs the browser TUI until the user quits.
///
/// # Errors
///
/// Returns an error if terminal setup, drawing, or event handling fails.
pub async fn run_browser<A, P>(api: Arc<A>, session: Session<P>, image_base: String) -> Result<()>
where
    A: TmdbApi + Send + Sync + 'static,
    P: PreferenceStore,
{
    let mut browser = Browser::new(api, session, image_base);
    if browser.session.screen() == Screen::Home {
        browser.start_home_load();
    }

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen)
        .context("failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    let result = run_event_loop(&mut terminal, &mut browser).await;

    // Cleanup (always attempt even if event loop failed)
    disable_raw_mode().context("failed to disable raw mode")?;
    crossterm::execute!(io::stdout(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;

    result
}

/// Main event loop.
async fn run_event_loop<A, P>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    browser: &mut Browser<A, P>,
) -> Result<()>
where
    A: TmdbApi + Send + Sync + 'static,
    P: PreferenceStore,
{
    loop {
        browser.drain_tasks();
        if browser.session.screen() == Screen::Search {
            let position = scroll_position(browser.cursor.selected(), browser.row_count());
            browser.search.tick(position);
        }

        let view = ui::View {
            screen: browser.session.screen(),
            state: &browser.state,
            validation: browser.session.validation_state(),
            search: browser.search.session(),
            rows: visible_rows(&browser.session, &browser.search, &browser.state),
        };
        let list_state = browser.cursor.list_state_mut();
        terminal
            .draw(|frame| ui::draw(frame, &view, list_state))
            .context("failed to draw TUI")?;

        while event::poll(Duration::ZERO).context("failed to poll events")? {
            if let Event::Key(key) = event::read().context("failed to read event")?
                && key.kind == KeyEventKind::Press
                && browser.handle_key(key)
            {
                return Ok(());
            }
        }

        tokio::time::sleep(TICK).await;
    }
}

/// Rows of the list on the visible screen.
fn visible_rows<'a, A, P>(
    session: &'a Session<P>,
    search: &'a SearchController<A>,
    state: &'a BrowserState,
) -> Vec<&'a MovieSummary>
where
    A: TmdbApi + Send + Sync + 'static,
    P: PreferenceStore,
{
    let recent = session.recently_viewed().movies();
    match session.screen() {
        Screen::Home => home_rows(state, recent),
        Screen::Search => search_rows(search.session(), recent, &state.home),
        Screen::KeyEntry | Screen::Details { .. } => Vec::new(),
    }
}

impl<A, P> Browser<A, P>
where
    A: TmdbApi + Send + Sync + 'static,
    P: PreferenceStore,
{
    fn new(api: Arc<A>, session: Session<P>, image_base: String) -> Self {
        let (task_tx, task_rx) = mpsc::unbounded_channel();
        Self {
            search: SearchController::new(Arc::clone(&api)),
            api,
            session,
            state: BrowserState::default(),
            cursor: Cursor::default(),
            image_base,
            task_tx,
            task_rx,
        }
    }

    fn row_count(&self) -> usize {
        visible_rows(&self.session, &self.search, &self.state).len()
    }

    fn selected_movie(&self) -> Option<MovieSummary> {
        let rows = visible_rows(&self.session, &self.search, &self.state);
        self.cursor
            .selected()
            .and_then(|idx| rows.get(idx))
            .map(|movie| (*movie).clone())
    }

    fn reset_cursor(&mut self) {
        let len = self.row_count();
        self.cursor.reset(len);
    }

    fn start_home_load(&mut self) {
        self.state.home = HomeView::Loading;
        let api = Arc::clone(&self.api);
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let outcome = load_home(api.as_ref()).await;
            if tx.send(TaskReply::Home(outcome)).is_err() {
                tracing::debug!("Browser closed before home screen loaded");
            }
        });
    }

    fn open_details(&mut self, movie: MovieSummary) {
        self.session.handle(MovieAction::OpenDetails(movie.clone()));
        self.state.details = None;

        let api = Arc::clone(&self.api);
        let tx = self.task_tx.clone();
        let image_base = self.image_base.clone();
        let movie_id = movie.id;
        tokio::spawn(async move {
            let result = load_details(api.as_ref(), movie, &image_base)
                .await
                .map(Box::new);
            if tx.send(TaskReply::Details { movie_id, result }).is_err() {
                tracing::debug!("Browser closed before details loaded");
            }
        });
    }

    fn submit_key(&mut self) {
        let candidate = match self.session.begin_key_submission(&self.state.key_input) {
            Ok(candidate) => candidate,
            Err(e) => {
                self.state.notice = Some(e.to_string());
                return;
            }
        };
        self.state.notice = None;

        let api = Arc::clone(&self.api);
        let tx = self.task_tx.clone();
        tokio::spawn(async move {
            let outcome = api.validate_key(&candidate).await;
            if tx
                .send(TaskReply::KeyChecked { candidate, outcome })
                .is_err()
            {
                tracing::debug!("Browser closed before key validated");
            }
        });
    }

    /// Applies replies from finished tasks.
    fn drain_tasks(&mut self) {
        while let Ok(reply) = self.task_rx.try_recv() {
            self.apply(reply);
        }
    }

    fn apply(&mut self, reply: TaskReply) {
        match reply {
            TaskReply::Home(HomeOutcome::Ready { popular, trending }) => {
                self.state.home = HomeView::Ready { popular, trending };
                self.reset_cursor();
            }
            TaskReply::Home(HomeOutcome::NeedsApiKey) => {
                self.state.home = HomeView::Idle;
                self.session.require_key();
            }
            TaskReply::Home(HomeOutcome::Failed { message }) => {
                self.state.home = HomeView::Failed(message);
            }
            TaskReply::Details { movie_id, .. }
                if self.session.screen() != (Screen::Details { movie_id }) =>
            {
                tracing::debug!(movie_id, "Ignoring details for a closed screen");
            }
            TaskReply::Details {
                result: Ok(view), ..
            } => self.state.details = Some(*view),
            TaskReply::Details { result: Err(e), .. } => {
                if self.session.route_error(&e) {
                    self.state.home = HomeView::Idle;
                } else {
                    self.state.notice = Some(e.user_message());
                }
            }
            TaskReply::KeyChecked { candidate, outcome } => {
                match self.session.complete_key_submission(&candidate, &outcome) {
                    Ok(ValidationState::Valid) => {
                        self.state.key_input.clear();
                        self.start_home_load();
                    }
                    Ok(_) => {}
                    Err(e) => self.state.notice = Some(format!("Failed to store API key: {e}")),
                }
            }
        }
    }

    /// Handles a key press. Returns `true` to exit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }
        match self.session.screen() {
            Screen::KeyEntry => self.handle_key_entry(key.code),
            Screen::Home => self.handle_home(key.code),
            Screen::Search => {
                self.handle_search(key.code);
                false
            }
            Screen::Details { movie_id } => self.handle_details(key.code, movie_id),
        }
    }

    fn handle_key_entry(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Esc => return true,
            KeyCode::Enter => self.submit_key(),
            KeyCode::Backspace => {
                self.state.key_input.pop();
            }
            KeyCode::Char(c) => self.state.key_input.push(c),
            _ => {}
        }
        false
    }

    fn handle_home(&mut self, key: KeyCode) -> bool {
        let len = self.row_count();
        match key {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up | KeyCode::Char('k') => self.cursor.move_up(len),
            KeyCode::Down | KeyCode::Char('j') => self.cursor.move_down(len),
            KeyCode::Tab => {
                self.state.home_pane = self.state.home_pane.next();
                self.reset_cursor();
            }
            KeyCode::Enter => {
                if let Some(movie) = self.selected_movie() {
                    self.open_details(movie);
                }
            }
            KeyCode::Char('/') => {
                self.session.show_search();
                self.reset_cursor();
            }
            KeyCode::Char('r') => {
                if matches!(self.state.home, HomeView::Failed(_)) {
                    self.start_home_load();
                }
            }
            KeyCode::Char('K') => match self.session.forget_key() {
                Ok(_) => {
                    self.state.home = HomeView::Idle;
                    self.state.notice = None;
                }
                Err(e) => self.state.notice = Some(e.to_string()),
            },
            _ => {}
        }
        false
    }

    fn handle_search(&mut self, key: KeyCode) {
        let len = self.row_count();
        match key {
            KeyCode::Esc => {
                self.search.clear();
                self.state.query.clear();
                self.session.hide_search();
                self.reset_cursor();
            }
            KeyCode::Up => self.cursor.move_up(len),
            KeyCode::Down => self.cursor.move_down(len),
            KeyCode::Enter => {
                if let Some(movie) = self.selected_movie() {
                    self.open_details(movie);
                }
            }
            KeyCode::Backspace => {
                if self.state.query.pop().is_some() {
                    self.search.set_query(&self.state.query);
                    self.reset_cursor();
                }
            }
            KeyCode::Char(c) => {
                self.state.query.push(c);
                self.search.set_query(&self.state.query);
                self.reset_cursor();
            }
            _ => {}
        }
    }

    fn handle_details(&mut self, key: KeyCode, movie_id: u64) -> bool {
        match key {
            KeyCode::Char('q') => return true,
            KeyCode::Esc | KeyCode::Backspace => {
                self.session.close_details(false);
                self.reset_cursor();
            }
            KeyCode::Char('/') => {
                self.session.close_details(true);
                self.reset_cursor();
            }
            KeyCode::Char('o') => open_movie_page(movie_id),
            _ => {}
        }
        false
    }
}

/// Opens the themoviedb.org page of a movie.
fn open_movie_page(movie_id: u64) {
    let url = format!("{MOVIE_PAGE_URL}/{movie_id}");
    if let Err(e) = open::that(&url) {
        tracing::warn!(url = %url, error = %e, "Failed to open browser");
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use moviedeck_api::tmdb::{
        Credits, ImageSize, MovieDetails, PagedMovies, Result as ApiResult, SearchMovieParams,
        TimeWindow,
    };
    use moviedeck_core::key_store::KeyStore;
    use moviedeck_core::prefs::{MemoryPreferences, PreferenceStore};

    use super::*;

    /// API whose every request fails for lack of a key.
    #[derive(Debug)]
    struct KeylessApi;

    impl TmdbApi for KeylessApi {
        async fn validate_key(&self, _candidate: &str) -> ApiResult<ApiConfiguration> {
            Err(ApiError::MissingCredential)
        }

        async fn popular_movies(&self, _page: u32) -> ApiResult<PagedMovies> {
            Err(ApiError::MissingCredential)
        }

        async fn trending_movies(&self, _window: TimeWindow) -> ApiResult<PagedMovies> {
            Err(ApiError::MissingCredential)
        }

        async fn search_movie(&self, _params: &SearchMovieParams) -> ApiResult<PagedMovies> {
            Err(ApiError::MissingCredential)
        }

        async fn movie_details(&self, _movie_id: u64) -> ApiResult<MovieDetails> {
            Err(ApiError::MissingCredential)
        }

        async fn movie_credits(&self, _movie_id: u64) -> ApiResult<Credits> {
            Err(ApiError::MissingCredential)
        }

        async fn fetch_image(&self, _path: &str, _size: ImageSize) -> ApiResult<Vec<u8>> {
            Err(ApiError::MissingCredential)
        }
    }

    /// Preference store that refuses every write.
    #[derive(Debug)]
    struct ReadOnlyPreferences;

    impl PreferenceStore for ReadOnlyPreferences {
        fn get(&self, _slot: &str) -> anyhow::Result<Option<String>> {
            Ok(None)
        }

        fn set(&self, _slot: &str, _value: &str) -> anyhow::Result<()> {
            anyhow::bail!("preferences are read-only")
        }

        fn remove(&self, _slot: &str) -> anyhow::Result<()> {
            anyhow::bail!("preferences are read-only")
        }
    }

    fn browser_with<P: PreferenceStore>(key_store: KeyStore<P>) -> Browser<KeylessApi, P> {
        let session = Session::new(Arc::new(key_store));
        Browser::new(Arc::new(KeylessApi), session, String::from("http://img/t/p/"))
    }

    fn movie(id: u64) -> MovieSummary {
        MovieSummary {
            id,
            ..MovieSummary::default()
        }
    }

    #[test]
    fn test_stale_details_error_is_ignored() {
        // Arrange
        let key_store = KeyStore::new(MemoryPreferences::new());
        key_store.save("valid-key").unwrap();
        let mut browser = browser_with(key_store);
        browser.session.open_details(movie(2));

        // Act
        browser.apply(TaskReply::Details {
            movie_id: 1,
            result: Err(ApiError::MissingCredential),
        });

        // Assert
        assert_eq!(browser.session.screen(), Screen::Details { movie_id: 2 });
        assert!(browser.state.notice.is_none());
    }

    #[test]
    fn test_current_details_error_routes_to_key_entry() {
        // Arrange
        let key_store = KeyStore::new(MemoryPreferences::new());
        key_store.save("valid-key").unwrap();
        let mut browser = browser_with(key_store);
        browser.session.open_details(movie(2));

        // Act
        browser.apply(TaskReply::Details {
            movie_id: 2,
            result: Err(ApiError::MissingCredential),
        });

        // Assert
        assert_eq!(browser.session.screen(), Screen::KeyEntry);
    }

    #[test]
    fn test_key_storage_failure_shows_notice() {
        // Arrange
        let mut browser = browser_with(KeyStore::new(ReadOnlyPreferences));
        let candidate = browser.session.begin_key_submission("valid-key").unwrap();

        // Act
        browser.apply(TaskReply::KeyChecked {
            candidate,
            outcome: Ok(ApiConfiguration::default()),
        });

        // Assert
        assert_eq!(browser.session.screen(), Screen::KeyEntry);
        assert!(matches!(
            browser.session.validation_state(),
            ValidationState::Invalid(_)
        ));
        assert!(
            browser
                .state
                .notice
                .as_deref()
                .is_some_and(|n| n.contains("read-only"))
        );
    }
}
