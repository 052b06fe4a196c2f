//! Incremental search with scroll-triggered page fetches.
//!
//! A [`SearchController`] owns at most one [`SearchSession`]. Page requests run
//! as spawned tasks and report back over a channel; the front end calls
//! [`SearchController::tick`] on every frame with the results view's scroll
//! position to apply replies and trigger the next page.

use std::sync::Arc;

use moviedeck_api::tmdb::{ApiError, MovieSummary, PagedMovies, SearchMovieParams, TmdbApi};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::format::results_label;

/// Normalized scroll position (1.0 top, 0.0 bottom) at or below which the
/// next page is requested.
pub const FETCH_MORE_THRESHOLD: f64 = 0.05;

/// Accumulated results for one query.
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::module_name_repetitions)]
pub struct SearchSession {
    /// Query text.
    pub query: String,
    /// Last page applied (starts at 1).
    pub current_page: u32,
    /// Total pages reported by the API (at least 1).
    pub total_pages: u32,
    /// Total matches reported with the first page.
    pub total_results: u32,
    /// Results in page order.
    pub results: Vec<MovieSummary>,
    in_flight: bool,
}

impl SearchSession {
    fn new(query: String) -> Self {
        Self {
            query,
            current_page: 1,
            total_pages: 1,
            total_results: 0,
            results: Vec::new(),
            in_flight: false,
        }
    }

    /// Returns `true` while a page request is outstanding.
    #[must_use]
    pub const fn is_fetching(&self) -> bool {
        self.in_flight
    }

    /// Returns `true` if more pages remain.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Header for the results list.
    #[must_use]
    pub fn label(&self) -> String {
        results_label(&self.query, self.total_results)
    }

    fn should_fetch_more(&self, scroll_position: f64) -> bool {
        !self.in_flight && self.has_more() && scroll_position <= FETCH_MORE_THRESHOLD
    }

    fn apply_page(&mut self, page: u32, response: PagedMovies) {
        self.total_pages = response.total_pages.max(1);
        self.current_page = response.page.max(page).clamp(1, self.total_pages);
        if page <= 1 {
            self.total_results = response.total_results;
            self.results = response.results;
        } else {
            self.results.extend(response.results);
        }
    }
}

/// A finished page request.
#[derive(Debug)]
struct PageReply {
    generation: u64,
    page: u32,
    result: Result<PagedMovies, ApiError>,
}

/// Drives page requests for the search screen.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct SearchController<A> {
    api: Arc<A>,
    session: Option<SearchSession>,
    generation: u64,
    cancel: CancellationToken,
    reply_tx: mpsc::UnboundedSender<PageReply>,
    reply_rx: mpsc::UnboundedReceiver<PageReply>,
}

impl<A> SearchController<A>
where
    A: TmdbApi + Send + Sync + 'static,
{
    /// Creates a controller with no active session.
    pub fn new(api: Arc<A>) -> Self {
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        Self {
            api,
            session: None,
            generation: 0,
            cancel: CancellationToken::new(),
            reply_tx,
            reply_rx,
        }
    }

    /// Active session, if a query is set.
    #[must_use]
    pub const fn session(&self) -> Option<&SearchSession> {
        self.session.as_ref()
    }

    /// Replaces the query.
    ///
    /// Cancels any outstanding request, then starts page 1 of the new query.
    /// A blank query ends the session without a request. Must be called from
    /// within a tokio runtime.
    pub fn set_query(&mut self, query: &str) {
        self.cancel.cancel();
        self.cancel = CancellationToken::new();
        self.generation = self.generation.wrapping_add(1);

        let query = query.trim();
        if query.is_empty() {
            tracing::debug!("Search cleared");
            self.session = None;
            return;
        }

        self.session = Some(SearchSession::new(String::from(query)));
        self.request_page(1);
    }

    /// Ends the session, as when leaving the search screen.
    pub fn clear(&mut self) {
        self.set_query("");
    }

    /// Applies finished requests, then requests the next page if the view is
    /// scrolled near its end.
    ///
    /// Returns `true` if the session changed.
    pub fn tick(&mut self, scroll_position: f64) -> bool {
        let mut changed = false;
        while let Ok(reply) = self.reply_rx.try_recv() {
            changed |= self.apply_reply(reply);
        }

        let next_page = self
            .session
            .as_ref()
            .filter(|s| s.should_fetch_more(scroll_position))
            .map(|s| s.current_page.saturating_add(1));
        if let Some(page) = next_page {
            self.request_page(page);
            changed = true;
        }
        changed
    }

    /// Waits for the outstanding request of the current session and applies it.
    ///
    /// Returns `false` immediately when nothing is in flight.
    pub async fn settle(&mut self) -> bool {
        if !self.session.as_ref().is_some_and(SearchSession::is_fetching) {
            return false;
        }
        while let Some(reply) = self.reply_rx.recv().await {
            let current = reply.generation == self.generation;
            let changed = self.apply_reply(reply);
            if current {
                return changed;
            }
        }
        false
    }

    /// Requests the next page regardless of scroll position.
    ///
    /// Returns `false` if no page was requested.
    pub fn fetch_next_page(&mut self) -> bool {
        let next_page = self
            .session
            .as_ref()
            .filter(|s| !s.in_flight && s.has_more())
            .map(|s| s.current_page.saturating_add(1));
        next_page.is_some_and(|page| {
            self.request_page(page);
            true
        })
    }

    fn request_page(&mut self, page: u32) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.in_flight = true;

        let params = SearchMovieParams::new(session.query.clone()).page(page);
        let api = Arc::clone(&self.api);
        let token = self.cancel.clone();
        let tx = self.reply_tx.clone();
        let generation = self.generation;

        tracing::debug!(page, generation, "Requesting search page");
        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {
                    tracing::debug!(page, generation, "Search request cancelled");
                }
                result = api.search_movie(&params) => {
                    if tx.send(PageReply { generation, page, result }).is_err() {
                        tracing::debug!(page, "Search controller dropped before reply");
                    }
                }
            }
        });
    }

    fn apply_reply(&mut self, reply: PageReply) -> bool {
        if reply.generation != self.generation {
            return false;
        }
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        session.in_flight = false;

        match reply.result {
            Ok(response) => {
                session.apply_page(reply.page, response);
                true
            }
            Err(e) => {
                tracing::warn!(page = reply.page, error = %e, "Failed to fetch search results");
                false
            }
        }
    }
}
