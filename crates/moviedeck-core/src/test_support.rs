//! Scripted `TmdbApi` used by unit tests.
#![allow(clippy::unwrap_used)]

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use moviedeck_api::tmdb::{
    ApiConfiguration, ApiError, Credits, ImageSize, MovieDetails, PagedMovies, SearchMovieParams,
    TimeWindow, TmdbApi,
};

/// Parses a JSON fixture from `fixtures/tmdb/`.
macro_rules! fixture {
    ($name:literal) => {
        serde_json::from_str(include_str!(concat!(
            "../../../fixtures/tmdb/",
            $name
        )))
        .unwrap()
    };
}

/// Increments a counter when dropped.
struct DropCounter<'a>(&'a AtomicUsize);

impl Drop for DropCounter<'_> {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Serves fixtures and records every search request.
#[derive(Debug, Default)]
pub struct MockApi {
    /// `(query, page)` of each search call, in order.
    pub searches: Mutex<Vec<(String, u32)>>,
    /// Search pages that never complete.
    pub hanging_pages: HashSet<u32>,
    /// Search pages that fail with an HTTP error.
    pub failing_pages: HashSet<u32>,
    /// Hanging requests dropped before completion.
    pub dropped: AtomicUsize,
    /// Error returned by the listing endpoints.
    pub listing_error: Option<fn() -> ApiError>,
    /// Error returned by the details endpoint.
    pub details_error: Option<fn() -> ApiError>,
}

impl MockApi {
    pub fn hanging(pages: &[u32]) -> Self {
        Self {
            hanging_pages: pages.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn failing(pages: &[u32]) -> Self {
        Self {
            failing_pages: pages.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn search_log(&self) -> Vec<(String, u32)> {
        self.searches.lock().unwrap().clone()
    }

    fn listing_result(&self, fixture: PagedMovies) -> Result<PagedMovies, ApiError> {
        self.listing_error.map_or(Ok(fixture), |make| Err(make()))
    }
}

impl TmdbApi for MockApi {
    async fn validate_key(&self, candidate: &str) -> Result<ApiConfiguration, ApiError> {
        if candidate == "valid-key" {
            Ok(fixture!("configuration.json"))
        } else {
            Err(ApiError::Api {
                status_code: 7,
                message: Some(String::from(
                    "Invalid API key: You must be granted a valid key.",
                )),
            })
        }
    }

    async fn popular_movies(&self, _page: u32) -> Result<PagedMovies, ApiError> {
        self.listing_result(fixture!("movie_popular.json"))
    }

    async fn trending_movies(&self, _window: TimeWindow) -> Result<PagedMovies, ApiError> {
        self.listing_result(fixture!("trending_movie_day.json"))
    }

    async fn search_movie(&self, params: &SearchMovieParams) -> Result<PagedMovies, ApiError> {
        self.searches
            .lock()
            .unwrap()
            .push((params.query.clone(), params.page));

        if self.hanging_pages.contains(&params.page) {
            let _guard = DropCounter(&self.dropped);
            std::future::pending::<()>().await;
        }
        if self.failing_pages.contains(&params.page) {
            return Err(ApiError::HttpStatus {
                status: 500,
                path: String::from("search/movie"),
            });
        }
        match params.page {
            1 => Ok(fixture!("search_movie_star_p1.json")),
            2 => Ok(fixture!("search_movie_star_p2.json")),
            _ => Ok(fixture!("search_movie_empty.json")),
        }
    }

    async fn movie_details(&self, _movie_id: u64) -> Result<MovieDetails, ApiError> {
        self.details_error
            .map_or_else(|| Ok(fixture!("movie_details_27205.json")), |make| Err(make()))
    }

    async fn movie_credits(&self, _movie_id: u64) -> Result<Credits, ApiError> {
        Ok(fixture!("movie_credits_27205.json"))
    }

    async fn fetch_image(&self, _path: &str, _size: ImageSize) -> Result<Vec<u8>, ApiError> {
        Ok(Vec::new())
    }
}
