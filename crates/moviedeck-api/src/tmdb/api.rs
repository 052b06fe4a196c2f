//! `TmdbApi` trait definition.
#![allow(clippy::future_not_send)]

use super::error::Result;
use super::image::ImageSize;
use super::types::{
    ApiConfiguration, Credits, MovieDetails, PagedMovies, SearchMovieParams, TimeWindow,
};

/// TMDB API trait.
///
/// Abstracts API operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(TmdbApi: Send)]
pub trait LocalTmdbApi {
    /// Validates a candidate API key against the `configuration` endpoint.
    ///
    /// The candidate is used instead of the stored credential.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Api`](super::ApiError::Api) if the key is rejected,
    /// or a transport-class error if the request fails.
    async fn validate_key(&self, candidate: &str) -> Result<ApiConfiguration>;

    /// Fetches a page of popular movies.
    ///
    /// # Errors
    ///
    /// Returns an error if no key is stored, or the HTTP request or JSON parsing fails.
    async fn popular_movies(&self, page: u32) -> Result<PagedMovies>;

    /// Fetches trending movies for the given window.
    ///
    /// # Errors
    ///
    /// Returns an error if no key is stored, or the HTTP request or JSON parsing fails.
    async fn trending_movies(&self, window: TimeWindow) -> Result<PagedMovies>;

    /// Searches for movies. Pagination requests carry no timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the query is empty, no key is stored,
    /// or the HTTP request or JSON parsing fails.
    async fn search_movie(&self, params: &SearchMovieParams) -> Result<PagedMovies>;

    /// Fetches movie details including genres.
    ///
    /// # Errors
    ///
    /// Returns an error if no key is stored, or the HTTP request or JSON parsing fails.
    async fn movie_details(&self, movie_id: u64) -> Result<MovieDetails>;

    /// Fetches the cast of a movie.
    ///
    /// # Errors
    ///
    /// Returns an error if no key is stored, or the HTTP request or JSON parsing fails.
    async fn movie_credits(&self, movie_id: u64) -> Result<Credits>;

    /// Downloads an image by path at the requested size.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is empty or the HTTP request fails.
    async fn fetch_image(&self, path: &str, size: ImageSize) -> Result<Vec<u8>>;
}
