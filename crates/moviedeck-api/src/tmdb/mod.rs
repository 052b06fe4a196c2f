//! TMDB API client module.
//!
//! Handles HTTP requests to the TMDB API v3 endpoints and retrieves
//! movie lists, search results, details, credits, and artwork.

mod api;
mod client;
mod credential;
mod error;
mod image;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{LocalTmdbApi, TmdbApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{TmdbClient, TmdbClientBuilder};
pub use credential::{CredentialProvider, StaticApiKey};
pub use error::{ApiError, NETWORK_ERROR_MESSAGE, Result};
pub use image::{DEFAULT_IMAGE_BASE_URL, ImageSize, image_url};
#[allow(clippy::module_name_repetitions)]
pub use types::{
    ApiConfiguration, CastMember, Credits, Genre, ImagesConfiguration, MovieDetails,
    MovieSummary, PagedMovies, SearchMovieParams, TimeWindow, TmdbErrorResponse,
};
