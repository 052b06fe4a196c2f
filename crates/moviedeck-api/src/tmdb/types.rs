//! TMDB API response types and search parameters.

use serde::{Deserialize, Deserializer};

/// Deserializes `null` as the type's default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// --- Movie lists ---

/// A page of movies from `movie/popular`, `trending/movie/{window}`,
/// or `search/movie`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PagedMovies {
    /// Current page number.
    #[serde(default)]
    pub page: u32,
    /// Movies on this page.
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<MovieSummary>,
    /// Total number of pages.
    #[serde(default)]
    pub total_pages: u32,
    /// Total number of results.
    #[serde(default)]
    pub total_results: u32,
}

/// A movie as it appears in lists and search results.
///
/// Missing or `null` text fields are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MovieSummary {
    /// TMDB movie ID.
    pub id: u64,
    /// Localized title.
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Overview text.
    #[serde(default, deserialize_with = "null_as_default")]
    pub overview: String,
    /// Poster image path (e.g. `/abc.jpg`), empty when absent.
    #[serde(default, deserialize_with = "null_as_default")]
    pub poster_path: String,
    /// Backdrop image path, empty when absent.
    #[serde(default, deserialize_with = "null_as_default")]
    pub backdrop_path: String,
    /// Release date (YYYY-MM-DD), empty when unknown.
    #[serde(default, deserialize_with = "null_as_default")]
    pub release_date: String,
    /// Vote average (0 when unrated).
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_average: f64,
    /// Vote count.
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_count: u32,
}

impl MovieSummary {
    /// Returns the release year (first four characters of the date), if any.
    #[must_use]
    pub fn release_year(&self) -> Option<&str> {
        self.release_date
            .get(..4)
            .filter(|year| year.chars().all(|c| c.is_ascii_digit()))
    }
}

/// Trending time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeWindow {
    /// Trending today.
    #[default]
    Day,
    /// Trending this week.
    Week,
}

impl TimeWindow {
    /// Returns the path segment for this window.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
        }
    }
}

// --- Movie Details ---

/// Response from `movie/{movie_id}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MovieDetails {
    /// TMDB movie ID.
    pub id: u64,
    /// Localized title.
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Overview text.
    #[serde(default, deserialize_with = "null_as_default")]
    pub overview: String,
    /// Genres.
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<Genre>,
    /// Release date (YYYY-MM-DD).
    #[serde(default, deserialize_with = "null_as_default")]
    pub release_date: String,
    /// Poster image path, empty when absent.
    #[serde(default, deserialize_with = "null_as_default")]
    pub poster_path: String,
    /// Backdrop image path, empty when absent.
    #[serde(default, deserialize_with = "null_as_default")]
    pub backdrop_path: String,
    /// Vote average.
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_average: f64,
    /// Vote count.
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_count: u32,
    /// Runtime in minutes.
    #[serde(default)]
    pub runtime: Option<u32>,
    /// Tagline.
    #[serde(default)]
    pub tagline: Option<String>,
}

impl MovieDetails {
    /// The list-level fields of this movie.
    #[must_use]
    pub fn summary(&self) -> MovieSummary {
        MovieSummary {
            id: self.id,
            title: self.title.clone(),
            overview: self.overview.clone(),
            poster_path: self.poster_path.clone(),
            backdrop_path: self.backdrop_path.clone(),
            release_date: self.release_date.clone(),
            vote_average: self.vote_average,
            vote_count: self.vote_count,
        }
    }
}

/// Genre entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Genre {
    /// Genre ID.
    pub id: u32,
    /// Genre name.
    pub name: String,
}

// --- Credits ---

/// Response from `movie/{movie_id}/credits`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Credits {
    /// Cast in billing order.
    #[serde(default, deserialize_with = "null_as_default")]
    pub cast: Vec<CastMember>,
}

/// A single cast member.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CastMember {
    /// Performer name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Character played.
    #[serde(default, deserialize_with = "null_as_default")]
    pub character: String,
    /// Profile photo path.
    #[serde(default)]
    pub profile_path: Option<String>,
}

// --- Configuration ---

/// Response from `configuration`. Used to validate an API key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiConfiguration {
    /// Image CDN settings.
    #[serde(default)]
    pub images: ImagesConfiguration,
}

/// Image CDN settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImagesConfiguration {
    /// Plain HTTP base URL.
    #[serde(default)]
    pub base_url: String,
    /// HTTPS base URL.
    #[serde(default)]
    pub secure_base_url: String,
    /// Available backdrop sizes.
    #[serde(default)]
    pub backdrop_sizes: Vec<String>,
    /// Available poster sizes.
    #[serde(default)]
    pub poster_sizes: Vec<String>,
    /// Available profile sizes.
    #[serde(default)]
    pub profile_sizes: Vec<String>,
}

// --- Error Response ---

/// TMDB API error response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbErrorResponse {
    /// TMDB error code.
    #[serde(default)]
    pub status_code: u32,
    /// Error message.
    #[serde(default)]
    pub status_message: Option<String>,
}

impl TmdbErrorResponse {
    /// Marker identifying an error payload in a response body.
    const MARKER: &'static str = "\"status_code\":";

    /// Detects an error payload in a response body.
    ///
    /// Any body containing a `"status_code":` field counts as an error,
    /// whatever the HTTP status. A marked body that fails to decode yields
    /// an empty error.
    #[must_use]
    pub fn sniff(body: &str) -> Option<Self> {
        if !body.contains(Self::MARKER) {
            return None;
        }
        Some(serde_json::from_str(body).unwrap_or_default())
    }
}

// --- Search Parameters ---

/// Parameters for the `search/movie` endpoint.
#[derive(Debug, Clone)]
pub struct SearchMovieParams {
    /// Search query (required).
    pub query: String,
    /// Result page (1-500, default: 1).
    pub page: u32,
    /// Include adult content.
    pub include_adult: bool,
}

impl SearchMovieParams {
    /// Creates new search params with the given query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            page: 1,
            include_adult: false,
        }
    }

    /// Sets the result page.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }
}
