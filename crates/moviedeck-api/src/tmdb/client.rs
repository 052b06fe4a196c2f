//! `TmdbClient` - TMDB API client implementation.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::instrument;
use url::Url;

use super::api::TmdbApi;
use super::credential::{CredentialProvider, StaticApiKey};
use super::error::{ApiError, Result};
use super::image::{DEFAULT_IMAGE_BASE_URL, ImageSize, image_url};
use super::types::{
    ApiConfiguration, Credits, MovieDetails, PagedMovies, SearchMovieParams, TimeWindow,
    TmdbErrorResponse,
};

/// Default base URL for TMDB API v3.
const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3/";

/// Default timeout for key validation and listing requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default response language.
const DEFAULT_LANGUAGE: &str = "en-US";

/// TMDB API client.
///
/// Authenticates with the `api_key` query parameter. The key is read from the
/// [`CredentialProvider`] on every request.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClient {
    /// HTTP client.
    http_client: Client,
    /// Base URL for API requests.
    base_url: Url,
    /// Base URL for image downloads.
    image_base_url: String,
    /// API key source.
    credentials: Arc<dyn CredentialProvider>,
    /// Response language for listing endpoints.
    language: String,
    /// Timeout for validation and listing requests.
    timeout: Duration,
}

/// Builder for `TmdbClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClientBuilder {
    base_url: Option<Url>,
    image_base_url: Option<String>,
    credentials: Option<Arc<dyn CredentialProvider>>,
    user_agent: Option<String>,
    language: Option<String>,
    timeout: Option<Duration>,
}

impl TmdbClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            image_base_url: None,
            credentials: None,
            user_agent: None,
            language: None,
            timeout: None,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Overrides the image CDN base URL.
    #[must_use]
    pub fn image_base_url(mut self, url: impl Into<String>) -> Self {
        self.image_base_url = Some(url.into());
        self
    }

    /// Sets the credential source (required unless `api_key` is used).
    #[must_use]
    pub fn credentials(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = Some(provider);
        self
    }

    /// Uses a fixed API key.
    #[must_use]
    pub fn api_key(self, key: impl Into<String>) -> Self {
        self.credentials(Arc::new(StaticApiKey::new(key)))
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the response language (default: "en-US").
    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Sets the validation/listing timeout (default: 10s).
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - credentials are not set.
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<TmdbClient> {
        let credentials = self
            .credentials
            .ok_or_else(|| ApiError::InvalidInput(String::from("credentials are required")))?;
        let user_agent = self
            .user_agent
            .ok_or_else(|| ApiError::InvalidInput(String::from("user_agent is required")))?;

        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            Url::parse(DEFAULT_BASE_URL)
                .map_err(|e| ApiError::InvalidInput(format!("invalid default base URL: {e}")))?
        };

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .build()?;

        Ok(TmdbClient {
            http_client,
            base_url,
            image_base_url: self
                .image_base_url
                .unwrap_or_else(|| String::from(DEFAULT_IMAGE_BASE_URL)),
            credentials,
            language: self
                .language
                .unwrap_or_else(|| String::from(DEFAULT_LANGUAGE)),
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
        })
    }
}

impl TmdbClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> TmdbClientBuilder {
        TmdbClientBuilder::new()
    }

    /// Base URL of the image CDN.
    #[must_use]
    pub fn image_base_url(&self) -> &str {
        &self.image_base_url
    }

    /// Returns the image URL for `path` at `size` on the configured CDN.
    #[must_use]
    pub fn image_url(&self, path: &str, size: ImageSize) -> Option<String> {
        image_url(&self.image_base_url, size, path)
    }

    /// Sends an authenticated GET with the stored credential.
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        timeout: Option<Duration>,
    ) -> Result<T> {
        let api_key = self
            .credentials
            .api_key()
            .filter(|key| !key.is_empty())
            .ok_or(ApiError::MissingCredential)?;
        self.get_json_with_key(path, query, &api_key, timeout).await
    }

    /// Sends a GET request with `api_key` and query params, then decodes JSON.
    ///
    /// Any body carrying a `status_code` field is an API error, whatever the
    /// HTTP status.
    #[instrument(skip_all, fields(path = %path))]
    async fn get_json_with_key<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        api_key: &str,
        timeout: Option<Duration>,
    ) -> Result<T> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| ApiError::InvalidInput(format!("failed to join URL path {path}: {e}")))?;

        let mut builder = self
            .http_client
            .get(url)
            .query(&[("api_key", api_key)])
            .query(query);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let request = builder.build()?;

        tracing::debug!(?timeout, "TMDB API request");

        let response = self.http_client.execute(request).await.inspect_err(|e| {
            tracing::warn!(error = %e, timeout = e.is_timeout(), "TMDB API request failed");
        })?;
        let status = response.status();
        let body = response.text().await?;

        if let Some(error) = TmdbErrorResponse::sniff(&body) {
            tracing::debug!(
                http_status = status.as_u16(),
                code = error.status_code,
                "TMDB API returned an error payload"
            );
            return Err(ApiError::Api {
                status_code: error.status_code,
                message: error.status_message,
            });
        }

        if !status.is_success() {
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                path: String::from(path),
            });
        }

        serde_json::from_str(&body).map_err(|source| ApiError::Parse {
            path: String::from(path),
            source,
        })
    }
}

impl TmdbApi for TmdbClient {
    #[instrument(skip_all)]
    async fn validate_key(&self, candidate: &str) -> Result<ApiConfiguration> {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return Err(ApiError::InvalidInput(String::from(
                "API Key cannot be empty.",
            )));
        }
        self.get_json_with_key("configuration", &[], candidate, Some(self.timeout))
            .await
    }

    #[instrument(skip_all)]
    async fn popular_movies(&self, page: u32) -> Result<PagedMovies> {
        let query = [
            ("language", self.language.clone()),
            ("page", page.max(1).to_string()),
        ];
        self.get_json("movie/popular", &query, Some(self.timeout))
            .await
    }

    #[instrument(skip_all)]
    async fn trending_movies(&self, window: TimeWindow) -> Result<PagedMovies> {
        let path = format!("trending/movie/{}", window.as_str());
        let query = [("language", self.language.clone())];
        self.get_json(&path, &query, Some(self.timeout)).await
    }

    #[instrument(skip_all, fields(page = params.page))]
    async fn search_movie(&self, params: &SearchMovieParams) -> Result<PagedMovies> {
        if params.query.is_empty() {
            return Err(ApiError::InvalidInput(String::from(
                "search query cannot be empty",
            )));
        }
        let query = [
            ("query", params.query.clone()),
            ("page", params.page.max(1).to_string()),
            ("include_adult", params.include_adult.to_string()),
            ("language", self.language.clone()),
        ];
        self.get_json("search/movie", &query, None).await
    }

    #[instrument(skip_all, fields(movie_id = movie_id))]
    async fn movie_details(&self, movie_id: u64) -> Result<MovieDetails> {
        let path = format!("movie/{movie_id}");
        let query = [("language", self.language.clone())];
        self.get_json(&path, &query, Some(self.timeout)).await
    }

    #[instrument(skip_all, fields(movie_id = movie_id))]
    async fn movie_credits(&self, movie_id: u64) -> Result<Credits> {
        let path = format!("movie/{movie_id}/credits");
        let query = [("language", self.language.clone())];
        self.get_json(&path, &query, Some(self.timeout)).await
    }

    #[instrument(skip_all)]
    async fn fetch_image(&self, path: &str, size: ImageSize) -> Result<Vec<u8>> {
        let url = self
            .image_url(path, size)
            .ok_or_else(|| ApiError::InvalidInput(String::from("image path is empty")))?;

        tracing::debug!(size = size.as_str(), "TMDB image request");

        let response = self
            .http_client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(http_status = status.as_u16(), "Failed to load image");
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                path: String::from(path),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;

    /// Builds a client pointed at the mock server.
    fn mock_client(server: &wiremock::MockServer, key: &str) -> TmdbClient {
        let base_url = format!("{}/3/", server.uri());
        TmdbClient::builder()
            .base_url(base_url.parse().unwrap())
            .image_base_url(format!("{}/t/p/", server.uri()))
            .api_key(key)
            .user_agent("test/0.0.0")
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_credentials() {
        // Arrange & Act
        let result = TmdbClient::builder().user_agent("test/0.0.0").build();

        // Assert
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("credentials are required")
        );
    }

    #[test]
    fn test_builder_requires_user_agent() {
        // Arrange & Act
        let result = TmdbClient::builder().api_key("test-key").build();

        // Assert
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("user_agent is required")
        );
    }

    #[test]
    fn test_builder_defaults() {
        // Arrange & Act
        let client = TmdbClient::builder()
            .api_key("test-key")
            .user_agent("test/0.0.0")
            .build()
            .unwrap();

        // Assert
        assert_eq!(client.base_url.as_str(), DEFAULT_BASE_URL);
        assert_eq!(client.language, "en-US");
        assert_eq!(client.timeout, Duration::from_secs(10));
        assert_eq!(
            client.image_url("/p.jpg", ImageSize::W185).as_deref(),
            Some("https://image.tmdb.org/t/p/w185/p.jpg")
        );
    }

    #[tokio::test]
    async fn test_validate_key_sends_candidate() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/configuration.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/3/configuration"))
            .and(wiremock::matchers::query_param("api_key", "candidate-key"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = mock_client(&mock_server, "stored-key");

        // Act
        let config = client.validate_key("  candidate-key  ").await.unwrap();

        // Assert
        assert_eq!(config.images.secure_base_url, "https://image.tmdb.org/t/p/");
    }

    #[tokio::test]
    async fn test_validate_key_error_body_on_success_status() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let error_body = r#"{"status_code":7,"status_message":"Invalid API key: You must be granted a valid key.","success":false}"#;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(error_body))
            .mount(&mock_server)
            .await;

        let client = mock_client(&mock_server, "stored-key");

        // Act
        let err = client.validate_key("bad-key").await.unwrap_err();

        // Assert
        assert!(matches!(err, ApiError::Api { status_code: 7, .. }));
        assert!(err.is_credential_error());
    }

    #[tokio::test]
    async fn test_http_401_with_error_body_is_api_error() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let error_body = r#"{"status_code":7,"status_message":"Invalid API key: You must be granted a valid key.","success":false}"#;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(401).set_body_string(error_body))
            .mount(&mock_server)
            .await;

        let client = mock_client(&mock_server, "invalid-key");

        // Act
        let err = client.popular_movies(1).await.unwrap_err();

        // Assert
        assert_eq!(
            err.api_message(),
            Some("Invalid API key: You must be granted a valid key.")
        );
        assert!(err.to_string().contains("TMDB API error"));
    }

    #[tokio::test]
    async fn test_http_500_without_error_body_is_transport() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&mock_server)
            .await;

        let client = mock_client(&mock_server, "test-key");

        // Act
        let err = client.movie_details(27_205).await.unwrap_err();

        // Assert
        assert!(matches!(err, ApiError::HttpStatus { status: 503, .. }));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_malformed_json_is_parse_error() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("{\"page\": "))
            .mount(&mock_server)
            .await;

        let client = mock_client(&mock_server, "test-key");

        // Act
        let err = client.popular_movies(1).await.unwrap_err();

        // Assert
        assert!(matches!(err, ApiError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_validate_key_times_out() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/configuration.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string(json_body)
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let client = TmdbClient::builder()
            .base_url(format!("{}/3/", mock_server.uri()).parse().unwrap())
            .api_key("test-key")
            .user_agent("test/0.0.0")
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();

        // Act
        let err = client.validate_key("test-key").await.unwrap_err();

        // Assert
        assert!(matches!(err, ApiError::Transport(ref e) if e.is_timeout()));
    }

    #[tokio::test]
    async fn test_popular_movies_via_http() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/movie_popular.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/3/movie/popular"))
            .and(wiremock::matchers::query_param("api_key", "test-key"))
            .and(wiremock::matchers::query_param("page", "1"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .mount(&mock_server)
            .await;

        let client = mock_client(&mock_server, "test-key");

        // Act
        let response = client.popular_movies(1).await.unwrap();

        // Assert
        assert_eq!(response.results.len(), 3);
        assert_eq!(response.results[0].title, "Inception");
        assert!(response.results[1].poster_path.is_empty());
    }

    #[tokio::test]
    async fn test_trending_movies_via_http() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/trending_movie_day.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/3/trending/movie/day"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .mount(&mock_server)
            .await;

        let client = mock_client(&mock_server, "test-key");

        // Act
        let response = client.trending_movies(TimeWindow::Day).await.unwrap();

        // Assert
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].id, 533_535);
    }

    #[tokio::test]
    async fn test_trending_week_window_path() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/trending_movie_day.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/3/trending/movie/week"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = mock_client(&mock_server, "test-key");

        // Act
        let response = client.trending_movies(TimeWindow::Week).await.unwrap();

        // Assert
        assert_eq!(response.results.len(), 2);
    }

    #[tokio::test]
    async fn test_search_movie_via_http() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/tmdb/search_movie_star_p2.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/3/search/movie"))
            .and(wiremock::matchers::query_param("query", "star wars"))
            .and(wiremock::matchers::query_param("page", "2"))
            .and(wiremock::matchers::query_param("include_adult", "false"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = mock_client(&mock_server, "test-key");
        let params = SearchMovieParams::new("star wars").page(2);

        // Act
        let response = client.search_movie(&params).await.unwrap();

        // Assert
        assert_eq!(response.page, 2);
        assert_eq!(response.total_pages, 3);
        assert_eq!(response.results[0].title, "The Empire Strikes Back");
    }

    #[tokio::test]
    async fn test_search_movie_empty_query_sends_nothing() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = mock_client(&mock_server, "test-key");

        // Act
        let err = client
            .search_movie(&SearchMovieParams::new(""))
            .await
            .unwrap_err();

        // Assert
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_movie_details_and_credits_via_http() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/3/movie/27205"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(include_str!(
                "../../../../fixtures/tmdb/movie_details_27205.json"
            )))
            .mount(&mock_server)
            .await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/3/movie/27205/credits"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(include_str!(
                "../../../../fixtures/tmdb/movie_credits_27205.json"
            )))
            .mount(&mock_server)
            .await;

        let client = mock_client(&mock_server, "test-key");

        // Act
        let details = client.movie_details(27_205).await.unwrap();
        let credits = client.movie_credits(27_205).await.unwrap();

        // Assert
        assert_eq!(details.title, "Inception");
        assert_eq!(credits.cast[0].character, "Dom Cobb");
    }

    #[tokio::test]
    async fn test_missing_credential_sends_nothing() {
        // Arrange
        #[derive(Debug)]
        struct NoKey;
        impl CredentialProvider for NoKey {
            fn api_key(&self) -> Option<String> {
                None
            }
        }

        let mock_server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = TmdbClient::builder()
            .base_url(format!("{}/3/", mock_server.uri()).parse().unwrap())
            .credentials(Arc::new(NoKey))
            .user_agent("test/0.0.0")
            .build()
            .unwrap();

        // Act
        let err = client.popular_movies(1).await.unwrap_err();

        // Assert
        assert!(matches!(err, ApiError::MissingCredential));
    }

    #[tokio::test]
    async fn test_fetch_image_via_http() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/t/p/w780/backdrop.jpg"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF]))
            .mount(&mock_server)
            .await;

        let client = mock_client(&mock_server, "test-key");

        // Act
        let bytes = client
            .fetch_image("/backdrop.jpg", ImageSize::W780)
            .await
            .unwrap();

        // Assert
        assert_eq!(bytes, vec![0xFF, 0xD8, 0xFF]);
    }

    #[tokio::test]
    async fn test_fetch_image_empty_path() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let client = mock_client(&mock_server, "test-key");

        // Act
        let err = client.fetch_image("", ImageSize::W185).await.unwrap_err();

        // Assert
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }
}
