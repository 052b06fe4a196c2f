//! Home screen: popular and trending lists.

use moviedeck_api::tmdb::{ApiError, MovieSummary, TimeWindow, TmdbApi};

/// Result of loading the home screen.
#[derive(Debug, Clone, PartialEq)]
pub enum HomeOutcome {
    /// Both lists loaded.
    Ready {
        /// `movie/popular`, page 1.
        popular: Vec<MovieSummary>,
        /// `trending/movie/day`.
        trending: Vec<MovieSummary>,
    },
    /// The key is missing or was rejected; show key entry.
    NeedsApiKey,
    /// Loading failed; the user may retry.
    Failed {
        /// Message for the error panel.
        message: String,
    },
}

impl HomeOutcome {
    fn from_error(err: &ApiError) -> Self {
        if err.is_credential_error() {
            tracing::warn!(error = %err, "Home screen needs an API key");
            return Self::NeedsApiKey;
        }
        tracing::warn!(error = %err, "Failed to load home screen");
        Self::Failed {
            message: err.user_message(),
        }
    }
}

/// Fetches popular and trending movies concurrently and waits for both.
///
/// When both fail, the popular error decides the outcome.
pub async fn load_home<A: TmdbApi>(api: &A) -> HomeOutcome {
    let (popular, trending) = tokio::join!(
        api.popular_movies(1),
        api.trending_movies(TimeWindow::Day)
    );
    match (popular, trending) {
        (Ok(popular), Ok(trending)) => {
            tracing::debug!(
                popular = popular.results.len(),
                trending = trending.results.len(),
                "Home screen loaded"
            );
            HomeOutcome::Ready {
                popular: popular.results,
                trending: trending.results,
            }
        }
        (Err(err), _) | (Ok(_), Err(err)) => HomeOutcome::from_error(&err),
    }
}
