//! Display strings for movie lists and details.

use moviedeck_api::tmdb::{Genre, MovieSummary};

/// Label shown when a movie has no votes.
pub const NO_RATING: &str = "no rating";

/// Maximum genres listed in a metadata line.
const MAX_GENRES: usize = 3;

/// Formats a vote average with one decimal, or `"no rating"` for zero.
///
/// Ties round away from zero, so `7.25` reads `"7.3"`.
#[must_use]
pub fn rating_label(vote_average: f64) -> String {
    if vote_average > 0.0 {
        let rounded = (vote_average * 10.0).round() / 10.0;
        format!("{rounded:.1}")
    } else {
        String::from(NO_RATING)
    }
}

/// Builds `"{year} | {rating} ({votes}) | {genres}"`.
///
/// The year segment is dropped when the release date is unknown, the vote
/// count when it is zero, and the genre segment when `genres` is empty.
#[must_use]
pub fn format_metadata(movie: &MovieSummary, genres: &[Genre]) -> String {
    let mut line = String::new();
    if let Some(year) = movie.release_year() {
        line.push_str(year);
        line.push_str(" | ");
    }
    line.push_str(&rating_label(movie.vote_average));
    if movie.vote_count > 0 {
        line.push_str(&format!(" ({})", movie.vote_count));
    }
    if !genres.is_empty() {
        let names: Vec<&str> = genres
            .iter()
            .take(MAX_GENRES)
            .map(|g| g.name.as_str())
            .collect();
        line.push_str(" | ");
        line.push_str(&names.join(", "));
    }
    line
}

/// Header shown above search results.
#[must_use]
pub fn results_label(query: &str, total_results: u32) -> String {
    format!("Search results for: {query} ({total_results})")
}
