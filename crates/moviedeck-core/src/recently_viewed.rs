//! Movies opened during this session.

use moviedeck_api::tmdb::MovieSummary;

/// Insertion-ordered set of movies keyed by id. Not persisted.
#[derive(Debug, Clone, Default)]
pub struct RecentlyViewed {
    movies: Vec<MovieSummary>,
}

impl RecentlyViewed {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self { movies: Vec::new() }
    }

    /// Appends `movie` unless an entry with the same id exists.
    ///
    /// Returns `true` if the movie was inserted.
    pub fn add(&mut self, movie: MovieSummary) -> bool {
        if self.contains(movie.id) {
            return false;
        }
        self.movies.push(movie);
        true
    }

    /// Returns `true` if a movie with `id` was viewed.
    #[must_use]
    pub fn contains(&self, id: u64) -> bool {
        self.movies.iter().any(|m| m.id == id)
    }

    /// Viewed movies, oldest first.
    #[must_use]
    pub fn movies(&self) -> &[MovieSummary] {
        &self.movies
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.movies.len()
    }

    /// Returns `true` if nothing was viewed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }
}
