//! Details screen loader.

use moviedeck_api::tmdb::{
    ApiError, Credits, ImageSize, MovieDetails, MovieSummary, TmdbApi, image_url,
};

use crate::format::format_metadata;

/// Number of cast members shown.
pub const CAST_LIMIT: usize = 5;

/// A cast member ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastCard {
    /// Performer name.
    pub name: String,
    /// Character played.
    pub character: String,
    /// Profile photo URL (w185), if the API has one.
    pub profile_url: Option<String>,
}

/// Everything the details screen shows.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailsView {
    /// The selected movie.
    pub movie: MovieSummary,
    /// `"{year} | {rating} ({votes}) | {genres}"`.
    pub metadata: String,
    /// Tagline, when details loaded and one exists.
    pub tagline: Option<String>,
    /// Runtime in minutes, when known.
    pub runtime: Option<u32>,
    /// Top billed cast.
    pub cast: Vec<CastCard>,
    /// Backdrop URL (w780), falling back to the poster.
    pub artwork_url: Option<String>,
}

/// Artwork path for the details header: backdrop, else poster.
fn artwork_path(movie: &MovieSummary) -> &str {
    if movie.backdrop_path.is_empty() {
        &movie.poster_path
    } else {
        &movie.backdrop_path
    }
}

impl DetailsView {
    /// Builds the view from whatever parts loaded.
    ///
    /// Missing details drop genres, runtime and tagline; missing credits leave
    /// the cast empty.
    #[must_use]
    pub fn assemble(
        movie: MovieSummary,
        details: Option<&MovieDetails>,
        credits: Option<Credits>,
        image_base: &str,
    ) -> Self {
        let cast = credits
            .map(|credits| {
                credits
                    .cast
                    .into_iter()
                    .take(CAST_LIMIT)
                    .map(|member| CastCard {
                        profile_url: member
                            .profile_path
                            .as_deref()
                            .and_then(|path| image_url(image_base, ImageSize::W185, path)),
                        name: member.name,
                        character: member.character,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let genres = details.map_or(&[][..], |d| d.genres.as_slice());
        Self {
            metadata: format_metadata(&movie, genres),
            tagline: details
                .and_then(|d| d.tagline.clone())
                .filter(|t| !t.is_empty()),
            runtime: details.and_then(|d| d.runtime),
            cast,
            artwork_url: image_url(image_base, ImageSize::W780, artwork_path(&movie)),
            movie,
        }
    }
}

/// Loads genres and cast for `movie` concurrently.
///
/// A failed request leaves its part empty, except credential errors which are
/// returned so the caller can ask for a key.
///
/// # Errors
///
/// Returns the [`ApiError`] of either request when it is a credential error.
pub async fn load_details<A: TmdbApi>(
    api: &A,
    movie: MovieSummary,
    image_base: &str,
) -> Result<DetailsView, ApiError> {
    let (details, credits) = tokio::join!(api.movie_details(movie.id), api.movie_credits(movie.id));

    let details = match details {
        Ok(details) => Some(details),
        Err(e) if e.is_credential_error() => return Err(e),
        Err(e) => {
            tracing::warn!(movie_id = movie.id, error = %e, "Failed to load movie details");
            None
        }
    };
    let credits = match credits {
        Ok(credits) => Some(credits),
        Err(e) if e.is_credential_error() => return Err(e),
        Err(e) => {
            tracing::warn!(movie_id = movie.id, error = %e, "Failed to load movie credits");
            None
        }
    };

    Ok(DetailsView::assemble(movie, details.as_ref(), credits, image_base))
}
