//! Artwork URL construction.

/// Default base URL of the TMDB image CDN.
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/";

/// Image size variants served by the CDN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    /// 185px wide (posters, profile photos).
    W185,
    /// 342px wide.
    W342,
    /// 500px wide.
    W500,
    /// 780px wide (backdrops).
    W780,
    /// Original upload.
    Original,
}

impl ImageSize {
    /// Returns the size segment used in image URLs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::W185 => "w185",
            Self::W342 => "w342",
            Self::W500 => "w500",
            Self::W780 => "w780",
            Self::Original => "original",
        }
    }
}

/// Builds `{base}{size}{path}`. Returns `None` for an empty path.
///
/// `base` may omit its trailing slash; `path` is expected to start with `/`
/// as returned by the API.
#[must_use]
pub fn image_url(base: &str, size: ImageSize, path: &str) -> Option<String> {
    if path.is_empty() {
        return None;
    }
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    Some(format!("{base}/{}/{path}", size.as_str()))
}
