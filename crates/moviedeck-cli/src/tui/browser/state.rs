//! Browser TUI state.

use moviedeck_api::tmdb::MovieSummary;
use moviedeck_core::details::DetailsView;
use moviedeck_core::search::SearchSession;
use ratatui::widgets::ListState;

/// Home screen content.
#[derive(Debug, Clone, Default)]
pub enum HomeView {
    /// Not requested yet.
    #[default]
    Idle,
    /// Waiting for popular and trending.
    Loading,
    /// Both lists loaded.
    Ready {
        /// Popular movies.
        popular: Vec<MovieSummary>,
        /// Trending movies.
        trending: Vec<MovieSummary>,
    },
    /// Loading failed; `r` retries.
    Failed(String),
}

impl HomeView {
    /// Trending list, empty until loaded.
    #[must_use]
    pub fn trending(&self) -> &[MovieSummary] {
        match self {
            Self::Ready { trending, .. } => trending,
            Self::Idle | Self::Loading | Self::Failed(_) => &[],
        }
    }

    /// Popular list, empty until loaded.
    #[must_use]
    pub fn popular(&self) -> &[MovieSummary] {
        match self {
            Self::Ready { popular, .. } => popular,
            Self::Idle | Self::Loading | Self::Failed(_) => &[],
        }
    }
}

/// List shown on the home screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HomePane {
    /// Trending today.
    #[default]
    Trending,
    /// Popular.
    Popular,
    /// Opened this session.
    Recent,
}

impl HomePane {
    /// Pane shown after pressing Tab.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Trending => Self::Popular,
            Self::Popular => Self::Recent,
            Self::Recent => Self::Trending,
        }
    }

    /// Block title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Trending => " Trending Today ",
            Self::Popular => " Popular ",
            Self::Recent => " Recently Viewed ",
        }
    }
}

/// Screen data owned by the browser.
#[derive(Debug, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct BrowserState {
    /// Text typed into the key entry box.
    pub key_input: String,
    /// Home screen content.
    pub home: HomeView,
    /// Home list in focus.
    pub home_pane: HomePane,
    /// Search box text.
    pub query: String,
    /// Details of the open movie, once loaded.
    pub details: Option<DetailsView>,
    /// One-line message for the footer.
    pub notice: Option<String>,
}

/// Rows on the home screen for the focused pane.
pub fn home_rows<'a>(
    state: &'a BrowserState,
    recently_viewed: &'a [MovieSummary],
) -> Vec<&'a MovieSummary> {
    match state.home_pane {
        HomePane::Trending => state.home.trending().iter().collect(),
        HomePane::Popular => state.home.popular().iter().collect(),
        HomePane::Recent => recently_viewed.iter().collect(),
    }
}

/// Rows on the search screen.
///
/// Without a query this is the default view: recently viewed, then trending.
pub fn search_rows<'a>(
    search: Option<&'a SearchSession>,
    recently_viewed: &'a [MovieSummary],
    home: &'a HomeView,
) -> Vec<&'a MovieSummary> {
    search.map_or_else(
        || recently_viewed.iter().chain(home.trending()).collect(),
        |session| session.results.iter().collect(),
    )
}

/// Normalized scroll position of a list: 1.0 at the top, 0.0 at the end.
#[must_use]
pub fn scroll_position(selected: Option<usize>, len: usize) -> f64 {
    let last = len.saturating_sub(1);
    let selected = selected.unwrap_or(0).min(last);
    let (Ok(last), Ok(selected)) = (u32::try_from(last), u32::try_from(selected)) else {
        return 1.0;
    };
    if last == 0 {
        return 0.0;
    }
    f64::from(last.saturating_sub(selected)) / f64::from(last)
}

/// Selection within the visible list.
#[derive(Debug, Default)]
pub struct Cursor {
    list_state: ListState,
}

impl Cursor {
    /// Selected row.
    #[must_use]
    pub const fn selected(&self) -> Option<usize> {
        self.list_state.selected()
    }

    /// Mutable list state for rendering.
    pub const fn list_state_mut(&mut self) -> &mut ListState {
        &mut self.list_state
    }

    /// Selects the first row, or nothing for an empty list.
    pub fn reset(&mut self, len: usize) {
        self.list_state.select(if len == 0 { None } else { Some(0) });
    }

    /// Moves the selection up one row.
    pub fn move_up(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let current = self.list_state.selected().unwrap_or(0);
        self.list_state.select(Some(current.saturating_sub(1)));
    }

    /// Moves the selection down one row.
    pub fn move_down(&mut self, len: usize) {
        if len == 0 {
            return;
        }
        let next = self
            .list_state
            .selected()
            .map_or(0, |current| current.saturating_add(1));
        self.list_state.select(Some(next.min(len.saturating_sub(1))));
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]

    use super::*;

    fn movie(id: u64) -> MovieSummary {
        MovieSummary {
            id,
            ..MovieSummary::default()
        }
    }

    #[test]
    fn test_scroll_position_bounds() {
        assert_eq!(scroll_position(Some(0), 21), 1.0);
        assert_eq!(scroll_position(Some(20), 21), 0.0);
        assert_eq!(scroll_position(Some(10), 21), 0.5);
        assert_eq!(scroll_position(Some(99), 21), 0.0);
    }

    #[test]
    fn test_scroll_position_short_lists() {
        assert_eq!(scroll_position(None, 0), 0.0);
        assert_eq!(scroll_position(Some(0), 1), 0.0);
        assert_eq!(scroll_position(None, 5), 1.0);
    }

    #[test]
    fn test_cursor_movement_clamped() {
        // Arrange
        let mut cursor = Cursor::default();
        cursor.reset(3);

        // Act
        cursor.move_up(3);
        let top = cursor.selected();
        cursor.move_down(3);
        cursor.move_down(3);
        cursor.move_down(3);

        // Assert
        assert_eq!(top, Some(0));
        assert_eq!(cursor.selected(), Some(2));
    }

    #[test]
    fn test_cursor_reset_empty() {
        // Arrange
        let mut cursor = Cursor::default();

        // Act
        cursor.reset(0);
        cursor.move_down(0);

        // Assert
        assert_eq!(cursor.selected(), None);
    }

    #[test]
    fn test_home_pane_cycle() {
        assert_eq!(HomePane::Trending.next(), HomePane::Popular);
        assert_eq!(HomePane::Recent.next(), HomePane::Trending);
    }

    #[test]
    fn test_search_rows_default_view() {
        // Arrange
        let recent = vec![movie(1)];
        let home = HomeView::Ready {
            popular: vec![movie(9)],
            trending: vec![movie(2), movie(3)],
        };

        // Act
        let rows = search_rows(None, &recent, &home);

        // Assert
        let ids: Vec<u64> = rows.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_home_rows_follow_pane() {
        // Arrange
        let recent = vec![movie(1)];
        let state = BrowserState {
            home: HomeView::Ready {
                popular: vec![movie(9), movie(8)],
                trending: vec![movie(2)],
            },
            home_pane: HomePane::Popular,
            ..BrowserState::default()
        };

        // Act
        let rows = home_rows(&state, &recent);

        // Assert
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.first().map(|m| m.id), Some(9));
    }
}
