//! TUI rendering logic for the browser.

use moviedeck_api::tmdb::MovieSummary;
use moviedeck_core::format::rating_label;
use moviedeck_core::search::SearchSession;
use moviedeck_core::session::Screen;
use moviedeck_core::validation::ValidationState;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

use super::state::{BrowserState, HomeView};

/// Everything a frame needs except the list selection.
#[derive(Debug)]
pub struct View<'a> {
    /// Visible screen.
    pub screen: Screen,
    /// Browser data.
    pub state: &'a BrowserState,
    /// Key submission progress.
    pub validation: &'a ValidationState,
    /// Active search, if a query is set.
    pub search: Option<&'a SearchSession>,
    /// Rows of the visible list.
    pub rows: Vec<&'a MovieSummary>,
}

/// Draws the browser UI.
#[allow(clippy::indexing_slicing)]
pub fn draw(frame: &mut Frame, view: &View<'_>, list_state: &mut ListState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Min(5),    // main content
            Constraint::Length(3), // footer
        ])
        .split(frame.area());

    draw_header(frame, chunks[0], view);
    match view.screen {
        Screen::KeyEntry => draw_key_entry(frame, chunks[1], view),
        Screen::Home => draw_home(frame, chunks[1], view, list_state),
        Screen::Search => draw_movie_list(frame, chunks[1], view, &search_title(view), list_state),
        Screen::Details { .. } => draw_details(frame, chunks[1], view),
    }
    draw_footer(frame, chunks[2], view);
}

/// One list row: title, year and rating.
fn movie_line(movie: &MovieSummary) -> Line<'static> {
    let year = movie.release_year().unwrap_or("----");
    Line::from(vec![
        Span::raw(movie.title.clone()),
        Span::styled(format!("  ({year})"), Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("  {}", rating_label(movie.vote_average)),
            Style::default().fg(Color::Yellow),
        ),
    ])
}

/// Draws the header: search box on the search screen, app name elsewhere.
fn draw_header(frame: &mut Frame, area: Rect, view: &View<'_>) {
    let widget = if view.screen == Screen::Search {
        Paragraph::new(view.state.query.as_str())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title(" Search "))
    } else {
        Paragraph::new("Browse movies from The Movie Database")
            .block(Block::default().borders(Borders::ALL).title(" moviedeck "))
    };
    frame.render_widget(widget, area);
}

/// Draws the API key prompt with the validation message.
fn draw_key_entry(frame: &mut Frame, area: Rect, view: &View<'_>) {
    let masked: String = "*".repeat(view.state.key_input.chars().count());
    let status = match view.validation {
        ValidationState::Validating => {
            Line::styled("Validating...", Style::default().fg(Color::Yellow))
        }
        ValidationState::Invalid(message) | ValidationState::NetworkError(message) => {
            Line::styled(message.clone(), Style::default().fg(Color::Red))
        }
        ValidationState::Idle | ValidationState::Valid => Line::from(""),
    };
    let lines = vec![
        Line::from("Enter your TMDB API key:"),
        Line::from(""),
        Line::styled(masked, Style::default().add_modifier(Modifier::BOLD)),
        Line::from(""),
        status,
    ];
    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" API Key "),
    );
    frame.render_widget(widget, area);
}

/// Draws the home screen list, or its loading/error state.
fn draw_home(frame: &mut Frame, area: Rect, view: &View<'_>, list_state: &mut ListState) {
    let message = match &view.state.home {
        HomeView::Idle | HomeView::Loading => Some(Line::from("Loading...")),
        HomeView::Failed(message) => Some(Line::styled(
            format!("{message}  (r: retry)"),
            Style::default().fg(Color::Red),
        )),
        HomeView::Ready { .. } => None,
    };
    if let Some(line) = message {
        let widget = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(widget, area);
        return;
    }
    draw_movie_list(frame, area, view, view.state.home_pane.title(), list_state);
}

/// Block title for the search screen.
fn search_title(view: &View<'_>) -> String {
    view.search.map_or_else(
        || String::from(" Recently Viewed + Trending "),
        |session| {
            let fetching = if session.is_fetching() { " ..." } else { "" };
            format!(" {}{fetching} ", session.label())
        },
    )
}

/// Draws a selectable movie list.
fn draw_movie_list(
    frame: &mut Frame,
    area: Rect,
    view: &View<'_>,
    title: &str,
    list_state: &mut ListState,
) {
    let items: Vec<ListItem> = view
        .rows
        .iter()
        .map(|movie| ListItem::new(movie_line(movie)))
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(String::from(title)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(list, area, list_state);
}

/// Draws the details of the open movie.
#[allow(clippy::indexing_slicing)]
fn draw_details(frame: &mut Frame, area: Rect, view: &View<'_>) {
    let Some(details) = &view.state.details else {
        let widget = Paragraph::new("Loading...").block(Block::default().borders(Borders::ALL));
        frame.render_widget(widget, area);
        return;
    };

    let pane_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let mut lines = vec![
        Line::styled(
            details.movie.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Line::styled(details.metadata.clone(), Style::default().fg(Color::Yellow)),
    ];
    if let Some(tagline) = &details.tagline {
        lines.push(Line::styled(
            tagline.clone(),
            Style::default().add_modifier(Modifier::ITALIC),
        ));
    }
    if let Some(runtime) = details.runtime {
        lines.push(Line::from(format!("{runtime} min")));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(details.movie.overview.clone()));
    if let Some(url) = &details.artwork_url {
        lines.push(Line::from(""));
        lines.push(Line::styled(url.clone(), Style::default().fg(Color::DarkGray)));
    }
    let overview = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(" Details "));
    frame.render_widget(overview, pane_chunks[0]);

    let cast: Vec<ListItem> = details
        .cast
        .iter()
        .map(|member| {
            ListItem::new(Line::from(vec![
                Span::raw(member.name.clone()),
                Span::styled(
                    format!("  as {}", member.character),
                    Style::default().fg(Color::DarkGray),
                ),
            ]))
        })
        .collect();
    let cast = List::new(cast).block(Block::default().borders(Borders::ALL).title(" Cast "));
    frame.render_widget(cast, pane_chunks[1]);
}

/// Draws the footer with key bindings for the visible screen.
fn draw_footer(frame: &mut Frame, area: Rect, view: &View<'_>) {
    let help = match view.screen {
        Screen::KeyEntry => "Enter: Validate  Esc: Quit",
        Screen::Home => "j/k: Move  Tab: List  Enter: Open  /: Search  r: Retry  K: Forget key  q: Quit",
        Screen::Search => "Type to search  Up/Down: Move  Enter: Open  Esc: Back",
        Screen::Details { .. } => "o: Open in browser  /: Search  Esc: Back  q: Quit",
    };
    let mut spans = vec![Span::styled(help, Style::default().fg(Color::DarkGray))];
    if let Some(notice) = &view.state.notice {
        spans.push(Span::styled(
            format!("  {notice}"),
            Style::default().fg(Color::Red),
        ));
    }
    let footer = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}
