//! Browser TUI state management.

use std::sync::Arc;
use std::time::Duration;

use cinesearch_api::query::{FetchError, QueryState};
use cinesearch_api::tmdb::{Movie, SearchResult};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};
use tokio::time::Instant;

use super::cards::{self, Card};
use super::labels::Labels;
use crate::config::ImagesConfig;

/// What the results area shows. Exactly one of these at a time.
#[derive(Debug, Clone)]
pub enum ResultsView {
    /// A fetch for the current search string is in flight.
    Loading,
    /// The last fetch for the current search string failed.
    Error(FetchError),
    /// Results for the current search string (empty when none yet).
    Results(Arc<SearchResult>),
}

impl ResultsView {
    /// Cards to draw. Empty unless results are shown.
    #[must_use]
    pub fn cards(&self, images: &ImagesConfig, labels: &Labels) -> Vec<Card> {
        match self {
            Self::Results(result) => cards::render_cards(result, images, labels),
            Self::Loading | Self::Error(_) => Vec::new(),
        }
    }
}

/// Root controller: the search string and the selected movie, nothing else.
#[derive(Debug, Default)]
pub struct SearchController {
    /// Current search string (also the cache key).
    search: String,
    /// Movie shown in the overlay.
    selected: Option<Arc<Movie>>,
}

impl SearchController {
    /// Returns the search string.
    #[must_use]
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Returns the selected movie.
    #[must_use]
    pub const fn selected(&self) -> Option<&Arc<Movie>> {
        self.selected.as_ref()
    }

    /// Whether the detail overlay is open.
    #[must_use]
    pub const fn is_overlay_open(&self) -> bool {
        self.selected.is_some()
    }

    /// Replaces the search string. Returns `false` if it did not change.
    ///
    /// A changed search string clears the selection.
    pub fn set_search(&mut self, search: String) -> bool {
        if self.search == search {
            return false;
        }
        self.search = search;
        self.selected = None;
        true
    }

    /// Appends a character to the search string.
    pub fn push_char(&mut self, c: char) {
        self.search.push(c);
        self.selected = None;
    }

    /// Removes the last character. Returns `false` if the string was empty.
    pub fn pop_char(&mut self) -> bool {
        let popped = self.search.pop().is_some();
        if popped {
            self.selected = None;
        }
        popped
    }

    /// Opens the overlay for `movie`.
    pub fn select(&mut self, movie: Arc<Movie>) {
        tracing::debug!(id = movie.id, title = %movie.title, "movie selected");
        self.selected = Some(movie);
    }

    /// Closes the overlay.
    pub fn dismiss(&mut self) {
        self.selected = None;
    }

    /// Maps the query state of the current search string to the results view.
    #[must_use]
    pub fn view(&self, state: &QueryState) -> ResultsView {
        if state.is_loading {
            return ResultsView::Loading;
        }
        if let Some(ref err) = state.error {
            return ResultsView::Error(err.clone());
        }
        ResultsView::Results(
            state
                .data
                .clone()
                .unwrap_or_else(|| Arc::new(SearchResult::empty())),
        )
    }
}

/// Cursor, scroll and hit areas of the card grid.
#[derive(Debug)]
pub struct GridState {
    /// Index of the focused card.
    cursor: usize,
    /// Cards per row in the last drawn layout.
    columns: usize,
    /// First visible row.
    scroll_row: usize,
    /// Screen areas of the drawn cards and their indices.
    hit_areas: Vec<(Rect, usize)>,
}

impl Default for GridState {
    fn default() -> Self {
        Self {
            cursor: 0,
            columns: 1,
            scroll_row: 0,
            hit_areas: Vec::new(),
        }
    }
}

impl GridState {
    /// Returns the focused card index.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns the first visible row.
    #[must_use]
    pub const fn scroll_row(&self) -> usize {
        self.scroll_row
    }

    /// Focuses card `index`.
    pub const fn set_cursor(&mut self, index: usize) {
        self.cursor = index;
    }

    /// Moves back to the first card.
    pub const fn reset(&mut self) {
        self.cursor = 0;
        self.scroll_row = 0;
    }

    /// Keeps the cursor inside `len` cards.
    pub fn clamp(&mut self, len: usize) {
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }

    /// Moves the cursor one card left.
    pub const fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Moves the cursor one card right.
    pub fn move_right(&mut self, len: usize) {
        if self.cursor.saturating_add(1) < len {
            self.cursor = self.cursor.saturating_add(1);
        }
    }

    /// Moves the cursor one row up.
    pub const fn move_up(&mut self) {
        if self.cursor >= self.columns {
            self.cursor = self.cursor.saturating_sub(self.columns);
        }
    }

    /// Moves the cursor one row down.
    pub fn move_down(&mut self, len: usize) {
        let next = self.cursor.saturating_add(self.columns);
        if next < len {
            self.cursor = next;
        }
    }

    /// Records the grid geometry and scrolls so the cursor row is visible.
    #[allow(clippy::arithmetic_side_effects)]
    pub fn set_layout(&mut self, columns: usize, visible_rows: usize) {
        self.columns = columns.max(1);
        let row = self.cursor / self.columns;
        if row < self.scroll_row {
            self.scroll_row = row;
        } else if visible_rows > 0 && row >= self.scroll_row.saturating_add(visible_rows) {
            self.scroll_row = row + 1 - visible_rows;
        }
    }

    /// Forgets the card areas of the previous frame.
    pub fn clear_hit_areas(&mut self) {
        self.hit_areas.clear();
    }

    /// Records where card `index` was drawn.
    pub fn push_hit_area(&mut self, area: Rect, index: usize) {
        self.hit_areas.push((area, index));
    }

    /// Returns the index of the card drawn at `position`.
    #[must_use]
    pub fn hit_test(&self, position: Position) -> Option<usize> {
        self.hit_areas
            .iter()
            .find(|(area, _)| area.contains(position))
            .map(|(_, index)| *index)
    }
}

/// Side effect requested by an input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Nothing to do.
    None,
    /// Leave the browser.
    Quit,
    /// Request results for this search string.
    Request(String),
    /// Invalidate and request this search string again.
    Refresh(String),
    /// Open this URL in the system browser.
    Open(String),
}

/// State for the browser TUI.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct BrowserState {
    /// Search string and selection.
    pub controller: SearchController,
    /// Card grid cursor.
    pub grid: GridState,
    /// UI labels.
    pub labels: Labels,
    /// Poster URL settings.
    pub images: ImagesConfig,
    /// Area of the open overlay in the last frame.
    pub overlay_area: Option<Rect>,
    /// Delay between the last edit and the request.
    debounce: Duration,
    /// When the pending debounced request is due.
    pending_request: Option<Instant>,
}

impl BrowserState {
    /// Creates an empty browser state.
    #[must_use]
    pub fn new(images: ImagesConfig, labels: Labels, debounce: Duration) -> Self {
        Self {
            controller: SearchController::default(),
            grid: GridState::default(),
            labels,
            images,
            overlay_area: None,
            debounce,
            pending_request: None,
        }
    }

    /// Returns when the debounced request is due, if one is pending.
    #[must_use]
    pub const fn pending_request(&self) -> Option<Instant> {
        self.pending_request
    }

    /// Results view for the current search string.
    ///
    /// Shows `Loading` while a debounced request has not been sent yet, so an
    /// unsent query is never reported as having no results.
    #[must_use]
    pub fn view(&self, query_state: &QueryState) -> ResultsView {
        if self.pending_request.is_some() {
            return ResultsView::Loading;
        }
        self.controller.view(query_state)
    }

    /// Takes the pending debounced request.
    pub fn take_pending_request(&mut self) -> Option<String> {
        self.pending_request
            .take()
            .map(|_| String::from(self.controller.search()))
    }

    /// Sets the search string directly (initial `--query`).
    pub fn set_search(&mut self, search: String) -> Action {
        if self.controller.set_search(search) {
            self.search_changed()
        } else {
            Action::None
        }
    }

    /// Handles a key press.
    pub fn on_key(&mut self, key: KeyEvent, cards: &[Card]) -> Action {
        if self.controller.is_overlay_open() {
            self.handle_overlay_key(key)
        } else {
            self.handle_search_key(key, cards)
        }
    }

    /// Handles a mouse event: card clicks, backdrop clicks, wheel scrolling.
    pub fn on_mouse(&mut self, mouse: MouseEvent, cards: &[Card]) {
        let position = Position::new(mouse.column, mouse.row);
        let overlay_open = self.controller.is_overlay_open();
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) if overlay_open => {
                if !self.overlay_area.is_some_and(|area| area.contains(position)) {
                    self.controller.dismiss();
                }
            }
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(index) = self.grid.hit_test(position) {
                    self.grid.set_cursor(index);
                    cards::select_card(cards, index, |movie| self.controller.select(movie));
                }
            }
            MouseEventKind::ScrollDown if !overlay_open => self.grid.move_down(cards.len()),
            MouseEventKind::ScrollUp if !overlay_open => self.grid.move_up(),
            _ => {}
        }
    }

    /// Key input while the search field has focus.
    fn handle_search_key(&mut self, key: KeyEvent, cards: &[Card]) -> Action {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => Action::Quit,
            KeyCode::Char('r') if ctrl => {
                if self.controller.search().is_empty() {
                    return Action::None;
                }
                self.pending_request = None;
                Action::Refresh(String::from(self.controller.search()))
            }
            KeyCode::Char('u') if ctrl => self.set_search(String::new()),
            KeyCode::Char('o') if ctrl => cards
                .get(self.grid.cursor())
                .map_or(Action::None, |card| Action::Open(card.image_url.clone())),
            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                self.controller.push_char(c);
                self.search_changed()
            }
            KeyCode::Backspace => {
                if self.controller.pop_char() {
                    self.search_changed()
                } else {
                    Action::None
                }
            }
            KeyCode::Enter => {
                cards::select_card(cards, self.grid.cursor(), |movie| {
                    self.controller.select(movie);
                });
                Action::None
            }
            KeyCode::Esc => Action::Quit,
            KeyCode::Left => {
                self.grid.move_left();
                Action::None
            }
            KeyCode::Right => {
                self.grid.move_right(cards.len());
                Action::None
            }
            KeyCode::Up => {
                self.grid.move_up();
                Action::None
            }
            KeyCode::Down => {
                self.grid.move_down(cards.len());
                Action::None
            }
            KeyCode::Home => {
                self.grid.set_cursor(0);
                Action::None
            }
            KeyCode::End => {
                self.grid.set_cursor(cards.len().saturating_sub(1));
                Action::None
            }
            _ => Action::None,
        }
    }

    /// Key input while the overlay is open.
    fn handle_overlay_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
                self.controller.dismiss();
                Action::None
            }
            KeyCode::Char('o') => self.controller.selected().map_or(Action::None, |movie| {
                Action::Open(cards::image_url(&self.images, &movie.poster_path))
            }),
            _ => Action::None,
        }
    }

    /// Resets the grid and schedules the request for the new search string.
    fn search_changed(&mut self) -> Action {
        self.grid.reset();
        if self.debounce.is_zero() {
            self.pending_request = None;
            return Action::Request(String::from(self.controller.search()));
        }
        let now = Instant::now();
        self.pending_request = Some(now.checked_add(self.debounce).unwrap_or(now));
        Action::None
    }
}
