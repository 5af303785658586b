//! TUI module for the interactive movie browser.
//!
//! Uses `ratatui` + `crossterm` for rendering. The event loop waits on
//! terminal input, query cache changes and the debounce deadline.

/// Result card projection.
pub mod cards;
/// Localized UI strings.
pub mod labels;
mod overlay;
/// Browser state types.
pub mod state;
mod ui;

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use cinesearch_api::query::QueryClient;
use cinesearch_api::tmdb::TmdbApi;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEventKind,
};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use futures::StreamExt;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::time::Instant;

use self::labels::Labels;
use self::state::{Action, BrowserState};
use crate::config::ImagesConfig;

/// Settings for one browser session.
#[derive(Debug)]
pub struct BrowserOptions {
    /// Search string to start with.
    pub initial_query: Option<String>,
    /// Poster URL settings.
    pub images: ImagesConfig,
    /// UI labels.
    pub labels: Labels,
    /// Delay between the last edit and the request (`ZERO` = every keystroke).
    pub debounce: Duration,
}

/// Runs the movie browser until the user quits.
///
/// # Errors
///
/// Returns an error if terminal setup or event handling fails.
#[tracing::instrument(skip_all)]
pub async fn run_browser<A>(client: QueryClient<A>, options: BrowserOptions) -> Result<()>
where
    A: TmdbApi + Sync + 'static,
{
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    let mut state = BrowserState::new(options.images, options.labels, options.debounce);
    if let Some(query) = options.initial_query {
        let action = state.set_search(query);
        apply_action(&client, action);
    }

    let result = run_event_loop(&mut terminal, &mut state, &client).await;

    // Cleanup (always attempt even if event loop failed)
    disable_raw_mode().context("failed to disable raw mode")?;
    crossterm::execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)
        .context("failed to leave alternate screen")?;

    result
}

/// Main event loop.
async fn run_event_loop<A>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut BrowserState,
    client: &QueryClient<A>,
) -> Result<()>
where
    A: TmdbApi + Sync + 'static,
{
    let mut events = EventStream::new();
    let mut changes = client.subscribe();

    loop {
        // Only the entry for the current search string is shown.
        let query_state = client.snapshot(state.controller.search());
        let view = state.view(&query_state);
        let cards = view.cards(&state.images, &state.labels);

        terminal
            .draw(|frame| ui::draw(frame, state, &view, &cards))
            .context("failed to draw TUI")?;

        let deadline = state.pending_request();
        tokio::select! {
            maybe_event = events.next() => {
                let Some(event) = maybe_event else {
                    return Ok(());
                };
                let action = match event.context("failed to read event")? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        state.on_key(key, &cards)
                    }
                    Event::Mouse(mouse) => {
                        state.on_mouse(mouse, &cards);
                        Action::None
                    }
                    _ => Action::None,
                };
                if action == Action::Quit {
                    return Ok(());
                }
                apply_action(client, action);
            }
            changed = changes.changed() => {
                changed.context("query cache closed")?;
            }
            () = sleep_until(deadline) => {
                if let Some(query) = state.take_pending_request() {
                    client.request(&query);
                }
            }
        }
    }
}

/// Sleeps until `deadline`, or forever when there is none.
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Performs the side effect of an input action.
fn apply_action<A>(client: &QueryClient<A>, action: Action)
where
    A: TmdbApi + Sync + 'static,
{
    match action {
        Action::Request(query) => client.request(&query),
        Action::Refresh(query) => {
            client.invalidate(&query);
            client.request(&query);
        }
        Action::Open(url) => {
            if let Err(e) = open::that(&url) {
                tracing::warn!(url, error = %e, "failed to open URL");
            }
        }
        Action::None | Action::Quit => {}
    }
}
