//! TUI rendering logic for the movie browser.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use super::cards::{Card, ellipsize};
use super::overlay::{OverlayView, render_overlay};
use super::state::{BrowserState, ResultsView};

/// Card width including borders.
const CARD_WIDTH: u16 = 32;
/// Card height including borders (title, year, poster URL).
const CARD_HEIGHT: u16 = 5;
/// Maximum overlay size.
const OVERLAY_WIDTH: u16 = 72;
const OVERLAY_HEIGHT: u16 = 18;

/// Draws the browser UI and records card and overlay areas for mouse input.
#[allow(clippy::indexing_slicing)]
pub fn draw(frame: &mut Frame, state: &mut BrowserState, view: &ResultsView, cards: &[Card]) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // search box
            Constraint::Min(5),    // results
            Constraint::Length(3), // footer
        ])
        .split(frame.area());

    draw_search_box(frame, chunks[0], state);

    state.grid.clear_hit_areas();
    match view {
        ResultsView::Loading => draw_message(
            frame,
            chunks[1],
            vec![Line::styled(
                state.labels.loading,
                Style::default().fg(Color::Yellow),
            )],
        ),
        ResultsView::Error(err) => draw_message(
            frame,
            chunks[1],
            vec![
                Line::styled(state.labels.fetch_error, Style::default().fg(Color::Red)),
                Line::styled(
                    String::from(err.message()),
                    Style::default().fg(Color::DarkGray),
                ),
            ],
        ),
        ResultsView::Results(_) => draw_grid(frame, chunks[1], state, cards),
    }

    draw_footer(frame, chunks[2], state);

    let overlay = render_overlay(
        state.controller.selected().map(AsRef::as_ref),
        &state.images,
        &state.labels,
    );
    let overlay_area = overlay.map(|overlay| draw_overlay(frame, &overlay, state));
    state.overlay_area = overlay_area;
}

/// Draws the search input with a cursor marker.
fn draw_search_box(frame: &mut Frame, area: Rect, state: &BrowserState) {
    let style = if state.controller.is_overlay_open() {
        Style::default()
    } else {
        Style::default().fg(Color::Yellow)
    };
    let input = Paragraph::new(format!("{}\u{2588}", state.controller.search()))
        .style(style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", state.labels.search_prompt)),
        );
    frame.render_widget(input, area);
}

/// Draws status lines in the results area.
fn draw_message(frame: &mut Frame, area: Rect, lines: Vec<Line<'_>>) {
    let message = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(message, area);
}

/// Draws the card grid, scrolled so the cursor card is visible.
#[allow(clippy::arithmetic_side_effects)]
fn draw_grid(frame: &mut Frame, area: Rect, state: &mut BrowserState, cards: &[Card]) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", cards.len()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if cards.is_empty() {
        if !state.controller.search().is_empty() {
            let hint = Paragraph::new(Line::styled(
                state.labels.no_results,
                Style::default().fg(Color::DarkGray),
            ));
            frame.render_widget(hint, inner);
        }
        return;
    }

    let columns = usize::from(inner.width / CARD_WIDTH).max(1);
    let visible_rows = usize::from(inner.height / CARD_HEIGHT).max(1);
    state.grid.clamp(cards.len());
    state.grid.set_layout(columns, visible_rows);

    let rows = Layout::vertical(vec![Constraint::Length(CARD_HEIGHT); visible_rows]).split(inner);
    let slots: Vec<Rect> = rows
        .iter()
        .flat_map(|row| {
            Layout::horizontal(vec![Constraint::Length(CARD_WIDTH); columns])
                .split(*row)
                .to_vec()
        })
        .collect();

    let first = state.grid.scroll_row().saturating_mul(columns);
    for (slot, (index, card)) in slots.into_iter().zip(cards.iter().enumerate().skip(first)) {
        draw_card(frame, slot, card, index == state.grid.cursor());
        state.grid.push_hit_area(slot, index);
    }
}

/// Draws one movie card.
fn draw_card(frame: &mut Frame, area: Rect, card: &Card, focused: bool) {
    let border_style = if focused {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let width = usize::from(area.width.saturating_sub(2));

    let lines = vec![
        Line::from(Span::styled(
            ellipsize(card.title(), width),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(card.year_label.clone()),
        Line::from(Span::styled(
            ellipsize(&card.image_url, width),
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style),
    );
    frame.render_widget(widget, area);
}

/// Draws the detail overlay centered over the results. Returns its area.
fn draw_overlay(frame: &mut Frame, overlay: &OverlayView, state: &BrowserState) -> Rect {
    let area = centered_rect(OVERLAY_WIDTH, OVERLAY_HEIGHT, frame.area());
    let labels = &state.labels;
    let field = Style::default().fg(Color::Yellow);

    let lines = vec![
        Line::from(Span::styled(
            overlay.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::default(),
        Line::from(vec![
            Span::styled(format!("{}: ", labels.rating), field),
            Span::raw(overlay.rating.clone()),
        ]),
        Line::from(vec![
            Span::styled(format!("{}: ", labels.release_date), field),
            Span::raw(overlay.release_date.clone()),
        ]),
        Line::default(),
        Line::from(overlay.synopsis.clone()),
        Line::default(),
        Line::from(Span::styled(
            overlay.image_url.clone(),
            Style::default().fg(Color::DarkGray),
        )),
    ];

    frame.render_widget(Clear, area);
    let widget = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" {} ", labels.details))
            .title_bottom(Line::from(" Esc: close  o: open poster ").centered()),
    );
    frame.render_widget(widget, area);
    area
}

/// Centers a `width` x `height` rectangle inside `area`, shrinking it to fit.
#[allow(clippy::arithmetic_side_effects)]
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area
        .x
        .saturating_add(area.width.saturating_sub(width) / 2);
    let y = area
        .y
        .saturating_add(area.height.saturating_sub(height) / 2);
    Rect::new(x, y, width, height)
}

/// Draws the footer with key hints.
fn draw_footer(frame: &mut Frame, area: Rect, state: &BrowserState) {
    let help_text = if state.controller.is_overlay_open() {
        Line::from("Esc/Enter/q: close  o: open poster  Ctrl-C: quit")
    } else {
        Line::from(vec![Span::raw(
            "Type to search  \u{2190}\u{2191}\u{2192}\u{2193}: move  Enter: details  \
             Ctrl-O: poster  Ctrl-R: refresh  Ctrl-U: clear  Esc: quit",
        )])
    };

    let footer = Paragraph::new(help_text).block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}
