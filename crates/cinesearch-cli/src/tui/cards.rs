//! Projection of search results into movie cards.
//!
//! Everything here is a pure function of the data. Cursor and scroll
//! position live in `state::GridState`.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use cinesearch_api::tmdb::{Movie, SearchResult};

use super::labels::Labels;
use crate::config::ImagesConfig;

/// One card in the result grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// The movie, shared with the cache.
    pub movie: Arc<Movie>,
    /// Poster URL, or the placeholder when the movie has none.
    pub image_url: String,
    /// Four-digit release year, or the "unknown" label.
    pub year_label: String,
}

impl Card {
    /// Card title (the movie title).
    #[must_use]
    pub fn title(&self) -> &str {
        &self.movie.title
    }
}

/// Projects a search result into cards, one per movie, in result order.
#[must_use]
pub fn render_cards(result: &SearchResult, images: &ImagesConfig, labels: &Labels) -> Vec<Card> {
    result
        .results
        .iter()
        .map(|movie| Card {
            movie: Arc::clone(movie),
            image_url: image_url(images, &movie.poster_path),
            year_label: release_year(&movie.release_date)
                .map_or_else(|| String::from(labels.unknown), |y| format!("{y:04}")),
        })
        .collect()
}

/// Resolves a poster path against the image base URL.
#[must_use]
pub fn image_url(images: &ImagesConfig, poster_path: &str) -> String {
    if poster_path.is_empty() {
        images.placeholder_url.clone()
    } else {
        format!("{}{poster_path}", images.base_url)
    }
}

/// Extracts the year from a `YYYY-MM-DD` date. A trailing time part is ignored.
#[must_use]
pub fn release_year(release_date: &str) -> Option<i32> {
    let date_part = release_date.get(..10).unwrap_or(release_date);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .ok()
        .map(|d| d.year())
}

/// Truncates `text` to `width` characters, ending with an ellipsis when cut.
#[must_use]
pub fn ellipsize(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return String::from(text);
    }
    if width == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('\u{2026}');
    out
}

/// Hands the movie of card `index` to `on_select`. Returns `false` when out of range.
pub fn select_card(cards: &[Card], index: usize, on_select: impl FnOnce(Arc<Movie>)) -> bool {
    let Some(card) = cards.get(index) else {
        return false;
    };
    on_select(Arc::clone(&card.movie));
    true
}
