//! Detail overlay for the selected movie.

use cinesearch_api::tmdb::Movie;

use super::cards::image_url;
use super::labels::Labels;
use crate::config::ImagesConfig;

/// Text shown by the open overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayView {
    /// Movie title.
    pub title: String,
    /// Overview, or the "unavailable" label.
    pub synopsis: String,
    /// Rating as `"<value> / 10"`.
    pub rating: String,
    /// Release date as received, or the "unknown" label.
    pub release_date: String,
    /// Poster URL (placeholder when absent).
    pub image_url: String,
}

/// Builds the overlay for the current selection. `None` means closed.
#[must_use]
pub fn render_overlay(
    selected: Option<&Movie>,
    images: &ImagesConfig,
    labels: &Labels,
) -> Option<OverlayView> {
    let movie = selected?;
    Some(OverlayView {
        title: movie.title.clone(),
        synopsis: non_empty_or(&movie.overview, labels.no_overview),
        rating: format_rating(movie.vote_average),
        release_date: non_empty_or(&movie.release_date, labels.unknown),
        image_url: image_url(images, &movie.poster_path),
    })
}

/// Formats a vote average with the shortest exact decimal (`8.2 / 10`, `7 / 10`).
#[must_use]
pub fn format_rating(vote_average: f64) -> String {
    format!("{vote_average} / 10")
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        String::from(fallback)
    } else {
        String::from(value)
    }
}
