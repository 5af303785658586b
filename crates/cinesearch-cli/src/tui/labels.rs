//! Localized UI strings.

use crate::config::UiLanguage;

/// Label set for one UI language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Labels {
    /// Search box title.
    pub search_prompt: &'static str,
    /// Shown while a fetch is in flight.
    pub loading: &'static str,
    /// Shown when the fetch failed.
    pub fetch_error: &'static str,
    /// Missing or unparseable release date.
    pub unknown: &'static str,
    /// Missing overview.
    pub no_overview: &'static str,
    /// Rating field name in the overlay.
    pub rating: &'static str,
    /// Release date field name in the overlay.
    pub release_date: &'static str,
    /// A non-empty query returned nothing.
    pub no_results: &'static str,
    /// Overlay title.
    pub details: &'static str,
}

impl Labels {
    /// English labels.
    pub const EN: Self = Self {
        search_prompt: "Search for a movie",
        loading: "Loading...",
        fetch_error: "An error occurred while fetching data.",
        unknown: "Unknown",
        no_overview: "No overview available",
        rating: "Rating",
        release_date: "Release date",
        no_results: "No movies found",
        details: "Details",
    };

    /// Arabic labels.
    pub const AR: Self = Self {
        search_prompt: "ابحث عن فيلم",
        loading: "جارٍ التحميل...",
        fetch_error: "حدث خطأ أثناء جلب البيانات.",
        unknown: "غير معروف",
        no_overview: "لا يوجد وصف متاح",
        rating: "التقييم",
        release_date: "تاريخ الإصدار",
        no_results: "لا توجد أفلام",
        details: "التفاصيل",
    };

    /// Returns the label set for `language`.
    #[must_use]
    pub const fn for_language(language: UiLanguage) -> Self {
        match language {
            UiLanguage::En => Self::EN,
            UiLanguage::Ar => Self::AR,
        }
    }
}
