//! Catalog interaction types.
//!
//! These types represent the domain model for catalog operations,
//! decoupled from the wire format in [`tmdb_api_v3::types`].

use serde::{Deserialize, Serialize};
use tmdb_api_v3::types as api_types;

/// Every poster path returned by the catalog is relative to this URL.
pub const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

pub const DEFAULT_LANGUAGE: &str = "en-US";

/// One page of search results as sent by the catalog.
pub use api_types::SearchMovieResponse as PageEnvelope;
/// A single search result as sent by the catalog.
pub use api_types::MovieResult as RawMovie;

/// A movie as used throughout movielist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    /// Stable identifier of the movie within the catalog.
    pub id: i64,
    pub title: String,
    pub overview: String,
    /// Absolute URL of the poster image, if the movie has one.
    pub poster_url: Option<String>,
    /// Average user rating between 0.0 and 10.0.
    pub rating: f64,
}

impl Movie {
    /// The rating the way it is presented to users, e.g. `7.5`.
    pub fn rating_label(&self) -> String {
        format!("{:.1}", self.rating)
    }
}

impl From<RawMovie> for Movie {
    fn from(raw: RawMovie) -> Self {
        Movie {
            id: raw.id,
            title: raw.title,
            overview: raw.overview,
            poster_url: raw
                .poster_path
                .map(|path| format!("{POSTER_BASE_URL}{path}")),
            rating: raw.vote_average,
        }
    }
}

/// Per-search flags forwarded to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub include_adult: bool,
    pub language: String,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            include_adult: false,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}
