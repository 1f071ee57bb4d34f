//! Types used as operation parameters and responses.

use serde::{Deserialize, Serialize};

/// Response body of `GET /search/movie`.
///
/// ```json
/// {
///   "page": 1,
///   "results": [ ... ],
///   "total_pages": 5,
///   "total_results": 93
/// }
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SearchMovieResponse {
    /// The page this response belongs to.
    /// Older API versions omitted it, so it is optional on the wire.
    #[serde(default)]
    pub page: Option<i64>,
    pub results: Vec<MovieResult>,
    pub total_pages: i64,
    #[serde(default)]
    pub total_results: Option<i64>,
}

/// A single movie as returned by the search endpoint.
///
/// TMDB returns many more fields, only those consumed by movielist are modeled.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct MovieResult {
    pub id: i64,
    pub title: String,
    pub overview: String,
    /// Relative image path, e.g. `/alien.jpg`, if the movie has a poster.
    pub poster_path: Option<String>,
    pub vote_average: f64,
}

/// Error body returned by TMDB for documented failures (401, 404).
///
/// ```json
/// { "success": false, "status_code": 7, "status_message": "Invalid API key: You must be granted a valid key." }
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ErrorResponse {
    /// TMDB internal status code, unrelated to the HTTP status.
    pub status_code: i64,
    pub status_message: String,
    #[serde(default)]
    pub success: bool,
}
