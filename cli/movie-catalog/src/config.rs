//! Configuration types for catalog client construction.

use crate::policy::RequestLogging;

/// Base URL of the public TMDB v3 API.
pub const DEFAULT_TMDB_URL: &str = "https://api.themoviedb.org/3";

/// Configuration for catalog client construction.
#[derive(Debug, Clone)]
pub struct CatalogClientConfig {
    /// Base URL for the catalog API.
    pub tmdb_url: String,
    /// API key appended as `api_key` to every request.
    pub api_key: String,
    /// How much to log about each outgoing request.
    pub request_logging: RequestLogging,
    /// User agent sent with every request, defaults to reqwest's.
    pub user_agent: Option<String>,
}

impl Default for CatalogClientConfig {
    fn default() -> Self {
        Self {
            tmdb_url: DEFAULT_TMDB_URL.to_string(),
            api_key: String::new(),
            request_logging: RequestLogging::default(),
            user_agent: None,
        }
    }
}
