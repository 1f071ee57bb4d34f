//! HTTP client infrastructure for the TMDB movie catalog.
//!
//! This crate provides:
//! - HTTP client construction with timeouts and API key authentication
//! - The request policy shared by all catalog calls (one retry on 429/5xx, request logging)
//! - Common error handling for catalog API operations
//! - The domain [`Movie`](types::Movie) and its mapping from the wire format
//! - A [`MockClient`] with canned responses for tests of downstream crates
//!
//! ## Usage
//!
//! ```ignore
//! use movie_catalog::{CatalogClient, CatalogClientConfig, ClientTrait, SearchOptions};
//!
//! let config = CatalogClientConfig {
//!     api_key: key,
//!     ..CatalogClientConfig::default()
//! };
//!
//! let client = CatalogClient::new(config)?;
//! let page = client.search_movies("alien", 1, &SearchOptions::default()).await?;
//! ```

mod client;
mod config;
mod error;
mod policy;
pub mod types;

// Re-export tmdb-api-v3 types for consumers.
// This allows consumers to depend only on movie-catalog, not directly on tmdb-api-v3.
pub use client::{CatalogClient, Client, ClientTrait, MockClient, MockDataError, MockResponse};
#[cfg(any(test, feature = "tests"))]
pub use client::{EMPTY_SEARCH_RESPONSE, page_envelope};
pub use config::{CatalogClientConfig, DEFAULT_TMDB_URL};
pub use error::{CatalogClientError, MapApiErrorExt};
pub use policy::{RequestLogging, RetryPolicy};
pub use tmdb_api_v3::{Client as ApiClient, Error as ApiError, types as api_types};
pub use types::SearchOptions;
