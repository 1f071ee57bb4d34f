//! Typed client for the subset of the TMDB v3 API used by movielist.
//!
//! The client mirrors the shape of a generated OpenAPI client:
//! one method per operation, [`types`] for the wire format,
//! [`ResponseValue`] for successful responses and [`Error`] for everything else.
//! Only `GET /search/movie` is covered.

mod client;
pub mod types;

pub use client::Client;
#[allow(unused_imports)]
pub use progenitor_client::{Error, ResponseValue};

/// A mock server for the api, see [`mock::MockServerExt`].
#[cfg(feature = "mock-client")]
pub mod mock;
