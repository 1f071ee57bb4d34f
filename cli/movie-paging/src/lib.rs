//! Incremental paging of search results.
//!
//! A [`Pager`] turns a changing search query into a sequence of [`PagingSnapshot`]s:
//! - every query change starts a new session, cancelling the previous one
//! - pages are loaded through a [`PageSource`] created per query
//! - the consumer drives further loads by reporting accessed items
//! - failed loads are kept as [`LoadState::Error`] until retried
//!
//! [`MoviePageSource`] pages through the movie catalog.
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use movie_paging::{MoviePageSourceFactory, Pager, PagingConfig};
//!
//! let factory = MoviePageSourceFactory::new(Arc::new(client), SearchOptions::default());
//! let pager = Pager::new(factory, PagingConfig::default());
//! let mut subscription = pager.subscribe();
//!
//! pager.set_query("alien");
//! while let Some(snapshot) = subscription.changed().await {
//!     render(&snapshot);
//! }
//! ```

mod load_state;
mod movie_source;
mod page_key;
mod page_source;
mod pager;
mod session;
mod snapshot;
mod subscription;
#[cfg(test)]
mod testing;

pub use load_state::{LoadError, LoadPanicked, LoadState, LoadStates, LoadType};
pub use movie_source::{MoviePageSource, MoviePageSourceFactory};
pub use page_key::PageKey;
pub use page_source::{LoadParams, Page, PageSource, PageSourceFactory, PagingItem, PagingState};
pub use pager::{DEFAULT_PAGE_SIZE, DEFAULT_PREFETCH_DISTANCE, Pager, PagingConfig};
pub use snapshot::PagingSnapshot;
pub use subscription::PagingSubscription;
