//! Observable loading status of a paging session.

use std::any::Any;
use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

use crate::page_key::PageKey;

/// The kind of load issued for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadType {
    /// The first page of a session, or the anchor page after a refresh.
    Refresh,
    /// A page before the first loaded one.
    Prepend,
    /// A page after the last loaded one.
    Append,
}

/// A failed page load.
///
/// The cause is shared so that the error can be cloned into every snapshot.
#[derive(Debug, Clone, Error)]
#[error("failed to load {}", describe_key(*.key))]
pub struct LoadError {
    key: Option<PageKey>,
    #[source]
    source: Arc<dyn StdError + Send + Sync>,
}

impl LoadError {
    pub fn new<E>(key: Option<PageKey>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            key,
            source: Arc::new(source),
        }
    }

    /// The key of the page that failed to load, `None` for the first page.
    pub fn key(&self) -> Option<PageKey> {
        self.key
    }

    /// The underlying failure if it is of type `E`.
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.source.downcast_ref::<E>()
    }
}

/// A page source that panicked instead of returning a result.
#[derive(Debug, Error)]
#[error("page source panicked: {message}")]
pub struct LoadPanicked {
    message: String,
}

impl LoadPanicked {
    pub(crate) fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|message| message.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown cause".to_string());
        Self { message }
    }
}

fn describe_key(key: Option<PageKey>) -> String {
    match key {
        Some(key) => format!("page {key}"),
        None => "first page".to_string(),
    }
}

/// Status of one load axis.
#[derive(Debug, Clone)]
pub enum LoadState {
    /// No load is running.
    ///
    /// `end_of_pagination` is set once there is nothing more to load in this direction.
    NotLoading { end_of_pagination: bool },
    Loading,
    /// The last load failed and stays failed until retried.
    Error(LoadError),
}

impl LoadState {
    pub const INCOMPLETE: LoadState = LoadState::NotLoading {
        end_of_pagination: false,
    };
    pub const COMPLETE: LoadState = LoadState::NotLoading {
        end_of_pagination: true,
    };

    pub fn not_loading(end_of_pagination: bool) -> Self {
        LoadState::NotLoading { end_of_pagination }
    }

    pub fn is_not_loading(&self) -> bool {
        matches!(self, LoadState::NotLoading { .. })
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LoadState::Error(_))
    }

    pub fn end_of_pagination(&self) -> bool {
        matches!(self, LoadState::NotLoading {
            end_of_pagination: true
        })
    }

    pub fn error(&self) -> Option<&LoadError> {
        match self {
            LoadState::Error(error) => Some(error),
            _ => None,
        }
    }
}

/// Load state of each axis of a session.
///
/// The axes move independently:
/// `NotLoading -> Loading -> NotLoading | Error`.
#[derive(Debug, Clone)]
pub struct LoadStates {
    pub refresh: LoadState,
    pub prepend: LoadState,
    pub append: LoadState,
}

impl LoadStates {
    /// The state of a session that was just started.
    pub fn initial() -> Self {
        Self {
            refresh: LoadState::Loading,
            prepend: LoadState::INCOMPLETE,
            append: LoadState::INCOMPLETE,
        }
    }

    /// The state when there is no session, i.e. the query is blank.
    pub fn idle() -> Self {
        Self {
            refresh: LoadState::COMPLETE,
            prepend: LoadState::COMPLETE,
            append: LoadState::COMPLETE,
        }
    }

    pub fn get(&self, load_type: LoadType) -> &LoadState {
        match load_type {
            LoadType::Refresh => &self.refresh,
            LoadType::Prepend => &self.prepend,
            LoadType::Append => &self.append,
        }
    }

    pub(crate) fn set(&mut self, load_type: LoadType, state: LoadState) {
        match load_type {
            LoadType::Refresh => self.refresh = state,
            LoadType::Prepend => self.prepend = state,
            LoadType::Append => self.append = state,
        }
    }

    /// Whether any axis is currently loading.
    pub fn is_loading(&self) -> bool {
        self.refresh.is_loading() || self.prepend.is_loading() || self.append.is_loading()
    }

    /// The first failed axis, checked in the order refresh, prepend, append.
    pub fn first_error(&self) -> Option<(LoadType, &LoadError)> {
        [LoadType::Refresh, LoadType::Prepend, LoadType::Append]
            .into_iter()
            .find_map(|load_type| self.get(load_type).error().map(|e| (load_type, e)))
    }
}
