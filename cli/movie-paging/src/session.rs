use std::collections::HashSet;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::load_state::{LoadState, LoadStates, LoadType};
use crate::page_key::PageKey;
use crate::page_source::{Page, PageSource, PagingItem, PagingState};
use crate::snapshot::PagingSnapshot;

/// The load a session is currently waiting for.
#[derive(Debug)]
pub(crate) struct InFlight {
    pub(crate) load_type: LoadType,
    pub(crate) handle: JoinHandle<()>,
}

/// All state belonging to one query.
///
/// Dropping a session aborts its in-flight load.
pub(crate) struct Session<S: PageSource> {
    pub(crate) generation: u64,
    pub(crate) query: String,
    pub(crate) source: Arc<S>,
    pages: Vec<Page<S::Item>>,
    seen: HashSet<<S::Item as PagingItem>::Id>,
    pub(crate) load_states: LoadStates,
    /// Key of the page the current refresh started from.
    pub(crate) refresh_key: Option<PageKey>,
    pub(crate) anchor_position: Option<usize>,
    pub(crate) in_flight: Option<InFlight>,
}

impl<S: PageSource> Session<S> {
    pub(crate) fn new(generation: u64, query: String, source: Arc<S>) -> Self {
        Self {
            generation,
            query,
            source,
            pages: Vec::new(),
            seen: HashSet::new(),
            load_states: LoadStates::initial(),
            refresh_key: None,
            anchor_position: None,
            in_flight: None,
        }
    }

    /// Start a session for the same query that keeps showing the items of `previous`
    /// until its own refresh completes.
    pub(crate) fn replacing(generation: u64, source: Arc<S>, mut previous: Session<S>) -> Self {
        let mut session = Self::new(generation, previous.query.clone(), source);
        session.pages = std::mem::take(&mut previous.pages);
        session
    }

    pub(crate) fn item_count(&self) -> usize {
        self.pages.iter().map(|page| page.items.len()).sum()
    }

    pub(crate) fn paging_state(&self) -> PagingState<'_, S::Item> {
        PagingState {
            pages: &self.pages,
            anchor_position: self.anchor_position,
        }
    }

    /// The key to load next for `load_type`.
    ///
    /// For prepend and append `None` means that end was reached,
    /// for refresh it means the first page.
    pub(crate) fn boundary_key(&self, load_type: LoadType) -> Option<PageKey> {
        match load_type {
            LoadType::Refresh => self.refresh_key,
            LoadType::Prepend => self.pages.first().and_then(|page| page.prev_key),
            LoadType::Append => self.pages.last().and_then(|page| page.next_key),
        }
    }

    /// Store a successfully loaded page and update the load state of its axis.
    pub(crate) fn apply_page(&mut self, load_type: LoadType, page: Page<S::Item>) {
        match load_type {
            LoadType::Refresh => {
                self.pages.clear();
                self.seen.clear();
                self.anchor_position = None;
                let page = self.dedup(page);
                self.load_states = LoadStates {
                    refresh: LoadState::not_loading(
                        page.prev_key.is_none() && page.next_key.is_none(),
                    ),
                    prepend: LoadState::not_loading(page.prev_key.is_none()),
                    append: LoadState::not_loading(page.next_key.is_none()),
                };
                self.pages.push(page);
            },
            LoadType::Prepend => {
                let page = self.dedup(page);
                self.load_states.prepend = LoadState::not_loading(page.prev_key.is_none());
                if let Some(anchor) = self.anchor_position.as_mut() {
                    *anchor += page.items.len();
                }
                self.pages.insert(0, page);
            },
            LoadType::Append => {
                let page = self.dedup(page);
                self.load_states.append = LoadState::not_loading(page.next_key.is_none());
                self.pages.push(page);
            },
        }
    }

    /// Drop items that an earlier page of this session already contained.
    fn dedup(&mut self, mut page: Page<S::Item>) -> Page<S::Item> {
        let before = page.items.len();
        page.items.retain(|item| self.seen.insert(item.id()));
        let dropped = before - page.items.len();
        if dropped > 0 {
            debug!(dropped, query = %self.query, "dropped duplicate items");
        }
        page
    }

    pub(crate) fn snapshot(&self) -> PagingSnapshot<S::Item> {
        PagingSnapshot {
            query: self.query.clone(),
            generation: self.generation,
            items: self
                .pages
                .iter()
                .flat_map(|page| page.items.iter().cloned())
                .collect(),
            page_count: self.pages.len(),
            load_states: self.load_states.clone(),
        }
    }
}

impl<S: PageSource> Drop for Session<S> {
    fn drop(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            debug!(
                query = %self.query,
                load_type = ?in_flight.load_type,
                "cancelling in-flight load"
            );
            in_flight.handle.abort();
        }
    }
}
