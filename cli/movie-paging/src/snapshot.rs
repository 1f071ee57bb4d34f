use crate::load_state::LoadStates;

/// Everything a consumer needs to render the current search.
///
/// The [`Pager`](crate::Pager) publishes a new snapshot after every change,
/// the latest one is replayed to new subscribers.
#[derive(Debug, Clone)]
pub struct PagingSnapshot<T> {
    /// The query the items belong to.
    pub query: String,
    /// Incremented whenever a new session starts, i.e. on every query change and refresh.
    pub generation: u64,
    /// All items loaded so far, in display order.
    pub items: Vec<T>,
    /// Number of pages stored in the session, including pages left empty by deduplication.
    pub page_count: usize,
    pub load_states: LoadStates,
}

impl<T> PagingSnapshot<T> {
    /// The snapshot for a blank query.
    pub fn idle(query: String, generation: u64) -> Self {
        Self {
            query,
            generation,
            items: Vec::new(),
            page_count: 0,
            load_states: LoadStates::idle(),
        }
    }

    /// Whether no search is active because the query is blank.
    pub fn is_idle(&self) -> bool {
        self.query.trim().is_empty()
    }

    /// Whether the search completed without any results.
    ///
    /// This is distinct from a failed search, which has a refresh error.
    pub fn is_no_results(&self) -> bool {
        !self.is_idle() && self.items.is_empty() && self.load_states.refresh.is_not_loading()
    }
}
