//! The paging orchestrator.
//!
//! A [`Pager`] is a handle to a driver task that owns the current query and its session.
//! The handle sends commands, the driver publishes [`PagingSnapshot`]s through a
//! [`watch`] channel, which doubles as the cache replayed to new subscribers.
//!
//! Every page load runs in its own task and reports back to the driver,
//! tagged with the generation of the session it was started for.
//! Results of an older generation are discarded.

use std::error::Error as _;
use std::fmt::Debug;
use std::ops::ControlFlow;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, trace, warn};

use crate::load_state::{LoadError, LoadPanicked, LoadState, LoadType};
use crate::page_key::PageKey;
use crate::page_source::{LoadParams, Page, PageSource, PageSourceFactory, PagingItem};
use crate::session::{InFlight, Session};
use crate::snapshot::PagingSnapshot;
use crate::subscription::PagingSubscription;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const DEFAULT_PREFETCH_DISTANCE: usize = 2;

/// Fixed parameters of a [`Pager`].
///
/// The loaded sequence never contains placeholders,
/// only items that were actually loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagingConfig {
    /// Number of items requested per page.
    pub page_size: usize,
    /// Accessing one of the last `prefetch_distance` items loads the next page.
    pub prefetch_distance: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            prefetch_distance: DEFAULT_PREFETCH_DISTANCE,
        }
    }
}

#[derive(Debug)]
enum Command {
    SetQuery(String),
    AccessItem(usize),
    Prefetch,
    Refresh,
    /// Retry the given axis, or the first failed one.
    Retry(Option<LoadType>),
    Close,
}

struct LoadOutcome<T> {
    generation: u64,
    load_type: LoadType,
    result: Result<Page<T>, LoadError>,
}

/// Turns a changing query into a stream of [`PagingSnapshot`]s.
///
/// All methods return immediately, their effects are published to subscribers.
/// Dropping the pager cancels any in-flight load and ends all subscriptions.
pub struct Pager<T> {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<PagingSnapshot<T>>,
    driver: JoinHandle<()>,
}

impl<T> Debug for Pager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pager")
            .field("closed", &self.commands.is_closed())
            .finish_non_exhaustive()
    }
}

impl<T> Pager<T>
where
    T: PagingItem + Clone + Send + Sync + 'static,
{
    /// Start a pager on the current tokio runtime.
    ///
    /// Until the first query is set the pager is idle.
    pub fn new<F>(factory: F, config: PagingConfig) -> Self
    where
        F: PageSourceFactory,
        F::Source: PageSource<Item = T>,
    {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        let (snapshots_tx, snapshots) = watch::channel(PagingSnapshot::idle(String::new(), 0));

        let driver = Driver {
            factory,
            config,
            query: None,
            generation: 0,
            session: None,
            snapshots: snapshots_tx,
            outcomes: outcomes_tx,
        };
        let driver = tokio::spawn(driver.run(commands_rx, outcomes_rx));

        Self {
            commands: commands_tx,
            snapshots,
            driver,
        }
    }

    /// The latest snapshot.
    pub fn snapshot(&self) -> PagingSnapshot<T> {
        self.snapshots.borrow().clone()
    }

    /// Subscribe to snapshots, starting with the latest one.
    pub fn subscribe(&self) -> PagingSubscription<T> {
        PagingSubscription::new(self.snapshots.clone())
    }
}

impl<T> Pager<T> {
    /// Search for `query`.
    ///
    /// A blank query clears the results without any network call,
    /// setting the current query again has no effect.
    pub fn set_query(&self, query: impl Into<String>) {
        self.send(Command::SetQuery(query.into()));
    }

    /// Report that the consumer accessed the item at `index`.
    ///
    /// Loads the next (or previous) page if `index` is within the prefetch distance
    /// of the end (or start) of the loaded items.
    pub fn access_item(&self, index: usize) {
        self.send(Command::AccessItem(index));
    }

    /// Load the next page if there is one and nothing is loading.
    pub fn prefetch(&self) {
        self.send(Command::Prefetch);
    }

    /// Reload the current query, starting from the page around the last accessed item.
    pub fn refresh(&self) {
        self.send(Command::Refresh);
    }

    /// Repeat a failed refresh.
    pub fn retry_refresh(&self) {
        self.send(Command::Retry(Some(LoadType::Refresh)));
    }

    /// Repeat a failed append.
    pub fn retry_append(&self) {
        self.send(Command::Retry(Some(LoadType::Append)));
    }

    /// Repeat whichever load failed, checking refresh, prepend and append in that order.
    pub fn retry(&self) {
        self.send(Command::Retry(None));
    }

    /// Stop the pager.
    ///
    /// Cancels any in-flight load and ends all subscriptions.
    /// Commands sent afterwards are ignored.
    pub fn close(&self) {
        self.send(Command::Close);
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    fn send(&self, command: Command) {
        if let Err(mpsc::error::SendError(command)) = self.commands.send(command) {
            trace!(?command, "pager is closed, ignoring command");
        }
    }
}

impl<T> Drop for Pager<T> {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

type ItemOf<F> = <<F as PageSourceFactory>::Source as PageSource>::Item;

struct Driver<F: PageSourceFactory> {
    factory: F,
    config: PagingConfig,
    /// The last query that was set, blank or not.
    query: Option<String>,
    generation: u64,
    session: Option<Session<F::Source>>,
    snapshots: watch::Sender<PagingSnapshot<ItemOf<F>>>,
    outcomes: mpsc::UnboundedSender<LoadOutcome<ItemOf<F>>>,
}

impl<F: PageSourceFactory> Driver<F> {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut outcomes: mpsc::UnboundedReceiver<LoadOutcome<ItemOf<F>>>,
    ) {
        loop {
            tokio::select! {
                // Commands first, so a new query supersedes results that arrived meanwhile.
                biased;
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    if self.handle_command(command).is_break() {
                        break;
                    }
                },
                Some(outcome) = outcomes.recv() => self.handle_outcome(outcome),
            }
        }
        debug!(generation = self.generation, "pager closed");
    }

    fn handle_command(&mut self, command: Command) -> ControlFlow<()> {
        match command {
            Command::SetQuery(query) => self.set_query(query),
            Command::AccessItem(index) => self.access_item(index),
            Command::Prefetch => self.prefetch(),
            Command::Refresh => self.refresh(),
            Command::Retry(load_type) => self.retry(load_type),
            Command::Close => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    #[instrument(skip(self))]
    fn set_query(&mut self, query: String) {
        if self.query.as_ref() == Some(&query) {
            debug!("query unchanged");
            return;
        }

        self.generation += 1;
        // Dropping the session cancels its in-flight load.
        self.session = None;
        self.query = Some(query.clone());

        if query.trim().is_empty() {
            debug!("blank query, clearing results");
            self.publish();
            return;
        }

        let source = Arc::new(self.factory.create(&query));
        self.session = Some(Session::new(self.generation, query, source));
        self.start_load(LoadType::Refresh, None);
    }

    fn access_item(&mut self, index: usize) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.anchor_position = Some(index);
        self.prefetch_near_anchor();
    }

    fn prefetch(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.anchor_position = Some(session.item_count().saturating_sub(1));
        self.load_more(LoadType::Append);
    }

    fn refresh(&mut self) {
        let Some(previous) = self.session.take() else {
            debug!("no session to refresh");
            return;
        };
        let key = previous.source.refresh_key(&previous.paging_state());
        debug!(query = %previous.query, ?key, "refreshing");

        self.generation += 1;
        let source = Arc::new(self.factory.create(&previous.query));
        self.session = Some(Session::replacing(self.generation, source, previous));
        self.start_load(LoadType::Refresh, key);
    }

    fn retry(&mut self, requested: Option<LoadType>) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let failed = match requested {
            Some(load_type) => session
                .load_states
                .get(load_type)
                .is_error()
                .then_some(load_type),
            None => session.load_states.first_error().map(|(load_type, _)| load_type),
        };
        let Some(load_type) = failed else {
            debug!(?requested, "nothing to retry");
            return;
        };

        let key = session.boundary_key(load_type);
        if load_type == LoadType::Refresh || key.is_some() {
            self.start_load(load_type, key);
        }
    }

    /// Load more items if the anchor is close to either end of the loaded items.
    fn prefetch_near_anchor(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let Some(anchor) = session.anchor_position else {
            return;
        };
        let distance = self.config.prefetch_distance;
        let items_after = session
            .item_count()
            .saturating_sub(anchor.saturating_add(1));

        if items_after < distance && self.load_more(LoadType::Append) {
            return;
        }
        if anchor < distance {
            self.load_more(LoadType::Prepend);
        }
    }

    /// Start a prepend or append load unless any load is running,
    /// the axis failed or its end was reached.
    fn load_more(&mut self, load_type: LoadType) -> bool {
        let Some(session) = self.session.as_ref() else {
            return false;
        };
        if session.in_flight.is_some()
            || !session.load_states.refresh.is_not_loading()
            || !session.load_states.get(load_type).is_not_loading()
        {
            return false;
        }
        let Some(key) = session.boundary_key(load_type) else {
            return false;
        };
        self.start_load(load_type, Some(key));
        true
    }

    fn start_load(&mut self, load_type: LoadType, key: Option<PageKey>) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Some(in_flight) = &session.in_flight {
            trace!(?load_type, in_flight = ?in_flight.load_type, "a load is already in flight");
            return;
        }
        debug!(query = %session.query, ?load_type, ?key, "starting load");

        if load_type == LoadType::Refresh {
            session.refresh_key = key;
        }
        session.load_states.set(load_type, LoadState::Loading);

        let source = Arc::clone(&session.source);
        let outcomes = self.outcomes.clone();
        let generation = session.generation;
        let params = LoadParams {
            key,
            load_size: self.config.page_size,
        };
        let handle = tokio::spawn(async move {
            // A panicking source fails the load instead of leaving the axis in `Loading`.
            let result = match AssertUnwindSafe(source.load(params)).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => Err(LoadError::new(key, LoadPanicked::from_payload(payload))),
            };
            // Fails only if the pager was closed meanwhile.
            let _ = outcomes.send(LoadOutcome {
                generation,
                load_type,
                result,
            });
        });
        session.in_flight = Some(InFlight { load_type, handle });

        self.publish();
    }

    fn handle_outcome(&mut self, outcome: LoadOutcome<ItemOf<F>>) {
        let LoadOutcome {
            generation,
            load_type,
            result,
        } = outcome;

        let Some(session) = self
            .session
            .as_mut()
            .filter(|session| session.generation == generation)
        else {
            debug!(
                generation,
                current = self.generation,
                ?load_type,
                "discarding result of a cancelled load"
            );
            return;
        };

        session.in_flight = None;
        let loaded = match result {
            Ok(page) => {
                session.apply_page(load_type, page);
                true
            },
            Err(error) => {
                warn!(
                    query = %session.query,
                    ?load_type,
                    %error,
                    cause = ?error.source(),
                    "page load failed"
                );
                session.load_states.set(load_type, LoadState::Error(error));
                false
            },
        };

        self.publish();
        if loaded {
            self.prefetch_near_anchor();
        }
    }

    fn publish(&self) {
        let snapshot = match &self.session {
            Some(session) => session.snapshot(),
            None => PagingSnapshot::idle(self.query.clone().unwrap_or_default(), self.generation),
        };
        self.snapshots.send_replace(snapshot);
    }
}
