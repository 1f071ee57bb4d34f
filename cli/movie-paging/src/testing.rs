//! A scripted in-memory page source.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::Semaphore;

use crate::load_state::LoadError;
use crate::page_key::PageKey;
use crate::page_source::{LoadParams, Page, PageSource, PageSourceFactory, PagingItem, PagingState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestItem {
    pub id: u64,
    /// The query that produced this item.
    pub query: String,
}

impl TestItem {
    pub fn new(id: u64, query: &str) -> Self {
        Self {
            id,
            query: query.to_string(),
        }
    }
}

impl PagingItem for TestItem {
    type Id = u64;

    fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Error)]
#[error("scripted failure")]
pub struct ScriptedFailure;

#[derive(Debug, Default)]
struct Script {
    /// Item ids of every page, by query.
    pages: HashMap<String, Vec<Vec<u64>>>,
    /// Number of times a `(query, page)` load fails before it succeeds.
    failures: HashMap<(String, u32), usize>,
    /// Number of times a `(query, page)` load panics before it succeeds.
    panics: HashMap<(String, u32), usize>,
    /// Loads of a gated query wait for a permit.
    gates: HashMap<String, Arc<Semaphore>>,
    calls: Vec<(String, u32)>,
}

/// Creates [`ScriptedSource`]s that share one script.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSources {
    script: Arc<Mutex<Script>>,
}

impl ScriptedSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Results of `query` split into pages of item ids.
    pub fn with_pages(self, query: &str, pages: &[&[u64]]) -> Self {
        self.script
            .lock()
            .unwrap()
            .pages
            .insert(query.to_string(), pages.iter().map(|page| page.to_vec()).collect());
        self
    }

    /// `n_pages` full pages of `page_size` items with ids counting from 1.
    pub fn with_full_pages(self, query: &str, n_pages: u64, page_size: u64) -> Self {
        let pages = (0..n_pages)
            .map(|page| (page * page_size + 1..=(page + 1) * page_size).collect())
            .collect();
        self.script
            .lock()
            .unwrap()
            .pages
            .insert(query.to_string(), pages);
        self
    }

    /// Let the next `times` loads of `page` for `query` fail.
    pub fn fail(&self, query: &str, page: u32, times: usize) {
        self.script
            .lock()
            .unwrap()
            .failures
            .insert((query.to_string(), page), times);
    }

    /// Let the next `times` loads of `page` for `query` panic.
    pub fn panic(&self, query: &str, page: u32, times: usize) {
        self.script
            .lock()
            .unwrap()
            .panics
            .insert((query.to_string(), page), times);
    }

    /// Hold all loads of `query` until permits are added to the returned semaphore.
    pub fn gate(&self, query: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.script
            .lock()
            .unwrap()
            .gates
            .insert(query.to_string(), Arc::clone(&gate));
        gate
    }

    /// Every load started so far as `(query, page)`.
    pub fn calls(&self) -> Vec<(String, u32)> {
        self.script.lock().unwrap().calls.clone()
    }
}

impl PageSourceFactory for ScriptedSources {
    type Source = ScriptedSource;

    fn create(&self, query: &str) -> ScriptedSource {
        ScriptedSource {
            query: query.to_string(),
            script: Arc::clone(&self.script),
        }
    }
}

#[derive(Debug, Default)]
pub struct ScriptedSource {
    query: String,
    script: Arc<Mutex<Script>>,
}

impl ScriptedSource {
    fn respond(&self, params: LoadParams) -> Result<Page<TestItem>, LoadError> {
        let key = params.key.unwrap_or(PageKey::FIRST);
        let mut script = self.script.lock().unwrap();

        if let Some(remaining) = script
            .failures
            .get_mut(&(self.query.clone(), key.get()))
            .filter(|remaining| **remaining > 0)
        {
            *remaining -= 1;
            return Err(LoadError::new(params.key, ScriptedFailure));
        }

        let pages = script.pages.get(&self.query).cloned().unwrap_or_default();
        let ids = pages
            .get(key.get() as usize - 1)
            .cloned()
            .unwrap_or_default();
        Ok(Page {
            items: ids
                .into_iter()
                .map(|id| TestItem::new(id, &self.query))
                .collect(),
            prev_key: key.prev(),
            next_key: key.next(pages.len() as i64),
        })
    }
}

impl PageSource for ScriptedSource {
    type Item = TestItem;

    async fn load(&self, params: LoadParams) -> Result<Page<TestItem>, LoadError> {
        let page = params.key.unwrap_or(PageKey::FIRST).get();
        let gate = {
            let mut script = self.script.lock().unwrap();
            script.calls.push((self.query.clone(), page));
            script.gates.get(&self.query).cloned()
        };
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }

        // Decided under the lock, raised after it is released so the script isn't poisoned.
        let panics = {
            let mut script = self.script.lock().unwrap();
            script
                .panics
                .get_mut(&(self.query.clone(), page))
                .filter(|remaining| **remaining > 0)
                .map(|remaining| *remaining -= 1)
                .is_some()
        };
        if panics {
            panic!("scripted panic loading page {page}");
        }
        self.respond(params)
    }

    fn refresh_key(&self, state: &PagingState<'_, TestItem>) -> Option<PageKey> {
        state.anchor_page_key()
    }
}
