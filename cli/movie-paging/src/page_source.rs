//! The page source abstraction driven by the [`Pager`](crate::Pager).

use std::future::Future;
use std::hash::Hash;

use crate::load_state::LoadError;
use crate::page_key::PageKey;

/// An item that can be paged.
///
/// Items with the same id are considered the same item,
/// only the first occurrence within a session is kept.
pub trait PagingItem {
    type Id: Eq + Hash + Send + Sync + 'static;

    fn id(&self) -> Self::Id;
}

/// Parameters of a single [`PageSource::load`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadParams {
    /// The page to load, `None` for the first page.
    pub key: Option<PageKey>,
    /// The number of items requested.
    ///
    /// Sources whose backend has a fixed page size may ignore this.
    pub load_size: usize,
}

/// One loaded page and the keys of its neighbours.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub prev_key: Option<PageKey>,
    pub next_key: Option<PageKey>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            prev_key: None,
            next_key: None,
        }
    }
}

/// The pages loaded by a session and the position the consumer last accessed.
#[derive(Debug)]
pub struct PagingState<'a, T> {
    pub pages: &'a [Page<T>],
    /// Index into the concatenated items of `pages`.
    pub anchor_position: Option<usize>,
}

impl<'a, T> PagingState<'a, T> {
    /// The loaded page containing `position`.
    ///
    /// Positions past the end resolve to the last non empty page.
    /// Returns `None` if no items are loaded.
    pub fn closest_page_to_position(&self, position: usize) -> Option<&'a Page<T>> {
        if self.pages.iter().all(|page| page.items.is_empty()) {
            return None;
        }

        let mut remaining = position;
        let mut closest = None;
        for page in self.pages.iter().filter(|page| !page.items.is_empty()) {
            closest = Some(page);
            if remaining < page.items.len() {
                break;
            }
            remaining -= page.items.len();
        }
        closest
    }

    /// The key that reloads the page around the anchor position.
    ///
    /// Derived from the closest page's `prev_key + 1`,
    /// or `next_key - 1` if that page is the first one.
    pub fn anchor_page_key(&self) -> Option<PageKey> {
        let anchor = self.anchor_position?;
        let page = self.closest_page_to_position(anchor)?;
        page.prev_key
            .map(PageKey::succ)
            .or_else(|| page.next_key.and_then(PageKey::prev))
    }
}

/// A source of pages for a single, immutable query.
///
/// A source does not retry by itself,
/// every failure is reported for the one load that failed.
pub trait PageSource: Send + Sync + 'static {
    type Item: PagingItem + Clone + Send + Sync + 'static;

    /// Load the page identified by `params.key`.
    fn load(
        &self,
        params: LoadParams,
    ) -> impl Future<Output = Result<Page<Self::Item>, LoadError>> + Send;

    /// The key to restart from when the session is refreshed,
    /// `None` to start over from the first page.
    fn refresh_key(&self, state: &PagingState<'_, Self::Item>) -> Option<PageKey>;
}

/// Creates a fresh [`PageSource`] for every query.
pub trait PageSourceFactory: Send + 'static {
    type Source: PageSource;

    fn create(&self, query: &str) -> Self::Source;
}

impl<F, S> PageSourceFactory for F
where
    F: Fn(&str) -> S + Send + 'static,
    S: PageSource,
{
    type Source = S;

    fn create(&self, query: &str) -> S {
        self(query)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn key(page: u32) -> Option<PageKey> {
        PageKey::new(page)
    }

    /// Pages `first..first + sizes.len()` with the given number of items each.
    fn pages(first: u32, sizes: &[usize], total_pages: i64) -> Vec<Page<u32>> {
        sizes
            .iter()
            .enumerate()
            .map(|(offset, size)| {
                let page = PageKey::new(first + offset as u32).unwrap();
                Page {
                    items: (0..*size as u32).collect(),
                    prev_key: page.prev(),
                    next_key: page.next(total_pages),
                }
            })
            .collect()
    }

    #[test]
    fn no_anchor_no_key() {
        let pages = pages(1, &[20, 20], 5);
        let state = PagingState {
            pages: &pages,
            anchor_position: None,
        };
        assert_eq!(state.anchor_page_key(), None);
    }

    #[test]
    fn nothing_loaded_no_key() {
        let pages = pages(1, &[0], 0);
        let state = PagingState {
            pages: &pages,
            anchor_position: Some(0),
        };
        assert_eq!(state.closest_page_to_position(0), None);
        assert_eq!(state.anchor_page_key(), None);
    }

    #[test]
    fn anchor_in_second_page() {
        let pages = pages(1, &[20, 20, 20], 5);
        let state = PagingState {
            pages: &pages,
            anchor_position: Some(25),
        };
        assert_eq!(state.anchor_page_key(), key(2));
    }

    #[test]
    fn anchor_in_first_page_uses_next_key() {
        let pages = pages(1, &[20, 20], 5);
        let state = PagingState {
            pages: &pages,
            anchor_position: Some(3),
        };
        // page 1 has no prev key, next key 2 - 1
        assert_eq!(state.anchor_page_key(), key(1));
    }

    #[test]
    fn single_page_has_no_anchor_key() {
        let pages = pages(1, &[4], 1);
        let state = PagingState {
            pages: &pages,
            anchor_position: Some(2),
        };
        assert_eq!(state.anchor_page_key(), None);
    }

    #[test]
    fn anchor_past_end_resolves_to_last_page() {
        let pages = pages(3, &[20, 20], 10);
        let state = PagingState {
            pages: &pages,
            anchor_position: Some(500),
        };
        assert_eq!(state.anchor_page_key(), key(4));
    }

    #[test]
    fn empty_pages_are_skipped() {
        let pages = pages(1, &[20, 0, 20], 5);
        let state = PagingState {
            pages: &pages,
            anchor_position: Some(20),
        };
        assert_eq!(state.anchor_page_key(), key(3));
    }

    proptest! {
        /// With full pages starting at page 1 the anchor key is
        /// the page the anchor falls into.
        #[test]
        fn anchor_key_matches_page_of_position(
            n_pages in 2usize..10,
            page_size in 1usize..30,
            position_seed in 0usize..10_000,
        ) {
            let sizes = vec![page_size; n_pages];
            let pages = pages(1, &sizes, n_pages as i64);
            let position = position_seed % (n_pages * page_size);
            let state = PagingState { pages: &pages, anchor_position: Some(position) };

            let expected = PageKey::new((position / page_size) as u32 + 1);
            prop_assert_eq!(state.anchor_page_key(), expected);
        }
    }
}
