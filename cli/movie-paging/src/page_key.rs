use std::fmt::Display;

/// A 1-based page number within the results of one query.
///
/// Keys are only meaningful for the query they were issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageKey(u32);

impl PageKey {
    pub const FIRST: PageKey = PageKey(1);

    /// Returns `None` for `0`, pages are counted from `1`.
    pub fn new(page: u32) -> Option<Self> {
        (page >= 1).then_some(PageKey(page))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// The key of the preceding page, `None` for the first page.
    pub fn prev(self) -> Option<PageKey> {
        (self.0 > 1).then(|| PageKey(self.0 - 1))
    }

    /// The key of the following page if the result set has more than `self` pages.
    ///
    /// A `total_pages` of `0` means the query had no results at all.
    pub fn next(self, total_pages: i64) -> Option<PageKey> {
        if i64::from(self.0) < total_pages {
            self.0.checked_add(1).map(PageKey)
        } else {
            None
        }
    }

    /// The key of the following page regardless of the page count.
    pub(crate) fn succ(self) -> PageKey {
        PageKey(self.0.saturating_add(1))
    }
}

impl Default for PageKey {
    fn default() -> Self {
        PageKey::FIRST
    }
}

impl Display for PageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<PageKey> for i64 {
    fn from(key: PageKey) -> Self {
        i64::from(key.0)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn key(page: u32) -> PageKey {
        PageKey::new(page).unwrap()
    }

    #[test]
    fn zero_is_not_a_page() {
        assert_eq!(PageKey::new(0), None);
        assert_eq!(PageKey::new(1), Some(PageKey::FIRST));
    }

    #[test]
    fn single_page_result_has_no_neighbours() {
        assert_eq!(PageKey::FIRST.prev(), None);
        assert_eq!(PageKey::FIRST.next(1), None);
    }

    #[test]
    fn middle_page_has_both_neighbours() {
        assert_eq!(key(2).prev(), Some(key(1)));
        assert_eq!(key(2).next(5), Some(key(3)));
    }

    #[test]
    fn empty_result_has_no_next_page() {
        assert_eq!(PageKey::FIRST.next(0), None);
    }

    proptest! {
        #[test]
        fn next_exists_iff_more_pages(page in 1u32..10_000, total_pages in 0i64..10_000) {
            let next = key(page).next(total_pages);
            prop_assert_eq!(next.is_some(), i64::from(page) < total_pages);
            if let Some(next) = next {
                prop_assert_eq!(next.get(), page + 1);
            }
        }

        #[test]
        fn prev_exists_iff_not_first(page in 1u32..10_000) {
            let prev = key(page).prev();
            prop_assert_eq!(prev.is_none(), page == 1);
            if let Some(prev) = prev {
                prop_assert_eq!(prev.succ(), key(page));
            }
        }
    }
}
