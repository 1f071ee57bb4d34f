use futures::Stream;
use tokio::sync::watch;

use crate::snapshot::PagingSnapshot;

/// A subscriber's view of a [`Pager`](crate::Pager).
///
/// Only ever sees the latest snapshot, intermediate ones may be skipped.
/// Dropping a subscription has no effect on the pager or other subscribers.
#[derive(Debug)]
pub struct PagingSubscription<T> {
    receiver: watch::Receiver<PagingSnapshot<T>>,
}

impl<T: Clone> PagingSubscription<T> {
    pub(crate) fn new(mut receiver: watch::Receiver<PagingSnapshot<T>>) -> Self {
        receiver.mark_unchanged();
        Self { receiver }
    }

    /// The latest snapshot.
    pub fn current(&self) -> PagingSnapshot<T> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next snapshot.
    ///
    /// Returns `None` once the pager is closed.
    pub async fn changed(&mut self) -> Option<PagingSnapshot<T>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Wait for a snapshot matching `predicate`, starting with the latest one.
    ///
    /// Returns `None` if the pager closed before.
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&PagingSnapshot<T>) -> bool,
    ) -> Option<PagingSnapshot<T>> {
        let snapshot = self.receiver.wait_for(predicate).await.ok()?;
        Some((*snapshot).clone())
    }

    /// All snapshots from the latest one on, ending when the pager closes.
    pub fn into_stream(mut self) -> impl Stream<Item = PagingSnapshot<T>> {
        async_stream::stream! {
            let current = self.receiver.borrow_and_update().clone();
            yield current;
            while self.receiver.changed().await.is_ok() {
                let snapshot = self.receiver.borrow_and_update().clone();
                yield snapshot;
            }
        }
    }
}
