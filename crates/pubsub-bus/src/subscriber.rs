//! # Subscriber
//!
//! A typed, filtered view of the bus with its own private inbox.
//!
//! ## Lifecycle
//!
//! ```text
//! Created ──link──→ Linked ──dispose()/drop──→ Disposed (terminal)
//! ```
//!
//! Disposal stops new arrivals. Items already in the inbox stay consumable;
//! once they are drained, `receive` fails with `BusError::Disposed` instead of
//! waiting forever.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use pubsub_types::Variant;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::broadcaster::{Broadcaster, LinkHandle, LinkId};
use crate::error::BusError;
use crate::filter::Filter;
use crate::inbox::{Inbox, Take};

/// Lifecycle state of a [`Subscriber`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SubscriberState {
    /// Inbox allocated, not yet linked.
    Created = 0,
    /// Receiving from the broadcaster.
    Linked = 1,
    /// Link revoked. Terminal.
    Disposed = 2,
}

impl SubscriberState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Created,
            1 => Self::Linked,
            _ => Self::Disposed,
        }
    }
}

/// A subscription to messages of variant `T`.
///
/// `receive` takes `&self`, so a subscriber can be shared (for example in an
/// `Arc`) between the task consuming it and the one disposing it.
pub struct Subscriber<T: Variant> {
    inbox: Arc<Inbox<T>>,
    link: LinkHandle,
    filter: Filter<T>,
    state: AtomicU8,
}

impl<T: Variant> Subscriber<T> {
    /// Link a fresh inbox to `broadcaster` through `filter`.
    ///
    /// Messages dispatched after this returns are eligible for delivery.
    #[must_use]
    pub fn new(broadcaster: &Broadcaster, filter: Filter<T>) -> Self {
        let inbox = Arc::new(Inbox::new(broadcaster.policy()));
        let state = AtomicU8::new(SubscriberState::Created as u8);

        let link = broadcaster.link(filter.clone(), Arc::clone(&inbox));
        state.store(SubscriberState::Linked as u8, Ordering::Release);

        Self {
            inbox,
            link,
            filter,
            state,
        }
    }

    /// Wait for the next matching message or for `cancel` to fire.
    ///
    /// A cancelled call consumes nothing; calling `receive` again is valid.
    ///
    /// # Errors
    ///
    /// - `BusError::Cancelled` if `cancel` fired first
    /// - `BusError::Disposed` if the subscriber was disposed and is drained
    /// - `BusError::Closed` if the bus is gone and the inbox is drained
    pub async fn receive(&self, cancel: &CancellationToken) -> Result<T, BusError> {
        self.next(Some(cancel)).await
    }

    /// Wait for the next matching message.
    ///
    /// Returns `None` once the subscriber is disposed or the bus is gone and
    /// nothing is left in the inbox.
    pub async fn recv(&self) -> Option<T> {
        self.next(None).await.ok()
    }

    /// Take the next matching message without waiting.
    ///
    /// # Errors
    ///
    /// `BusError::Disposed` or `BusError::Closed` once nothing more can arrive.
    pub fn try_recv(&self) -> Result<Option<T>, BusError> {
        match self.inbox.take() {
            Take::Item(item) => Ok(Some(item)),
            Take::Empty => Ok(None),
            Take::Closed => Err(self.closed_error()),
        }
    }

    async fn next(&self, cancel: Option<&CancellationToken>) -> Result<T, BusError> {
        loop {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                return Err(BusError::Cancelled);
            }

            let notified = self.inbox.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.inbox.take() {
                Take::Item(item) => return Ok(item),
                Take::Closed => return Err(self.closed_error()),
                Take::Empty => {}
            }

            match cancel {
                Some(cancel) => {
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => return Err(BusError::Cancelled),
                        () = notified => {}
                    }
                }
                None => notified.await,
            }
        }
    }

    fn closed_error(&self) -> BusError {
        if self.is_disposed() {
            BusError::Disposed {
                link: self.link.id(),
            }
        } else {
            BusError::Closed
        }
    }

    /// Revoke the link. Idempotent.
    ///
    /// Once this returns, nothing published afterwards reaches this
    /// subscriber. Items already in the inbox remain consumable.
    pub fn dispose(&self) {
        let previous = self
            .state
            .swap(SubscriberState::Disposed as u8, Ordering::AcqRel);
        if SubscriberState::from_u8(previous) == SubscriberState::Disposed {
            return;
        }

        self.link.unlink();
        self.inbox.close();
        let kind = T::KIND;
        debug!(
            link = self.link.id(),
            kind = %kind,
            pending = self.inbox.len(),
            "Subscriber disposed"
        );
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SubscriberState {
        SubscriberState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// True once disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.state() == SubscriberState::Disposed
    }

    /// Messages waiting in the inbox.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inbox.len()
    }

    /// Identifier of this subscriber's link.
    #[must_use]
    pub fn id(&self) -> LinkId {
        self.link.id()
    }

    /// The filter this subscriber was linked with.
    #[must_use]
    pub fn filter(&self) -> &Filter<T> {
        &self.filter
    }

    /// Consume the subscriber as a stream of messages.
    ///
    /// The stream ends when the subscriber can receive nothing more.
    pub fn into_stream(self) -> impl Stream<Item = T> + Send {
        futures::stream::unfold(self, |subscriber| async move {
            let item = subscriber.recv().await?;
            Some((item, subscriber))
        })
    }
}

impl<T: Variant> Drop for Subscriber<T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<T: Variant> fmt::Debug for Subscriber<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id())
            .field("kind", &T::KIND)
            .field("state", &self.state())
            .field("pending", &self.pending())
            .finish()
    }
}
