//! # Subscriber Inbox
//!
//! The private queue between the broadcaster and one subscriber.
//!
//! - The broadcaster pushes without ever waiting.
//! - Closing is checked under the same lock as pushing, so once `close()`
//!   returns no later push is accepted.
//! - Items already queued when the inbox closes stay consumable.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::futures::Notified;
use tokio::sync::Notify;

use crate::config::DeliveryPolicy;

/// Result of pushing an item into an inbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Push {
    /// Appended.
    Queued,
    /// Replaced an unconsumed item (latest-only policy).
    Replaced,
    /// Rejected, the inbox is closed.
    Closed,
}

/// Result of taking an item out of an inbox.
#[derive(Debug, PartialEq, Eq)]
pub enum Take<T> {
    /// The oldest pending item.
    Item(T),
    /// Nothing pending yet.
    Empty,
    /// Nothing pending and nothing will ever arrive.
    Closed,
}

#[derive(Debug)]
struct InboxState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// A subscriber's private queue.
#[derive(Debug)]
pub struct Inbox<T> {
    state: Mutex<InboxState<T>>,
    notify: Notify,
    policy: DeliveryPolicy,
}

impl<T> Inbox<T> {
    /// Create an open, empty inbox.
    #[must_use]
    pub fn new(policy: DeliveryPolicy) -> Self {
        Self {
            state: Mutex::new(InboxState {
                items: VecDeque::new(),
                closed: false,
            }),
            notify: Notify::new(),
            policy,
        }
    }

    /// The delivery policy applied on push.
    #[must_use]
    pub fn policy(&self) -> DeliveryPolicy {
        self.policy
    }

    /// Offer an item. Never waits.
    pub fn push(&self, item: T) -> Push {
        let outcome = {
            let mut state = self.state.lock();
            if state.closed {
                return Push::Closed;
            }
            match self.policy {
                DeliveryPolicy::Queued => {
                    state.items.push_back(item);
                    Push::Queued
                }
                DeliveryPolicy::LatestOnly => {
                    let replaced = !state.items.is_empty();
                    state.items.clear();
                    state.items.push_back(item);
                    if replaced {
                        Push::Replaced
                    } else {
                        Push::Queued
                    }
                }
            }
        };
        self.notify.notify_waiters();
        outcome
    }

    /// Take the oldest pending item without waiting.
    pub fn take(&self) -> Take<T> {
        let mut state = self.state.lock();
        match state.items.pop_front() {
            Some(item) => Take::Item(item),
            None if state.closed => Take::Closed,
            None => Take::Empty,
        }
    }

    /// Refuse further pushes and wake every waiter. Idempotent.
    ///
    /// Returns `true` on the call that actually closed the inbox.
    pub fn close(&self) -> bool {
        let newly_closed = {
            let mut state = self.state.lock();
            !std::mem::replace(&mut state.closed, true)
        };
        self.notify.notify_waiters();
        newly_closed
    }

    /// True once closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of pending items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// True if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Future resolved by the next push or close.
    ///
    /// Callers must `enable()` it before checking [`take`](Self::take), so a
    /// push landing between the check and the await is not missed.
    pub(crate) fn notified(&self) -> Notified<'_> {
        self.notify.notified()
    }
}
