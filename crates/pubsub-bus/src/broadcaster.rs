//! # Broadcaster
//!
//! The fan-out engine. One worker task drains the ingress queue and offers
//! each message to every linked subscriber.
//!
//! ## Rules
//!
//! - **Ordered:** messages are dispatched in ingress arrival order.
//! - **Snapshot:** each dispatch works on a copy of the link set taken under
//!   the read lock. Links added mid-dispatch may miss that message.
//! - **Unlink is final:** unlinking closes the destination inbox under its own
//!   lock, so an offer that starts after `unlink()` returns is rejected.
//! - **Contained predicate failures:** a panicking predicate abandons only that
//!   link's copy of the message.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use pubsub_types::{Message, MessageKind, Variant};
use tracing::{debug, error, info, trace, warn};

use crate::config::{BusConfig, DeliveryPolicy};
use crate::error::BusError;
use crate::filter::Filter;
use crate::inbox::{Inbox, Push};
use crate::publisher::{ingress, IngressReceiver, Publisher};
use crate::stats::{BusStats, Counters, DispatchReport};

/// Identifier of one broadcaster → subscriber link.
pub type LinkId = u64;

/// Outcome of offering a message to one link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// The filter rejected the message.
    Skipped,
    /// A copy was queued.
    Delivered,
    /// A copy replaced an unconsumed one (latest-only policy).
    Replaced,
    /// The destination is closed.
    Closed,
}

/// A type-erased destination the broadcaster can offer messages to.
pub(crate) trait LinkTarget: Send + Sync {
    fn kind(&self) -> MessageKind;

    fn offer(&self, message: &Message) -> Offer;

    fn close(&self) -> bool;
}

struct FilteredLink<T: Variant> {
    filter: Filter<T>,
    inbox: Arc<Inbox<T>>,
}

impl<T: Variant> LinkTarget for FilteredLink<T> {
    fn kind(&self) -> MessageKind {
        T::KIND
    }

    fn offer(&self, message: &Message) -> Offer {
        let Some(typed) = self.filter.select(message) else {
            return Offer::Skipped;
        };
        match self.inbox.push(typed.deep_copy()) {
            Push::Queued => Offer::Delivered,
            Push::Replaced => Offer::Replaced,
            Push::Closed => Offer::Closed,
        }
    }

    fn close(&self) -> bool {
        self.inbox.close()
    }
}

#[derive(Default)]
struct LinkSet {
    links: BTreeMap<LinkId, Arc<dyn LinkTarget>>,
    stopped: bool,
}

struct Shared {
    links: RwLock<LinkSet>,
    next_link: AtomicU64,
    counters: Arc<Counters>,
    policy: DeliveryPolicy,
}

impl Shared {
    fn snapshot(&self) -> Vec<(LinkId, Arc<dyn LinkTarget>)> {
        self.links
            .read()
            .links
            .iter()
            .map(|(id, link)| (*id, Arc::clone(link)))
            .collect()
    }

    fn dispatch(&self, message: &Message) -> DispatchReport {
        let mut report = DispatchReport::default();

        for (id, link) in self.snapshot() {
            report.offered += 1;
            match catch_unwind(AssertUnwindSafe(|| link.offer(message))) {
                Ok(Offer::Delivered) => report.delivered += 1,
                Ok(Offer::Replaced) => {
                    report.delivered += 1;
                    report.replaced += 1;
                    debug!(
                        link = id,
                        message_id = %message.id(),
                        "Pending message replaced (latest-only)"
                    );
                }
                Ok(Offer::Skipped | Offer::Closed) => {}
                Err(panic) => {
                    report.failures += 1;
                    let failure = BusError::FilterPredicateFailure {
                        link: id,
                        reason: panic_reason(panic.as_ref()),
                    };
                    warn!(
                        link = id,
                        kind = %link.kind(),
                        message_id = %message.id(),
                        error = %failure,
                        "Delivery abandoned for one subscriber"
                    );
                }
            }
        }

        self.counters.record_dispatch(&report);
        trace!(
            message_id = %message.id(),
            kind = %message.kind(),
            topic = message.topic(),
            offered = report.offered,
            delivered = report.delivered,
            "Message dispatched"
        );
        report
    }

    fn unlink(&self, id: LinkId) {
        let mut set = self.links.write();
        match set.links.remove(&id) {
            Some(link) => {
                link.close();
                debug!(link = id, "Subscriber unlinked");
            }
            None if set.stopped => debug!(link = id, "Unlink after broadcaster stopped"),
            None => error!(link = id, "Link missing from broadcaster on unlink"),
        }
    }

    fn close_all(&self) {
        let mut set = self.links.write();
        set.stopped = true;
        for (_, link) in std::mem::take(&mut set.links) {
            link.close();
        }
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(reason) = payload.downcast_ref::<&str>() {
        (*reason).to_string()
    } else if let Some(reason) = payload.downcast_ref::<String>() {
        reason.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Handle to the fan-out engine.
///
/// Cheap to clone. Subscribers link through it; messages enter through the
/// [`Publisher`] returned by [`Broadcaster::spawn`].
#[derive(Clone)]
pub struct Broadcaster {
    shared: Arc<Shared>,
}

impl Broadcaster {
    fn new(policy: DeliveryPolicy) -> Self {
        Self {
            shared: Arc::new(Shared {
                links: RwLock::new(LinkSet::default()),
                next_link: AtomicU64::new(1),
                counters: Arc::new(Counters::default()),
                policy,
            }),
        }
    }

    /// Create a broadcaster and start its worker task.
    ///
    /// The worker runs until every [`Publisher`] is dropped, then dispatches
    /// what is left in the ingress, closes all inboxes and exits.
    ///
    /// # Errors
    ///
    /// `BusError::InvalidConfig` if `config` fails validation.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn spawn(config: &BusConfig) -> Result<(Self, Publisher), BusError> {
        config.validate()?;

        let broadcaster = Self::new(config.delivery);
        let (sender, receiver) = ingress(config.ingress_capacity);
        let publisher = Publisher::new(sender, Arc::clone(&broadcaster.shared.counters));

        tokio::spawn(run(Arc::clone(&broadcaster.shared), receiver));
        info!(
            delivery = %config.delivery,
            ingress_capacity = ?config.ingress_capacity,
            "Broadcaster started"
        );

        Ok((broadcaster, publisher))
    }

    /// Register `inbox` as a destination for messages matching `filter`.
    ///
    /// The link is active as soon as this returns. If the worker has already
    /// stopped, the inbox is closed immediately instead.
    pub fn link<T: Variant>(&self, filter: Filter<T>, inbox: Arc<Inbox<T>>) -> LinkHandle {
        let id = self.shared.next_link.fetch_add(1, Ordering::Relaxed);
        let kind = T::KIND;
        let has_predicate = filter.has_predicate();
        let target: Arc<dyn LinkTarget> = Arc::new(FilteredLink { filter, inbox });

        let mut set = self.shared.links.write();
        if set.stopped {
            target.close();
            debug!(link = id, "Link refused, broadcaster stopped");
        } else {
            set.links.insert(id, target);
            debug!(link = id, kind = %kind, has_predicate, "Subscriber linked");
        }
        drop(set);

        LinkHandle {
            id,
            shared: Arc::downgrade(&self.shared),
            unlinked: AtomicBool::new(false),
        }
    }

    /// Delivery policy applied to inboxes created for this broadcaster.
    #[must_use]
    pub fn policy(&self) -> DeliveryPolicy {
        self.shared.policy
    }

    /// Number of currently linked subscribers.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.shared.links.read().links.len()
    }

    /// True until the worker has stopped.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.shared.links.read().stopped
    }

    /// Activity counters.
    #[must_use]
    pub fn stats(&self) -> BusStats {
        self.shared.counters.snapshot(self.link_count())
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("policy", &self.shared.policy)
            .field("links", &self.link_count())
            .field("running", &self.is_running())
            .finish()
    }
}

async fn run(shared: Arc<Shared>, mut ingress: IngressReceiver) {
    while let Some(message) = ingress.recv().await {
        shared.dispatch(&message);
    }

    shared.close_all();
    info!("Broadcaster stopped, all subscriber inboxes closed");
}

/// Registration of one destination with a [`Broadcaster`].
///
/// Unlinks on drop.
pub struct LinkHandle {
    id: LinkId,
    shared: Weak<Shared>,
    unlinked: AtomicBool,
}

impl LinkHandle {
    /// Identifier of this link.
    #[must_use]
    pub fn id(&self) -> LinkId {
        self.id
    }

    /// Deregister the destination and close it. Idempotent.
    ///
    /// Returns `true` on the call that performed the unlink.
    pub fn unlink(&self) -> bool {
        if self.unlinked.swap(true, Ordering::AcqRel) {
            return false;
        }
        match self.shared.upgrade() {
            Some(shared) => shared.unlink(self.id),
            None => debug!(link = self.id, "Broadcaster already gone on unlink"),
        }
        true
    }

    /// True once [`unlink`](Self::unlink) has run.
    #[must_use]
    pub fn is_unlinked(&self) -> bool {
        self.unlinked.load(Ordering::Acquire)
    }
}

impl Drop for LinkHandle {
    fn drop(&mut self) {
        self.unlink();
    }
}

impl std::fmt::Debug for LinkHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkHandle")
            .field("id", &self.id)
            .field("unlinked", &self.is_unlinked())
            .finish()
    }
}
