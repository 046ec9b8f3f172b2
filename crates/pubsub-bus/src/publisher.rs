//! # Publisher
//!
//! The write-only ingress handle producers use to put messages on the bus.

use std::sync::Arc;

use async_trait::async_trait;
use pubsub_types::Message;
use tokio::sync::mpsc;
use tracing::{trace, warn};

use crate::error::BusError;
use crate::stats::Counters;

/// Trait for putting messages on a bus.
///
/// The seam producers depend on, so they can be driven by a test double.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Publish a message.
    ///
    /// # Errors
    ///
    /// `BusError::Closed` if the broadcaster is gone.
    async fn publish_message(&self, message: Message) -> Result<(), BusError>;

    /// Total messages accepted by the ingress.
    fn messages_published(&self) -> u64;
}

#[derive(Debug, Clone)]
pub(crate) enum IngressSender {
    Unbounded(mpsc::UnboundedSender<Message>),
    Bounded {
        tx: mpsc::Sender<Message>,
        capacity: usize,
    },
}

pub(crate) enum IngressReceiver {
    Unbounded(mpsc::UnboundedReceiver<Message>),
    Bounded(mpsc::Receiver<Message>),
}

impl IngressReceiver {
    pub(crate) async fn recv(&mut self) -> Option<Message> {
        match self {
            Self::Unbounded(rx) => rx.recv().await,
            Self::Bounded(rx) => rx.recv().await,
        }
    }
}

pub(crate) fn ingress(capacity: Option<usize>) -> (IngressSender, IngressReceiver) {
    match capacity {
        Some(capacity) => {
            let (tx, rx) = mpsc::channel(capacity);
            (
                IngressSender::Bounded { tx, capacity },
                IngressReceiver::Bounded(rx),
            )
        }
        None => {
            let (tx, rx) = mpsc::unbounded_channel();
            (IngressSender::Unbounded(tx), IngressReceiver::Unbounded(rx))
        }
    }
}

/// Ingress handle. Cheap to clone; the bus stays up while any clone lives.
#[derive(Debug, Clone)]
pub struct Publisher {
    sender: IngressSender,
    counters: Arc<Counters>,
}

impl Publisher {
    pub(crate) fn new(sender: IngressSender, counters: Arc<Counters>) -> Self {
        Self { sender, counters }
    }

    /// Enqueue a message for broadcast.
    ///
    /// Returns once the message is in the ingress queue. Suspends only while
    /// a bounded ingress is full.
    ///
    /// # Errors
    ///
    /// `BusError::Closed` if the broadcaster is gone.
    pub async fn publish<M>(&self, message: M) -> Result<(), BusError>
    where
        M: Into<Message>,
    {
        let message = message.into();
        let (id, kind) = (message.id(), message.kind());

        let sent = match &self.sender {
            IngressSender::Unbounded(tx) => tx.send(message).is_ok(),
            IngressSender::Bounded { tx, .. } => tx.send(message).await.is_ok(),
        };
        self.finish(sent, id, kind)
    }

    /// Enqueue a message without waiting.
    ///
    /// # Errors
    ///
    /// - `BusError::IngressFull` if a bounded ingress has no free slot
    /// - `BusError::Closed` if the broadcaster is gone
    pub fn try_publish<M>(&self, message: M) -> Result<(), BusError>
    where
        M: Into<Message>,
    {
        let message = message.into();
        let (id, kind) = (message.id(), message.kind());

        let sent = match &self.sender {
            IngressSender::Unbounded(tx) => tx.send(message).is_ok(),
            IngressSender::Bounded { tx, capacity } => match tx.try_send(message) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    return Err(BusError::IngressFull {
                        capacity: *capacity,
                    })
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            },
        };
        self.finish(sent, id, kind)
    }

    fn finish(
        &self,
        sent: bool,
        id: pubsub_types::MessageId,
        kind: pubsub_types::MessageKind,
    ) -> Result<(), BusError> {
        if sent {
            self.counters.record_published();
            trace!(message_id = %id, kind = %kind, "Message published");
            Ok(())
        } else {
            warn!(message_id = %id, kind = %kind, "Message dropped (bus closed)");
            Err(BusError::Closed)
        }
    }

    /// True once the broadcaster has stopped receiving.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        match &self.sender {
            IngressSender::Unbounded(tx) => tx.is_closed(),
            IngressSender::Bounded { tx, .. } => tx.is_closed(),
        }
    }

    /// Ingress capacity, `None` when unbounded.
    #[must_use]
    pub fn capacity(&self) -> Option<usize> {
        match &self.sender {
            IngressSender::Unbounded(_) => None,
            IngressSender::Bounded { capacity, .. } => Some(*capacity),
        }
    }
}

#[async_trait]
impl MessagePublisher for Publisher {
    async fn publish_message(&self, message: Message) -> Result<(), BusError> {
        self.publish(message).await
    }

    fn messages_published(&self) -> u64 {
        self.counters.published()
    }
}
