//! Helpers shared by the integration suites.
//!
//! Mirrors how a consumer uses the bus: a task loops on `receive` until its
//! token fires, recording what arrived and why the loop ended.

use std::sync::Arc;
use std::time::Duration;

use pubsub_bus::{BusError, CancellationToken, Subscriber, Variant};
use tokio::task::JoinHandle;

/// Time given to the broadcaster to fan out before a receive loop is cancelled.
pub const SETTLE: Duration = Duration::from_millis(100);

/// Upper bound for anything a test awaits.
pub const DEADLINE: Duration = Duration::from_secs(5);

/// Everything a receive loop saw.
#[derive(Debug)]
pub struct Drained<T> {
    /// Messages received, in order.
    pub items: Vec<T>,
    /// The error that ended the loop.
    pub end: BusError,
}

impl<T> Drained<T> {
    /// True if the loop ended by cancellation rather than closure.
    #[must_use]
    pub fn cancelled(&self) -> bool {
        self.end == BusError::Cancelled
    }
}

/// Spawn a loop that receives until `receive` fails.
pub fn spawn_receiver<T: Variant>(
    subscriber: Arc<Subscriber<T>>,
    cancel: CancellationToken,
) -> JoinHandle<Drained<T>> {
    tokio::spawn(async move {
        let mut items = Vec::new();
        loop {
            match subscriber.receive(&cancel).await {
                Ok(item) => items.push(item),
                Err(end) => return Drained { items, end },
            }
        }
    })
}

/// Wait [`SETTLE`], cancel, and collect the loop's result.
///
/// # Panics
///
/// Panics if the loop does not finish within [`DEADLINE`] or panicked.
pub async fn settle_and_cancel<T: Variant>(
    cancel: &CancellationToken,
    handle: JoinHandle<Drained<T>>,
) -> Drained<T> {
    tokio::time::sleep(SETTLE).await;
    cancel.cancel();
    join(handle).await
}

/// Collect a receive loop's result.
///
/// # Panics
///
/// Panics if the loop does not finish within [`DEADLINE`] or panicked.
pub async fn join<T: Variant>(handle: JoinHandle<Drained<T>>) -> Drained<T> {
    match tokio::time::timeout(DEADLINE, handle).await {
        Ok(Ok(drained)) => drained,
        Ok(Err(e)) => panic!("receive loop panicked: {e}"),
        Err(_) => panic!("receive loop did not finish within {DEADLINE:?}"),
    }
}
