//! # Subscription Filter
//!
//! A variant tag check plus an optional predicate over the typed payload.
//! Evaluated once per (message, subscriber) pair at broadcast time, so
//! predicates must be cheap and free of side effects.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use pubsub_types::{Message, MessageKind, Variant};

type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Matches messages of variant `T` that satisfy an optional predicate.
///
/// A predicate must not panic. If it does, the broadcaster abandons that
/// link's delivery of the message and reports a
/// [`BusError::FilterPredicateFailure`](crate::BusError::FilterPredicateFailure);
/// other subscribers are unaffected.
pub struct Filter<T: Variant> {
    predicate: Option<Predicate<T>>,
    _variant: PhantomData<fn() -> T>,
}

impl<T: Variant> Filter<T> {
    /// Accept every message of variant `T`.
    #[must_use]
    pub fn any() -> Self {
        Self {
            predicate: None,
            _variant: PhantomData,
        }
    }

    /// Accept messages of variant `T` for which `predicate` holds.
    #[must_use]
    pub fn with_predicate<F>(predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Some(Arc::new(predicate)),
            _variant: PhantomData,
        }
    }

    /// Accept messages of variant `T` routed to `topic`.
    #[must_use]
    pub fn topic(topic: impl Into<String>) -> Self {
        let topic = topic.into();
        Self::with_predicate(move |message: &T| message.topic() == topic)
    }

    /// The variant tag this filter accepts.
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        T::KIND
    }

    /// True if a user predicate is attached.
    #[must_use]
    pub fn has_predicate(&self) -> bool {
        self.predicate.is_some()
    }

    /// True iff `candidate` is a `T` and passes the predicate, if any.
    #[must_use]
    pub fn matches(&self, candidate: &Message) -> bool {
        self.select(candidate).is_some()
    }

    /// Borrow `candidate` as `T` if it matches.
    pub(crate) fn select<'a>(&self, candidate: &'a Message) -> Option<&'a T> {
        let typed = T::from_message(candidate)?;
        match &self.predicate {
            Some(predicate) if !predicate(typed) => None,
            _ => Some(typed),
        }
    }
}

impl<T: Variant> Default for Filter<T> {
    fn default() -> Self {
        Self::any()
    }
}

impl<T: Variant> Clone for Filter<T> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
            _variant: PhantomData,
        }
    }
}

impl<T: Variant> fmt::Debug for Filter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("kind", &T::KIND)
            .field("has_predicate", &self.has_predicate())
            .finish()
    }
}
