// src/events.rs

//! A small synchronous publish/subscribe registry shared by the Scheduler
//! and the Adaptive Controller.
//!
//! Delivery is synchronous and in-process: `publish` calls every subscribed
//! handler on the caller's stack, in subscription order. A handler that
//! panics is caught so one bad subscriber cannot poison dispatch for the
//! rest or crash the producer — see `4.4` in the design notes.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tracing::warn;

/// Handle returned by `subscribe`, usable to `unsubscribe` later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber<E> {
    id: SubscriptionId,
    handler: Box<dyn Fn(&E) + Send + Sync>,
}

/// Registry of subscribers for one event type `E`. `E` is expected to be a
/// cheaply-cloneable enum of tagged event variants.
pub struct EventBus<E> {
    subscribers: Mutex<Vec<Subscriber<E>>>,
    next_id: AtomicU64,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        EventBus {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler`, run synchronously on every future `publish`.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.lock().unwrap().push(Subscriber {
            id,
            handler: Box::new(handler),
        });
        id
    }

    /// Removes a previously registered handler. No-op if already removed.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.lock().unwrap().retain(|s| s.id != id);
    }

    /// Calls every subscriber with `event`, in subscription order. A
    /// subscriber panic is caught and logged; it never propagates to the
    /// caller.
    pub fn publish(&self, event: &E) {
        let subscribers = self.subscribers.lock().unwrap();
        for sub in subscribers.iter() {
            let handler = AssertUnwindSafe(&sub.handler);
            if panic::catch_unwind(|| (handler.0)(event)).is_err() {
                warn!("event subscriber panicked; continuing dispatch to remaining subscribers");
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn handlers_run_in_subscription_order() {
        let bus: EventBus<u32> = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let o1 = Arc::clone(&order);
        bus.subscribe(move |e: &u32| o1.lock().unwrap().push(("first", *e)));
        let o2 = Arc::clone(&order);
        bus.subscribe(move |e: &u32| o2.lock().unwrap().push(("second", *e)));

        bus.publish(&42);
        assert_eq!(*order.lock().unwrap(), vec![("first", 42), ("second", 42)]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus: EventBus<u32> = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let id = bus.subscribe(move |_: &u32| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        bus.publish(&1);
        bus.unsubscribe(id);
        bus.publish(&1);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn panicking_subscriber_does_not_stop_others() {
        let bus: EventBus<u32> = EventBus::new();
        bus.subscribe(|_: &u32| panic!("boom"));
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        bus.subscribe(move |_: &u32| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        bus.publish(&7);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
