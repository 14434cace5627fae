#![forbid(unsafe_code)]

//! In-process publish/subscribe bus with deferred delivery.
//!
//! Topics are dot-separated hierarchical names (`takeActionRequest.myOpen`).
//! A subscription names a prefix and receives every event whose topic equals
//! the prefix or extends it by further `.`-separated segments. The empty
//! prefix receives everything.
//!
//! Publishing never delivers synchronously: events join a FIFO queue and are
//! delivered by [`EventBus::flush`], which the host calls once per scheduling
//! tick. The completion returned by [`EventBus::publish`] resolves after the
//! event's handlers have run, so chained continuations observe strictly
//! sequential delivery.
//!
//! # Invariants
//!
//! 1. Delivery order is publish order (FIFO), including events published by
//!    handlers during the same flush pass.
//! 2. A publish's completion resolves after all matching handlers ran for
//!    that event, and before the next queued event is delivered.
//! 3. Dropping a [`Subscription`] removes the handler before the next
//!    delivery.
//! 4. `flush()` re-entered from a handler is a no-op; the outer pass keeps
//!    draining.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::completion::{Completion, Deferred};

type Handler<P> = Rc<dyn Fn(&str, &P)>;

struct Subscriber<P> {
    id: u64,
    prefix: String,
    handler: Handler<P>,
}

struct Pending<P> {
    topic: String,
    payload: P,
    done: Deferred,
}

struct BusInner<P> {
    subscribers: Vec<Subscriber<P>>,
    queue: VecDeque<Pending<P>>,
    next_id: u64,
    flushing: bool,
}

/// Shared handle to a single-threaded event bus.
///
/// Clones share the same subscriber registry and queue.
pub struct EventBus<P> {
    inner: Rc<RefCell<BusInner<P>>>,
}

impl<P> Clone for EventBus<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<P> Default for EventBus<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> std::fmt::Debug for EventBus<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventBus")
            .field("subscribers", &inner.subscribers.len())
            .field("pending", &inner.queue.len())
            .finish()
    }
}

impl<P> EventBus<P> {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(BusInner {
                subscribers: Vec::new(),
                queue: VecDeque::new(),
                next_id: 1,
                flushing: false,
            })),
        }
    }

    /// Number of queued, undelivered events.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.borrow().queue.len()
    }
}

impl<P: 'static> EventBus<P> {
    /// Subscribe a handler to a topic prefix.
    ///
    /// The handler receives the full topic and the payload. Delivery stops
    /// when the returned [`Subscription`] is dropped.
    pub fn subscribe(
        &self,
        prefix: impl Into<String>,
        handler: impl Fn(&str, &P) + 'static,
    ) -> Subscription {
        let prefix = prefix.into();
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribers.push(Subscriber {
                id,
                prefix,
                handler: Rc::new(handler),
            });
            id
        };

        let weak: Weak<RefCell<BusInner<P>>> = Rc::downgrade(&self.inner);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.borrow_mut().subscribers.retain(|s| s.id != id);
                }
            })),
        }
    }

    /// Queue an event for delivery on the next flush.
    ///
    /// The returned completion resolves once the event has been delivered to
    /// all matching handlers.
    pub fn publish(&self, topic: impl Into<String>, payload: P) -> Completion {
        let topic = topic.into();
        trace!(topic = %topic, "event queued");
        let done = Deferred::new();
        let completion = done.completion();
        self.inner.borrow_mut().queue.push_back(Pending {
            topic,
            payload,
            done,
        });
        completion
    }

    /// Deliver all queued events, in FIFO order, until the queue is empty.
    ///
    /// Events published by handlers during the pass are delivered by the same
    /// pass. Returns the number of events delivered; returns 0 immediately if
    /// called re-entrantly from a handler.
    pub fn flush(&self) -> usize {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.flushing {
                return 0;
            }
            inner.flushing = true;
        }

        let mut delivered = 0;
        loop {
            let pending = self.inner.borrow_mut().queue.pop_front();
            let Some(pending) = pending else { break };

            let handlers: Vec<Handler<P>> = self
                .inner
                .borrow()
                .subscribers
                .iter()
                .filter(|s| topic_matches(&s.prefix, &pending.topic))
                .map(|s| Rc::clone(&s.handler))
                .collect();

            trace!(topic = %pending.topic, handlers = handlers.len(), "delivering event");
            for handler in handlers {
                handler(&pending.topic, &pending.payload);
            }
            pending.done.resolve();
            delivered += 1;
        }

        self.inner.borrow_mut().flushing = false;
        delivered
    }
}

/// Whether `topic` equals `prefix` or extends it by `.`-separated segments.
fn topic_matches(prefix: &str, topic: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    topic == prefix
        || (topic.len() > prefix.len()
            && topic.starts_with(prefix)
            && topic.as_bytes()[prefix.len()] == b'.')
}

/// RAII subscription handle; dropping it unsubscribes.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn spy(bus: &EventBus<String>, prefix: &str) -> (Subscription, Rc<RefCell<Vec<String>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sub = bus.subscribe(prefix, move |topic, _payload| {
            sink.borrow_mut().push(topic.to_string());
        });
        (sub, seen)
    }

    #[test]
    fn publish_is_deferred_until_flush() {
        let bus: EventBus<String> = EventBus::new();
        let (_sub, seen) = spy(&bus, "topic");

        bus.publish("topic", String::new());
        assert!(seen.borrow().is_empty());
        assert_eq!(bus.pending(), 1);

        assert_eq!(bus.flush(), 1);
        assert_eq!(*seen.borrow(), vec!["topic".to_string()]);
        assert_eq!(bus.pending(), 0);
    }

    #[test]
    fn fifo_delivery_order() {
        let bus: EventBus<String> = EventBus::new();
        let (_sub, seen) = spy(&bus, "");

        bus.publish("a", String::new());
        bus.publish("b", String::new());
        bus.publish("c", String::new());
        bus.flush();

        assert_eq!(*seen.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn prefix_matches_exact_and_child_segments() {
        assert!(topic_matches("takeActionRequest", "takeActionRequest"));
        assert!(topic_matches("takeActionRequest", "takeActionRequest.open"));
        assert!(topic_matches("didChangeFlag.visible", "didChangeFlag.visible.true"));
        assert!(!topic_matches("takeActionRequest.open", "takeActionRequest.openX"));
        assert!(!topic_matches("takeActionRequest.open", "takeActionRequest"));
        assert!(topic_matches("", "anything.at.all"));
    }

    #[test]
    fn completion_resolves_after_handlers() {
        let bus: EventBus<String> = EventBus::new();
        let handler_ran = Rc::new(Cell::new(false));
        let resolved_saw_handler = Rc::new(Cell::new(false));

        let flag = Rc::clone(&handler_ran);
        let _sub = bus.subscribe("t", move |_, _| flag.set(true));

        let handler = Rc::clone(&handler_ran);
        let saw = Rc::clone(&resolved_saw_handler);
        bus.publish("t", String::new()).then(move || saw.set(handler.get()));

        bus.flush();
        assert!(resolved_saw_handler.get());
    }

    #[test]
    fn handler_publishes_within_same_flush() {
        let bus: EventBus<String> = EventBus::new();
        let (_all, seen) = spy(&bus, "");

        let relay = bus.clone();
        let _sub = bus.subscribe("ping", move |_, _| {
            relay.publish("pong", String::new());
        });

        bus.publish("ping", String::new());
        let delivered = bus.flush();
        assert_eq!(delivered, 2);
        assert_eq!(*seen.borrow(), vec!["ping", "pong"]);
    }

    #[test]
    fn nested_flush_is_noop() {
        let bus: EventBus<String> = EventBus::new();
        let nested = Rc::new(Cell::new(usize::MAX));

        let inner_bus = bus.clone();
        let nested_result = Rc::clone(&nested);
        let _sub = bus.subscribe("t", move |_, _| {
            nested_result.set(inner_bus.flush());
        });

        bus.publish("t", String::new());
        assert_eq!(bus.flush(), 1);
        assert_eq!(nested.get(), 0, "re-entrant flush must deliver nothing");
    }

    #[test]
    fn dropped_subscription_stops_delivery() {
        let bus: EventBus<String> = EventBus::new();
        let (sub, seen) = spy(&bus, "t");

        bus.publish("t", String::new());
        bus.flush();
        assert_eq!(seen.borrow().len(), 1);

        drop(sub);
        bus.publish("t", String::new());
        bus.flush();
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn multiple_subscribers_all_receive() {
        let bus: EventBus<String> = EventBus::new();
        let (_s1, seen1) = spy(&bus, "t");
        let (_s2, seen2) = spy(&bus, "");

        bus.publish("t.child", String::new());
        bus.flush();
        assert_eq!(seen1.borrow().len(), 1);
        assert_eq!(seen2.borrow().len(), 1);
    }

    #[test]
    fn payload_passed_through() {
        let bus: EventBus<u32> = EventBus::new();
        let seen = Rc::new(Cell::new(0));
        let sink = Rc::clone(&seen);
        let _sub = bus.subscribe("n", move |_, value| sink.set(*value));

        bus.publish("n", 42);
        bus.flush();
        assert_eq!(seen.get(), 42);
    }
}
