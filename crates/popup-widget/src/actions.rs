#![forbid(unsafe_code)]

//! Adapts named bus commands to coordinator calls.
//!
//! One bus channel is registered per configured open/close action name. Both
//! channels acknowledge with `didTakeAction.<action>.SUCCESS` as soon as the
//! synchronous portion of the command has run; the acknowledgment is
//! deliberately decoupled from the visibility handshake.

use popup_bus::{EventBus, Subscription};
use tracing::trace;

use crate::coordinator::PopupCoordinator;
use crate::protocol::{AnchorId, BusEvent, Outcome, topics};

/// Bus subscriptions driving the coordinator; dropped at widget teardown.
pub(crate) struct ActionHandler {
    _subscriptions: Vec<Subscription>,
}

impl ActionHandler {
    pub(crate) fn subscribe(coordinator: &PopupCoordinator, bus: &EventBus<BusEvent>) -> Self {
        let mut subscriptions = Vec::new();

        for action in coordinator.features().open_actions() {
            subscriptions.push(subscribe_open(coordinator, bus, action.clone()));
        }
        for action in coordinator.features().close_actions() {
            subscriptions.push(subscribe_close(coordinator, bus, action.clone()));
        }

        Self {
            _subscriptions: subscriptions,
        }
    }
}

fn subscribe_open(
    coordinator: &PopupCoordinator,
    bus: &EventBus<BusEvent>,
    action: String,
) -> Subscription {
    let weak = coordinator.downgrade();
    let reply_bus = bus.clone();
    bus.subscribe(topics::take_action_request(&action), move |_topic, event| {
        let Some(coordinator) = weak.upgrade() else {
            return;
        };
        trace!(action = %action, "open command received");
        coordinator.open(anchor_of(event));
        acknowledge(&reply_bus, &action);
    })
}

fn subscribe_close(
    coordinator: &PopupCoordinator,
    bus: &EventBus<BusEvent>,
    action: String,
) -> Subscription {
    let weak = coordinator.downgrade();
    let reply_bus = bus.clone();
    bus.subscribe(topics::take_action_request(&action), move |_topic, _event| {
        let Some(coordinator) = weak.upgrade() else {
            return;
        };
        trace!(action = %action, "close command received");
        coordinator.close();
        acknowledge(&reply_bus, &action);
    })
}

/// Anchorless or malformed open commands are accepted as anchor `None`.
fn anchor_of(event: &BusEvent) -> Option<AnchorId> {
    match event {
        BusEvent::TakeAction { anchor, .. } => anchor.clone(),
        _ => None,
    }
}

fn acknowledge(bus: &EventBus<BusEvent>, action: &str) {
    let _ = bus.publish(
        topics::did_take_action(action, Outcome::Success),
        BusEvent::DidTakeAction {
            action: action.to_string(),
            outcome: Outcome::Success,
        },
    );
}
