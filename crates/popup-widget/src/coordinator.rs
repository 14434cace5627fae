#![forbid(unsafe_code)]

//! Visibility coordinator: owns the popup state and runs the handshake.
//!
//! States are `Closed`, `Opening`, `Open`; closing is fire-and-forget
//! (instantaneous locally, confirmed later on the bus). The two-phase open
//! handshake is strictly sequential: the visibility flag publish must
//! resolve before the widget-visibility request is issued, and only that
//! request's resolution clears the in-flight marker.
//!
//! # Invariants
//!
//! 1. `is_open` is the externally observable truth; `is_opening` is an
//!    advisory in-flight marker, not a lock (see the close-time note below).
//! 2. The layer configuration is replaced wholesale, never mutated: on every
//!    `open()` (including redundant ones) and when the open handshake
//!    resolves.
//! 3. Every deferred continuation re-checks that the coordinator is still
//!    alive (`Weak` upgrade) before touching state; stale continuations are
//!    silent no-ops.
//! 4. Nested areas are visible from the moment opening starts:
//!    `area_visible() == is_open || is_opening`.
//!
//! # Failure Modes
//!
//! - `close()` fires the handshake without awaiting it, so `is_opening` is
//!   cleared by whichever publish resolution lands last when a close races
//!   an in-flight open. Callers must not treat `is_opening` as a reentrancy
//!   guarantee.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use popup_bus::{Completion, Deferred, EventBus};
use tracing::{debug, trace};

use crate::config::PopupFeatures;
use crate::gateway::ModalGateway;
use crate::layer::LayerConfig;
use crate::protocol::{AnchorId, BusEvent, topics};

/// State owned exclusively by the coordinator; one instance per widget.
struct PopupState {
    is_open: bool,
    is_opening: bool,
    anchor: Option<AnchorId>,
    layer: LayerConfig,
}

struct Shared {
    state: RefCell<PopupState>,
    features: PopupFeatures,
    bus: EventBus<BusEvent>,
    gateway: Rc<dyn ModalGateway>,
    widget: String,
}

/// Coordinates the popup's open/close lifecycle for one widget instance.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct PopupCoordinator {
    shared: Rc<Shared>,
}

/// Non-owning handle used by deferred continuations and layer callbacks.
///
/// Upgrading fails once the widget has been torn down, which is the sole
/// cancellation mechanism for in-flight handshake steps.
#[derive(Clone)]
pub(crate) struct WeakCoordinator(Weak<Shared>);

impl WeakCoordinator {
    pub(crate) fn upgrade(&self) -> Option<PopupCoordinator> {
        self.0.upgrade().map(|shared| PopupCoordinator { shared })
    }
}

impl PopupCoordinator {
    pub(crate) fn new(
        widget: String,
        features: PopupFeatures,
        bus: EventBus<BusEvent>,
        gateway: Rc<dyn ModalGateway>,
    ) -> Self {
        let layer = LayerConfig::inert(&features);
        let coordinator = Self {
            shared: Rc::new(Shared {
                state: RefCell::new(PopupState {
                    is_open: false,
                    is_opening: false,
                    anchor: None,
                    layer,
                }),
                features,
                bus,
                gateway,
                widget,
            }),
        };
        // Replace the inert placeholder with live callbacks.
        coordinator.rebuild_layer();
        coordinator
    }

    pub(crate) fn downgrade(&self) -> WeakCoordinator {
        WeakCoordinator(Rc::downgrade(&self.shared))
    }

    pub(crate) fn features(&self) -> &PopupFeatures {
        &self.shared.features
    }

    /// Whether the open handshake has completed.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.shared.state.borrow().is_open
    }

    /// Whether a visibility handshake is in flight (advisory).
    #[must_use]
    pub fn is_opening(&self) -> bool {
        self.shared.state.borrow().is_opening
    }

    /// Anchor recorded at the most recent open.
    #[must_use]
    pub fn anchor(&self) -> Option<AnchorId> {
        self.shared.state.borrow().anchor.clone()
    }

    /// Current layer configuration (replaced wholesale on transitions).
    #[must_use]
    pub fn layer_config(&self) -> LayerConfig {
        self.shared.state.borrow().layer.clone()
    }

    /// Nested-area visibility responder.
    ///
    /// Children become visible as soon as opening starts, not only once the
    /// handshake has resolved, since they render while the popup animates in.
    #[must_use]
    pub fn area_visible(&self) -> bool {
        let state = self.shared.state.borrow();
        state.is_open || state.is_opening
    }

    /// Open the popup, recording `anchor` as the triggering element.
    ///
    /// Starts the visibility handshake unless the popup is already open; an
    /// open-while-open is idempotent and only refreshes the anchor and the
    /// layer configuration. The layer is rebuilt immediately, before the
    /// handshake resolves, so rendering is never gated on confirmation.
    pub fn open(&self, anchor: Option<AnchorId>) {
        let was_open = {
            let mut state = self.shared.state.borrow_mut();
            let was_open = state.is_open;
            state.anchor = anchor;
            was_open
        };

        if was_open {
            trace!(widget = %self.shared.widget, "open while open; refreshing layer");
        } else {
            debug!(widget = %self.shared.widget, "opening popup");
            let weak = self.downgrade();
            self.publish_visibility(true).then(move || {
                let Some(coordinator) = weak.upgrade() else {
                    return;
                };
                coordinator.shared.state.borrow_mut().is_open = true;
                coordinator.rebuild_layer();
            });
        }

        self.rebuild_layer();
        self.shared.gateway.mark_open();
    }

    /// Close the popup.
    ///
    /// The local state flip is synchronous; the visibility publish is fired
    /// without awaiting the confirmation chain. The gateway is released
    /// unconditionally, so a redundant close still clears the body marker.
    pub fn close(&self) {
        let was_open = self.shared.state.borrow().is_open;
        if was_open {
            debug!(widget = %self.shared.widget, "closing popup");
            self.shared.state.borrow_mut().is_open = false;
            let _ = self.publish_visibility(false);
        }
        self.shared.gateway.mark_closed();
    }

    /// Close path for layer-originated dismissal.
    ///
    /// A forced close (icon, backdrop, keyboard) additionally notifies the
    /// configured forced-close action channel, carrying the anchor recorded
    /// at the most recent open; without a configured channel the
    /// notification is skipped.
    pub(crate) fn handle_layer_closed(&self, forced: bool) {
        self.close();
        if !forced {
            return;
        }
        let Some(action) = self.shared.features.forced_close_action() else {
            return;
        };
        let anchor = self.shared.state.borrow().anchor.clone();
        debug!(widget = %self.shared.widget, action = %action, "popup closed by user");
        let _ = self.shared.bus.publish(
            topics::take_action_request(action),
            BusEvent::TakeAction {
                action: action.to_string(),
                anchor,
            },
        );
    }

    /// Two-phase visibility handshake.
    ///
    /// Marks the handshake in flight, publishes the visibility flag, then —
    /// once that resolved — requests the widget's own visibility from its
    /// parent. The returned completion resolves after the in-flight marker
    /// has been cleared. Either continuation no-ops if the widget was torn
    /// down mid-flight.
    fn publish_visibility(&self, visible: bool) -> Completion {
        self.shared.state.borrow_mut().is_opening = true;

        let done = Deferred::new();
        let completion = done.completion();
        let weak = self.downgrade();

        self.publish_flag(visible).then(move || {
            let Some(coordinator) = weak.upgrade() else {
                return;
            };
            let request = coordinator.request_widget_visibility(visible);
            request.then(move || {
                if let Some(coordinator) = weak.upgrade() {
                    coordinator.shared.state.borrow_mut().is_opening = false;
                }
                done.resolve();
            });
        });

        completion
    }

    /// Publish the visibility flag, or resolve immediately when none is
    /// configured.
    fn publish_flag(&self, state: bool) -> Completion {
        match self.shared.features.visibility_flag() {
            Some(flag) => {
                trace!(flag = %flag, state, "publishing visibility flag");
                self.shared.bus.publish(
                    topics::did_change_flag(flag, state),
                    BusEvent::FlagChanged {
                        flag: flag.to_string(),
                        state,
                    },
                )
            }
            None => Completion::resolved(),
        }
    }

    /// Ask the parent container to show or hide this widget.
    fn request_widget_visibility(&self, visible: bool) -> Completion {
        trace!(widget = %self.shared.widget, visible, "requesting widget visibility");
        self.shared.bus.publish(
            topics::change_widget_visibility_request(&self.shared.widget, visible),
            BusEvent::WidgetVisibilityRequest {
                widget: self.shared.widget.clone(),
                visible,
            },
        )
    }

    /// Recompute the layer configuration, replacing it wholesale.
    pub(crate) fn rebuild_layer(&self) {
        let on_positioned: Rc<dyn Fn()> = {
            let weak = self.downgrade();
            Rc::new(move || {
                if let Some(coordinator) = weak.upgrade() {
                    coordinator.shared.gateway.force_reflow();
                }
            })
        };
        let on_closed: Rc<dyn Fn(bool)> = {
            let weak = self.downgrade();
            Rc::new(move |forced| {
                if let Some(coordinator) = weak.upgrade() {
                    coordinator.handle_layer_closed(forced);
                }
            })
        };

        let layer = LayerConfig::build(&self.shared.features, on_positioned, on_closed);
        self.shared.state.borrow_mut().layer = layer;
    }
}

impl std::fmt::Debug for PopupCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("PopupCoordinator")
            .field("widget", &self.shared.widget)
            .field("is_open", &state.is_open)
            .field("is_opening", &state.is_opening)
            .field("anchor", &state.anchor)
            .finish_non_exhaustive()
    }
}
