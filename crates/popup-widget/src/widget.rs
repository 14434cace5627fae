#![forbid(unsafe_code)]

//! Widget assembly: coordinator, bus subscriptions, and teardown.

use std::rc::Rc;

use popup_bus::{EventBus, Subscription};
use tracing::debug;

use crate::actions::ActionHandler;
use crate::config::{ConfigError, PopupFeatures, validate_name};
use crate::coordinator::PopupCoordinator;
use crate::gateway::ModalGateway;
use crate::layer::LayerConfig;
use crate::protocol::{BusEvent, topics};

/// One popup widget instance on a page.
///
/// Owns the coordinator and all bus subscriptions. Dropping the widget runs
/// the same path as an external close command, so the gateway marker is
/// always released and a final visibility-flag `false` is published; any
/// handshake still in flight afterwards resolves into silent no-ops.
pub struct PopupWidget {
    coordinator: PopupCoordinator,
    _actions: ActionHandler,
    _area_subscription: Subscription,
}

impl PopupWidget {
    /// Construct the widget and register its bus channels.
    ///
    /// `widget_id` names this widget instance in visibility topics; it must
    /// be non-empty and free of `.`.
    pub fn new(
        widget_id: impl Into<String>,
        features: PopupFeatures,
        bus: EventBus<BusEvent>,
        gateway: Rc<dyn ModalGateway>,
    ) -> Result<Self, ConfigError> {
        let widget_id = widget_id.into();
        validate_name(&widget_id)?;
        debug!(widget = %widget_id, "constructing popup widget");

        let coordinator = PopupCoordinator::new(widget_id.clone(), features, bus.clone(), gateway);
        let actions = ActionHandler::subscribe(&coordinator, &bus);
        let area_subscription = subscribe_area_visibility(&coordinator, &bus, &widget_id);

        Ok(Self {
            coordinator,
            _actions: actions,
            _area_subscription: area_subscription,
        })
    }

    /// The coordinator owning this widget's popup state.
    #[must_use]
    pub fn coordinator(&self) -> &PopupCoordinator {
        &self.coordinator
    }

    /// Current layer configuration for the rendering collaborator.
    #[must_use]
    pub fn layer_config(&self) -> LayerConfig {
        self.coordinator.layer_config()
    }

    /// Close-icon click from the DOM. No-op while the feature is disabled;
    /// otherwise a forced close.
    pub fn handle_close_icon_clicked(&self) {
        if !self.coordinator.features().close_icon() {
            return;
        }
        self.coordinator.handle_layer_closed(true);
    }

    /// Backdrop click from the DOM. No-op while the feature is disabled;
    /// otherwise a forced close.
    pub fn handle_backdrop_clicked(&self) {
        if !self.coordinator.features().backdrop_close() {
            return;
        }
        self.coordinator.handle_layer_closed(true);
    }
}

impl Drop for PopupWidget {
    fn drop(&mut self) {
        // Same handler path as an external close command.
        self.coordinator.close();
    }
}

impl std::fmt::Debug for PopupWidget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PopupWidget")
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}

/// Answer visibility requests from areas nested inside this widget.
fn subscribe_area_visibility(
    coordinator: &PopupCoordinator,
    bus: &EventBus<BusEvent>,
    widget_id: &str,
) -> Subscription {
    let weak = coordinator.downgrade();
    let reply_bus = bus.clone();
    bus.subscribe(
        topics::change_area_visibility_request(widget_id),
        move |_topic, event| {
            let Some(coordinator) = weak.upgrade() else {
                return;
            };
            let BusEvent::AreaVisibilityRequest { area, .. } = event else {
                return;
            };
            let visible = coordinator.area_visible();
            let _ = reply_bus.publish(
                topics::did_change_area_visibility(area, visible),
                BusEvent::AreaVisibilityChanged {
                    area: area.clone(),
                    visible,
                },
            );
        },
    )
}
