#![forbid(unsafe_code)]

//! Visibility state machine for a modal popup widget.
//!
//! A page is composed of independently loaded widgets that talk over a
//! publish/subscribe bus. This crate models exactly one widget instance's
//! coordination logic: opening and closing a popup layer in lockstep with
//! the rest of the page, without ever rendering anything itself.
//!
//! The moving parts:
//!
//! - [`PopupCoordinator`]: owns the popup state (`is_open`, `is_opening`,
//!   anchor, layer configuration) and runs the two-phase visibility
//!   handshake — flag publish, then widget-visibility request, strictly in
//!   that order.
//! - Action channels ([`PopupWidget`] registers them): named "take action"
//!   commands open or close the popup and are acknowledged after their
//!   synchronous portion, never waiting for the handshake.
//! - [`LayerConfig`]: declarative configuration for the external layer
//!   renderer, rebuilt wholesale on every relevant transition, with
//!   `on_positioned`/`on_closed` callbacks feeding back into the
//!   coordinator.
//! - [`ModalGateway`]: injected side-effect collaborator for the
//!   process-wide "a modal is open" marker.
//!
//! Everything is single-threaded and cooperative: asynchronous steps are
//! `popup_bus` completions, and every deferred continuation re-checks that
//! the widget still exists before touching state, so tearing a widget down
//! mid-handshake is always safe.
//!
//! # Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use popup_bus::EventBus;
//! use popup_widget::{BusEvent, NoopGateway, PopupFeatures, PopupWidget};
//!
//! let bus: EventBus<BusEvent> = EventBus::new();
//! let features = PopupFeatures::builder()
//!     .open_on_action("showDetails")
//!     .close_on_action("dismiss")
//!     .visibility_flag("visible-popup")
//!     .build()?;
//! let widget = PopupWidget::new("popup1", features, bus.clone(), Rc::new(NoopGateway))?;
//!
//! // Host loop: deliver bus traffic once per tick.
//! bus.flush();
//! ```

mod actions;
pub mod config;
pub mod coordinator;
pub mod gateway;
pub mod layer;
pub mod protocol;
mod widget;

pub use config::{ConfigError, PopupFeatures, PopupFeaturesBuilder};
pub use coordinator::PopupCoordinator;
pub use gateway::{ModalGateway, NoopGateway};
pub use layer::{LayerConfig, Positioning};
pub use protocol::{AnchorId, BusEvent, Outcome, topics};
pub use widget::PopupWidget;
