#![forbid(unsafe_code)]

//! Declarative configuration handed to the popup-layer renderer.
//!
//! [`LayerConfig`] is a value object: the coordinator replaces it wholesale
//! on every relevant transition and never mutates it in place. The renderer
//! consumes the fields and reports back through the two callback slots.

use std::rc::Rc;

use crate::config::PopupFeatures;

/// Vertical placement of the layer, from the `position.vertical` feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Positioning {
    Top,
    #[default]
    Center,
    Bottom,
}

/// Configuration consumed by the layer renderer.
///
/// Outside-click closing is never delegated to the layer: the explicit
/// backdrop-click path on the widget handles it, so `close_by_outside_click`
/// is always `false`.
#[derive(Clone)]
pub struct LayerConfig {
    pub positioning: Positioning,
    pub allowed_positions: Vec<Positioning>,
    pub auto_focus: bool,
    pub capture_focus: bool,
    pub close_by_keyboard: bool,
    pub prevent_body_scrolling: bool,
    pub close_by_outside_click: bool,
    on_positioned: Rc<dyn Fn()>,
    on_closed: Rc<dyn Fn(bool)>,
}

impl LayerConfig {
    /// Derive a configuration from the features, wiring the callback slots.
    pub(crate) fn build(
        features: &PopupFeatures,
        on_positioned: Rc<dyn Fn()>,
        on_closed: Rc<dyn Fn(bool)>,
    ) -> Self {
        Self {
            positioning: features.position(),
            allowed_positions: vec![Positioning::Center],
            auto_focus: features.auto_focus(),
            capture_focus: features.capture_focus(),
            // Keyboard close follows the close-icon feature.
            close_by_keyboard: features.close_icon(),
            prevent_body_scrolling: features.prevent_body_scrolling(),
            close_by_outside_click: false,
            on_positioned,
            on_closed,
        }
    }

    /// A configuration whose callbacks do nothing.
    ///
    /// Placeholder until the coordinator installs live callbacks; never
    /// observed by a renderer after construction.
    pub(crate) fn inert(features: &PopupFeatures) -> Self {
        Self::build(features, Rc::new(|| {}), Rc::new(|_| {}))
    }

    /// Invoked by the renderer after the layer has been laid out.
    pub fn notify_positioned(&self) {
        (self.on_positioned)();
    }

    /// Invoked by the renderer when the layer was dismissed.
    ///
    /// `forced` is true for user-originated dismissal (icon, backdrop,
    /// keyboard), false when the layer closed because it was told to.
    pub fn notify_closed(&self, forced: bool) {
        (self.on_closed)(forced);
    }
}

impl std::fmt::Debug for LayerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerConfig")
            .field("positioning", &self.positioning)
            .field("allowed_positions", &self.allowed_positions)
            .field("auto_focus", &self.auto_focus)
            .field("capture_focus", &self.capture_focus)
            .field("close_by_keyboard", &self.close_by_keyboard)
            .field("prevent_body_scrolling", &self.prevent_body_scrolling)
            .field("close_by_outside_click", &self.close_by_outside_click)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn features() -> PopupFeatures {
        PopupFeatures::builder()
            .close_icon(true)
            .prevent_body_scrolling(true)
            .auto_focus(false)
            .capture_focus(true)
            .position(Positioning::Top)
            .build()
            .unwrap()
    }

    #[test]
    fn fields_pass_through_features() {
        let config = LayerConfig::inert(&features());
        assert_eq!(config.positioning, Positioning::Top);
        assert_eq!(config.allowed_positions, vec![Positioning::Center]);
        assert!(!config.auto_focus);
        assert!(config.capture_focus);
        assert!(config.close_by_keyboard);
        assert!(config.prevent_body_scrolling);
    }

    #[test]
    fn outside_click_close_never_delegated() {
        let config = LayerConfig::inert(&features());
        assert!(!config.close_by_outside_click);

        let disabled = PopupFeatures::builder().build().unwrap();
        assert!(!LayerConfig::inert(&disabled).close_by_outside_click);
    }

    #[test]
    fn keyboard_close_follows_close_icon() {
        let without_icon = PopupFeatures::builder().build().unwrap();
        assert!(!LayerConfig::inert(&without_icon).close_by_keyboard);
    }

    #[test]
    fn callbacks_are_invoked() {
        let positioned = Rc::new(Cell::new(0));
        let closed_forced = Rc::new(Cell::new(None));

        let p = Rc::clone(&positioned);
        let c = Rc::clone(&closed_forced);
        let config = LayerConfig::build(
            &features(),
            Rc::new(move || p.set(p.get() + 1)),
            Rc::new(move |forced| c.set(Some(forced))),
        );

        config.notify_positioned();
        config.notify_positioned();
        assert_eq!(positioned.get(), 2);

        config.notify_closed(true);
        assert_eq!(closed_forced.get(), Some(true));
    }

    #[test]
    fn debug_omits_callbacks() {
        let rendered = format!("{:?}", LayerConfig::inert(&features()));
        assert!(rendered.contains("positioning: Top"));
        assert!(rendered.contains(".."));
    }
}
