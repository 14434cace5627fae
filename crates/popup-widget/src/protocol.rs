#![forbid(unsafe_code)]

//! Wire grammar of the page bus.
//!
//! Topics are dot-separated: the event kind, then the action/flag/widget
//! name, then (for flags and visibility) the boolean state. Because `.` is
//! the segment separator, configured names must never contain it; the
//! [`crate::config`] builder enforces this.

use std::fmt;

/// Opaque reference to the element that triggered opening.
///
/// The coordinator never interprets it; it is recorded on open and returned
/// to the caller on a forced close.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnchorId(String);

impl AnchorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnchorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome segment of an action acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Error,
}

impl Outcome {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed payload carried by every bus event this widget sends or receives.
#[derive(Debug, Clone, PartialEq)]
pub enum BusEvent {
    /// A named "take action" command. Open commands carry the anchor.
    TakeAction {
        action: String,
        anchor: Option<AnchorId>,
    },
    /// Acknowledgment for a handled command.
    DidTakeAction { action: String, outcome: Outcome },
    /// Visibility flag broadcast.
    FlagChanged { flag: String, state: bool },
    /// Request that the parent container show or hide this widget.
    WidgetVisibilityRequest { widget: String, visible: bool },
    /// A nested area asks whether it should be visible.
    AreaVisibilityRequest { area: String, visible: bool },
    /// Reply to an area visibility request.
    AreaVisibilityChanged { area: String, visible: bool },
}

/// Topic constructors for the grammar above.
pub mod topics {
    use super::Outcome;

    #[must_use]
    pub fn take_action_request(action: &str) -> String {
        format!("takeActionRequest.{action}")
    }

    #[must_use]
    pub fn did_take_action(action: &str, outcome: Outcome) -> String {
        format!("didTakeAction.{action}.{}", outcome.as_str())
    }

    #[must_use]
    pub fn did_change_flag(flag: &str, state: bool) -> String {
        format!("didChangeFlag.{flag}.{state}")
    }

    #[must_use]
    pub fn change_widget_visibility_request(widget: &str, visible: bool) -> String {
        format!("changeWidgetVisibilityRequest.{widget}.{visible}")
    }

    /// Subscription prefix covering every area hosted by `widget`.
    #[must_use]
    pub fn change_area_visibility_request(widget: &str) -> String {
        format!("changeAreaVisibilityRequest.{widget}")
    }

    #[must_use]
    pub fn did_change_area_visibility(area: &str, visible: bool) -> String {
        format!("didChangeAreaVisibility.{area}.{visible}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_grammar() {
        assert_eq!(topics::take_action_request("myOpen"), "takeActionRequest.myOpen");
        assert_eq!(
            topics::did_take_action("myClose", Outcome::Success),
            "didTakeAction.myClose.SUCCESS"
        );
        assert_eq!(
            topics::did_change_flag("visible-popup", true),
            "didChangeFlag.visible-popup.true"
        );
        assert_eq!(
            topics::change_widget_visibility_request("popup1", false),
            "changeWidgetVisibilityRequest.popup1.false"
        );
        assert_eq!(
            topics::change_area_visibility_request("popup1"),
            "changeAreaVisibilityRequest.popup1"
        );
        assert_eq!(
            topics::did_change_area_visibility("popup1.content", true),
            "didChangeAreaVisibility.popup1.content.true"
        );
    }

    #[test]
    fn anchor_is_opaque() {
        let anchor = AnchorId::new("popup_layer");
        assert_eq!(anchor.as_str(), "popup_layer");
        assert_eq!(anchor.to_string(), "popup_layer");
        assert_eq!(anchor, AnchorId::new(String::from("popup_layer")));
    }
}
