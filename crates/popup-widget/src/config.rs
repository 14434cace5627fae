#![forbid(unsafe_code)]

//! Immutable feature configuration, validated at construction.
//!
//! The widget's behavior is driven entirely by this struct; nothing is read
//! from ambient state after construction. Build it with
//! [`PopupFeatures::builder`], which rejects names that would break the bus
//! topic grammar.

use thiserror::Error;

use crate::layer::Positioning;

/// Configuration rejected at construction time.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("name `{0}` must not contain `.`")]
    InvalidName(String),
}

/// Reject names that cannot be embedded in a dot-separated topic.
pub(crate) fn validate_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::EmptyName);
    }
    if name.contains('.') {
        return Err(ConfigError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Feature configuration declared at widget construction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PopupFeatures {
    open_actions: Vec<String>,
    close_actions: Vec<String>,
    close_icon: bool,
    backdrop_close: bool,
    prevent_body_scrolling: bool,
    auto_focus: bool,
    capture_focus: bool,
    position: Positioning,
    forced_close_action: Option<String>,
    visibility_flag: Option<String>,
}

impl PopupFeatures {
    #[must_use]
    pub fn builder() -> PopupFeaturesBuilder {
        PopupFeaturesBuilder::default()
    }

    /// Action names that open the popup.
    #[must_use]
    pub fn open_actions(&self) -> &[String] {
        &self.open_actions
    }

    /// Action names that close the popup.
    #[must_use]
    pub fn close_actions(&self) -> &[String] {
        &self.close_actions
    }

    #[must_use]
    pub fn close_icon(&self) -> bool {
        self.close_icon
    }

    #[must_use]
    pub fn backdrop_close(&self) -> bool {
        self.backdrop_close
    }

    #[must_use]
    pub fn prevent_body_scrolling(&self) -> bool {
        self.prevent_body_scrolling
    }

    #[must_use]
    pub fn auto_focus(&self) -> bool {
        self.auto_focus
    }

    #[must_use]
    pub fn capture_focus(&self) -> bool {
        self.capture_focus
    }

    #[must_use]
    pub fn position(&self) -> Positioning {
        self.position
    }

    /// Action emitted when the layer is dismissed by the user, if configured.
    #[must_use]
    pub fn forced_close_action(&self) -> Option<&str> {
        self.forced_close_action.as_deref()
    }

    /// Visibility flag name, if configured.
    #[must_use]
    pub fn visibility_flag(&self) -> Option<&str> {
        self.visibility_flag.as_deref()
    }
}

/// Consuming builder for [`PopupFeatures`].
#[derive(Debug, Clone)]
pub struct PopupFeaturesBuilder {
    open_actions: Vec<String>,
    close_actions: Vec<String>,
    close_icon: bool,
    backdrop_close: bool,
    prevent_body_scrolling: bool,
    auto_focus: bool,
    capture_focus: bool,
    position: Positioning,
    forced_close_action: Option<String>,
    visibility_flag: Option<String>,
}

impl Default for PopupFeaturesBuilder {
    fn default() -> Self {
        Self {
            open_actions: Vec::new(),
            close_actions: Vec::new(),
            close_icon: false,
            backdrop_close: false,
            prevent_body_scrolling: false,
            auto_focus: true,
            capture_focus: true,
            position: Positioning::Center,
            forced_close_action: None,
            visibility_flag: None,
        }
    }
}

impl PopupFeaturesBuilder {
    /// Add an action name that opens the popup.
    pub fn open_on_action(mut self, action: impl Into<String>) -> Self {
        self.open_actions.push(action.into());
        self
    }

    /// Add an action name that closes the popup.
    pub fn close_on_action(mut self, action: impl Into<String>) -> Self {
        self.close_actions.push(action.into());
        self
    }

    pub fn close_icon(mut self, enabled: bool) -> Self {
        self.close_icon = enabled;
        self
    }

    pub fn backdrop_close(mut self, enabled: bool) -> Self {
        self.backdrop_close = enabled;
        self
    }

    pub fn prevent_body_scrolling(mut self, enabled: bool) -> Self {
        self.prevent_body_scrolling = enabled;
        self
    }

    pub fn auto_focus(mut self, enabled: bool) -> Self {
        self.auto_focus = enabled;
        self
    }

    pub fn capture_focus(mut self, enabled: bool) -> Self {
        self.capture_focus = enabled;
        self
    }

    pub fn position(mut self, position: Positioning) -> Self {
        self.position = position;
        self
    }

    /// Emit this action when the layer is dismissed by the user.
    pub fn forced_close_action(mut self, action: impl Into<String>) -> Self {
        self.forced_close_action = Some(action.into());
        self
    }

    /// Broadcast this flag on visibility changes.
    pub fn visibility_flag(mut self, flag: impl Into<String>) -> Self {
        self.visibility_flag = Some(flag.into());
        self
    }

    /// Validate and freeze the configuration.
    pub fn build(self) -> Result<PopupFeatures, ConfigError> {
        for name in self.open_actions.iter().chain(self.close_actions.iter()) {
            validate_name(name)?;
        }
        if let Some(action) = &self.forced_close_action {
            validate_name(action)?;
        }
        if let Some(flag) = &self.visibility_flag {
            validate_name(flag)?;
        }

        Ok(PopupFeatures {
            open_actions: self.open_actions,
            close_actions: self.close_actions,
            close_icon: self.close_icon,
            backdrop_close: self.backdrop_close,
            prevent_body_scrolling: self.prevent_body_scrolling,
            auto_focus: self.auto_focus,
            capture_focus: self.capture_focus,
            position: self.position,
            forced_close_action: self.forced_close_action,
            visibility_flag: self.visibility_flag,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let features = PopupFeatures::builder().build().unwrap();
        assert!(features.open_actions().is_empty());
        assert!(features.close_actions().is_empty());
        assert!(!features.close_icon());
        assert!(!features.backdrop_close());
        assert!(!features.prevent_body_scrolling());
        assert!(features.auto_focus());
        assert!(features.capture_focus());
        assert_eq!(features.position(), Positioning::Center);
        assert_eq!(features.forced_close_action(), None);
        assert_eq!(features.visibility_flag(), None);
    }

    #[test]
    fn builder_collects_action_names() {
        let features = PopupFeatures::builder()
            .open_on_action("showHelp")
            .open_on_action("showDetails")
            .close_on_action("dismiss")
            .build()
            .unwrap();
        assert_eq!(features.open_actions(), ["showHelp", "showDetails"]);
        assert_eq!(features.close_actions(), ["dismiss"]);
    }

    #[test]
    fn rejects_empty_action_name() {
        let err = PopupFeatures::builder().open_on_action("").build().unwrap_err();
        assert_eq!(err, ConfigError::EmptyName);
    }

    #[test]
    fn rejects_dotted_names() {
        let err = PopupFeatures::builder()
            .close_on_action("close.now")
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidName("close.now".into()));

        let err = PopupFeatures::builder()
            .visibility_flag("visible.popup")
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidName("visible.popup".into()));

        let err = PopupFeatures::builder()
            .forced_close_action("closed.by.user")
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidName("closed.by.user".into()));
    }

    #[test]
    fn optional_channels_accepted() {
        let features = PopupFeatures::builder()
            .forced_close_action("closedByUser")
            .visibility_flag("visible-popup")
            .build()
            .unwrap();
        assert_eq!(features.forced_close_action(), Some("closedByUser"));
        assert_eq!(features.visibility_flag(), Some("visible-popup"));
    }
}
