//! Link resolution
//!
//! A link names a route and its parameters. Resolution never fails: a link
//! whose path cannot be built degrades to `"#"` and is marked invalid.

use serde::Serialize;

/// Marker for links whose required parameters are missing
pub const MISSING_PARAMS: &str = "missing-params";

/// Resolved link target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Href {
    /// Target URL in the active URL mode
    pub href: String,
    /// Why the link is invalid, if it is
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid: Option<&'static str>,
}

impl Href {
    /// A navigable link
    pub fn valid(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            invalid: None,
        }
    }

    /// A placeholder for a link missing parameters
    pub fn missing_params() -> Self {
        Self {
            href: "#".to_string(),
            invalid: Some(MISSING_PARAMS),
        }
    }

    /// Check if the link can be followed
    pub fn is_valid(&self) -> bool {
        self.invalid.is_none()
    }
}

/// Mouse button of a click
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MouseButton {
    /// Usually the left button
    #[default]
    Primary,
    /// Usually the wheel button
    Auxiliary,
    /// Usually the right button
    Secondary,
}

/// Modifier keys held during a click
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Meta / command key
    pub meta: bool,
    /// Alt / option key
    pub alt: bool,
    /// Control key
    pub ctrl: bool,
    /// Shift key
    pub shift: bool,
}

impl Modifiers {
    /// Check if any modifier is held
    pub fn any(&self) -> bool {
        self.meta || self.alt || self.ctrl || self.shift
    }
}

/// A click on a link
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkClick {
    /// Button pressed
    pub button: MouseButton,
    /// Modifiers held
    pub modifiers: Modifiers,
    /// Link target attribute
    pub target: Option<String>,
    /// Another handler already claimed the click
    pub default_prevented: bool,
}

impl LinkClick {
    /// Plain primary-button click
    pub fn primary() -> Self {
        Self::default()
    }

    /// Set the target attribute
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set held modifiers
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Set the button
    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    /// Whether the router should handle this click instead of the host
    ///
    /// Only unclaimed, unmodified primary clicks on same-frame links qualify.
    pub fn should_intercept(&self) -> bool {
        let same_frame = match self.target.as_deref() {
            None | Some("") | Some("_self") => true,
            Some(_) => false,
        };
        !self.default_prevented
            && self.button == MouseButton::Primary
            && !self.modifiers.any()
            && same_frame
    }
}
