//! User-visible notifications.
//!
//! Toasts are fire-and-forget: they are dispatched as actions and rendered by
//! whatever owns the UI slice.

use serde::{Deserialize, Serialize};

/// Visual intent of a toast.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    /// Neutral
    #[default]
    None,
    /// Highlighted information
    Primary,
    /// The operation succeeded
    Success,
    /// Something needs attention
    Warning,
    /// The operation failed
    Danger,
}

/// A notification shown to the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toast {
    /// Text of the toast
    pub message: String,
    /// Visual intent
    pub intent: Intent,
    /// Optional icon identifier
    pub icon: Option<String>,
}

impl Toast {
    /// A toast with the given intent and no icon.
    #[must_use]
    pub fn new(message: impl Into<String>, intent: Intent) -> Self {
        Self {
            message: message.into(),
            intent,
            icon: None,
        }
    }

    /// A success toast with the `tick-circle` icon.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(message, Intent::Success).with_icon("tick-circle")
    }

    /// A danger toast with the `error` icon.
    #[must_use]
    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(message, Intent::Danger).with_icon("error")
    }

    /// Set the icon.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}
