//! User-facing notifications.

use serde::{Deserialize, Serialize};

/// Generic description used when a failure carries no message of its own.
pub const FALLBACK_ERROR_DESCRIPTION: &str = "Failed to get response from assistant";

/// Visual weight of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationVariant {
    /// Informational message.
    #[default]
    Default,
    /// Failure the user should notice.
    Destructive,
}

/// A transient, non-blocking message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: NotificationVariant,
}

impl Notification {
    /// Create an informational notification.
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: NotificationVariant::Default,
        }
    }

    /// Create an error notification. Blank descriptions fall back to a
    /// generic message.
    pub fn error(description: impl Into<String>) -> Self {
        let description = description.into();
        let description = if description.trim().is_empty() {
            FALLBACK_ERROR_DESCRIPTION.to_string()
        } else {
            description
        };
        Self {
            title: "Error".into(),
            description,
            variant: NotificationVariant::Destructive,
        }
    }

    /// Whether this notification reports a failure.
    pub fn is_error(&self) -> bool {
        self.variant == NotificationVariant::Destructive
    }
}
