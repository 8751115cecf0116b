//! Notification events raised by presence transitions.
//!
//! The transition engine emits these; the notifier renders them into the
//! message text that goes out over the notification channel.

use serde::{Deserialize, Serialize};

use crate::types::MacAddr;

/// A notification-worthy presence transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum Notification {
    /// A device came back from the dead.
    Reborn { mac: MacAddr, alias: String },
    /// A watched device crossed the dead timeout.
    Dead { mac: MacAddr, alias: String },
    /// A watched device connected for the first time.
    Connected { mac: MacAddr, alias: String },
    /// An unknown device connected for the first time.
    FirstSeen { mac: MacAddr, description: String },
    /// The station came up.
    Started,
}

impl Notification {
    /// Render the message text for the given station.
    pub fn render(&self, station: &str) -> String {
        match self {
            Self::Reborn { mac, alias } => format!("{mac} ({alias}) reborn at {station}"),
            Self::Dead { mac, alias } => format!("{mac} ({alias}) dead at {station}"),
            Self::Connected { mac, alias } => format!("{mac} ({alias}) has connected to {station}"),
            Self::FirstSeen { mac, description } => {
                format!("{mac} ({description}) first connect to {station}")
            }
            Self::Started => format!("{station} lanwatch started"),
        }
    }

    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Reborn { .. } => "reborn",
            Self::Dead { .. } => "dead",
            Self::Connected { .. } => "connected",
            Self::FirstSeen { .. } => "first_seen",
            Self::Started => "started",
        }
    }

    /// New-device notifications are paced when sent in a burst.
    pub fn is_new_device(&self) -> bool {
        matches!(self, Self::Connected { .. } | Self::FirstSeen { .. })
    }
}
