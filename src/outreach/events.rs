use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Delivered,
    Opened,
    Clicked,
    Bounced,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Delivered => "delivered",
            EventKind::Opened => "opened",
            EventKind::Clicked => "clicked",
            EventKind::Bounced => "bounced",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "delivered" => Some(EventKind::Delivered),
            "opened" => Some(EventKind::Opened),
            "clicked" => Some(EventKind::Clicked),
            "bounced" => Some(EventKind::Bounced),
            _ => None,
        }
    }
}

/// A delivery-provider webhook event, keyed by provider message id and/or
/// the engine's own tracking id.
#[derive(Debug, Clone)]
pub struct DeliveryEvent {
    pub kind: EventKind,
    pub provider_message_id: Option<String>,
    pub tracking_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub reason: Option<String>,
}

/// What happened when an event was applied to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOutcome {
    Applied,
    UnknownRecord,
}
