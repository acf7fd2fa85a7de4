use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Canonical timestamp format for everything persisted or compared as text.
/// Whole-second RFC 3339 in UTC so lexicographic order matches time order.
pub fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_ts(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Best-effort price guidance attached to a discovered business. `Unknown`
/// is a deliberate sentinel: when the business type cannot be confidently
/// classified we never fabricate a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriceEstimate {
    Range { low: u32, high: u32 },
    Unknown,
}

/// A candidate business assembled fresh on every discovery call. It only
/// becomes durable once an outreach attempt is logged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessContact {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub location: String,
    pub category: String,
    pub source_id: Option<String>,
    pub rating: Option<f64>,
    pub price_estimate: PriceEstimate,
    pub opening_hours: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutreachType {
    SearchTriggered,
    SystematicDiscovery,
}

impl OutreachType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutreachType::SearchTriggered => "search_triggered",
            OutreachType::SystematicDiscovery => "systematic_discovery",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "search_triggered" => Some(OutreachType::SearchTriggered),
            "systematic_discovery" => Some(OutreachType::SystematicDiscovery),
            _ => None,
        }
    }
}

/// Delivery lifecycle of one outreach email. `sent → delivered → opened →
/// clicked` is forward-only; `bounced` and `failed` are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    Sent,
    Delivered,
    Opened,
    Clicked,
    Bounced,
    Failed,
}

impl EmailStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailStatus::Sent => "sent",
            EmailStatus::Delivered => "delivered",
            EmailStatus::Opened => "opened",
            EmailStatus::Clicked => "clicked",
            EmailStatus::Bounced => "bounced",
            EmailStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sent" => Some(EmailStatus::Sent),
            "delivered" => Some(EmailStatus::Delivered),
            "opened" => Some(EmailStatus::Opened),
            "clicked" => Some(EmailStatus::Clicked),
            "bounced" => Some(EmailStatus::Bounced),
            "failed" => Some(EmailStatus::Failed),
            _ => None,
        }
    }
}

/// One row of the append-only outreach log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutreachRecord {
    pub id: String,
    pub business_name: String,
    pub business_email: String,
    pub location: String,
    pub outreach_type: OutreachType,
    pub search_query: String,
    pub date_contacted: DateTime<Utc>,
    pub email_status: EmailStatus,
    pub tracking_id: String,
    pub provider_message_id: Option<String>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub opened_at: Option<DateTime<Utc>>,
    pub clicked_at: Option<DateTime<Utc>>,
    pub responded_at: Option<DateTime<Utc>>,
    pub converted_at: Option<DateTime<Utc>>,
    pub bounce_reason: Option<String>,
    pub cooldown_until: DateTime<Utc>,
    pub click_count: i64,
    pub visited_site: bool,
}

/// Counters returned to whoever triggered a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub contacted: u32,
    pub skipped: u32,
    pub failed: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunTrigger {
    Scheduled,
    Manual,
}

impl RunTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunTrigger::Scheduled => "scheduled",
            RunTrigger::Manual => "manual",
        }
    }
}
