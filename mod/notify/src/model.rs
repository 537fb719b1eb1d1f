use serde::{Deserialize, Serialize};

/// Delivery channels a trigger can fan out to. `email` and `webhook`
/// perform real outbound calls; the rest only record a notification row.
pub const CHANNELS: &[&str] = &["email", "webhook", "whatsapp", "sms", "push"];

/// One delivery target: a channel name plus the address, URL, or number
/// the message goes to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChannelConfig {
    pub channel: String,
    pub target: String,
}

/// A standing rule: when an event with `event_code` occurs, render the
/// template and deliver it over the configured channels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventTrigger {
    pub id: String,
    pub org_id: String,

    pub name: String,

    /// Dotted event identifier this trigger listens for, e.g. `stock.low`.
    pub event_code: String,

    pub channels: Vec<ChannelConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,

    /// Minimum minutes between firings. 0 disables the cooldown.
    #[serde(default)]
    pub silent_window_minutes: u32,

    #[serde(default = "default_true")]
    pub active: bool,

    /// Last time this trigger actually dispatched (silenced skips do not
    /// move it).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fired_at: Option<String>,

    pub created_at: String,
    pub updated_at: String,
}

pub(crate) fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTriggerRequest {
    pub name: String,
    pub event_code: String,
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub silent_window_minutes: u32,
}

/// Message template with `{{placeholder}}` tokens resolved against the
/// event payload at dispatch time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationTemplate {
    pub id: String,
    pub org_id: String,

    pub name: String,

    #[serde(default)]
    pub subject: String,

    pub body: String,

    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTemplateRequest {
    pub name: String,
    #[serde(default)]
    pub subject: String,
    pub body: String,
}

/// One delivered (or attempted) message on one channel. This is what the
/// notification feed serves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub org_id: String,

    pub channel: String,
    pub target: String,

    pub title: String,
    pub body: String,

    pub event_code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_id: Option<String>,

    /// `sent`, `failed`, or `logged` (placeholder channels).
    pub status: String,

    #[serde(default)]
    pub read: bool,

    pub created_at: String,
}

/// Audit row written once per trigger per event, whatever the outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TriggerExecution {
    pub id: String,
    pub org_id: String,

    pub trigger_id: String,
    pub event_code: String,

    /// `dispatched`, `silenced`, or `failed`.
    pub outcome: String,

    /// Human-readable summary of what happened per channel.
    #[serde(default)]
    pub detail: String,

    pub executed_at: String,
}
