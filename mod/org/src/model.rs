use serde::{Deserialize, Serialize};

/// Organization — the tenant boundary. Every business record in every
/// other module carries the id of exactly one organization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,

    /// Display name.
    pub name: String,

    /// URL-safe unique identifier (lowercase letters, digits, hyphens).
    pub slug: String,

    /// ISO 4217 code reports default to when no currency is requested.
    #[serde(default = "default_currency")]
    pub base_currency: String,

    #[serde(default = "default_true")]
    pub active: bool,

    pub created_at: String,
    pub updated_at: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_true() -> bool {
    true
}

/// Request body for creating an organization.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrgRequest {
    pub name: String,

    /// Optional explicit slug; derived from `name` when omitted.
    #[serde(default)]
    pub slug: Option<String>,

    #[serde(default)]
    pub base_currency: Option<String>,
}
