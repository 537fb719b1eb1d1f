use serde::{Deserialize, Serialize};

/// Membership plan sold by the gym.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: String,
    pub org_id: String,

    pub name: String,

    /// How long one purchase of this plan lasts.
    pub duration_days: u32,

    #[serde(default)]
    pub price: f64,

    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default = "default_true")]
    pub active: bool,

    pub created_at: String,
    pub updated_at: String,
}

pub(crate) fn default_currency() -> String {
    "USD".to_string()
}

pub(crate) fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanRequest {
    pub name: String,
    pub duration_days: u32,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub currency: Option<String>,
}

/// One customer's enrollment in a plan. Expiry is never stored: it is
/// derived from `end_date` against the current day on every read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub id: String,
    pub org_id: String,
    pub customer_id: String,
    pub plan_id: String,

    /// First covered day (`YYYY-MM-DD`).
    pub start_date: String,

    /// Last covered day (`YYYY-MM-DD`), inclusive.
    pub end_date: String,

    #[serde(default)]
    pub price_paid: f64,

    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMembershipRequest {
    pub customer_id: String,
    pub plan_id: String,
    /// Defaults to today.
    #[serde(default)]
    pub start_date: Option<String>,
    /// Defaults to `start_date` plus the plan duration.
    #[serde(default)]
    pub end_date: Option<String>,
    /// Defaults to the plan price.
    #[serde(default)]
    pub price_paid: Option<f64>,
}

/// Display view of a membership: the record joined with the customer and
/// plan names, plus the derived expiry state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipCard {
    pub membership: Membership,
    pub customer_name: String,
    pub plan_name: String,
    /// Whole days until `end_date`; negative once it has passed.
    pub days_remaining: i64,
    pub expired: bool,
}

/// Per-organization membership statistics.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GymStats {
    pub total: usize,
    pub active: usize,
    pub expired: usize,
    /// Active memberships ending within the next 7 days.
    pub expiring_soon: usize,
}
