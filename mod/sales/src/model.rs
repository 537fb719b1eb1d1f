use serde::{Deserialize, Serialize};

/// One recorded sale. `total` is always `quantity * unit_price`, computed
/// at recording time and never taken from the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    pub org_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,

    /// What was sold, as shown on reports.
    pub description: String,

    pub quantity: f64,
    pub unit_price: f64,
    pub currency: String,
    pub total: f64,

    /// When the sale happened (RFC 3339). Reports group by its date part.
    pub sold_at: String,

    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleRequest {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
    pub description: String,
    /// Defaults to 1.
    #[serde(default)]
    pub quantity: Option<f64>,
    pub unit_price: f64,
    /// Defaults to the organization's base currency.
    #[serde(default)]
    pub currency: Option<String>,
    /// Defaults to now.
    #[serde(default)]
    pub sold_at: Option<String>,
}

/// A stored exchange rate: 1 `base` = `rate` `quote`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub id: String,
    pub org_id: String,
    pub base: String,
    pub quote: String,
    pub rate: f64,
    pub fetched_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertRateRequest {
    pub base: String,
    pub quote: String,
    pub rate: f64,
}

/// Result of a currency conversion.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    pub amount: f64,
    pub from: String,
    pub to: String,
    pub rate: f64,
    pub converted: f64,
}

/// Revenue summary over a date range, converted into one currency.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    pub from: String,
    pub to: String,
    pub currency: String,
    pub sale_count: usize,
    pub revenue: f64,
    pub average_sale: f64,
    pub daily: Vec<DailyRevenue>,
    pub top_products: Vec<TopProduct>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenue {
    pub day: String,
    pub revenue: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    pub description: String,
    pub revenue: f64,
    pub quantity: f64,
}

/// Flat projection of the trailing daily revenue average.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastReport {
    pub currency: String,
    pub window_days: i64,
    pub horizon_days: i64,
    pub daily_average: f64,
    pub projected: Vec<ProjectedDay>,
    pub projected_total: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectedDay {
    pub day: String,
    pub revenue: f64,
}
