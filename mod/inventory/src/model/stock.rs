use serde::{Deserialize, Serialize};

/// Stock on hand for a product (or one of its variants).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub id: String,
    pub org_id: String,
    pub product_id: String,

    /// Present when the level tracks a single variant rather than the
    /// whole product.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,

    pub quantity: i64,

    /// At or below this quantity the level counts as low stock.
    #[serde(default)]
    pub min_quantity: i64,

    /// Target quantity a replenishment order should restore.
    #[serde(default)]
    pub restock_quantity: i64,

    pub created_at: String,
    pub updated_at: String,
}

/// One signed stock adjustment, kept as an audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: String,
    pub org_id: String,
    pub stock_id: String,
    pub delta: i64,
    pub reason: String,
    /// Level quantity after this movement was applied.
    pub quantity_after: i64,
    pub created_at: String,
}

/// Upsert body for a stock level.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStockRequest {
    pub product_id: String,
    #[serde(default)]
    pub variant_id: Option<String>,
    pub quantity: i64,
    #[serde(default)]
    pub min_quantity: i64,
    #[serde(default)]
    pub restock_quantity: i64,
}

/// Body for `@adjust`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockRequest {
    pub delta: i64,
    pub reason: String,
}

/// One row of the replenishment report: a low stock level joined with
/// its product, plus the suggested order size.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplenishmentItem {
    pub stock: StockLevel,
    pub product_name: String,
    pub product_sku: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_sku: Option<String>,
    /// `restock_quantity - quantity`, floored at zero.
    pub suggested_quantity: i64,
}
