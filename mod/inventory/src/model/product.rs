use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One attribute axis of a product, e.g. `size: [S, M, L]`.
/// The cartesian product of all axes defines the variant matrix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttributeAxis {
    pub name: String,
    pub options: Vec<String>,
}

/// Product — a sellable item, optionally carrying attribute axes that
/// expand into variants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub org_id: String,

    pub name: String,

    /// Stock-keeping unit, unique per organization.
    pub sku: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default)]
    pub price: f64,

    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<AttributeAxis>,

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

/// Variant — one concrete combination of a product's attribute options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub id: String,
    pub org_id: String,
    pub product_id: String,

    /// Derived SKU: `<product-sku>-<opt>-<opt>…`, unique per organization.
    pub sku: String,

    /// Axis name → chosen option.
    pub options: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_override: Option<f64>,

    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub sku: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeAxis>,
}

/// Result of `@generate-variants`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVariantsResult {
    /// Variants created by this call.
    pub created: Vec<Variant>,
    /// Combinations skipped because a variant already existed.
    pub skipped: usize,
}
