use serde::{Deserialize, Serialize};

/// Whether a segment's membership is recomputed on every read or frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    Dynamic,
    Static,
}

impl Default for SegmentKind {
    fn default() -> Self {
        Self::Dynamic
    }
}

/// Comparison operator in a segment rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentOp {
    Eq,
    Neq,
    Contains,
    StartsWith,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl SegmentOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentOp::Eq => "eq",
            SegmentOp::Neq => "neq",
            SegmentOp::Contains => "contains",
            SegmentOp::StartsWith => "starts_with",
            SegmentOp::Gt => "gt",
            SegmentOp::Gte => "gte",
            SegmentOp::Lt => "lt",
            SegmentOp::Lte => "lte",
        }
    }

    /// SQL comparison for this operator. `contains` and `starts_with`
    /// become LIKE and pattern-wrap their value at bind time.
    pub fn sql(&self) -> &'static str {
        match self {
            SegmentOp::Eq => "=",
            SegmentOp::Neq => "!=",
            SegmentOp::Contains | SegmentOp::StartsWith => "LIKE",
            SegmentOp::Gt => ">",
            SegmentOp::Gte => ">=",
            SegmentOp::Lt => "<",
            SegmentOp::Lte => "<=",
        }
    }
}

/// One filter rule. Rules in a segment compose with implicit AND; there
/// is no OR and no grouping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRule {
    /// Customer field the rule filters on. Must name a filterable column.
    pub field: String,
    pub operator: SegmentOp,
    /// String or number to compare against.
    pub value: serde_json::Value,
}

/// Segment — a named, saved filter over the customer table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: String,
    pub org_id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub kind: SegmentKind,

    #[serde(default)]
    pub rules: Vec<SegmentRule>,

    /// Frozen membership snapshot. Empty for dynamic segments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub member_ids: Vec<String>,

    /// Member count: the snapshot size for static segments, recomputed
    /// on read for dynamic ones.
    #[serde(default)]
    pub member_count: usize,

    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating a segment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSegmentRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub kind: SegmentKind,
    #[serde(default)]
    pub rules: Vec<SegmentRule>,
}

/// Result of evaluating a rule set without saving it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentPreview {
    pub count: usize,
    pub sample: Vec<super::Customer>,
}
