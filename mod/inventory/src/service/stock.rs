use centro_core::{ListParams, ListResult, ServiceError, new_id, now_rfc3339, store};
use centro_sql::Value;
use serde_json::json;
use tracing::error;

use super::InventoryService;
use crate::model::{
    AdjustStockRequest, ReplenishmentItem, SetStockRequest, StockLevel, StockMovement,
};

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockFilters {
    pub product_id: Option<String>,
    /// Only levels at or under their threshold.
    #[serde(default)]
    pub low: bool,
}

impl InventoryService {
    // ── Levels ──

    /// Create or replace the stock level for a product (or one of its
    /// variants). Does not record a movement; use `adjust_stock` for
    /// audited changes.
    pub fn set_stock(&self, org: &str, req: SetStockRequest) -> Result<StockLevel, ServiceError> {
        if req.quantity < 0 || req.min_quantity < 0 || req.restock_quantity < 0 {
            return Err(ServiceError::Validation(
                "stock quantities can not be negative".into(),
            ));
        }

        let product = self.get_product(org, &req.product_id)?;
        if let Some(ref vid) = req.variant_id {
            let variant = self.get_variant(org, vid)?;
            if variant.product_id != product.id {
                return Err(ServiceError::Validation(format!(
                    "variant '{}' does not belong to product '{}'",
                    vid, product.id
                )));
            }
        }

        // One level per (product, variant) pair; '' stands for the
        // product-level row.
        let variant_key = req.variant_id.clone().unwrap_or_default();
        let rows = self
            .db
            .query(
                "SELECT id FROM stock_levels WHERE org_id = ?1 AND product_id = ?2 AND variant_id = ?3",
                &[
                    Value::Text(org.to_string()),
                    Value::Text(req.product_id.clone()),
                    Value::Text(variant_key),
                ],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        if let Some(row) = rows.first() {
            let id = row
                .get_str("id")
                .ok_or_else(|| ServiceError::Internal("missing id column".into()))?
                .to_string();
            let current: StockLevel = self.get_stock(org, &id)?;
            let updated = StockLevel {
                quantity: req.quantity,
                min_quantity: req.min_quantity,
                restock_quantity: req.restock_quantity,
                updated_at: now_rfc3339(),
                ..current
            };
            store::update_record(
                self.db.as_ref(),
                "stock_levels",
                org,
                &id,
                &updated,
                &stock_indexes(&updated),
            )?;
            Ok(updated)
        } else {
            let id = new_id();
            let now = now_rfc3339();
            let record = StockLevel {
                id: id.clone(),
                org_id: org.to_string(),
                product_id: req.product_id,
                variant_id: req.variant_id,
                quantity: req.quantity,
                min_quantity: req.min_quantity,
                restock_quantity: req.restock_quantity,
                created_at: now.clone(),
                updated_at: now,
            };
            store::insert_record(
                self.db.as_ref(),
                "stock_levels",
                org,
                &id,
                &record,
                &stock_indexes(&record),
            )?;
            Ok(record)
        }
    }

    pub fn get_stock(&self, org: &str, id: &str) -> Result<StockLevel, ServiceError> {
        store::get_record(self.db.as_ref(), "stock_levels", org, id)
    }

    pub fn list_stock(
        &self,
        org: &str,
        params: &ListParams,
        filters: &StockFilters,
    ) -> Result<ListResult<StockLevel>, ServiceError> {
        if filters.low {
            let all = self.low_levels(Some(org), filters.product_id.as_deref())?;
            let total = all.len();
            let items = all
                .into_iter()
                .skip(params.offset)
                .take(params.limit.min(500))
                .collect();
            return Ok(ListResult { items, total });
        }

        let mut f: Vec<(&str, Value)> = Vec::new();
        if let Some(ref pid) = filters.product_id {
            f.push(("product_id", Value::Text(pid.clone())));
        }
        store::list_records(
            self.db.as_ref(),
            "stock_levels",
            org,
            &f,
            None,
            params.limit.min(500),
            params.offset,
        )
    }

    // ── Adjustments ──

    /// Apply a signed delta to a level. Records a movement row; the level
    /// can never go negative. Crossing the low stock threshold downward
    /// emits a `stock.low` event.
    pub fn adjust_stock(
        &self,
        org: &str,
        id: &str,
        req: AdjustStockRequest,
    ) -> Result<StockLevel, ServiceError> {
        let reason = req.reason.trim().to_string();
        if reason.is_empty() {
            return Err(ServiceError::Validation("adjustment reason is required".into()));
        }

        let current = self.get_stock(org, id)?;
        let after = current.quantity + req.delta;
        if after < 0 {
            return Err(ServiceError::Validation(format!(
                "adjustment {} would take stock below zero (current {})",
                req.delta, current.quantity
            )));
        }

        let was_above = current.quantity > current.min_quantity;
        let updated = StockLevel {
            quantity: after,
            updated_at: now_rfc3339(),
            ..current
        };
        store::update_record(
            self.db.as_ref(),
            "stock_levels",
            org,
            id,
            &updated,
            &stock_indexes(&updated),
        )?;

        let movement = StockMovement {
            id: new_id(),
            org_id: org.to_string(),
            stock_id: id.to_string(),
            delta: req.delta,
            reason,
            quantity_after: after,
            created_at: now_rfc3339(),
        };
        store::insert_record(
            self.db.as_ref(),
            "stock_movements",
            org,
            &movement.id,
            &movement,
            &[
                ("stock_id", Value::Text(id.to_string())),
                ("created_at", Value::Text(movement.created_at.clone())),
            ],
        )?;

        if was_above && after <= updated.min_quantity {
            self.emit_low(org, &updated);
        }

        Ok(updated)
    }

    pub fn list_movements(
        &self,
        org: &str,
        stock_id: &str,
    ) -> Result<Vec<StockMovement>, ServiceError> {
        let _ = self.get_stock(org, stock_id)?;
        let result: ListResult<StockMovement> = store::list_records(
            self.db.as_ref(),
            "stock_movements",
            org,
            &[("stock_id", Value::Text(stock_id.to_string()))],
            None,
            10_000,
            0,
        )?;
        Ok(result.items)
    }

    // ── Replenishment ──

    /// Levels at or under their threshold, joined with product names and
    /// the suggested order quantity.
    pub fn replenishment(&self, org: &str) -> Result<Vec<ReplenishmentItem>, ServiceError> {
        let levels = self.low_levels(Some(org), None)?;
        let mut items = Vec::with_capacity(levels.len());
        for level in levels {
            let product = self.get_product(org, &level.product_id)?;
            let variant_sku = match level.variant_id.as_deref() {
                Some(vid) => Some(self.get_variant(org, vid)?.sku),
                None => None,
            };
            items.push(ReplenishmentItem {
                product_name: product.name,
                product_sku: product.sku,
                variant_sku,
                suggested_quantity: suggested_order(&level),
                stock: level,
            });
        }
        Ok(items)
    }

    /// Emit `stock.low` for every level sitting at or under its threshold,
    /// across all organizations. Called by the background scan so that
    /// crossings missed at adjustment time still alert.
    pub fn scan_low_stock(&self) -> Result<usize, ServiceError> {
        let levels = self.low_levels(None, None)?;
        let count = levels.len();
        for level in levels {
            let org = level.org_id.clone();
            self.emit_low(&org, &level);
        }
        Ok(count)
    }

    fn low_levels(
        &self,
        org: Option<&str>,
        product_id: Option<&str>,
    ) -> Result<Vec<StockLevel>, ServiceError> {
        let mut sql = String::from("SELECT data FROM stock_levels WHERE quantity <= min_quantity");
        let mut params: Vec<Value> = Vec::new();
        if let Some(org) = org {
            params.push(Value::Text(org.to_string()));
            sql.push_str(&format!(" AND org_id = ?{}", params.len()));
        }
        if let Some(pid) = product_id {
            params.push(Value::Text(pid.to_string()));
            sql.push_str(&format!(" AND product_id = ?{}", params.len()));
        }
        sql.push_str(" ORDER BY quantity ASC");

        let rows = self
            .db
            .query(&sql, &params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let mut levels = Vec::with_capacity(rows.len());
        for row in &rows {
            let data = row
                .get_str("data")
                .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
            let level: StockLevel =
                serde_json::from_str(data).map_err(|e| ServiceError::Internal(e.to_string()))?;
            levels.push(level);
        }
        Ok(levels)
    }

    fn emit_low(&self, org: &str, level: &StockLevel) {
        let product = match self.get_product(org, &level.product_id) {
            Ok(p) => p,
            Err(e) => {
                error!("low stock event for level {} dropped: {e}", level.id);
                return;
            }
        };
        let variant_sku = level
            .variant_id
            .as_deref()
            .and_then(|vid| self.get_variant(org, vid).ok())
            .map(|v| v.sku);

        self.events.emit(
            org,
            "stock.low",
            json!({
                "stockId": level.id,
                "productId": product.id,
                "productName": product.name,
                "sku": variant_sku.unwrap_or(product.sku),
                "quantity": level.quantity,
                "minQuantity": level.min_quantity,
                "suggestedQuantity": suggested_order(level),
            }),
        );
    }
}

/// `restock_quantity - quantity`, never negative.
fn suggested_order(level: &StockLevel) -> i64 {
    (level.restock_quantity - level.quantity).max(0)
}

fn stock_indexes(s: &StockLevel) -> Vec<(&'static str, Value)> {
    vec![
        ("product_id", Value::Text(s.product_id.clone())),
        (
            "variant_id",
            Value::Text(s.variant_id.clone().unwrap_or_default()),
        ),
        ("quantity", Value::Integer(s.quantity)),
        ("min_quantity", Value::Integer(s.min_quantity)),
        ("created_at", Value::Text(s.created_at.clone())),
        ("updated_at", Value::Text(s.updated_at.clone())),
    ]
}
