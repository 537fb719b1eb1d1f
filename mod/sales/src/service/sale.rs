use centro_core::{ListParams, ListResult, ServiceError, new_id, now_rfc3339, store};
use centro_sql::Value;
use serde_json::json;

use super::SalesService;
use crate::model::{CreateSaleRequest, Sale};

#[derive(Debug, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleFilters {
    pub customer_id: Option<String>,
    pub product_id: Option<String>,
    /// First day included (`YYYY-MM-DD`).
    pub from: Option<String>,
    /// Last day included (`YYYY-MM-DD`).
    pub to: Option<String>,
}

impl SalesService {
    pub fn record_sale(&self, org: &str, req: CreateSaleRequest) -> Result<Sale, ServiceError> {
        let description = req.description.trim().to_string();
        if description.is_empty() {
            return Err(ServiceError::Validation("sale description is required".into()));
        }
        let quantity = req.quantity.unwrap_or(1.0);
        if quantity <= 0.0 {
            return Err(ServiceError::Validation("quantity must be positive".into()));
        }
        if req.unit_price < 0.0 {
            return Err(ServiceError::Validation("unit price can not be negative".into()));
        }

        let currency = match req.currency {
            Some(c) => c.to_ascii_uppercase(),
            None => self.base_currency(org)?,
        };
        let sold_at = match req.sold_at {
            Some(s) => s,
            None => now_rfc3339(),
        };
        let sold_day = sold_day_of(&sold_at)?;

        let id = new_id();
        let record = Sale {
            id: id.clone(),
            org_id: org.to_string(),
            customer_id: req.customer_id,
            product_id: req.product_id,
            description,
            quantity,
            unit_price: req.unit_price,
            currency,
            total: quantity * req.unit_price,
            sold_at,
            created_at: now_rfc3339(),
        };

        store::insert_record(
            self.db.as_ref(),
            "sales",
            org,
            &id,
            &record,
            &sale_indexes(&record, &sold_day),
        )?;

        self.events.emit(
            org,
            "sale.recorded",
            json!({
                "saleId": record.id,
                "description": record.description,
                "quantity": record.quantity,
                "total": record.total,
                "currency": record.currency,
                "customerId": record.customer_id,
                "productId": record.product_id,
                "soldAt": record.sold_at,
            }),
        );

        Ok(record)
    }

    pub fn get_sale(&self, org: &str, id: &str) -> Result<Sale, ServiceError> {
        store::get_record(self.db.as_ref(), "sales", org, id)
    }

    pub fn list_sales(
        &self,
        org: &str,
        params: &ListParams,
        filters: &SaleFilters,
    ) -> Result<ListResult<Sale>, ServiceError> {
        let limit = params.limit.min(500);

        let mut where_sql = String::from("org_id = ?1");
        let mut sql_params = vec![Value::Text(org.to_string())];

        if let Some(ref c) = filters.customer_id {
            sql_params.push(Value::Text(c.clone()));
            where_sql.push_str(&format!(" AND customer_id = ?{}", sql_params.len()));
        }
        if let Some(ref p) = filters.product_id {
            sql_params.push(Value::Text(p.clone()));
            where_sql.push_str(&format!(" AND product_id = ?{}", sql_params.len()));
        }
        if let Some(ref d) = filters.from {
            sql_params.push(Value::Text(parse_day(d)?.to_string()));
            where_sql.push_str(&format!(" AND sold_day >= ?{}", sql_params.len()));
        }
        if let Some(ref d) = filters.to {
            sql_params.push(Value::Text(parse_day(d)?.to_string()));
            where_sql.push_str(&format!(" AND sold_day <= ?{}", sql_params.len()));
        }

        let count_sql = format!("SELECT COUNT(*) as cnt FROM sales WHERE {}", where_sql);
        let rows = self
            .db
            .query(&count_sql, &sql_params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let total = rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0) as usize;

        sql_params.push(Value::Integer(limit as i64));
        sql_params.push(Value::Integer(params.offset as i64));
        let sql = format!(
            "SELECT data FROM sales WHERE {} ORDER BY sold_at DESC LIMIT ?{} OFFSET ?{}",
            where_sql,
            sql_params.len() - 1,
            sql_params.len(),
        );
        let rows = self
            .db
            .query(&sql, &sql_params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            let data = row
                .get_str("data")
                .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
            let sale: Sale =
                serde_json::from_str(data).map_err(|e| ServiceError::Internal(e.to_string()))?;
            items.push(sale);
        }
        Ok(ListResult { items, total })
    }

    pub fn delete_sale(&self, org: &str, id: &str) -> Result<(), ServiceError> {
        store::delete_record(self.db.as_ref(), "sales", org, id)
    }
}

/// Date part of an RFC 3339 timestamp.
pub(crate) fn sold_day_of(sold_at: &str) -> Result<String, ServiceError> {
    let dt = chrono::DateTime::parse_from_rfc3339(sold_at).map_err(|_| {
        ServiceError::Validation(format!("invalid soldAt '{}': expected RFC 3339", sold_at))
    })?;
    Ok(dt.date_naive().to_string())
}

pub(crate) fn parse_day(s: &str) -> Result<chrono::NaiveDate, ServiceError> {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| ServiceError::Validation(format!("invalid date '{}': expected YYYY-MM-DD", s)))
}

fn sale_indexes(s: &Sale, sold_day: &str) -> Vec<(&'static str, Value)> {
    vec![
        (
            "customer_id",
            s.customer_id.clone().map(Value::Text).unwrap_or(Value::Null),
        ),
        (
            "product_id",
            s.product_id.clone().map(Value::Text).unwrap_or(Value::Null),
        ),
        ("currency", Value::Text(s.currency.clone())),
        ("total", Value::Real(s.total)),
        ("sold_at", Value::Text(s.sold_at.clone())),
        ("sold_day", Value::Text(sold_day.to_string())),
        ("created_at", Value::Text(s.created_at.clone())),
    ]
}
