use centro_core::{ListParams, ListResult, ServiceError, new_id, now_rfc3339, store};
use centro_sql::Value;

use super::{CrmService, opt_text};
use crate::model::{CreateCustomerRequest, Customer, CustomerStats};

#[derive(Debug, Default, serde::Deserialize)]
pub struct CustomerFilters {
    pub status: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

impl CrmService {
    pub fn create_customer(
        &self,
        org: &str,
        req: CreateCustomerRequest,
    ) -> Result<Customer, ServiceError> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::Validation("customer name is required".into()));
        }

        let id = new_id();
        let now = now_rfc3339();
        let record = Customer {
            id: id.clone(),
            org_id: org.to_string(),
            name,
            email: req.email,
            phone: req.phone,
            company: req.company,
            city: req.city,
            country: req.country,
            status: req.status,
            total_spent: 0.0,
            purchase_count: 0,
            created_at: now.clone(),
            updated_at: now,
        };

        store::insert_record(
            self.db.as_ref(),
            "customers",
            org,
            &id,
            &record,
            &customer_indexes(&record),
        )?;

        let payload = serde_json::to_value(&record)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        self.events.emit(org, "customer.created", payload);

        Ok(record)
    }

    pub fn get_customer(&self, org: &str, id: &str) -> Result<Customer, ServiceError> {
        store::get_record(self.db.as_ref(), "customers", org, id)
    }

    pub fn list_customers(
        &self,
        org: &str,
        params: &ListParams,
        filters: &CustomerFilters,
    ) -> Result<ListResult<Customer>, ServiceError> {
        let limit = params.limit.min(500);
        let mut f: Vec<(&str, Value)> = Vec::new();
        if let Some(ref s) = filters.status {
            f.push(("status", Value::Text(s.clone())));
        }
        if let Some(ref c) = filters.city {
            f.push(("city", Value::Text(c.clone())));
        }
        if let Some(ref c) = filters.country {
            f.push(("country", Value::Text(c.clone())));
        }
        store::list_records(
            self.db.as_ref(),
            "customers",
            org,
            &f,
            params.q.as_deref(),
            limit,
            params.offset,
        )
    }

    pub fn update_customer(
        &self,
        org: &str,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<Customer, ServiceError> {
        let current = self.get_customer(org, id)?;
        let updated: Customer = store::apply_patch(&current, patch)?;

        store::update_record(
            self.db.as_ref(),
            "customers",
            org,
            id,
            &updated,
            &customer_indexes(&updated),
        )?;

        Ok(updated)
    }

    pub fn delete_customer(&self, org: &str, id: &str) -> Result<(), ServiceError> {
        store::delete_record(self.db.as_ref(), "customers", org, id)
    }

    pub fn customer_stats(&self, org: &str) -> Result<CustomerStats, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT COUNT(*) as cnt, COALESCE(SUM(total_spent), 0) as revenue
                 FROM customers WHERE org_id = ?1",
                &[Value::Text(org.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let total = rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0) as usize;
        let total_revenue = rows.first().and_then(|r| r.get_f64("revenue")).unwrap_or(0.0);

        let mut stats = CustomerStats {
            total,
            leads: 0,
            active: 0,
            inactive: 0,
            total_revenue,
        };

        let rows = self
            .db
            .query(
                "SELECT status, COUNT(*) as cnt FROM customers
                 WHERE org_id = ?1 GROUP BY status",
                &[Value::Text(org.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        for row in &rows {
            let count = row.get_i64("cnt").unwrap_or(0) as usize;
            match row.get_str("status") {
                Some("lead") => stats.leads = count,
                Some("active") => stats.active = count,
                Some("inactive") => stats.inactive = count,
                _ => {}
            }
        }

        Ok(stats)
    }
}

fn customer_indexes(c: &Customer) -> Vec<(&'static str, Value)> {
    vec![
        ("name", Value::Text(c.name.clone())),
        ("email", opt_text(&c.email)),
        ("phone", opt_text(&c.phone)),
        ("company", opt_text(&c.company)),
        ("city", opt_text(&c.city)),
        ("country", opt_text(&c.country)),
        ("status", Value::Text(c.status.as_str().to_string())),
        ("total_spent", Value::Real(c.total_spent)),
        ("purchase_count", Value::Integer(c.purchase_count as i64)),
        ("created_at", Value::Text(c.created_at.clone())),
        ("updated_at", Value::Text(c.updated_at.clone())),
    ]
}
