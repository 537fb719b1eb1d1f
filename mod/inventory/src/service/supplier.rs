use centro_core::{ListParams, ListResult, ServiceError, new_id, now_rfc3339, store};
use centro_sql::Value;

use super::InventoryService;
use crate::model::{CreateSupplierRequest, Supplier};

impl InventoryService {
    pub fn create_supplier(
        &self,
        org: &str,
        req: CreateSupplierRequest,
    ) -> Result<Supplier, ServiceError> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::Validation("supplier name is required".into()));
        }

        let id = new_id();
        let now = now_rfc3339();
        let record = Supplier {
            id: id.clone(),
            org_id: org.to_string(),
            name,
            email: req.email,
            phone: req.phone,
            lead_time_days: req.lead_time_days,
            created_at: now.clone(),
            updated_at: now,
        };

        store::insert_record(
            self.db.as_ref(),
            "suppliers",
            org,
            &id,
            &record,
            &supplier_indexes(&record),
        )?;

        Ok(record)
    }

    pub fn get_supplier(&self, org: &str, id: &str) -> Result<Supplier, ServiceError> {
        store::get_record(self.db.as_ref(), "suppliers", org, id)
    }

    pub fn list_suppliers(
        &self,
        org: &str,
        params: &ListParams,
    ) -> Result<ListResult<Supplier>, ServiceError> {
        store::list_records(
            self.db.as_ref(),
            "suppliers",
            org,
            &[],
            params.q.as_deref(),
            params.limit.min(500),
            params.offset,
        )
    }

    pub fn update_supplier(
        &self,
        org: &str,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<Supplier, ServiceError> {
        let current = self.get_supplier(org, id)?;
        let updated: Supplier = store::apply_patch(&current, patch)?;
        if updated.name.trim().is_empty() {
            return Err(ServiceError::Validation("supplier name is required".into()));
        }
        store::update_record(
            self.db.as_ref(),
            "suppliers",
            org,
            id,
            &updated,
            &supplier_indexes(&updated),
        )?;
        Ok(updated)
    }

    pub fn delete_supplier(&self, org: &str, id: &str) -> Result<(), ServiceError> {
        store::delete_record(self.db.as_ref(), "suppliers", org, id)
    }
}

fn supplier_indexes(s: &Supplier) -> Vec<(&'static str, Value)> {
    vec![
        ("name", Value::Text(s.name.clone())),
        ("email", s.email.clone().map(Value::Text).unwrap_or(Value::Null)),
        ("created_at", Value::Text(s.created_at.clone())),
        ("updated_at", Value::Text(s.updated_at.clone())),
    ]
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use centro_core::MemorySink;
    use centro_sql::SqliteStore;

    use super::*;

    fn svc() -> InventoryService {
        let db = Arc::new(SqliteStore::open_in_memory().unwrap());
        InventoryService::new(db, Arc::new(MemorySink::new())).unwrap()
    }

    #[test]
    fn supplier_lifecycle() {
        let svc = svc();
        let s = svc
            .create_supplier(
                "org1",
                CreateSupplierRequest {
                    name: "Acme Textiles".into(),
                    email: Some("orders@acme.example".into()),
                    phone: None,
                    lead_time_days: 14,
                },
            )
            .unwrap();
        assert_eq!(s.lead_time_days, 14);

        let updated = svc
            .update_supplier("org1", &s.id, serde_json::json!({"leadTimeDays": 7}))
            .unwrap();
        assert_eq!(updated.lead_time_days, 7);
        assert_eq!(updated.name, "Acme Textiles");

        let listed = svc.list_suppliers("org1", &ListParams::default()).unwrap();
        assert_eq!(listed.total, 1);

        svc.delete_supplier("org1", &s.id).unwrap();
        assert!(svc.get_supplier("org1", &s.id).is_err());
    }

    #[test]
    fn blank_name_rejected() {
        let svc = svc();
        let err = svc
            .create_supplier(
                "org1",
                CreateSupplierRequest {
                    name: "  ".into(),
                    email: None,
                    phone: None,
                    lead_time_days: 0,
                },
            )
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
    }
}
