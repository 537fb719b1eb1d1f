use std::collections::BTreeMap;

use centro_core::{ListParams, ListResult, ServiceError, new_id, now_rfc3339, store};
use centro_sql::Value;

use super::InventoryService;
use crate::model::{
    AttributeAxis, CreateProductRequest, GenerateVariantsResult, Product, Variant,
};

#[derive(Debug, Default, serde::Deserialize)]
pub struct ProductFilters {
    pub category: Option<String>,
    pub active: Option<bool>,
}

impl InventoryService {
    // ── Products ──

    pub fn create_product(
        &self,
        org: &str,
        req: CreateProductRequest,
    ) -> Result<Product, ServiceError> {
        let name = req.name.trim().to_string();
        let sku = req.sku.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::Validation("product name is required".into()));
        }
        if sku.is_empty() {
            return Err(ServiceError::Validation("product sku is required".into()));
        }
        if req.price < 0.0 {
            return Err(ServiceError::Validation("price can not be negative".into()));
        }
        validate_axes(&req.attributes)?;

        let id = new_id();
        let now = now_rfc3339();
        let record = Product {
            id: id.clone(),
            org_id: org.to_string(),
            name,
            sku: sku.clone(),
            description: req.description,
            category: req.category,
            price: req.price,
            currency: req
                .currency
                .map(|c| c.to_ascii_uppercase())
                .unwrap_or_else(crate::model::default_currency),
            attributes: req.attributes,
            active: true,
            created_at: now.clone(),
            updated_at: now,
        };

        store::insert_record(
            self.db.as_ref(),
            "products",
            org,
            &id,
            &record,
            &product_indexes(&record),
        )
        .map_err(|e| match e {
            ServiceError::Conflict(_) => {
                ServiceError::Conflict(format!("sku '{}' already exists", sku))
            }
            other => other,
        })?;

        Ok(record)
    }

    pub fn get_product(&self, org: &str, id: &str) -> Result<Product, ServiceError> {
        store::get_record(self.db.as_ref(), "products", org, id)
    }

    pub fn list_products(
        &self,
        org: &str,
        params: &ListParams,
        filters: &ProductFilters,
    ) -> Result<ListResult<Product>, ServiceError> {
        let limit = params.limit.min(500);
        let mut f: Vec<(&str, Value)> = Vec::new();
        if let Some(ref c) = filters.category {
            f.push(("category", Value::Text(c.clone())));
        }
        if let Some(a) = filters.active {
            f.push(("active", Value::Integer(a as i64)));
        }
        store::list_records(
            self.db.as_ref(),
            "products",
            org,
            &f,
            params.q.as_deref(),
            limit,
            params.offset,
        )
    }

    pub fn update_product(
        &self,
        org: &str,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<Product, ServiceError> {
        let current = self.get_product(org, id)?;
        let updated: Product = store::apply_patch(&current, patch)?;

        if updated.name.trim().is_empty() || updated.sku.trim().is_empty() {
            return Err(ServiceError::Validation("name and sku are required".into()));
        }
        if updated.price < 0.0 {
            return Err(ServiceError::Validation("price can not be negative".into()));
        }
        validate_axes(&updated.attributes)?;

        store::update_record(
            self.db.as_ref(),
            "products",
            org,
            id,
            &updated,
            &product_indexes(&updated),
        )?;

        Ok(updated)
    }

    /// Delete a product together with its variants and stock levels.
    /// Movements are kept as an audit trail.
    pub fn delete_product(&self, org: &str, id: &str) -> Result<(), ServiceError> {
        store::delete_record(self.db.as_ref(), "products", org, id)?;
        for table in ["variants", "stock_levels"] {
            let sql = format!("DELETE FROM {} WHERE org_id = ?1 AND product_id = ?2", table);
            self.db
                .exec(&sql, &[Value::Text(org.to_string()), Value::Text(id.to_string())])
                .map_err(|e| ServiceError::Storage(e.to_string()))?;
        }
        Ok(())
    }

    // ── Variants ──

    pub fn list_variants(&self, org: &str, product_id: &str) -> Result<Vec<Variant>, ServiceError> {
        // Validate the product exists before listing against it.
        let _ = self.get_product(org, product_id)?;
        let result: ListResult<Variant> = store::list_records(
            self.db.as_ref(),
            "variants",
            org,
            &[("product_id", Value::Text(product_id.to_string()))],
            None,
            10_000,
            0,
        )?;
        Ok(result.items)
    }

    /// Expand the product's attribute axes into the full cartesian variant
    /// matrix. Combinations that already have a variant are skipped; a
    /// product without axes yields no variants.
    pub fn generate_variants(
        &self,
        org: &str,
        product_id: &str,
    ) -> Result<GenerateVariantsResult, ServiceError> {
        let product = self.get_product(org, product_id)?;
        if product.attributes.is_empty() {
            return Ok(GenerateVariantsResult {
                created: Vec::new(),
                skipped: 0,
            });
        }

        let existing = self.list_variants(org, product_id)?;
        let existing_options: Vec<&BTreeMap<String, String>> =
            existing.iter().map(|v| &v.options).collect();

        let mut created = Vec::new();
        let mut skipped = 0;

        for combo in cartesian(&product.attributes) {
            if existing_options.contains(&&combo) {
                skipped += 1;
                continue;
            }

            // SKU fragments follow the declared axis order, not map order.
            let mut sku = product.sku.clone();
            for axis in &product.attributes {
                if let Some(option) = combo.get(&axis.name) {
                    sku.push('-');
                    sku.push_str(&sku_fragment(option));
                }
            }

            let id = new_id();
            let record = Variant {
                id: id.clone(),
                org_id: org.to_string(),
                product_id: product_id.to_string(),
                sku: sku.clone(),
                options: combo,
                price_override: None,
                created_at: now_rfc3339(),
            };

            store::insert_record(
                self.db.as_ref(),
                "variants",
                org,
                &id,
                &record,
                &[
                    ("product_id", Value::Text(product_id.to_string())),
                    ("sku", Value::Text(sku)),
                    ("created_at", Value::Text(record.created_at.clone())),
                ],
            )?;

            created.push(record);
        }

        Ok(GenerateVariantsResult { created, skipped })
    }

    pub(crate) fn get_variant(&self, org: &str, id: &str) -> Result<Variant, ServiceError> {
        store::get_record(self.db.as_ref(), "variants", org, id)
    }
}

fn validate_axes(axes: &[AttributeAxis]) -> Result<(), ServiceError> {
    let mut seen = Vec::new();
    for axis in axes {
        let name = axis.name.trim();
        if name.is_empty() {
            return Err(ServiceError::Validation("attribute axis name is required".into()));
        }
        if seen.contains(&name) {
            return Err(ServiceError::Validation(format!(
                "duplicate attribute axis '{}'",
                name
            )));
        }
        if axis.options.is_empty() {
            return Err(ServiceError::Validation(format!(
                "attribute axis '{}' needs at least one option",
                name
            )));
        }
        seen.push(name);
    }
    Ok(())
}

/// All combinations of one option per axis, in axis order.
fn cartesian(axes: &[AttributeAxis]) -> Vec<BTreeMap<String, String>> {
    let mut combos: Vec<Vec<(String, String)>> = vec![Vec::new()];
    for axis in axes {
        let mut next = Vec::with_capacity(combos.len() * axis.options.len());
        for combo in &combos {
            for option in &axis.options {
                let mut c = combo.clone();
                c.push((axis.name.clone(), option.clone()));
                next.push(c);
            }
        }
        combos = next;
    }
    combos
        .into_iter()
        .map(|pairs| pairs.into_iter().collect())
        .collect()
}

/// SKU piece for one option value: lowercase, runs of non-alphanumerics
/// collapsed to single hyphens.
fn sku_fragment(option: &str) -> String {
    let mut out = String::with_capacity(option.len());
    let mut last_hyphen = true;
    for c in option.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_hyphen = false;
        } else if !last_hyphen {
            out.push('-');
            last_hyphen = true;
        }
    }
    out.trim_end_matches('-').to_string()
}

fn product_indexes(p: &Product) -> Vec<(&'static str, Value)> {
    vec![
        ("name", Value::Text(p.name.clone())),
        ("sku", Value::Text(p.sku.clone())),
        (
            "category",
            p.category.clone().map(Value::Text).unwrap_or(Value::Null),
        ),
        ("price", Value::Real(p.price)),
        ("active", Value::Integer(p.active as i64)),
        ("created_at", Value::Text(p.created_at.clone())),
        ("updated_at", Value::Text(p.updated_at.clone())),
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

    fn axis(name: &str, options: &[&str]) -> AttributeAxis {
        AttributeAxis {
            name: name.into(),
            options: options.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn create_product(svc: &InventoryService, org: &str, sku: &str, axes: Vec<AttributeAxis>) -> Product {
        svc.create_product(
            org,
            CreateProductRequest {
                name: format!("Product {}", sku),
                sku: sku.into(),
                description: None,
                category: Some("apparel".into()),
                price: 25.0,
                currency: None,
                attributes: axes,
            },
        )
        .unwrap()
    }

    #[test]
    fn sku_unique_per_org() {
        let svc = svc();
        create_product(&svc, "org1", "TEE", vec![]);
        let err = svc
            .create_product(
                "org1",
                CreateProductRequest {
                    name: "Other".into(),
                    sku: "TEE".into(),
                    description: None,
                    category: None,
                    price: 1.0,
                    currency: None,
                    attributes: vec![],
                },
            )
            .unwrap_err();
        assert_eq!(err.error_code(), "ALREADY_EXISTS");

        // Same sku in another org is fine.
        create_product(&svc, "org2", "TEE", vec![]);
    }

    #[test]
    fn generate_variants_full_matrix() {
        let svc = svc();
        let p = create_product(
            &svc,
            "org1",
            "TEE",
            vec![axis("size", &["S", "M"]), axis("color", &["Black", "Sky Blue"])],
        );

        let result = svc.generate_variants("org1", &p.id).unwrap();
        assert_eq!(result.created.len(), 4);
        assert_eq!(result.skipped, 0);

        let skus: Vec<&str> = result.created.iter().map(|v| v.sku.as_str()).collect();
        assert!(skus.contains(&"TEE-s-black"));
        assert!(skus.contains(&"TEE-m-sky-blue"));

        for v in &result.created {
            assert_eq!(v.product_id, p.id);
            assert_eq!(v.options.len(), 2);
        }
    }

    #[test]
    fn generate_variants_skips_existing() {
        let svc = svc();
        let p = create_product(&svc, "org1", "TEE", vec![axis("size", &["S", "M"])]);

        let first = svc.generate_variants("org1", &p.id).unwrap();
        assert_eq!(first.created.len(), 2);

        // Add an axis option, regenerate: only the new combination appears.
        svc.update_product(
            "org1",
            &p.id,
            serde_json::json!({"attributes": [{"name": "size", "options": ["S", "M", "L"]}]}),
        )
        .unwrap();

        let second = svc.generate_variants("org1", &p.id).unwrap();
        assert_eq!(second.created.len(), 1);
        assert_eq!(second.skipped, 2);
        assert_eq!(second.created[0].sku, "TEE-l");

        assert_eq!(svc.list_variants("org1", &p.id).unwrap().len(), 3);
    }

    #[test]
    fn no_axes_no_variants() {
        let svc = svc();
        let p = create_product(&svc, "org1", "TEE", vec![]);
        let result = svc.generate_variants("org1", &p.id).unwrap();
        assert!(result.created.is_empty());
        assert_eq!(result.skipped, 0);
    }

    #[test]
    fn axis_validation() {
        let svc = svc();
        let err = svc
            .create_product(
                "org1",
                CreateProductRequest {
                    name: "X".into(),
                    sku: "X".into(),
                    description: None,
                    category: None,
                    price: 1.0,
                    currency: None,
                    attributes: vec![axis("size", &[])],
                },
            )
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");

        let err = svc
            .create_product(
                "org1",
                CreateProductRequest {
                    name: "X".into(),
                    sku: "X".into(),
                    description: None,
                    category: None,
                    price: 1.0,
                    currency: None,
                    attributes: vec![axis("size", &["S"]), axis("size", &["M"])],
                },
            )
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
    }

    #[test]
    fn delete_product_cascades_variants() {
        let svc = svc();
        let p = create_product(&svc, "org1", "TEE", vec![axis("size", &["S"])]);
        svc.generate_variants("org1", &p.id).unwrap();

        svc.delete_product("org1", &p.id).unwrap();
        assert!(svc.get_product("org1", &p.id).is_err());
        assert!(svc.list_variants("org1", &p.id).is_err());
    }
}
