use centro_core::{ListParams, ListResult, ServiceError, new_id, now_rfc3339, store};
use centro_sql::Value;

use super::CrmService;
use crate::model::{
    CreateSegmentRequest, Customer, Segment, SegmentKind, SegmentOp, SegmentPreview, SegmentRule,
};

/// Customer columns segment rules may filter on. Rule fields are
/// interpolated into SQL, so anything outside this list is rejected
/// before it gets near a query.
const FILTERABLE_FIELDS: &[&str] = &[
    "name",
    "email",
    "phone",
    "company",
    "city",
    "country",
    "status",
    "total_spent",
    "purchase_count",
];

/// Rows returned by a preview alongside the count.
const PREVIEW_SAMPLE: usize = 10;

impl CrmService {
    // ── Rule evaluation ──

    /// Evaluate a rule set without saving it.
    pub fn preview_segment(
        &self,
        org: &str,
        rules: &[SegmentRule],
    ) -> Result<SegmentPreview, ServiceError> {
        validate_rules(rules)?;
        let count = self.eval_count(org, rules)?;
        let sample = self.eval_rows(org, rules, PREVIEW_SAMPLE, 0)?;
        Ok(SegmentPreview { count, sample })
    }

    fn eval_count(&self, org: &str, rules: &[SegmentRule]) -> Result<usize, ServiceError> {
        let (clause, mut params) = rules_where(rules, 2)?;
        params.insert(0, Value::Text(org.to_string()));
        let sql = format!(
            "SELECT COUNT(*) as cnt FROM customers WHERE org_id = ?1{}",
            clause
        );
        let rows = self
            .db
            .query(&sql, &params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        Ok(rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0) as usize)
    }

    fn eval_rows(
        &self,
        org: &str,
        rules: &[SegmentRule],
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Customer>, ServiceError> {
        let (clause, mut params) = rules_where(rules, 2)?;
        params.insert(0, Value::Text(org.to_string()));
        let limit_idx = params.len() + 1;
        let offset_idx = params.len() + 2;
        params.push(Value::Integer(limit as i64));
        params.push(Value::Integer(offset as i64));

        let sql = format!(
            "SELECT data FROM customers WHERE org_id = ?1{} ORDER BY created_at DESC LIMIT ?{} OFFSET ?{}",
            clause, limit_idx, offset_idx,
        );
        let rows = self
            .db
            .query(&sql, &params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let mut items = Vec::new();
        for row in &rows {
            let data = row
                .get_str("data")
                .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
            items.push(
                serde_json::from_str(data).map_err(|e| ServiceError::Internal(e.to_string()))?,
            );
        }
        Ok(items)
    }

    fn eval_ids(&self, org: &str, rules: &[SegmentRule]) -> Result<Vec<String>, ServiceError> {
        let (clause, mut params) = rules_where(rules, 2)?;
        params.insert(0, Value::Text(org.to_string()));
        let sql = format!(
            "SELECT id FROM customers WHERE org_id = ?1{} ORDER BY created_at DESC",
            clause
        );
        let rows = self
            .db
            .query(&sql, &params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        Ok(rows
            .iter()
            .filter_map(|r| r.get_str("id").map(String::from))
            .collect())
    }

    // ── Segment CRUD ──

    pub fn create_segment(
        &self,
        org: &str,
        req: CreateSegmentRequest,
    ) -> Result<Segment, ServiceError> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::Validation("segment name is required".into()));
        }
        validate_rules(&req.rules)?;

        // Static segments freeze their membership at creation time.
        let member_ids = match req.kind {
            SegmentKind::Static => self.eval_ids(org, &req.rules)?,
            SegmentKind::Dynamic => Vec::new(),
        };
        let member_count = match req.kind {
            SegmentKind::Static => member_ids.len(),
            SegmentKind::Dynamic => self.eval_count(org, &req.rules)?,
        };

        let id = new_id();
        let now = now_rfc3339();
        let record = Segment {
            id: id.clone(),
            org_id: org.to_string(),
            name: name.clone(),
            description: req.description,
            kind: req.kind,
            rules: req.rules,
            member_ids,
            member_count,
            created_at: now.clone(),
            updated_at: now.clone(),
        };

        store::insert_record(
            self.db.as_ref(),
            "segments",
            org,
            &id,
            &record,
            &segment_indexes(&record),
        )?;

        Ok(record)
    }

    pub fn get_segment(&self, org: &str, id: &str) -> Result<Segment, ServiceError> {
        let mut seg: Segment = store::get_record(self.db.as_ref(), "segments", org, id)?;
        if seg.kind == SegmentKind::Dynamic {
            seg.member_count = self.eval_count(org, &seg.rules)?;
        }
        Ok(seg)
    }

    pub fn list_segments(
        &self,
        org: &str,
        params: &ListParams,
    ) -> Result<ListResult<Segment>, ServiceError> {
        let limit = params.limit.min(500);
        let mut result: ListResult<Segment> = store::list_records(
            self.db.as_ref(),
            "segments",
            org,
            &[],
            params.q.as_deref(),
            limit,
            params.offset,
        )?;
        for seg in &mut result.items {
            if seg.kind == SegmentKind::Dynamic {
                seg.member_count = self.eval_count(org, &seg.rules)?;
            }
        }
        Ok(result)
    }

    pub fn update_segment(
        &self,
        org: &str,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<Segment, ServiceError> {
        let current: Segment = store::get_record(self.db.as_ref(), "segments", org, id)?;

        // Kind and membership are derived, not patchable.
        let mut patch = patch;
        if let Some(obj) = patch.as_object_mut() {
            obj.remove("kind");
            obj.remove("memberIds");
            obj.remove("memberCount");
        }

        let mut updated: Segment = store::apply_patch(&current, patch)?;
        validate_rules(&updated.rules)?;
        if updated.kind == SegmentKind::Dynamic {
            updated.member_count = self.eval_count(org, &updated.rules)?;
        }

        store::update_record(
            self.db.as_ref(),
            "segments",
            org,
            id,
            &updated,
            &segment_indexes(&updated),
        )?;

        Ok(updated)
    }

    pub fn delete_segment(&self, org: &str, id: &str) -> Result<(), ServiceError> {
        store::delete_record(self.db.as_ref(), "segments", org, id)
    }

    /// Convert a dynamic segment into a static one by freezing the
    /// current rule matches as its membership.
    pub fn materialize_segment(&self, org: &str, id: &str) -> Result<Segment, ServiceError> {
        let mut seg: Segment = store::get_record(self.db.as_ref(), "segments", org, id)?;
        if seg.kind == SegmentKind::Static {
            return Err(ServiceError::Validation(format!(
                "segment '{}' is already static",
                seg.name
            )));
        }

        seg.member_ids = self.eval_ids(org, &seg.rules)?;
        seg.member_count = seg.member_ids.len();
        seg.kind = SegmentKind::Static;
        seg.updated_at = now_rfc3339();

        store::update_record(
            self.db.as_ref(),
            "segments",
            org,
            id,
            &seg,
            &segment_indexes(&seg),
        )?;

        Ok(seg)
    }

    /// List the customers in a segment: recomputed for dynamic segments,
    /// resolved from the frozen snapshot for static ones.
    pub fn segment_members(
        &self,
        org: &str,
        id: &str,
        params: &ListParams,
    ) -> Result<ListResult<Customer>, ServiceError> {
        let seg: Segment = store::get_record(self.db.as_ref(), "segments", org, id)?;
        let limit = params.limit.min(500);

        match seg.kind {
            SegmentKind::Dynamic => {
                let total = self.eval_count(org, &seg.rules)?;
                let items = self.eval_rows(org, &seg.rules, limit, params.offset)?;
                Ok(ListResult { items, total })
            }
            SegmentKind::Static => {
                let members = self.fetch_by_ids(org, &seg.member_ids)?;
                let total = members.len();
                let items = members
                    .into_iter()
                    .skip(params.offset)
                    .take(limit)
                    .collect();
                Ok(ListResult { items, total })
            }
        }
    }

    /// Fetch customers by id, preserving the given order. Ids that no
    /// longer resolve (deleted customers in old snapshots) are skipped.
    fn fetch_by_ids(&self, org: &str, ids: &[String]) -> Result<Vec<Customer>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders: Vec<String> = (0..ids.len()).map(|i| format!("?{}", i + 2)).collect();
        let sql = format!(
            "SELECT data FROM customers WHERE org_id = ?1 AND id IN ({})",
            placeholders.join(", ")
        );
        let mut params = vec![Value::Text(org.to_string())];
        params.extend(ids.iter().map(|id| Value::Text(id.clone())));

        let rows = self
            .db
            .query(&sql, &params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;

        let mut by_id = std::collections::HashMap::new();
        for row in &rows {
            let data = row
                .get_str("data")
                .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
            let c: Customer =
                serde_json::from_str(data).map_err(|e| ServiceError::Internal(e.to_string()))?;
            by_id.insert(c.id.clone(), c);
        }

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }
}

/// Validate a rule set: fields must be whitelisted columns, LIKE-family
/// operators need string values, everything else needs a string or number.
pub fn validate_rules(rules: &[SegmentRule]) -> Result<(), ServiceError> {
    for rule in rules {
        let field = rule.field.trim();
        if field.is_empty() {
            return Err(ServiceError::Validation("rule field is required".into()));
        }
        if !FILTERABLE_FIELDS.contains(&field) {
            return Err(ServiceError::Validation(format!(
                "field '{}' is not filterable",
                field
            )));
        }
        match rule.operator {
            SegmentOp::Contains | SegmentOp::StartsWith => {
                if !rule.value.is_string() {
                    return Err(ServiceError::Validation(format!(
                        "operator '{}' requires a string value",
                        rule.operator.as_str()
                    )));
                }
            }
            _ => {
                if !(rule.value.is_string() || rule.value.is_number() || rule.value.is_boolean()) {
                    return Err(ServiceError::Validation(
                        "rule value must be a string or number".into(),
                    ));
                }
            }
        }
    }
    Ok(())
}

/// Build the `AND col op ?N AND ...` suffix for a validated rule set.
/// `start_idx` is the first free positional parameter number.
fn rules_where(
    rules: &[SegmentRule],
    start_idx: usize,
) -> Result<(String, Vec<Value>), ServiceError> {
    let mut clause = String::new();
    let mut params = Vec::new();

    for rule in rules {
        let field = rule.field.trim();
        if !FILTERABLE_FIELDS.contains(&field) {
            return Err(ServiceError::Validation(format!(
                "field '{}' is not filterable",
                field
            )));
        }

        let idx = start_idx + params.len();
        clause.push_str(&format!(" AND {} {} ?{}", field, rule.operator.sql(), idx));
        params.push(bind_rule_value(rule)?);
    }

    Ok((clause, params))
}

fn bind_rule_value(rule: &SegmentRule) -> Result<Value, ServiceError> {
    match rule.operator {
        SegmentOp::Contains => match rule.value.as_str() {
            Some(s) => Ok(Value::Text(format!("%{}%", s))),
            None => Err(ServiceError::Validation(
                "operator 'contains' requires a string value".into(),
            )),
        },
        SegmentOp::StartsWith => match rule.value.as_str() {
            Some(s) => Ok(Value::Text(format!("{}%", s))),
            None => Err(ServiceError::Validation(
                "operator 'starts_with' requires a string value".into(),
            )),
        },
        _ => match &rule.value {
            serde_json::Value::String(s) => Ok(Value::Text(s.clone())),
            serde_json::Value::Number(n) if n.is_i64() => {
                Ok(Value::Integer(n.as_i64().unwrap_or_default()))
            }
            serde_json::Value::Number(n) => Ok(Value::Real(n.as_f64().unwrap_or_default())),
            serde_json::Value::Bool(b) => Ok(Value::Integer(*b as i64)),
            _ => Err(ServiceError::Validation(
                "rule value must be a string or number".into(),
            )),
        },
    }
}

fn segment_indexes(s: &Segment) -> Vec<(&'static str, Value)> {
    vec![
        ("name", Value::Text(s.name.clone())),
        (
            "kind",
            Value::Text(
                match s.kind {
                    SegmentKind::Dynamic => "dynamic",
                    SegmentKind::Static => "static",
                }
                .to_string(),
            ),
        ),
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
    use crate::model::{CreateCustomerRequest, CustomerStatus};

    fn svc() -> CrmService {
        let db = Arc::new(SqliteStore::open_in_memory().unwrap());
        CrmService::new(db, Arc::new(MemorySink::new())).unwrap()
    }

    fn seed_customer(
        svc: &CrmService,
        org: &str,
        name: &str,
        city: &str,
        status: CustomerStatus,
        spent: f64,
    ) -> Customer {
        let c = svc
            .create_customer(
                org,
                CreateCustomerRequest {
                    name: name.into(),
                    email: None,
                    phone: None,
                    company: None,
                    city: Some(city.into()),
                    country: None,
                    status,
                },
            )
            .unwrap();
        svc.update_customer(org, &c.id, serde_json::json!({"totalSpent": spent}))
            .unwrap()
    }

    fn rule(field: &str, op: SegmentOp, value: serde_json::Value) -> SegmentRule {
        SegmentRule {
            field: field.into(),
            operator: op,
            value,
        }
    }

    #[test]
    fn preview_count_matches_and_semantics() {
        let svc = svc();
        seed_customer(&svc, "org1", "Ana", "Lima", CustomerStatus::Active, 300.0);
        seed_customer(&svc, "org1", "Beto", "Lima", CustomerStatus::Active, 50.0);
        seed_customer(&svc, "org1", "Carla", "Cusco", CustomerStatus::Active, 400.0);
        seed_customer(&svc, "org1", "Dario", "Lima", CustomerStatus::Lead, 500.0);

        // Active AND in Lima AND spent > 100: only Ana.
        let rules = vec![
            rule("status", SegmentOp::Eq, serde_json::json!("active")),
            rule("city", SegmentOp::Eq, serde_json::json!("Lima")),
            rule("total_spent", SegmentOp::Gt, serde_json::json!(100)),
        ];
        let preview = svc.preview_segment("org1", &rules).unwrap();
        assert_eq!(preview.count, 1);
        assert_eq!(preview.sample.len(), 1);
        assert_eq!(preview.sample[0].name, "Ana");

        // Every sampled row satisfies each rule.
        for c in &preview.sample {
            assert_eq!(c.status, CustomerStatus::Active);
            assert_eq!(c.city.as_deref(), Some("Lima"));
            assert!(c.total_spent > 100.0);
        }

        // No rules matches everything in the org.
        assert_eq!(svc.preview_segment("org1", &[]).unwrap().count, 4);
    }

    #[test]
    fn string_operators() {
        let svc = svc();
        seed_customer(&svc, "org1", "Ana Torres", "Lima", CustomerStatus::Lead, 0.0);
        seed_customer(&svc, "org1", "Mariana Cruz", "Lima", CustomerStatus::Lead, 0.0);

        let contains = vec![rule("name", SegmentOp::Contains, serde_json::json!("ana"))];
        // SQLite LIKE is ASCII case-insensitive, so both names match.
        assert_eq!(svc.preview_segment("org1", &contains).unwrap().count, 2);

        let starts = vec![rule("name", SegmentOp::StartsWith, serde_json::json!("Ana"))];
        assert_eq!(svc.preview_segment("org1", &starts).unwrap().count, 1);

        let neq = vec![rule("city", SegmentOp::Neq, serde_json::json!("Cusco"))];
        assert_eq!(svc.preview_segment("org1", &neq).unwrap().count, 2);
    }

    #[test]
    fn unknown_field_rejected() {
        let svc = svc();
        let rules = vec![rule(
            "password; DROP TABLE customers",
            SegmentOp::Eq,
            serde_json::json!("x"),
        )];
        let err = svc.preview_segment("org1", &rules).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");

        let empty = vec![rule("", SegmentOp::Eq, serde_json::json!("x"))];
        assert!(svc.preview_segment("org1", &empty).is_err());
    }

    #[test]
    fn contains_requires_string_value() {
        let svc = svc();
        let rules = vec![rule("name", SegmentOp::Contains, serde_json::json!(42))];
        let err = svc.preview_segment("org1", &rules).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
    }

    #[test]
    fn dynamic_segment_recomputes_on_read() {
        let svc = svc();
        seed_customer(&svc, "org1", "Ana", "Lima", CustomerStatus::Active, 0.0);

        let seg = svc
            .create_segment(
                "org1",
                CreateSegmentRequest {
                    name: "Active".into(),
                    description: None,
                    kind: SegmentKind::Dynamic,
                    rules: vec![rule("status", SegmentOp::Eq, serde_json::json!("active"))],
                },
            )
            .unwrap();
        assert_eq!(seg.member_count, 1);

        seed_customer(&svc, "org1", "Beto", "Lima", CustomerStatus::Active, 0.0);

        let seg = svc.get_segment("org1", &seg.id).unwrap();
        assert_eq!(seg.member_count, 2);
        assert_eq!(svc.segment_members("org1", &seg.id, &Default::default()).unwrap().total, 2);
    }

    #[test]
    fn static_segment_freezes_membership() {
        let svc = svc();
        let ana = seed_customer(&svc, "org1", "Ana", "Lima", CustomerStatus::Active, 0.0);

        let seg = svc
            .create_segment(
                "org1",
                CreateSegmentRequest {
                    name: "Snapshot".into(),
                    description: None,
                    kind: SegmentKind::Static,
                    rules: vec![rule("status", SegmentOp::Eq, serde_json::json!("active"))],
                },
            )
            .unwrap();
        assert_eq!(seg.member_ids, vec![ana.id.clone()]);
        assert_eq!(seg.member_count, 1);

        // New matching customers do not join a frozen segment.
        seed_customer(&svc, "org1", "Beto", "Lima", CustomerStatus::Active, 0.0);
        let members = svc
            .segment_members("org1", &seg.id, &Default::default())
            .unwrap();
        assert_eq!(members.total, 1);
        assert_eq!(members.items[0].id, ana.id);

        // Deleted customers drop out of the resolved member list.
        svc.delete_customer("org1", &ana.id).unwrap();
        let members = svc
            .segment_members("org1", &seg.id, &Default::default())
            .unwrap();
        assert_eq!(members.total, 0);
    }

    #[test]
    fn materialize_freezes_then_conflicts() {
        let svc = svc();
        seed_customer(&svc, "org1", "Ana", "Lima", CustomerStatus::Active, 0.0);

        let seg = svc
            .create_segment(
                "org1",
                CreateSegmentRequest {
                    name: "Active".into(),
                    description: None,
                    kind: SegmentKind::Dynamic,
                    rules: vec![rule("status", SegmentOp::Eq, serde_json::json!("active"))],
                },
            )
            .unwrap();

        let frozen = svc.materialize_segment("org1", &seg.id).unwrap();
        assert_eq!(frozen.kind, SegmentKind::Static);
        assert_eq!(frozen.member_count, 1);

        let err = svc.materialize_segment("org1", &seg.id).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
    }

    #[test]
    fn update_rejects_bad_rules_and_protects_kind() {
        let svc = svc();
        let seg = svc
            .create_segment(
                "org1",
                CreateSegmentRequest {
                    name: "All".into(),
                    description: None,
                    kind: SegmentKind::Dynamic,
                    rules: vec![],
                },
            )
            .unwrap();

        let err = svc
            .update_segment(
                "org1",
                &seg.id,
                serde_json::json!({"rules": [{"field": "nope", "operator": "eq", "value": 1}]}),
            )
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");

        let updated = svc
            .update_segment("org1", &seg.id, serde_json::json!({"kind": "static", "name": "Everyone"}))
            .unwrap();
        assert_eq!(updated.kind, SegmentKind::Dynamic);
        assert_eq!(updated.name, "Everyone");
    }
}
