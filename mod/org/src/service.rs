use std::sync::Arc;

use centro_core::{ListParams, ListResult, ServiceError, new_id, now_rfc3339, store};
use centro_sql::{SQLStore, Value};

use crate::model::{CreateOrgRequest, Organization};

/// Organizations are the one table that is not org-scoped, so this
/// service talks to SQL directly instead of going through the scoped
/// record helpers.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS organizations (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        name TEXT,
        slug TEXT UNIQUE,
        created_at TEXT,
        updated_at TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_org_name ON organizations(name)",
];

pub struct OrgService {
    db: Arc<dyn SQLStore>,
}

impl OrgService {
    pub fn new(db: Arc<dyn SQLStore>) -> Result<Self, ServiceError> {
        for stmt in SCHEMA {
            db.exec(stmt, &[])
                .map_err(|e| ServiceError::Storage(e.to_string()))?;
        }
        Ok(Self { db })
    }

    pub fn create_org(&self, req: CreateOrgRequest) -> Result<Organization, ServiceError> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::Validation("organization name is required".into()));
        }

        let slug = match req.slug {
            Some(s) => {
                validate_slug(&s)?;
                s
            }
            None => {
                let derived = slugify(&name);
                if derived.is_empty() {
                    return Err(ServiceError::Validation(format!(
                        "cannot derive a slug from name '{}'; provide one explicitly",
                        name
                    )));
                }
                derived
            }
        };

        let id = new_id();
        let now = now_rfc3339();
        let record = Organization {
            id: id.clone(),
            name: name.clone(),
            slug: slug.clone(),
            base_currency: req
                .base_currency
                .map(|c| c.to_ascii_uppercase())
                .unwrap_or_else(|| "USD".to_string()),
            active: true,
            created_at: now.clone(),
            updated_at: now.clone(),
        };

        let json = serde_json::to_string(&record)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        self.db
            .exec(
                "INSERT INTO organizations (id, data, name, slug, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                &[
                    Value::Text(id),
                    Value::Text(json),
                    Value::Text(name),
                    Value::Text(slug.clone()),
                    Value::Text(now.clone()),
                    Value::Text(now),
                ],
            )
            .map_err(|e| {
                let msg = e.to_string();
                if msg.contains("UNIQUE constraint") {
                    ServiceError::Conflict(format!("slug '{}' is already taken", slug))
                } else {
                    ServiceError::Storage(msg)
                }
            })?;

        Ok(record)
    }

    pub fn get_org(&self, id: &str) -> Result<Organization, ServiceError> {
        self.fetch_one(
            "SELECT data FROM organizations WHERE id = ?1",
            &[Value::Text(id.to_string())],
        )?
        .ok_or_else(|| ServiceError::NotFound(format!("organization '{}' not found", id)))
    }

    pub fn get_by_slug(&self, slug: &str) -> Result<Organization, ServiceError> {
        self.fetch_one(
            "SELECT data FROM organizations WHERE slug = ?1",
            &[Value::Text(slug.to_string())],
        )?
        .ok_or_else(|| ServiceError::NotFound(format!("organization '{}' not found", slug)))
    }

    pub fn list_orgs(&self, params: &ListParams) -> Result<ListResult<Organization>, ServiceError> {
        let limit = params.limit.min(500);
        let (where_sql, mut where_params) = match &params.q {
            Some(q) => (
                " WHERE name LIKE ?1".to_string(),
                vec![Value::Text(format!("%{}%", q))],
            ),
            None => (String::new(), Vec::new()),
        };

        let count_sql = format!("SELECT COUNT(*) as cnt FROM organizations{}", where_sql);
        let rows = self
            .db
            .query(&count_sql, &where_params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        let total = rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0) as usize;

        let limit_idx = where_params.len() + 1;
        let offset_idx = where_params.len() + 2;
        where_params.push(Value::Integer(limit as i64));
        where_params.push(Value::Integer(params.offset as i64));

        let sql = format!(
            "SELECT data FROM organizations{} ORDER BY created_at DESC LIMIT ?{} OFFSET ?{}",
            where_sql, limit_idx, offset_idx,
        );
        let rows = self
            .db
            .query(&sql, &where_params)
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

        Ok(ListResult { items, total })
    }

    pub fn update_org(
        &self,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<Organization, ServiceError> {
        let current = self.get_org(id)?;
        let updated: Organization = store::apply_patch(&current, patch)?;

        if updated.name.trim().is_empty() {
            return Err(ServiceError::Validation("organization name is required".into()));
        }
        validate_slug(&updated.slug)?;

        let json = serde_json::to_string(&updated)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        self.db
            .exec(
                "UPDATE organizations
                 SET data = ?1, name = ?2, slug = ?3, updated_at = ?4
                 WHERE id = ?5",
                &[
                    Value::Text(json),
                    Value::Text(updated.name.clone()),
                    Value::Text(updated.slug.clone()),
                    Value::Text(updated.updated_at.clone()),
                    Value::Text(id.to_string()),
                ],
            )
            .map_err(|e| {
                let msg = e.to_string();
                if msg.contains("UNIQUE constraint") {
                    ServiceError::Conflict(format!("slug '{}' is already taken", updated.slug))
                } else {
                    ServiceError::Storage(msg)
                }
            })?;

        Ok(updated)
    }

    /// Delete an organization. Scoped records in other modules are kept
    /// but become unreachable through the API.
    pub fn delete_org(&self, id: &str) -> Result<(), ServiceError> {
        let affected = self
            .db
            .exec(
                "DELETE FROM organizations WHERE id = ?1",
                &[Value::Text(id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        if affected == 0 {
            return Err(ServiceError::NotFound(format!("organization '{}' not found", id)));
        }
        Ok(())
    }

    /// Fast existence check used by the scoping middleware.
    pub fn exists(&self, id: &str) -> Result<bool, ServiceError> {
        let rows = self
            .db
            .query(
                "SELECT COUNT(*) as cnt FROM organizations WHERE id = ?1",
                &[Value::Text(id.to_string())],
            )
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        Ok(rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0) > 0)
    }

    fn fetch_one(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<Option<Organization>, ServiceError> {
        let rows = self
            .db
            .query(sql, params)
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
        match rows.first() {
            None => Ok(None),
            Some(row) => {
                let data = row
                    .get_str("data")
                    .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
                Ok(Some(
                    serde_json::from_str(data)
                        .map_err(|e| ServiceError::Internal(e.to_string()))?,
                ))
            }
        }
    }
}

/// Derive a slug from a display name: lowercase, spaces to hyphens,
/// anything else dropped, runs of hyphens collapsed.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_hyphen = true;
    for c in name.chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_hyphen = false;
        } else if (c.is_whitespace() || c == '-' || c == '_') && !last_hyphen {
            out.push('-');
            last_hyphen = true;
        }
    }
    out.trim_end_matches('-').to_string()
}

fn validate_slug(slug: &str) -> Result<(), ServiceError> {
    let ok = !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if ok {
        Ok(())
    } else {
        Err(ServiceError::Validation(format!(
            "invalid slug '{}': use lowercase letters, digits, and hyphens",
            slug
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use centro_sql::SqliteStore;

    fn svc() -> OrgService {
        let db = Arc::new(SqliteStore::open_in_memory().unwrap());
        OrgService::new(db).unwrap()
    }

    fn create(svc: &OrgService, name: &str) -> Organization {
        svc.create_org(CreateOrgRequest {
            name: name.into(),
            slug: None,
            base_currency: None,
        })
        .unwrap()
    }

    #[test]
    fn slug_is_derived_from_name() {
        let svc = svc();
        let org = create(&svc, "Acme Corp");
        assert_eq!(org.slug, "acme-corp");
        assert_eq!(svc.get_by_slug("acme-corp").unwrap().id, org.id);
    }

    #[test]
    fn slugify_drops_punctuation() {
        assert_eq!(slugify("Bob's Gym & Spa"), "bobs-gym-spa");
        assert_eq!(slugify("  Café  24/7  "), "caf-247");
        assert_eq!(slugify("--"), "");
    }

    #[test]
    fn duplicate_slug_conflicts() {
        let svc = svc();
        create(&svc, "Acme");
        let err = svc
            .create_org(CreateOrgRequest {
                name: "Acme 2".into(),
                slug: Some("acme".into()),
                base_currency: None,
            })
            .unwrap_err();
        assert_eq!(err.error_code(), "ALREADY_EXISTS");
    }

    #[test]
    fn invalid_slug_rejected() {
        let svc = svc();
        let err = svc
            .create_org(CreateOrgRequest {
                name: "X".into(),
                slug: Some("Bad Slug!".into()),
                base_currency: None,
            })
            .unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_FAILED");
    }

    #[test]
    fn list_filters_by_name() {
        let svc = svc();
        create(&svc, "Acme Gym");
        create(&svc, "Acme Store");
        create(&svc, "Bravo");

        let result = svc
            .list_orgs(&ListParams {
                q: Some("Acme".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(result.total, 2);

        let all = svc.list_orgs(&ListParams::default()).unwrap();
        assert_eq!(all.total, 3);
    }

    #[test]
    fn patch_updates_name() {
        let svc = svc();
        let org = create(&svc, "Acme");
        let updated = svc
            .update_org(&org.id, serde_json::json!({"name": "Acme Intl"}))
            .unwrap();
        assert_eq!(updated.name, "Acme Intl");
        assert_eq!(updated.slug, "acme");
        assert_eq!(svc.get_org(&org.id).unwrap().name, "Acme Intl");
    }

    #[test]
    fn delete_then_gone() {
        let svc = svc();
        let org = create(&svc, "Acme");
        assert!(svc.exists(&org.id).unwrap());
        svc.delete_org(&org.id).unwrap();
        assert!(!svc.exists(&org.id).unwrap());
        assert_eq!(
            svc.get_org(&org.id).unwrap_err().error_code(),
            "NOT_FOUND"
        );
    }
}
