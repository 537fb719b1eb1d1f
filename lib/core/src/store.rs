//! Generic JSON-document persistence helpers.
//!
//! Every business table follows the same shape: the full record as JSON in
//! a `data` TEXT column, plus extracted columns (`id`, `org_id`, and any
//! filterable fields) for indexing and uniqueness. These helpers implement
//! the CRUD plumbing once; module services supply the table name and the
//! extracted columns.
//!
//! All operations are scoped to one organization. A record is only visible
//! to the org that created it, so `get`/`update`/`delete` against another
//! org's record behave exactly like a missing record.

use serde::Serialize;
use serde::de::DeserializeOwned;

use centro_sql::{SQLStore, Value};

use crate::error::ServiceError;
use crate::types::{ListResult, merge_patch, now_rfc3339};

/// Insert a record as JSON into a table with indexed columns.
pub fn insert_record<T: Serialize>(
    db: &dyn SQLStore,
    table: &str,
    org_id: &str,
    id: &str,
    record: &T,
    indexes: &[(&str, Value)],
) -> Result<(), ServiceError> {
    let json = serde_json::to_string(record)
        .map_err(|e| ServiceError::Internal(e.to_string()))?;

    let mut cols = vec!["id", "org_id", "data"];
    let mut placeholders = vec!["?1".to_string(), "?2".to_string(), "?3".to_string()];
    let mut params = vec![
        Value::Text(id.to_string()),
        Value::Text(org_id.to_string()),
        Value::Text(json),
    ];

    for (i, (col, val)) in indexes.iter().enumerate() {
        let idx = i + 4;
        cols.push(col);
        placeholders.push(format!("?{}", idx));
        params.push(val.clone());
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        cols.join(", "),
        placeholders.join(", "),
    );

    db.exec(&sql, &params).map_err(|e| {
        let msg = e.to_string();
        if msg.contains("UNIQUE constraint") {
            ServiceError::Conflict(msg)
        } else {
            ServiceError::Storage(msg)
        }
    })?;

    Ok(())
}

/// Get a record by id, deserializing the JSON `data` column.
pub fn get_record<T: DeserializeOwned>(
    db: &dyn SQLStore,
    table: &str,
    org_id: &str,
    id: &str,
) -> Result<T, ServiceError> {
    let sql = format!("SELECT data FROM {} WHERE id = ?1 AND org_id = ?2", table);
    let rows = db
        .query(&sql, &[Value::Text(id.to_string()), Value::Text(org_id.to_string())])
        .map_err(|e| ServiceError::Storage(e.to_string()))?;
    let row = rows
        .first()
        .ok_or_else(|| ServiceError::NotFound(format!("{}/{}", table, id)))?;
    let data = row
        .get_str("data")
        .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
    serde_json::from_str(data).map_err(|e| ServiceError::Internal(e.to_string()))
}

/// Update a record's JSON data and indexed columns.
pub fn update_record<T: Serialize>(
    db: &dyn SQLStore,
    table: &str,
    org_id: &str,
    id: &str,
    record: &T,
    indexes: &[(&str, Value)],
) -> Result<(), ServiceError> {
    let json = serde_json::to_string(record)
        .map_err(|e| ServiceError::Internal(e.to_string()))?;

    let mut sets = vec!["data = ?1".to_string()];
    let mut params: Vec<Value> = vec![Value::Text(json)];

    for (i, (col, val)) in indexes.iter().enumerate() {
        let idx = i + 2;
        sets.push(format!("{} = ?{}", col, idx));
        params.push(val.clone());
    }

    let id_idx = params.len() + 1;
    let org_idx = params.len() + 2;
    params.push(Value::Text(id.to_string()));
    params.push(Value::Text(org_id.to_string()));

    let sql = format!(
        "UPDATE {} SET {} WHERE id = ?{} AND org_id = ?{}",
        table,
        sets.join(", "),
        id_idx,
        org_idx,
    );

    let affected = db.exec(&sql, &params).map_err(|e| {
        let msg = e.to_string();
        if msg.contains("UNIQUE constraint") {
            ServiceError::Conflict(msg)
        } else {
            ServiceError::Storage(msg)
        }
    })?;

    if affected == 0 {
        return Err(ServiceError::NotFound(format!("{}/{}", table, id)));
    }

    Ok(())
}

/// Delete a record by id.
pub fn delete_record(
    db: &dyn SQLStore,
    table: &str,
    org_id: &str,
    id: &str,
) -> Result<(), ServiceError> {
    let sql = format!("DELETE FROM {} WHERE id = ?1 AND org_id = ?2", table);
    let affected = db
        .exec(&sql, &[Value::Text(id.to_string()), Value::Text(org_id.to_string())])
        .map_err(|e| ServiceError::Storage(e.to_string()))?;
    if affected == 0 {
        return Err(ServiceError::NotFound(format!("{}/{}", table, id)));
    }
    Ok(())
}

/// List records with optional equality filters, a substring match on the
/// `name` column, pagination, and a total count.
pub fn list_records<T: DeserializeOwned + Serialize>(
    db: &dyn SQLStore,
    table: &str,
    org_id: &str,
    filters: &[(&str, Value)],
    name_like: Option<&str>,
    limit: usize,
    offset: usize,
) -> Result<ListResult<T>, ServiceError> {
    let mut where_clauses = vec!["org_id = ?1".to_string()];
    let mut params = vec![Value::Text(org_id.to_string())];

    for (col, val) in filters {
        let idx = params.len() + 1;
        where_clauses.push(format!("{} = ?{}", col, idx));
        params.push(val.clone());
    }

    if let Some(q) = name_like {
        let idx = params.len() + 1;
        where_clauses.push(format!("name LIKE ?{}", idx));
        params.push(Value::Text(format!("%{}%", q)));
    }

    let where_sql = format!(" WHERE {}", where_clauses.join(" AND "));

    let count_sql = format!("SELECT COUNT(*) as cnt FROM {}{}", table, where_sql);
    let rows = db
        .query(&count_sql, &params)
        .map_err(|e| ServiceError::Storage(e.to_string()))?;
    let total = rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0) as usize;

    let limit_idx = params.len() + 1;
    let offset_idx = params.len() + 2;
    params.push(Value::Integer(limit as i64));
    params.push(Value::Integer(offset as i64));

    let sql = format!(
        "SELECT data FROM {}{} ORDER BY created_at DESC LIMIT ?{} OFFSET ?{}",
        table, where_sql, limit_idx, offset_idx,
    );

    let rows = db
        .query(&sql, &params)
        .map_err(|e| ServiceError::Storage(e.to_string()))?;

    let mut items = Vec::new();
    for row in &rows {
        let data = row
            .get_str("data")
            .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
        let item: T = serde_json::from_str(data)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        items.push(item);
    }

    Ok(ListResult { items, total })
}

/// Count records with optional equality filters.
pub fn count_records(
    db: &dyn SQLStore,
    table: &str,
    org_id: &str,
    filters: &[(&str, Value)],
) -> Result<i64, ServiceError> {
    let mut where_clauses = vec!["org_id = ?1".to_string()];
    let mut params = vec![Value::Text(org_id.to_string())];

    for (col, val) in filters {
        let idx = params.len() + 1;
        where_clauses.push(format!("{} = ?{}", col, idx));
        params.push(val.clone());
    }

    let sql = format!(
        "SELECT COUNT(*) as cnt FROM {} WHERE {}",
        table,
        where_clauses.join(" AND "),
    );
    let rows = db
        .query(&sql, &params)
        .map_err(|e| ServiceError::Storage(e.to_string()))?;

    Ok(rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0))
}

/// Apply a JSON merge-patch to a record.
///
/// `id`, `orgId`, and `createdAt` are immutable and stripped from the
/// patch; `updatedAt` is stamped with the current time.
pub fn apply_patch<T: Serialize + DeserializeOwned>(
    current: &T,
    patch: serde_json::Value,
) -> Result<T, ServiceError> {
    let mut json = serde_json::to_value(current)
        .map_err(|e| ServiceError::Internal(e.to_string()))?;
    let now = now_rfc3339();

    let mut patch_filtered = patch;
    if let Some(obj) = patch_filtered.as_object_mut() {
        obj.remove("id");
        obj.remove("orgId");
        obj.remove("createdAt");
        obj.insert("updatedAt".into(), serde_json::json!(now));
    }

    merge_patch(&mut json, &patch_filtered);
    serde_json::from_value(json).map_err(|e| ServiceError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use centro_sql::SqliteStore;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Widget {
        id: String,
        org_id: String,
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
        created_at: String,
        updated_at: String,
    }

    fn setup() -> SqliteStore {
        let db = SqliteStore::open_in_memory().unwrap();
        db.exec_batch(
            "CREATE TABLE widgets (
                id TEXT PRIMARY KEY,
                org_id TEXT NOT NULL,
                data TEXT NOT NULL,
                name TEXT,
                created_at TEXT,
                UNIQUE(org_id, name)
            )",
        )
        .unwrap();
        db
    }

    fn widget(id: &str, org: &str, name: &str) -> Widget {
        Widget {
            id: id.into(),
            org_id: org.into(),
            name: name.into(),
            color: None,
            created_at: now_rfc3339(),
            updated_at: now_rfc3339(),
        }
    }

    fn insert(db: &SqliteStore, w: &Widget) {
        insert_record(
            db,
            "widgets",
            &w.org_id,
            &w.id,
            w,
            &[
                ("name", Value::Text(w.name.clone())),
                ("created_at", Value::Text(w.created_at.clone())),
            ],
        )
        .unwrap();
    }

    #[test]
    fn crud_roundtrip() {
        let db = setup();
        let w = widget("w1", "org1", "gear");
        insert(&db, &w);

        let got: Widget = get_record(&db, "widgets", "org1", "w1").unwrap();
        assert_eq!(got, w);

        delete_record(&db, "widgets", "org1", "w1").unwrap();
        let err = get_record::<Widget>(&db, "widgets", "org1", "w1").unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[test]
    fn records_are_org_scoped() {
        let db = setup();
        insert(&db, &widget("w1", "org1", "gear"));

        // Another org cannot see, update, or delete the record.
        assert!(get_record::<Widget>(&db, "widgets", "org2", "w1").is_err());
        assert!(delete_record(&db, "widgets", "org2", "w1").is_err());

        let result: ListResult<Widget> =
            list_records(&db, "widgets", "org2", &[], None, 50, 0).unwrap();
        assert_eq!(result.total, 0);
    }

    #[test]
    fn duplicate_key_is_conflict() {
        let db = setup();
        insert(&db, &widget("w1", "org1", "gear"));
        let dup = widget("w2", "org1", "gear");
        let err = insert_record(
            &db,
            "widgets",
            "org1",
            &dup.id,
            &dup,
            &[("name", Value::Text(dup.name.clone()))],
        )
        .unwrap_err();
        assert_eq!(err.error_code(), "ALREADY_EXISTS");

        // Same name in a different org is fine.
        insert(&db, &widget("w3", "org2", "gear"));
    }

    #[test]
    fn list_with_name_filter() {
        let db = setup();
        insert(&db, &widget("w1", "org1", "blue gear"));
        insert(&db, &widget("w2", "org1", "red gear"));
        insert(&db, &widget("w3", "org1", "sprocket"));

        let result: ListResult<Widget> =
            list_records(&db, "widgets", "org1", &[], Some("gear"), 50, 0).unwrap();
        assert_eq!(result.total, 2);

        let all: ListResult<Widget> =
            list_records(&db, "widgets", "org1", &[], None, 2, 0).unwrap();
        assert_eq!(all.total, 3);
        assert_eq!(all.items.len(), 2);
    }

    #[test]
    fn update_bumps_data_and_indexes() {
        let db = setup();
        let mut w = widget("w1", "org1", "gear");
        insert(&db, &w);

        w.name = "mega gear".into();
        update_record(
            &db,
            "widgets",
            "org1",
            "w1",
            &w,
            &[("name", Value::Text(w.name.clone()))],
        )
        .unwrap();

        let got: Widget = get_record(&db, "widgets", "org1", "w1").unwrap();
        assert_eq!(got.name, "mega gear");

        let by_name: ListResult<Widget> =
            list_records(&db, "widgets", "org1", &[], Some("mega"), 50, 0).unwrap();
        assert_eq!(by_name.total, 1);
    }

    #[test]
    fn patch_protects_immutable_fields() {
        let w = widget("w1", "org1", "gear");
        let patched: Widget = apply_patch(
            &w,
            serde_json::json!({"id": "hacked", "orgId": "org9", "createdAt": "1999", "color": "red"}),
        )
        .unwrap();
        assert_eq!(patched.id, "w1");
        assert_eq!(patched.org_id, "org1");
        assert_eq!(patched.created_at, w.created_at);
        assert_eq!(patched.color.as_deref(), Some("red"));
        assert!(patched.updated_at >= w.updated_at);
    }
}
