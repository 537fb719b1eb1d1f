use centro_core::ServiceError;
use centro_sql::SQLStore;

/// SQL DDL statements for the CRM tables.
///
/// Each table stores the full JSON document in a `data` TEXT column, with
/// indexed columns extracted for filtering. The customer columns double as
/// the whitelist of segment-rule fields.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS customers (
        id TEXT PRIMARY KEY,
        org_id TEXT NOT NULL,
        data TEXT NOT NULL,
        name TEXT,
        email TEXT,
        phone TEXT,
        company TEXT,
        city TEXT,
        country TEXT,
        status TEXT,
        total_spent REAL,
        purchase_count INTEGER,
        created_at TEXT,
        updated_at TEXT
    )",
    "CREATE TABLE IF NOT EXISTS segments (
        id TEXT PRIMARY KEY,
        org_id TEXT NOT NULL,
        data TEXT NOT NULL,
        name TEXT,
        kind TEXT,
        created_at TEXT,
        updated_at TEXT
    )",
    // Indexes
    "CREATE INDEX IF NOT EXISTS idx_cust_org ON customers(org_id)",
    "CREATE INDEX IF NOT EXISTS idx_cust_status ON customers(org_id, status)",
    "CREATE INDEX IF NOT EXISTS idx_cust_email ON customers(org_id, email)",
    "CREATE INDEX IF NOT EXISTS idx_seg_org ON segments(org_id)",
];

pub fn init_schema(db: &dyn SQLStore) -> Result<(), ServiceError> {
    for stmt in SCHEMA {
        db.exec(stmt, &[])
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
    }
    Ok(())
}
