use centro_core::ServiceError;
use centro_sql::SQLStore;

/// SQL DDL for the sales tables. `sold_day` extracts the date part of
/// `sold_at` so reports can group and filter by calendar day.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS sales (
        id TEXT PRIMARY KEY,
        org_id TEXT NOT NULL,
        data TEXT NOT NULL,
        customer_id TEXT,
        product_id TEXT,
        currency TEXT,
        total REAL,
        sold_at TEXT,
        sold_day TEXT,
        created_at TEXT
    )",
    "CREATE TABLE IF NOT EXISTS exchange_rates (
        id TEXT PRIMARY KEY,
        org_id TEXT NOT NULL,
        data TEXT NOT NULL,
        base TEXT,
        quote TEXT,
        rate REAL,
        created_at TEXT,
        UNIQUE(org_id, base, quote)
    )",
    "CREATE INDEX IF NOT EXISTS idx_sale_org ON sales(org_id)",
    "CREATE INDEX IF NOT EXISTS idx_sale_day ON sales(org_id, sold_day)",
    "CREATE INDEX IF NOT EXISTS idx_sale_customer ON sales(org_id, customer_id)",
    "CREATE INDEX IF NOT EXISTS idx_rate_org ON exchange_rates(org_id)",
];

pub fn init_schema(db: &dyn SQLStore) -> Result<(), ServiceError> {
    for stmt in SCHEMA {
        db.exec(stmt, &[])
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
    }
    Ok(())
}
