use centro_core::ServiceError;
use centro_sql::SQLStore;

/// SQL DDL for the inventory tables.
///
/// `stock_levels.variant_id` stores '' (not NULL) for product-level rows
/// so the UNIQUE constraint can dedupe — SQLite treats NULLs as distinct.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS products (
        id TEXT PRIMARY KEY,
        org_id TEXT NOT NULL,
        data TEXT NOT NULL,
        name TEXT,
        sku TEXT,
        category TEXT,
        price REAL,
        active INTEGER,
        created_at TEXT,
        updated_at TEXT,
        UNIQUE(org_id, sku)
    )",
    "CREATE TABLE IF NOT EXISTS variants (
        id TEXT PRIMARY KEY,
        org_id TEXT NOT NULL,
        data TEXT NOT NULL,
        product_id TEXT,
        sku TEXT,
        created_at TEXT,
        UNIQUE(org_id, sku)
    )",
    "CREATE TABLE IF NOT EXISTS suppliers (
        id TEXT PRIMARY KEY,
        org_id TEXT NOT NULL,
        data TEXT NOT NULL,
        name TEXT,
        email TEXT,
        created_at TEXT,
        updated_at TEXT
    )",
    "CREATE TABLE IF NOT EXISTS stock_levels (
        id TEXT PRIMARY KEY,
        org_id TEXT NOT NULL,
        data TEXT NOT NULL,
        product_id TEXT,
        variant_id TEXT NOT NULL DEFAULT '',
        quantity INTEGER,
        min_quantity INTEGER,
        created_at TEXT,
        updated_at TEXT,
        UNIQUE(org_id, product_id, variant_id)
    )",
    "CREATE TABLE IF NOT EXISTS stock_movements (
        id TEXT PRIMARY KEY,
        org_id TEXT NOT NULL,
        data TEXT NOT NULL,
        stock_id TEXT,
        created_at TEXT
    )",
    // Indexes
    "CREATE INDEX IF NOT EXISTS idx_prod_org ON products(org_id)",
    "CREATE INDEX IF NOT EXISTS idx_var_product ON variants(org_id, product_id)",
    "CREATE INDEX IF NOT EXISTS idx_sup_org ON suppliers(org_id)",
    "CREATE INDEX IF NOT EXISTS idx_stock_org ON stock_levels(org_id)",
    "CREATE INDEX IF NOT EXISTS idx_stock_product ON stock_levels(org_id, product_id)",
    "CREATE INDEX IF NOT EXISTS idx_move_stock ON stock_movements(org_id, stock_id)",
];

pub fn init_schema(db: &dyn SQLStore) -> Result<(), ServiceError> {
    for stmt in SCHEMA {
        db.exec(stmt, &[])
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
    }
    Ok(())
}
