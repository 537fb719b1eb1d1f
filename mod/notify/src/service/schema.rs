use centro_core::ServiceError;
use centro_sql::SQLStore;

/// SQL DDL for the notification tables.
///
/// `trigger_executions` and `notifications` extract their event time into
/// the shared `created_at` column so the generic list helpers can order
/// them like every other table.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS event_triggers (
        id TEXT PRIMARY KEY,
        org_id TEXT NOT NULL,
        data TEXT NOT NULL,
        name TEXT,
        event_code TEXT,
        active INTEGER,
        created_at TEXT,
        updated_at TEXT
    )",
    "CREATE TABLE IF NOT EXISTS notification_templates (
        id TEXT PRIMARY KEY,
        org_id TEXT NOT NULL,
        data TEXT NOT NULL,
        name TEXT,
        created_at TEXT,
        updated_at TEXT
    )",
    "CREATE TABLE IF NOT EXISTS notifications (
        id TEXT PRIMARY KEY,
        org_id TEXT NOT NULL,
        data TEXT NOT NULL,
        channel TEXT,
        event_code TEXT,
        status TEXT,
        read INTEGER NOT NULL DEFAULT 0,
        created_at TEXT
    )",
    "CREATE TABLE IF NOT EXISTS trigger_executions (
        id TEXT PRIMARY KEY,
        org_id TEXT NOT NULL,
        data TEXT NOT NULL,
        trigger_id TEXT,
        event_code TEXT,
        outcome TEXT,
        created_at TEXT
    )",
    // Indexes
    "CREATE INDEX IF NOT EXISTS idx_trig_event ON event_triggers(org_id, event_code)",
    "CREATE INDEX IF NOT EXISTS idx_notif_created ON notifications(org_id, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_notif_read ON notifications(org_id, read)",
    "CREATE INDEX IF NOT EXISTS idx_exec_trigger ON trigger_executions(org_id, trigger_id)",
];

pub fn init_schema(db: &dyn SQLStore) -> Result<(), ServiceError> {
    for stmt in SCHEMA {
        db.exec(stmt, &[])
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
    }
    Ok(())
}
