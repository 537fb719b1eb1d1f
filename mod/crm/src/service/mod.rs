pub mod customer;
pub mod schema;
pub mod segment;

use std::sync::Arc;

use centro_core::{EventSink, ServiceError};
use centro_sql::{SQLStore, Value};

/// CRM service — customers and saved segments.
pub struct CrmService {
    pub(crate) db: Arc<dyn SQLStore>,
    pub(crate) events: Arc<dyn EventSink>,
}

impl CrmService {
    pub fn new(db: Arc<dyn SQLStore>, events: Arc<dyn EventSink>) -> Result<Self, ServiceError> {
        schema::init_schema(db.as_ref())?;
        Ok(Self { db, events })
    }
}

/// Bind an optional text field as TEXT or NULL.
pub(crate) fn opt_text(v: &Option<String>) -> Value {
    match v {
        Some(s) => Value::Text(s.clone()),
        None => Value::Null,
    }
}
