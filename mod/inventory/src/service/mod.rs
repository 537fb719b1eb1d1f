pub mod product;
pub mod schema;
pub mod stock;
pub mod supplier;

use std::sync::Arc;

use centro_core::{EventSink, ServiceError};
use centro_sql::SQLStore;

/// Inventory service — products, variants, suppliers, and stock.
pub struct InventoryService {
    pub(crate) db: Arc<dyn SQLStore>,
    pub(crate) events: Arc<dyn EventSink>,
}

impl InventoryService {
    pub fn new(db: Arc<dyn SQLStore>, events: Arc<dyn EventSink>) -> Result<Self, ServiceError> {
        schema::init_schema(db.as_ref())?;
        Ok(Self { db, events })
    }
}
