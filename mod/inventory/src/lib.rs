pub mod api;
pub mod model;
pub mod service;
pub mod worker;

use std::sync::Arc;

use axum::Router;
use centro_core::{EventSink, Module};
use centro_sql::SQLStore;

use service::InventoryService;
use worker::WorkerConfig;

/// Inventory module — products, variants, suppliers, and stock levels,
/// with a background scan that raises low stock alerts.
pub struct InventoryModule {
    service: Arc<InventoryService>,
    _worker_cancel: tokio_util::sync::CancellationToken,
}

impl InventoryModule {
    /// Create the module, initialise storage, and start the stock scan.
    pub fn new(
        db: Arc<dyn SQLStore>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, centro_core::ServiceError> {
        Self::with_config(db, events, WorkerConfig::default())
    }

    /// Create with explicit worker configuration.
    pub fn with_config(
        db: Arc<dyn SQLStore>,
        events: Arc<dyn EventSink>,
        worker_config: WorkerConfig,
    ) -> Result<Self, centro_core::ServiceError> {
        let service = Arc::new(InventoryService::new(db, events)?);
        let cancel = worker::start(Arc::clone(&service), worker_config);

        Ok(Self {
            service,
            _worker_cancel: cancel,
        })
    }
}

impl Module for InventoryModule {
    fn name(&self) -> &str {
        "inventory"
    }

    fn routes(&self) -> Router {
        api::router(Arc::clone(&self.service))
    }
}
