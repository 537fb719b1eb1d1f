pub mod api;
pub mod model;
pub mod service;
pub mod worker;

use std::sync::Arc;

use axum::Router;
use centro_core::{EventSink, Module};
use centro_sql::SQLStore;

use service::GymService;
use worker::WorkerConfig;

/// Gym module — membership plans and enrollments, with a background scan
/// that raises expiry alerts.
pub struct GymModule {
    service: Arc<GymService>,
    _worker_cancel: tokio_util::sync::CancellationToken,
}

impl GymModule {
    /// Create the module, initialise storage, and start the expiry scan.
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
        let service = Arc::new(GymService::new(db, events)?);
        let cancel = worker::start(Arc::clone(&service), worker_config);

        Ok(Self {
            service,
            _worker_cancel: cancel,
        })
    }
}

impl Module for GymModule {
    fn name(&self) -> &str {
        "gym"
    }

    fn routes(&self) -> Router {
        api::router(Arc::clone(&self.service))
    }
}
