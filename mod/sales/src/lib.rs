pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;
use centro_core::{EventSink, Module};
use centro_sql::SQLStore;

use service::SalesService;

/// Sales module — sale records, currency conversion, revenue reports.
pub struct SalesModule {
    service: Arc<SalesService>,
}

impl SalesModule {
    pub fn new(
        db: Arc<dyn SQLStore>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, centro_core::ServiceError> {
        Ok(Self {
            service: Arc::new(SalesService::new(db, events)?),
        })
    }
}

impl Module for SalesModule {
    fn name(&self) -> &str {
        "sales"
    }

    fn routes(&self) -> Router {
        api::router(Arc::clone(&self.service))
    }
}
