pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;
use centro_core::{EventSink, Module};
use centro_sql::SQLStore;

use service::CrmService;

/// CRM module — customers and saved segments.
pub struct CrmModule {
    service: Arc<CrmService>,
}

impl CrmModule {
    pub fn new(
        db: Arc<dyn SQLStore>,
        events: Arc<dyn EventSink>,
    ) -> Result<Self, centro_core::ServiceError> {
        Ok(Self {
            service: Arc::new(CrmService::new(db, events)?),
        })
    }
}

impl Module for CrmModule {
    fn name(&self) -> &str {
        "crm"
    }

    fn routes(&self) -> Router {
        api::router(Arc::clone(&self.service))
    }
}
