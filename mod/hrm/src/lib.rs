pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;
use centro_core::Module;
use centro_sql::SQLStore;

use service::HrmService;

/// HRM module — employee administration.
pub struct HrmModule {
    service: Arc<HrmService>,
}

impl HrmModule {
    pub fn new(db: Arc<dyn SQLStore>) -> Result<Self, centro_core::ServiceError> {
        Ok(Self {
            service: Arc::new(HrmService::new(db)?),
        })
    }
}

impl Module for HrmModule {
    fn name(&self) -> &str {
        "hrm"
    }

    fn routes(&self) -> Router {
        api::router(Arc::clone(&self.service))
    }
}
