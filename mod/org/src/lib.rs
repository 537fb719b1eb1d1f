pub mod api;
pub mod model;
pub mod service;

use std::sync::Arc;

use axum::Router;
use centro_core::Module;
use centro_sql::SQLStore;

use service::OrgService;

/// Org module — organization (tenant) management.
pub struct OrgModule {
    service: Arc<OrgService>,
}

impl OrgModule {
    pub fn new(db: Arc<dyn SQLStore>) -> Result<Self, centro_core::ServiceError> {
        Ok(Self {
            service: Arc::new(OrgService::new(db)?),
        })
    }

    /// Shared service handle, used by the server's scoping middleware.
    pub fn service(&self) -> Arc<OrgService> {
        Arc::clone(&self.service)
    }
}

impl Module for OrgModule {
    fn name(&self) -> &str {
        "org"
    }

    fn routes(&self) -> Router {
        api::router(Arc::clone(&self.service))
    }
}
