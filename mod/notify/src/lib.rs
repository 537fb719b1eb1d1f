pub mod api;
pub mod model;
pub mod outbound;
pub mod render;
pub mod service;

use std::sync::Arc;

use axum::Router;
use centro_core::{EventSink, Module};
use centro_sql::SQLStore;
use tracing::{debug, error};

use outbound::HttpOutbound;
use service::{NotifyConfig, NotifyService};

/// Notify module — event triggers, templates, dispatch and the
/// notification feed. The other modules reach it only through the
/// [`EventSink`] returned by [`NotifyModule::sink`].
pub struct NotifyModule {
    service: Arc<NotifyService>,
}

impl NotifyModule {
    pub fn new(
        db: Arc<dyn SQLStore>,
        config: NotifyConfig,
    ) -> Result<Self, centro_core::ServiceError> {
        let service = Arc::new(NotifyService::new(
            db,
            Arc::new(HttpOutbound::default()),
            config,
        )?);
        Ok(Self { service })
    }

    /// Sink handed to every other module at startup. Emitting is
    /// fire-and-forget: dispatch runs on the runtime and failures are
    /// logged, never surfaced to the emitter.
    pub fn sink(&self) -> Arc<dyn EventSink> {
        Arc::new(NotifySink {
            service: Arc::clone(&self.service),
        })
    }
}

impl Module for NotifyModule {
    fn name(&self) -> &str {
        "notify"
    }

    fn routes(&self) -> Router {
        api::router(Arc::clone(&self.service))
    }
}

struct NotifySink {
    service: Arc<NotifyService>,
}

impl EventSink for NotifySink {
    fn emit(&self, org_id: &str, name: &str, data: serde_json::Value) {
        let service = Arc::clone(&self.service);
        let org = org_id.to_string();
        let event = name.to_string();
        tokio::spawn(async move {
            match service.dispatch(&org, &event, &data).await {
                Ok(0) => {}
                Ok(fired) => debug!(%org, %event, fired, "event dispatched"),
                Err(e) => error!(%org, %event, error = %e, "event dispatch failed"),
            }
        });
    }
}
