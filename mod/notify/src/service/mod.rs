pub mod dispatch;
pub mod feed;
pub mod schema;
pub mod template;
pub mod trigger;

use std::sync::Arc;

use centro_core::ServiceError;
use centro_sql::SQLStore;
use tokio::sync::Notify;

use crate::outbound::Outbound;

/// Delivery configuration.
#[derive(Debug, Clone, Default)]
pub struct NotifyConfig {
    /// HTTP endpoint that relays email as `{to, subject, body}` JSON.
    /// When unset, email deliveries are recorded as failed instead of
    /// being dropped.
    pub email_api_url: Option<String>,
}

/// Notification service — triggers, templates, the dispatch pipeline,
/// and the notification feed.
pub struct NotifyService {
    pub(crate) db: Arc<dyn SQLStore>,
    pub(crate) outbound: Arc<dyn Outbound>,
    pub(crate) config: NotifyConfig,
    /// Wakes feed long-polls whenever a dispatch lands new notifications.
    pub(crate) feed_notify: Notify,
}

impl NotifyService {
    pub fn new(
        db: Arc<dyn SQLStore>,
        outbound: Arc<dyn Outbound>,
        config: NotifyConfig,
    ) -> Result<Self, ServiceError> {
        schema::init_schema(db.as_ref())?;
        Ok(Self {
            db,
            outbound,
            config,
            feed_notify: Notify::new(),
        })
    }
}
