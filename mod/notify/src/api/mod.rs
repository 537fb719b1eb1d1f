use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use crate::service::NotifyService;

mod feed;
mod template;
mod trigger;

pub type AppState = Arc<NotifyService>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/triggers", get(trigger::list).post(trigger::create))
        .route(
            "/triggers/{id}",
            get(trigger::get_one)
                .patch(trigger::update)
                .delete(trigger::delete),
        )
        .route("/triggers/{id}/executions", get(trigger::executions))
        .route("/templates", get(template::list).post(template::create))
        .route(
            "/templates/{id}",
            get(template::get_one)
                .patch(template::update)
                .delete(template::delete),
        )
        .route("/notifications", get(feed::list))
        .route("/notifications/unread-count", get(feed::unread_count))
        .route("/notifications/@poll", get(feed::poll))
        .route("/notifications/@read-all", post(feed::mark_all_read))
        .route("/notifications/{id}/@read", post(feed::mark_read))
        .with_state(state)
}
