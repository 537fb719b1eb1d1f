use axum::Json;
use axum::extract::{Path, Query, State};

use centro_core::{ListParams, ListResult, OrgId, ServiceError};

use super::AppState;
use crate::model::Notification;
use crate::service::feed::{FeedFilters, FeedPoll};

#[derive(Debug, serde::Deserialize)]
pub(super) struct PollQuery {
    after: Option<String>,
    #[serde(default = "default_poll_timeout")]
    timeout: u64,
}

fn default_poll_timeout() -> u64 {
    30
}

pub(super) async fn list(
    State(svc): State<AppState>,
    org: OrgId,
    Query(params): Query<ListParams>,
    Query(filters): Query<FeedFilters>,
) -> Result<Json<ListResult<Notification>>, ServiceError> {
    Ok(Json(svc.list_notifications(org.as_str(), &params, &filters)?))
}

pub(super) async fn unread_count(
    State(svc): State<AppState>,
    org: OrgId,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let unread = svc.unread_count(org.as_str())?;
    Ok(Json(serde_json::json!({"unread": unread})))
}

pub(super) async fn poll(
    State(svc): State<AppState>,
    org: OrgId,
    Query(query): Query<PollQuery>,
) -> Result<Json<FeedPoll>, ServiceError> {
    Ok(Json(
        svc.poll_feed(org.as_str(), query.after, query.timeout).await?,
    ))
}

pub(super) async fn mark_read(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<Notification>, ServiceError> {
    Ok(Json(svc.mark_read(org.as_str(), &id)?))
}

pub(super) async fn mark_all_read(
    State(svc): State<AppState>,
    org: OrgId,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let updated = svc.mark_all_read(org.as_str())?;
    Ok(Json(serde_json::json!({"updated": updated})))
}
