use axum::Json;
use axum::extract::{Path, Query, State};

use centro_core::{ListParams, ListResult, OrgId, ServiceError};

use super::AppState;
use crate::model::{CreateTriggerRequest, EventTrigger, TriggerExecution};
use crate::service::trigger::TriggerFilters;

pub(super) async fn create(
    State(svc): State<AppState>,
    org: OrgId,
    Json(req): Json<CreateTriggerRequest>,
) -> Result<Json<EventTrigger>, ServiceError> {
    Ok(Json(svc.create_trigger(org.as_str(), req)?))
}

pub(super) async fn list(
    State(svc): State<AppState>,
    org: OrgId,
    Query(params): Query<ListParams>,
    Query(filters): Query<TriggerFilters>,
) -> Result<Json<ListResult<EventTrigger>>, ServiceError> {
    Ok(Json(svc.list_triggers(org.as_str(), &params, &filters)?))
}

pub(super) async fn get_one(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<EventTrigger>, ServiceError> {
    Ok(Json(svc.get_trigger(org.as_str(), &id)?))
}

pub(super) async fn update(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<EventTrigger>, ServiceError> {
    Ok(Json(svc.update_trigger(org.as_str(), &id, patch)?))
}

pub(super) async fn delete(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    svc.delete_trigger(org.as_str(), &id)?;
    Ok(Json(serde_json::json!({"deleted": id})))
}

pub(super) async fn executions(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResult<TriggerExecution>>, ServiceError> {
    Ok(Json(svc.list_executions(org.as_str(), &id, &params)?))
}
