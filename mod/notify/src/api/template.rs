use axum::Json;
use axum::extract::{Path, Query, State};

use centro_core::{ListParams, ListResult, OrgId, ServiceError};

use super::AppState;
use crate::model::{CreateTemplateRequest, NotificationTemplate};

pub(super) async fn create(
    State(svc): State<AppState>,
    org: OrgId,
    Json(req): Json<CreateTemplateRequest>,
) -> Result<Json<NotificationTemplate>, ServiceError> {
    Ok(Json(svc.create_template(org.as_str(), req)?))
}

pub(super) async fn list(
    State(svc): State<AppState>,
    org: OrgId,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResult<NotificationTemplate>>, ServiceError> {
    Ok(Json(svc.list_templates(org.as_str(), &params)?))
}

pub(super) async fn get_one(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<NotificationTemplate>, ServiceError> {
    Ok(Json(svc.get_template(org.as_str(), &id)?))
}

pub(super) async fn update(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<NotificationTemplate>, ServiceError> {
    Ok(Json(svc.update_template(org.as_str(), &id, patch)?))
}

pub(super) async fn delete(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    svc.delete_template(org.as_str(), &id)?;
    Ok(Json(serde_json::json!({"deleted": id})))
}
