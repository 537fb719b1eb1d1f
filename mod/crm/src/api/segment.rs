use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use centro_core::{ListParams, ListResult, OrgId, ServiceError};

use super::AppState;
use crate::model::{CreateSegmentRequest, Customer, Segment, SegmentPreview, SegmentRule};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/segments", get(list_segments).post(create_segment))
        .route("/segments/preview", post(preview_segment))
        .route(
            "/segments/{id}",
            get(get_segment).patch(update_segment).delete(delete_segment),
        )
        .route("/segments/{id}/@materialize", post(materialize_segment))
        .route("/segments/{id}/members", get(segment_members))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreviewRequest {
    #[serde(default)]
    rules: Vec<SegmentRule>,
}

async fn create_segment(
    State(svc): State<AppState>,
    org: OrgId,
    Json(req): Json<CreateSegmentRequest>,
) -> Result<Json<Segment>, ServiceError> {
    Ok(Json(svc.create_segment(org.as_str(), req)?))
}

async fn preview_segment(
    State(svc): State<AppState>,
    org: OrgId,
    Json(req): Json<PreviewRequest>,
) -> Result<Json<SegmentPreview>, ServiceError> {
    Ok(Json(svc.preview_segment(org.as_str(), &req.rules)?))
}

async fn list_segments(
    State(svc): State<AppState>,
    org: OrgId,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResult<Segment>>, ServiceError> {
    Ok(Json(svc.list_segments(org.as_str(), &params)?))
}

async fn get_segment(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<Segment>, ServiceError> {
    Ok(Json(svc.get_segment(org.as_str(), &id)?))
}

async fn update_segment(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<Segment>, ServiceError> {
    Ok(Json(svc.update_segment(org.as_str(), &id, patch)?))
}

async fn delete_segment(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    svc.delete_segment(org.as_str(), &id)?;
    Ok(Json(serde_json::json!({"deleted": id})))
}

async fn materialize_segment(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<Segment>, ServiceError> {
    Ok(Json(svc.materialize_segment(org.as_str(), &id)?))
}

async fn segment_members(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResult<Customer>>, ServiceError> {
    Ok(Json(svc.segment_members(org.as_str(), &id, &params)?))
}
