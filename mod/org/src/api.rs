use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};

use centro_core::{ListParams, ListResult, ServiceError};

use crate::model::{CreateOrgRequest, Organization};
use crate::service::OrgService;

pub type AppState = Arc<OrgService>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/orgs", get(list_orgs).post(create_org))
        .route("/orgs/{id}", get(get_org).patch(update_org).delete(delete_org))
        .route("/orgs/by-slug/{slug}", get(get_by_slug))
        .with_state(state)
}

async fn create_org(
    State(svc): State<AppState>,
    Json(req): Json<CreateOrgRequest>,
) -> Result<Json<Organization>, ServiceError> {
    Ok(Json(svc.create_org(req)?))
}

async fn list_orgs(
    State(svc): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResult<Organization>>, ServiceError> {
    Ok(Json(svc.list_orgs(&params)?))
}

async fn get_org(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Organization>, ServiceError> {
    Ok(Json(svc.get_org(&id)?))
}

async fn get_by_slug(
    State(svc): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Organization>, ServiceError> {
    Ok(Json(svc.get_by_slug(&slug)?))
}

async fn update_org(
    State(svc): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<Organization>, ServiceError> {
    Ok(Json(svc.update_org(&id, patch)?))
}

async fn delete_org(
    State(svc): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    svc.delete_org(&id)?;
    Ok(Json(serde_json::json!({"deleted": id})))
}
