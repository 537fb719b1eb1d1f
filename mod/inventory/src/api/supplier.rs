use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};

use centro_core::{ListParams, ListResult, OrgId, ServiceError};

use super::AppState;
use crate::model::{CreateSupplierRequest, Supplier};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/suppliers", get(list_suppliers).post(create_supplier))
        .route(
            "/suppliers/{id}",
            get(get_supplier).patch(update_supplier).delete(delete_supplier),
        )
}

async fn create_supplier(
    State(svc): State<AppState>,
    org: OrgId,
    Json(req): Json<CreateSupplierRequest>,
) -> Result<Json<Supplier>, ServiceError> {
    Ok(Json(svc.create_supplier(org.as_str(), req)?))
}

async fn list_suppliers(
    State(svc): State<AppState>,
    org: OrgId,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResult<Supplier>>, ServiceError> {
    Ok(Json(svc.list_suppliers(org.as_str(), &params)?))
}

async fn get_supplier(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<Supplier>, ServiceError> {
    Ok(Json(svc.get_supplier(org.as_str(), &id)?))
}

async fn update_supplier(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<Supplier>, ServiceError> {
    Ok(Json(svc.update_supplier(org.as_str(), &id, patch)?))
}

async fn delete_supplier(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    svc.delete_supplier(org.as_str(), &id)?;
    Ok(Json(serde_json::json!({"deleted": id})))
}
