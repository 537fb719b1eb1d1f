use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use centro_core::{ListParams, ListResult, OrgId, ServiceError};

use super::AppState;
use crate::model::{
    AdjustStockRequest, ReplenishmentItem, SetStockRequest, StockLevel, StockMovement,
};
use crate::service::stock::StockFilters;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stock", get(list_stock).post(set_stock))
        .route("/stock/replenishment", get(replenishment))
        .route("/stock/{id}", get(get_stock))
        .route("/stock/{id}/@adjust", post(adjust_stock))
        .route("/stock/{id}/movements", get(list_movements))
}

async fn set_stock(
    State(svc): State<AppState>,
    org: OrgId,
    Json(req): Json<SetStockRequest>,
) -> Result<Json<StockLevel>, ServiceError> {
    Ok(Json(svc.set_stock(org.as_str(), req)?))
}

async fn list_stock(
    State(svc): State<AppState>,
    org: OrgId,
    Query(params): Query<ListParams>,
    Query(filters): Query<StockFilters>,
) -> Result<Json<ListResult<StockLevel>>, ServiceError> {
    Ok(Json(svc.list_stock(org.as_str(), &params, &filters)?))
}

async fn replenishment(
    State(svc): State<AppState>,
    org: OrgId,
) -> Result<Json<Vec<ReplenishmentItem>>, ServiceError> {
    Ok(Json(svc.replenishment(org.as_str())?))
}

async fn get_stock(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<StockLevel>, ServiceError> {
    Ok(Json(svc.get_stock(org.as_str(), &id)?))
}

async fn adjust_stock(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
    Json(req): Json<AdjustStockRequest>,
) -> Result<Json<StockLevel>, ServiceError> {
    Ok(Json(svc.adjust_stock(org.as_str(), &id, req)?))
}

async fn list_movements(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<Vec<StockMovement>>, ServiceError> {
    Ok(Json(svc.list_movements(org.as_str(), &id)?))
}
