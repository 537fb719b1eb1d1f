use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;

use centro_core::{ListParams, ListResult, OrgId, ServiceError};

use crate::model::{
    Conversion, CreateSaleRequest, ExchangeRate, ForecastReport, Sale, SummaryReport,
    UpsertRateRequest,
};
use crate::service::report::{ForecastQuery, ReportQuery};
use crate::service::sale::SaleFilters;
use crate::service::SalesService;

pub type AppState = Arc<SalesService>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/sales", get(list_sales).post(record_sale))
        .route("/sales/{id}", get(get_sale).delete(delete_sale))
        .route("/rates", get(list_rates).post(upsert_rate))
        .route("/rates/@invalidate", post(invalidate_rates))
        .route("/convert", get(convert))
        .route("/reports/summary", get(summary_report))
        .route("/reports/forecast", get(forecast))
        .with_state(state)
}

// ── Sales ──

async fn record_sale(
    State(svc): State<AppState>,
    org: OrgId,
    Json(req): Json<CreateSaleRequest>,
) -> Result<Json<Sale>, ServiceError> {
    Ok(Json(svc.record_sale(org.as_str(), req)?))
}

async fn list_sales(
    State(svc): State<AppState>,
    org: OrgId,
    Query(params): Query<ListParams>,
    Query(filters): Query<SaleFilters>,
) -> Result<Json<ListResult<Sale>>, ServiceError> {
    Ok(Json(svc.list_sales(org.as_str(), &params, &filters)?))
}

async fn get_sale(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<Sale>, ServiceError> {
    Ok(Json(svc.get_sale(org.as_str(), &id)?))
}

async fn delete_sale(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    svc.delete_sale(org.as_str(), &id)?;
    Ok(Json(serde_json::json!({"deleted": id})))
}

// ── Exchange rates ──

async fn upsert_rate(
    State(svc): State<AppState>,
    org: OrgId,
    Json(req): Json<UpsertRateRequest>,
) -> Result<Json<ExchangeRate>, ServiceError> {
    Ok(Json(svc.upsert_rate(org.as_str(), req)?))
}

async fn list_rates(
    State(svc): State<AppState>,
    org: OrgId,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResult<ExchangeRate>>, ServiceError> {
    Ok(Json(svc.list_rates(org.as_str(), &params)?))
}

async fn invalidate_rates(
    State(svc): State<AppState>,
    org: OrgId,
) -> Result<Json<serde_json::Value>, ServiceError> {
    let dropped = svc.invalidate_rates(org.as_str());
    Ok(Json(serde_json::json!({"invalidated": dropped})))
}

#[derive(Debug, serde::Deserialize)]
struct ConvertQuery {
    amount: f64,
    from: String,
    to: String,
}

async fn convert(
    State(svc): State<AppState>,
    org: OrgId,
    Query(q): Query<ConvertQuery>,
) -> Result<Json<Conversion>, ServiceError> {
    Ok(Json(svc.convert(org.as_str(), q.amount, &q.from, &q.to)?))
}

// ── Reports ──

async fn summary_report(
    State(svc): State<AppState>,
    org: OrgId,
    Query(q): Query<ReportQuery>,
) -> Result<Json<SummaryReport>, ServiceError> {
    Ok(Json(svc.summary_report(org.as_str(), &q)?))
}

async fn forecast(
    State(svc): State<AppState>,
    org: OrgId,
    Query(q): Query<ForecastQuery>,
) -> Result<Json<ForecastReport>, ServiceError> {
    Ok(Json(svc.forecast(org.as_str(), &q)?))
}
