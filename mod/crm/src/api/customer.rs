use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};

use centro_core::{ListParams, ListResult, OrgId, ServiceError};

use super::AppState;
use crate::model::{CreateCustomerRequest, Customer, CustomerStats};
use crate::service::customer::CustomerFilters;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route("/customers/stats", get(customer_stats))
        .route(
            "/customers/{id}",
            get(get_customer).patch(update_customer).delete(delete_customer),
        )
}

async fn create_customer(
    State(svc): State<AppState>,
    org: OrgId,
    Json(req): Json<CreateCustomerRequest>,
) -> Result<Json<Customer>, ServiceError> {
    Ok(Json(svc.create_customer(org.as_str(), req)?))
}

async fn list_customers(
    State(svc): State<AppState>,
    org: OrgId,
    Query(params): Query<ListParams>,
    Query(filters): Query<CustomerFilters>,
) -> Result<Json<ListResult<Customer>>, ServiceError> {
    Ok(Json(svc.list_customers(org.as_str(), &params, &filters)?))
}

async fn customer_stats(
    State(svc): State<AppState>,
    org: OrgId,
) -> Result<Json<CustomerStats>, ServiceError> {
    Ok(Json(svc.customer_stats(org.as_str())?))
}

async fn get_customer(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<Customer>, ServiceError> {
    Ok(Json(svc.get_customer(org.as_str(), &id)?))
}

async fn update_customer(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<Customer>, ServiceError> {
    Ok(Json(svc.update_customer(org.as_str(), &id, patch)?))
}

async fn delete_customer(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    svc.delete_customer(org.as_str(), &id)?;
    Ok(Json(serde_json::json!({"deleted": id})))
}
