use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;

use centro_core::{ListParams, ListResult, OrgId, ServiceError};

use crate::model::{CreateEmployeeRequest, Employee, HrmStats, TerminateRequest};
use crate::service::{EmployeeFilters, HrmService};

pub type AppState = Arc<HrmService>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/employees", get(list_employees).post(create_employee))
        .route("/employees/stats", get(hrm_stats))
        .route(
            "/employees/{id}",
            get(get_employee).patch(update_employee).delete(delete_employee),
        )
        .route("/employees/{id}/@terminate", post(terminate_employee))
        .with_state(state)
}

async fn create_employee(
    State(svc): State<AppState>,
    org: OrgId,
    Json(req): Json<CreateEmployeeRequest>,
) -> Result<Json<Employee>, ServiceError> {
    Ok(Json(svc.create_employee(org.as_str(), req)?))
}

async fn list_employees(
    State(svc): State<AppState>,
    org: OrgId,
    Query(params): Query<ListParams>,
    Query(filters): Query<EmployeeFilters>,
) -> Result<Json<ListResult<Employee>>, ServiceError> {
    Ok(Json(svc.list_employees(org.as_str(), &params, &filters)?))
}

async fn hrm_stats(
    State(svc): State<AppState>,
    org: OrgId,
) -> Result<Json<HrmStats>, ServiceError> {
    Ok(Json(svc.hrm_stats(org.as_str())?))
}

async fn get_employee(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<Employee>, ServiceError> {
    Ok(Json(svc.get_employee(org.as_str(), &id)?))
}

async fn update_employee(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<Employee>, ServiceError> {
    Ok(Json(svc.update_employee(org.as_str(), &id, patch)?))
}

async fn delete_employee(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    svc.delete_employee(org.as_str(), &id)?;
    Ok(Json(serde_json::json!({"deleted": id})))
}

async fn terminate_employee(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
    body: Option<Json<TerminateRequest>>,
) -> Result<Json<Employee>, ServiceError> {
    let req = body.map(|Json(b)| b).unwrap_or_default();
    Ok(Json(svc.terminate_employee(org.as_str(), &id, req)?))
}
