use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;

use centro_core::{ListParams, ListResult, OrgId, ServiceError};

use crate::model::{
    CreateMembershipRequest, CreatePlanRequest, GymStats, Membership, MembershipCard, Plan,
};
use crate::service::{GymService, MembershipFilters};

pub type AppState = Arc<GymService>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/plans", get(list_plans).post(create_plan))
        .route(
            "/plans/{id}",
            get(get_plan).patch(update_plan).delete(delete_plan),
        )
        .route("/memberships", get(list_memberships).post(create_membership))
        .route("/memberships/stats", get(gym_stats))
        .route(
            "/memberships/{id}",
            get(get_membership).delete(delete_membership),
        )
        .route("/memberships/{id}/@renew", post(renew_membership))
        .route("/memberships/{id}/card", get(membership_card))
        .route("/cards", get(list_cards))
        .with_state(state)
}

// ── Plans ──

async fn create_plan(
    State(svc): State<AppState>,
    org: OrgId,
    Json(req): Json<CreatePlanRequest>,
) -> Result<Json<Plan>, ServiceError> {
    Ok(Json(svc.create_plan(org.as_str(), req)?))
}

async fn list_plans(
    State(svc): State<AppState>,
    org: OrgId,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResult<Plan>>, ServiceError> {
    Ok(Json(svc.list_plans(org.as_str(), &params)?))
}

async fn get_plan(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<Plan>, ServiceError> {
    Ok(Json(svc.get_plan(org.as_str(), &id)?))
}

async fn update_plan(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<Plan>, ServiceError> {
    Ok(Json(svc.update_plan(org.as_str(), &id, patch)?))
}

async fn delete_plan(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    svc.delete_plan(org.as_str(), &id)?;
    Ok(Json(serde_json::json!({"deleted": id})))
}

// ── Memberships ──

async fn create_membership(
    State(svc): State<AppState>,
    org: OrgId,
    Json(req): Json<CreateMembershipRequest>,
) -> Result<Json<Membership>, ServiceError> {
    Ok(Json(svc.create_membership(org.as_str(), req)?))
}

async fn list_memberships(
    State(svc): State<AppState>,
    org: OrgId,
    Query(params): Query<ListParams>,
    Query(filters): Query<MembershipFilters>,
) -> Result<Json<ListResult<Membership>>, ServiceError> {
    Ok(Json(svc.list_memberships(org.as_str(), &params, &filters)?))
}

async fn gym_stats(
    State(svc): State<AppState>,
    org: OrgId,
) -> Result<Json<GymStats>, ServiceError> {
    Ok(Json(svc.gym_stats(org.as_str())?))
}

async fn get_membership(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<Membership>, ServiceError> {
    Ok(Json(svc.get_membership(org.as_str(), &id)?))
}

async fn delete_membership(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    svc.delete_membership(org.as_str(), &id)?;
    Ok(Json(serde_json::json!({"deleted": id})))
}

async fn renew_membership(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<Membership>, ServiceError> {
    Ok(Json(svc.renew_membership(org.as_str(), &id)?))
}

async fn membership_card(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<MembershipCard>, ServiceError> {
    Ok(Json(svc.membership_card(org.as_str(), &id)?))
}

async fn list_cards(
    State(svc): State<AppState>,
    org: OrgId,
    Query(params): Query<ListParams>,
    Query(filters): Query<MembershipFilters>,
) -> Result<Json<ListResult<MembershipCard>>, ServiceError> {
    Ok(Json(svc.list_cards(org.as_str(), &params, &filters)?))
}
