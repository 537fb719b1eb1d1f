use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use centro_core::{ListParams, ListResult, OrgId, ServiceError};

use super::AppState;
use crate::model::{CreateProductRequest, GenerateVariantsResult, Product, Variant};
use crate::service::product::ProductFilters;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .route("/products/{id}/variants", get(list_variants))
        .route("/products/{id}/@generate-variants", post(generate_variants))
}

async fn create_product(
    State(svc): State<AppState>,
    org: OrgId,
    Json(req): Json<CreateProductRequest>,
) -> Result<Json<Product>, ServiceError> {
    Ok(Json(svc.create_product(org.as_str(), req)?))
}

async fn list_products(
    State(svc): State<AppState>,
    org: OrgId,
    Query(params): Query<ListParams>,
    Query(filters): Query<ProductFilters>,
) -> Result<Json<ListResult<Product>>, ServiceError> {
    Ok(Json(svc.list_products(org.as_str(), &params, &filters)?))
}

async fn get_product(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<Product>, ServiceError> {
    Ok(Json(svc.get_product(org.as_str(), &id)?))
}

async fn update_product(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
    Json(patch): Json<serde_json::Value>,
) -> Result<Json<Product>, ServiceError> {
    Ok(Json(svc.update_product(org.as_str(), &id, patch)?))
}

async fn delete_product(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServiceError> {
    svc.delete_product(org.as_str(), &id)?;
    Ok(Json(serde_json::json!({"deleted": id})))
}

async fn list_variants(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<Vec<Variant>>, ServiceError> {
    Ok(Json(svc.list_variants(org.as_str(), &id)?))
}

async fn generate_variants(
    State(svc): State<AppState>,
    org: OrgId,
    Path(id): Path<String>,
) -> Result<Json<GenerateVariantsResult>, ServiceError> {
    Ok(Json(svc.generate_variants(org.as_str(), &id)?))
}
