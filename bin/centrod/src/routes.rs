//! Route registration — collects all module routes + system endpoints.

use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::get;

use org::service::OrgService;

use crate::auth_middleware::{self, JwtState};
use crate::login;
use crate::org_guard;

/// Application shared state.
#[derive(Clone)]
pub struct AppState {
    pub jwt_state: Arc<JwtState>,
    pub server_config: Arc<crate::config::ServerConfig>,
}

/// Build the complete router with all routes.
pub fn build_router(
    state: AppState,
    module_routes: Vec<(&str, Router)>,
    orgs: Arc<OrgService>,
) -> Router {
    let jwt_state = state.jwt_state.clone();

    // System endpoints (public, no state needed).
    let system_routes = Router::new()
        .route("/health", get(health))
        .route("/version", get(version));

    let mut app: Router<()> = Router::new()
        .merge(login::routes())
        .with_state(state)
        .merge(system_routes);

    // Mount each module's routes under /{module_name}.
    // Module routes are already Router<()> (they called .with_state() internally).
    for (name, router) in module_routes {
        app = app.nest(&format!("/{}", name), router);
    }

    // Tenant scoping inside, JWT auth on the outside.
    app.layer(middleware::from_fn_with_state(orgs, org_guard::org_guard))
        .layer(middleware::from_fn_with_state(
            jwt_state,
            auth_middleware::auth_middleware,
        ))
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "centrod",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
