pub mod customer;
pub mod segment;

use std::sync::Arc;

use axum::Router;

use crate::service::CrmService;

/// Shared application state.
pub type AppState = Arc<CrmService>;

/// Build the CRM API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(customer::routes())
        .merge(segment::routes())
        .with_state(state)
}
