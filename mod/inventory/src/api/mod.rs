pub mod product;
pub mod stock;
pub mod supplier;

use std::sync::Arc;

use axum::Router;

use crate::service::InventoryService;

/// Shared application state.
pub type AppState = Arc<InventoryService>;

/// Build the inventory API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(product::routes())
        .merge(supplier::routes())
        .merge(stock::routes())
        .with_state(state)
}
