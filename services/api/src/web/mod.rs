pub mod middleware;
pub mod rest;
pub mod selection;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub use middleware::require_client_id;
pub use rest::{
    create_property_handler, delete_property_handler, get_agent_handler, get_property_handler,
    list_agent_properties_handler, list_properties_handler, map_positions_handler,
    regenerate_metadata_handler,
};
pub use selection::selection_router;

use state::{AppState, SelectionKind};

/// Builds every API route over the shared state. CORS and Swagger UI are
/// layered on by the binary.
pub fn api_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/properties", get(list_properties_handler).post(create_property_handler))
        .route("/properties/map", get(map_positions_handler))
        .route(
            "/properties/{id}",
            get(get_property_handler).delete(delete_property_handler),
        )
        .route("/properties/{id}/metadata", post(regenerate_metadata_handler))
        .route("/agents/{id}", get(get_agent_handler))
        .route("/agents/{id}/properties", get(list_agent_properties_handler))
        .nest("/compare", selection_router(SelectionKind::Comparison))
        .nest("/favorites", selection_router(SelectionKind::Favorites))
        .with_state(app_state)
}
