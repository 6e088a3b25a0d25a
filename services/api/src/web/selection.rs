//! services/api/src/web/selection.rs
//!
//! Handlers for the comparison list and the favorites list. Both lists share
//! these handlers; the router nests them under `/compare` and `/favorites`
//! and tells them apart through a `SelectionKind` extension.

use crate::error::port_rejection;
use crate::web::middleware::require_client_id;
use crate::web::rest::PropertyView;
use crate::web::state::{AppState, ClientId, SelectionKind};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware as axum_middleware,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use rental_core::SelectionStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};
use utoipa::openapi::OpenApi;
use utoipa::{Modify, ToSchema};

/// Placeholder segment the selection handlers are documented under.
const LIST_SEGMENT: &str = "/{list}";

/// Prefixes the router nests the selection routes under, with the suffix that
/// keeps each copy's operation ids unique.
const LIST_PREFIXES: [(&str, &str); 2] = [("/compare", "comparison"), ("/favorites", "favorites")];

//=========================================================================================
// Router
//=========================================================================================

/// Routes for one list, to be nested under its prefix.
pub fn selection_router(kind: SelectionKind) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_selection_handler).delete(clear_selection_handler))
        .route("/properties", get(list_selection_properties_handler))
        .route(
            "/{id}",
            post(add_to_selection_handler).delete(remove_from_selection_handler),
        )
        .route("/{id}/toggle", post(toggle_selection_handler))
        .layer(axum_middleware::from_fn(require_client_id))
        .layer(Extension(kind))
}

/// Rewrites each `/{list}...` path in the OpenAPI document into the concrete
/// `/compare...` and `/favorites...` paths the router serves.
pub struct SelectionPaths;

impl Modify for SelectionPaths {
    fn modify(&self, openapi: &mut OpenApi) {
        let shared: Vec<String> = openapi
            .paths
            .paths
            .keys()
            .filter(|path| path.starts_with(LIST_SEGMENT))
            .cloned()
            .collect();

        for path in shared {
            let Some(item) = openapi.paths.paths.remove(&path) else {
                continue;
            };
            for (prefix, suffix) in LIST_PREFIXES {
                let mut concrete = item.clone();
                for operation in [&mut concrete.get, &mut concrete.post, &mut concrete.delete]
                    .into_iter()
                    .flatten()
                {
                    if let Some(params) = operation.parameters.as_mut() {
                        params.retain(|param| param.name != "list");
                    }
                    operation.operation_id = operation.operation_id.take().map(|id| format!("{}_{}", id, suffix));
                }
                openapi
                    .paths
                    .paths
                    .insert(path.replacen(LIST_SEGMENT, prefix, 1), concrete);
            }
        }
    }
}

//=========================================================================================
// Response Structs
//=========================================================================================

/// The current contents of a list.
#[derive(Debug, Serialize, ToSchema)]
pub struct SelectionResponse {
    pub list: SelectionKind,
    pub ids: Vec<String>,
    /// `null` for favorites, which are uncapped.
    pub capacity: Option<usize>,
}

impl SelectionResponse {
    fn of(kind: SelectionKind, store: &SelectionStore) -> Self {
        Self {
            list: kind,
            ids: store.list(),
            capacity: store.capacity(),
        }
    }
}

/// The outcome of an add or toggle, with the list as it stands afterwards.
#[derive(Debug, Serialize, ToSchema)]
pub struct SelectionUpdate {
    /// For add: whether the id is in the list now. A full comparison list
    /// reports `false`. For toggle: `false` when the id was removed.
    pub success: bool,
    pub list: SelectionKind,
    pub ids: Vec<String>,
    pub capacity: Option<usize>,
}

impl SelectionUpdate {
    fn of(success: bool, kind: SelectionKind, store: &SelectionStore) -> Self {
        let SelectionResponse { list, ids, capacity } = SelectionResponse::of(kind, store);
        Self {
            success,
            list,
            ids,
            capacity,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// List the ids in the comparison list (`/compare`) or favorites (`/favorites`).
#[utoipa::path(
    get,
    path = "/{list}",
    params(
        ("list" = String, Path, description = "`compare` or `favorites`"),
        ("x-client-id" = uuid::Uuid, Header, description = "The browser profile the list belongs to.")
    ),
    responses(
        (status = 200, description = "Current list", body = SelectionResponse),
        (status = 400, description = "Missing or invalid x-client-id header")
    )
)]
pub async fn list_selection_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(kind): Extension<SelectionKind>,
    Extension(client): Extension<ClientId>,
) -> Json<SelectionResponse> {
    let store = app_state.selection(kind, client);
    Json(SelectionResponse::of(kind, &store))
}

/// Resolve the list into listings, in list order. Withdrawn listings are skipped.
#[utoipa::path(
    get,
    path = "/{list}/properties",
    params(
        ("list" = String, Path, description = "`compare` or `favorites`"),
        ("x-client-id" = uuid::Uuid, Header, description = "The browser profile the list belongs to.")
    ),
    responses(
        (status = 200, description = "Listings in the list", body = [PropertyView]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_selection_properties_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(kind): Extension<SelectionKind>,
    Extension(client): Extension<ClientId>,
) -> Result<Json<Vec<PropertyView>>, (StatusCode, String)> {
    let ids = app_state.selection(kind, client).list();
    let properties = app_state.repo.get_properties_by_ids(&ids).await.map_err(|e| {
        error!("Failed to resolve {:?} list: {:?}", kind, e);
        port_rejection(e)
    })?;
    Ok(Json(properties.into_iter().map(PropertyView::from).collect()))
}

#[utoipa::path(
    post,
    path = "/{list}/{id}",
    params(
        ("list" = String, Path, description = "`compare` or `favorites`"),
        ("id" = String, Path, description = "Property id"),
        ("x-client-id" = uuid::Uuid, Header, description = "The browser profile the list belongs to.")
    ),
    responses(
        (status = 200, description = "Add outcome; `success` is false when the comparison list is full", body = SelectionUpdate)
    )
)]
pub async fn add_to_selection_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(kind): Extension<SelectionKind>,
    Extension(client): Extension<ClientId>,
    Path(id): Path<String>,
) -> Json<SelectionUpdate> {
    let store = app_state.selection(kind, client);
    let success = store.add(&id);
    if !success {
        debug!(property_id = %id, "{:?} list refused add", kind);
    }
    Json(SelectionUpdate::of(success, kind, &store))
}

#[utoipa::path(
    delete,
    path = "/{list}/{id}",
    params(
        ("list" = String, Path, description = "`compare` or `favorites`"),
        ("id" = String, Path, description = "Property id"),
        ("x-client-id" = uuid::Uuid, Header, description = "The browser profile the list belongs to.")
    ),
    responses(
        (status = 200, description = "List after removal", body = SelectionResponse)
    )
)]
pub async fn remove_from_selection_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(kind): Extension<SelectionKind>,
    Extension(client): Extension<ClientId>,
    Path(id): Path<String>,
) -> Json<SelectionResponse> {
    let store = app_state.selection(kind, client);
    store.remove(&id);
    Json(SelectionResponse::of(kind, &store))
}

#[utoipa::path(
    post,
    path = "/{list}/{id}/toggle",
    params(
        ("list" = String, Path, description = "`compare` or `favorites`"),
        ("id" = String, Path, description = "Property id"),
        ("x-client-id" = uuid::Uuid, Header, description = "The browser profile the list belongs to.")
    ),
    responses(
        (status = 200, description = "Toggle outcome; `success` is false when the id was removed or the list is full", body = SelectionUpdate)
    )
)]
pub async fn toggle_selection_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(kind): Extension<SelectionKind>,
    Extension(client): Extension<ClientId>,
    Path(id): Path<String>,
) -> Json<SelectionUpdate> {
    let store = app_state.selection(kind, client);
    let success = store.toggle(&id);
    Json(SelectionUpdate::of(success, kind, &store))
}

#[utoipa::path(
    delete,
    path = "/{list}",
    params(
        ("list" = String, Path, description = "`compare` or `favorites`"),
        ("x-client-id" = uuid::Uuid, Header, description = "The browser profile the list belongs to.")
    ),
    responses(
        (status = 204, description = "List cleared")
    )
)]
pub async fn clear_selection_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(kind): Extension<SelectionKind>,
    Extension(client): Extension<ClientId>,
) -> StatusCode {
    app_state.selection(kind, client).clear();
    StatusCode::NO_CONTENT
}
