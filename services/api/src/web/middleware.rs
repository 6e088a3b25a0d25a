//! services/api/src/web/middleware.rs
//!
//! Client identification for the selection routes.

use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;
use uuid::Uuid;

use crate::web::state::ClientId;

pub const CLIENT_ID_HEADER: &str = "x-client-id";

/// Parses the `x-client-id` header into a `ClientId`.
pub fn client_id_from_headers(headers: &HeaderMap) -> Result<ClientId, (StatusCode, String)> {
    let raw = headers
        .get(CLIENT_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                format!("{} header is required", CLIENT_ID_HEADER),
            )
        })?;

    Uuid::parse_str(raw.trim()).map(ClientId).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            format!("Invalid {} format", CLIENT_ID_HEADER),
        )
    })
}

/// Middleware that resolves the client id and inserts it into the request
/// extensions for the selection handlers.
///
/// A missing or malformed header returns 400 Bad Request.
pub async fn require_client_id(mut req: Request, next: Next) -> Response {
    match client_id_from_headers(req.headers()) {
        Ok(client) => {
            req.extensions_mut().insert(client);
            next.run(req).await
        }
        Err(rejection) => {
            warn!("Rejected selection request: {}", rejection.1);
            rejection.into_response()
        }
    }
}
