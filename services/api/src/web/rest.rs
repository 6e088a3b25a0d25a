//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the listing and agent endpoints, the payload
//! structs they exchange, and the master definition for the OpenAPI
//! specification.

use crate::error::port_rejection;
use crate::web::selection;
use crate::web::selection::SelectionPaths;
use crate::web::state::{AppState, SelectionKind};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use rental_core::domain::{Agent, Furnishing, GeoPoint, NewProperty, Property, PropertyStatus};
use rental_core::listing::{PropertyFilter, SortOrder};
use rental_core::map::project_properties;
use rental_core::reference::{add_metadata, generate_shortcode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{IntoParams, OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_properties_handler,
        get_property_handler,
        create_property_handler,
        delete_property_handler,
        regenerate_metadata_handler,
        map_positions_handler,
        get_agent_handler,
        list_agent_properties_handler,
        selection::list_selection_handler,
        selection::list_selection_properties_handler,
        selection::add_to_selection_handler,
        selection::remove_from_selection_handler,
        selection::toggle_selection_handler,
        selection::clear_selection_handler,
    ),
    components(
        schemas(
            PropertyView,
            NewPropertyRequest,
            AgentView,
            MapPin,
            SelectionKind,
            selection::SelectionResponse,
            selection::SelectionUpdate,
        )
    ),
    modifiers(&SelectionPaths),
    tags(
        (name = "Rental Listings API", description = "Browse, compare and favorite rental listings.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// A listing as returned to the dashboard and listing pages.
#[derive(Debug, Serialize, ToSchema)]
pub struct PropertyView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area: i32,
    pub location: String,
    pub region: Option<String>,
    /// One of `available`, `rented`, `pending`.
    pub status: String,
    /// One of `furnished`, `semi-furnished`, `unfurnished`.
    pub furnishing: String,
    pub images: Vec<String>,
    pub video_url: Option<String>,
    pub amenities: Vec<String>,
    pub agent_id: Option<String>,
    pub shortcode: Option<String>,
    pub reference_code: Option<String>,
    pub qr_code_url: Option<String>,
    pub property_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl From<Property> for PropertyView {
    fn from(p: Property) -> Self {
        let (shortcode, reference_code, qr_code_url, property_url) = match p.metadata {
            Some(m) => (
                Some(m.shortcode),
                Some(m.reference_code),
                Some(m.qr_code_url),
                Some(m.property_url),
            ),
            None => (None, None, None, None),
        };
        Self {
            id: p.id,
            title: p.title,
            description: p.description,
            price: p.price,
            bedrooms: p.bedrooms,
            bathrooms: p.bathrooms,
            area: p.area,
            location: p.location,
            region: p.region,
            status: p.status.to_string(),
            furnishing: p.furnishing.to_string(),
            images: p.images,
            video_url: p.video_url,
            amenities: p.amenities,
            agent_id: p.agent_id,
            shortcode,
            reference_code,
            qr_code_url,
            property_url,
            latitude: p.coordinates.map(|c| c.latitude),
            longitude: p.coordinates.map(|c| c.longitude),
            created_at: p.created_at,
        }
    }
}

/// The form an owner or agent submits to create a listing.
#[derive(Debug, Deserialize, ToSchema)]
pub struct NewPropertyRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    #[serde(default)]
    pub bedrooms: i32,
    #[serde(default)]
    pub bathrooms: i32,
    #[serde(default)]
    pub area: i32,
    pub location: String,
    pub region: Option<String>,
    /// Defaults to `available`.
    pub status: Option<String>,
    /// Defaults to `unfurnished`.
    pub furnishing: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub video_url: Option<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub agent_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl NewPropertyRequest {
    pub fn into_domain(self) -> Result<NewProperty, (StatusCode, String)> {
        if self.title.trim().is_empty() {
            return Err((StatusCode::BAD_REQUEST, "title must not be empty".to_string()));
        }
        if self.price < 0 {
            return Err((StatusCode::BAD_REQUEST, "price must not be negative".to_string()));
        }
        let status = match self.status.as_deref() {
            Some(raw) => raw.parse::<PropertyStatus>().map_err(bad_request)?,
            None => PropertyStatus::Available,
        };
        let furnishing = match self.furnishing.as_deref() {
            Some(raw) => raw.parse::<Furnishing>().map_err(bad_request)?,
            None => Furnishing::Unfurnished,
        };
        let coordinates = match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint { latitude, longitude }),
            (None, None) => None,
            _ => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    "latitude and longitude must be given together".to_string(),
                ))
            }
        };
        Ok(NewProperty {
            title: self.title,
            description: self.description,
            price: self.price,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            area: self.area,
            location: self.location,
            region: self.region,
            status,
            furnishing,
            images: self.images,
            video_url: self.video_url,
            amenities: self.amenities,
            agent_id: self.agent_id,
            coordinates,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AgentView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub listing_count: i64,
}

impl From<Agent> for AgentView {
    fn from(a: Agent) -> Self {
        Self {
            id: a.id,
            name: a.name,
            email: a.email,
            phone: a.phone,
            whatsapp: a.whatsapp,
            listing_count: a.listing_count,
        }
    }
}

/// A pin on the illustrative map, in percent of the map's width and height.
#[derive(Debug, Serialize, ToSchema)]
pub struct MapPin {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

/// Search bar and filter panel parameters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListingQuery {
    /// Free text matched against title, description and location.
    pub search: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
    pub furnishing: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_bedrooms: Option<i32>,
    /// One of `newest` (default), `price_asc`, `price_desc`.
    pub sort: Option<String>,
}

impl ListingQuery {
    pub fn into_filter(self) -> Result<PropertyFilter, (StatusCode, String)> {
        let status = self
            .status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<PropertyStatus>)
            .transpose()
            .map_err(bad_request)?;
        let furnishing = self
            .furnishing
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<Furnishing>)
            .transpose()
            .map_err(bad_request)?;
        let sort = match self.sort.as_deref().map(str::trim) {
            None | Some("") | Some("newest") => SortOrder::Newest,
            Some("price_asc") => SortOrder::PriceAsc,
            Some("price_desc") => SortOrder::PriceDesc,
            Some(other) => return Err(bad_request(format!("unknown sort order '{}'", other))),
        };
        Ok(PropertyFilter {
            search: self.search,
            location: self.location,
            status,
            furnishing,
            min_price: self.min_price,
            max_price: self.max_price,
            min_bedrooms: self.min_bedrooms,
            agent_id: None,
            sort,
        })
    }
}

fn bad_request(message: String) -> (StatusCode, String) {
    (StatusCode::BAD_REQUEST, message)
}

fn into_views(properties: Vec<Property>) -> Vec<PropertyView> {
    properties.into_iter().map(PropertyView::from).collect()
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Browse and search listings.
#[utoipa::path(
    get,
    path = "/properties",
    params(ListingQuery),
    responses(
        (status = 200, description = "Matching listings", body = [PropertyView]),
        (status = 400, description = "Invalid filter value"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_properties_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<Vec<PropertyView>>, (StatusCode, String)> {
    let filter = query.into_filter()?;
    let properties = app_state.repo.list_properties(&filter).await.map_err(|e| {
        error!("Failed to list properties: {:?}", e);
        port_rejection(e)
    })?;
    Ok(Json(into_views(properties)))
}

/// Fetch one listing for the property detail page.
#[utoipa::path(
    get,
    path = "/properties/{id}",
    params(("id" = String, Path, description = "Property id")),
    responses(
        (status = 200, description = "The listing", body = PropertyView),
        (status = 404, description = "No such listing")
    )
)]
pub async fn get_property_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PropertyView>, (StatusCode, String)> {
    let property = app_state.repo.get_property(&id).await.map_err(port_rejection)?;
    Ok(Json(property.into()))
}

/// Create a listing and issue its display codes.
#[utoipa::path(
    post,
    path = "/properties",
    request_body = NewPropertyRequest,
    responses(
        (status = 201, description = "Listing created", body = PropertyView),
        (status = 400, description = "Invalid listing data"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_property_handler(
    State(app_state): State<Arc<AppState>>,
    Json(request): Json<NewPropertyRequest>,
) -> Result<(StatusCode, Json<PropertyView>), (StatusCode, String)> {
    let new_property = request.into_domain()?;
    let shortcode = generate_shortcode(&mut rand::thread_rng());
    let created = app_state
        .repo
        .create_property(new_property, &shortcode, &app_state.config.metadata)
        .await
        .map_err(|e| {
            error!("Failed to create property: {:?}", e);
            port_rejection(e)
        })?;

    info!(property_id = %created.id, "Listing published");
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Withdraw a listing. The row is kept and flagged as deleted.
#[utoipa::path(
    delete,
    path = "/properties/{id}",
    params(("id" = String, Path, description = "Property id")),
    responses(
        (status = 204, description = "Listing withdrawn"),
        (status = 404, description = "No such listing")
    )
)]
pub async fn delete_property_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    app_state.repo.soft_delete_property(&id).await.map_err(port_rejection)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Issue a new shortcode and reference code for the next listing cycle.
#[utoipa::path(
    post,
    path = "/properties/{id}/metadata",
    params(("id" = String, Path, description = "Property id")),
    responses(
        (status = 200, description = "Listing with fresh display codes", body = PropertyView),
        (status = 404, description = "No such listing")
    )
)]
pub async fn regenerate_metadata_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PropertyView>, (StatusCode, String)> {
    let property = app_state.repo.get_property(&id).await.map_err(port_rejection)?;
    let enriched = add_metadata(property, &app_state.config.metadata, &mut rand::thread_rng());
    if let Some(metadata) = &enriched.metadata {
        app_state
            .repo
            .save_metadata(&enriched.id, metadata)
            .await
            .map_err(port_rejection)?;
    }
    Ok(Json(enriched.into()))
}

/// Pin positions for the listings matching the filter.
#[utoipa::path(
    get,
    path = "/properties/map",
    params(ListingQuery),
    responses(
        (status = 200, description = "Pin positions in result order", body = [MapPin]),
        (status = 400, description = "Invalid filter value")
    )
)]
pub async fn map_positions_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<Vec<MapPin>>, (StatusCode, String)> {
    let filter = query.into_filter()?;
    let properties = app_state.repo.list_properties(&filter).await.map_err(port_rejection)?;
    let pins = project_properties(&properties)
        .into_iter()
        .map(|(id, pos)| MapPin { id, x: pos.x, y: pos.y })
        .collect();
    Ok(Json(pins))
}

#[utoipa::path(
    get,
    path = "/agents/{id}",
    params(("id" = String, Path, description = "Agent id")),
    responses(
        (status = 200, description = "The agent", body = AgentView),
        (status = 404, description = "No such agent")
    )
)]
pub async fn get_agent_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<AgentView>, (StatusCode, String)> {
    let agent = app_state.repo.get_agent(&id).await.map_err(port_rejection)?;
    Ok(Json(agent.into()))
}

/// Listings managed by one agent, for the agent dashboard.
#[utoipa::path(
    get,
    path = "/agents/{id}/properties",
    params(("id" = String, Path, description = "Agent id"), ListingQuery),
    responses(
        (status = 200, description = "The agent's listings", body = [PropertyView]),
        (status = 404, description = "No such agent")
    )
)]
pub async fn list_agent_properties_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<Vec<PropertyView>>, (StatusCode, String)> {
    let agent = app_state.repo.get_agent(&id).await.map_err(port_rejection)?;
    let mut filter = query.into_filter()?;
    filter.agent_id = Some(agent.id);
    let properties = app_state.repo.list_properties(&filter).await.map_err(port_rejection)?;
    Ok(Json(into_views(properties)))
}
