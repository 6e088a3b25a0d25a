//! Handler-level tests for the listings API, run against an in-memory
//! repository and selection store.

mod common;

use api_lib::web::rest::{
    create_property_handler, delete_property_handler, get_property_handler,
    list_agent_properties_handler, list_properties_handler, map_positions_handler,
    regenerate_metadata_handler, ListingQuery, NewPropertyRequest,
};
use api_lib::web::selection::{
    add_to_selection_handler, clear_selection_handler, list_selection_handler,
    list_selection_properties_handler, remove_from_selection_handler, toggle_selection_handler,
};
use api_lib::web::state::{ClientId, SelectionKind};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use common::{repository, state, state_with, InMemoryRepository};
use uuid::Uuid;

fn client() -> Extension<ClientId> {
    Extension(ClientId(Uuid::new_v4()))
}

const COMPARE: Extension<SelectionKind> = Extension(SelectionKind::Comparison);
const FAVORITES: Extension<SelectionKind> = Extension(SelectionKind::Favorites);

//=========================================================================================
// Selection routes
//=========================================================================================

#[tokio::test]
async fn comparison_list_enforces_capacity() {
    let state = state();
    let me = client();

    for id in ["1", "2", "3"] {
        let Json(update) =
            add_to_selection_handler(State(state.clone()), COMPARE, me.clone(), Path(id.to_string())).await;
        assert!(update.success);
    }
    let Json(rejected) =
        add_to_selection_handler(State(state.clone()), COMPARE, me.clone(), Path("4".to_string())).await;
    assert!(!rejected.success);
    assert_eq!(rejected.ids, ["1", "2", "3"]);
    assert_eq!(rejected.capacity, Some(3));

    let Json(after_remove) =
        remove_from_selection_handler(State(state.clone()), COMPARE, me.clone(), Path("2".to_string())).await;
    assert_eq!(after_remove.ids, ["1", "3"]);

    let Json(update) =
        add_to_selection_handler(State(state.clone()), COMPARE, me.clone(), Path("4".to_string())).await;
    assert!(update.success);
    assert_eq!(update.ids, ["1", "3", "4"]);
}

#[tokio::test]
async fn clients_have_separate_lists() {
    let state = state();
    let alice = client();
    let bob = client();

    add_to_selection_handler(State(state.clone()), FAVORITES, alice.clone(), Path("1".to_string())).await;

    let Json(alices) = list_selection_handler(State(state.clone()), FAVORITES, alice).await;
    let Json(bobs) = list_selection_handler(State(state.clone()), FAVORITES, bob).await;
    assert_eq!(alices.ids, ["1"]);
    assert!(bobs.ids.is_empty());
    assert_eq!(bobs.capacity, None);
}

#[tokio::test]
async fn toggle_and_clear() {
    let state = state();
    let me = client();

    let Json(on) = toggle_selection_handler(State(state.clone()), FAVORITES, me.clone(), Path("3".to_string())).await;
    assert!(on.success);
    let Json(off) = toggle_selection_handler(State(state.clone()), FAVORITES, me.clone(), Path("3".to_string())).await;
    assert!(!off.success);
    assert!(off.ids.is_empty());

    add_to_selection_handler(State(state.clone()), FAVORITES, me.clone(), Path("2".to_string())).await;
    let status = clear_selection_handler(State(state.clone()), FAVORITES, me.clone()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let Json(list) = list_selection_handler(State(state), FAVORITES, me).await;
    assert!(list.ids.is_empty());
}

#[tokio::test]
async fn resolved_selection_skips_withdrawn_listings() {
    let state = state();
    let me = client();
    for id in ["3", "1", "2"] {
        add_to_selection_handler(State(state.clone()), COMPARE, me.clone(), Path(id.to_string())).await;
    }
    delete_property_handler(State(state.clone()), Path("1".to_string())).await.unwrap();

    let Json(properties) = list_selection_properties_handler(State(state), COMPARE, me).await.unwrap();
    let ids: Vec<_> = properties.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["3", "2"]);
}

//=========================================================================================
// Listing routes
//=========================================================================================

#[tokio::test]
async fn listings_are_filtered_and_sorted() {
    let state = state();
    let query = ListingQuery {
        max_price: Some(15),
        sort: Some("price_asc".to_string()),
        ..Default::default()
    };
    let Json(properties) = list_properties_handler(State(state), Query(query)).await.unwrap();
    let ids: Vec<_> = properties.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["3", "1", "4"]);
}

#[tokio::test]
async fn invalid_filter_is_a_bad_request() {
    let query = ListingQuery {
        status: Some("sold".to_string()),
        ..Default::default()
    };
    let err = list_properties_handler(State(state()), Query(query)).await.unwrap_err();
    assert_eq!(err.0, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_property_is_not_found() {
    let err = get_property_handler(State(state()), Path("99".to_string())).await.unwrap_err();
    assert_eq!(err.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn created_listing_gets_display_codes() {
    let state = state();
    let request: NewPropertyRequest = serde_json::from_value(serde_json::json!({
        "title": "Modern Villa in New Cairo",
        "price": 55000,
        "location": "New Cairo - Fifth Settlement",
        "amenities": ["Pool", "Garden"]
    }))
    .unwrap();

    let (status, Json(created)) = create_property_handler(State(state.clone()), Json(request)).await.unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created.id, "5");

    let shortcode = created.shortcode.clone().unwrap();
    assert_eq!(created.reference_code.as_deref(), Some(format!("BOB-NC-VIL-0005-R1 • {}", shortcode).as_str()));
    assert_eq!(created.property_url.as_deref(), Some("https://listings.test/property/5"));

    // The stored listing carries the same codes.
    let Json(stored) = get_property_handler(State(state.clone()), Path("5".to_string())).await.unwrap();
    assert_eq!(stored.reference_code, created.reference_code);

    let Json(regenerated) = regenerate_metadata_handler(State(state), Path("5".to_string())).await.unwrap();
    assert!(regenerated.reference_code.unwrap().starts_with("BOB-NC-VIL-0005-R2 • "));
}

fn villa_request() -> NewPropertyRequest {
    serde_json::from_value(serde_json::json!({
        "title": "Villa",
        "price": 1,
        "location": "Maadi"
    }))
    .unwrap()
}

fn failing_repository() -> InMemoryRepository {
    InMemoryRepository {
        metadata_writes_fail: true,
        ..repository()
    }
}

#[tokio::test]
async fn failed_create_leaves_no_partial_listing() {
    let state = state_with(failing_repository());

    let err = create_property_handler(State(state.clone()), Json(villa_request())).await.unwrap_err();
    assert_eq!(err.0, StatusCode::INTERNAL_SERVER_ERROR);

    let Json(properties) = list_properties_handler(State(state.clone()), Query(ListingQuery::default()))
        .await
        .unwrap();
    let mut ids: Vec<_> = properties.iter().map(|p| p.id.clone()).collect();
    ids.sort();
    assert_eq!(ids, ["1", "2", "3", "4"]);
    let err = get_property_handler(State(state), Path("5".to_string())).await.unwrap_err();
    assert_eq!(err.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn failed_regeneration_leaves_the_listing_unchanged() {
    let state = state_with(failing_repository());

    let err = regenerate_metadata_handler(State(state.clone()), Path("1".to_string())).await.unwrap_err();
    assert_eq!(err.0, StatusCode::INTERNAL_SERVER_ERROR);

    let Json(stored) = get_property_handler(State(state), Path("1".to_string())).await.unwrap();
    assert_eq!(stored.reference_code, None);
    assert_eq!(stored.shortcode, None);
}

#[tokio::test]
async fn deleted_listing_disappears() {
    let state = state();
    let status = delete_property_handler(State(state.clone()), Path("2".to_string())).await.unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let err = get_property_handler(State(state.clone()), Path("2".to_string())).await.unwrap_err();
    assert_eq!(err.0, StatusCode::NOT_FOUND);
    let err = delete_property_handler(State(state), Path("2".to_string())).await.unwrap_err();
    assert_eq!(err.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn agent_dashboard_lists_only_their_listings() {
    let state = state();
    let Json(properties) = list_agent_properties_handler(
        State(state.clone()),
        Path("7".to_string()),
        Query(ListingQuery::default()),
    )
    .await
    .unwrap();
    let mut ids: Vec<_> = properties.iter().map(|p| p.id.clone()).collect();
    ids.sort();
    assert_eq!(ids, ["1", "2"]);

    let err = list_agent_properties_handler(State(state), Path("8".to_string()), Query(ListingQuery::default()))
        .await
        .unwrap_err();
    assert_eq!(err.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn map_pins_stay_inside_the_margin() {
    let Json(pins) = map_positions_handler(State(state()), Query(ListingQuery::default())).await.unwrap();
    assert_eq!(pins.len(), 4);
    for pin in pins {
        assert!((15.0..=85.0).contains(&pin.x), "x out of range for {}", pin.id);
        assert!((15.0..=85.0).contains(&pin.y), "y out of range for {}", pin.id);
    }
}
