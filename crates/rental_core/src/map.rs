//! crates/rental_core/src/map.rs
//!
//! Projects coordinates onto the illustrative listings map. The map is not
//! georeferenced: each known region has a hand-picked bounding box that is
//! stretched over the drawing, and pins stay inside a 15%-85% margin.

use serde::{Deserialize, Serialize};

use crate::domain::{GeoPoint, Property};

pub const MIN_PERCENT: f64 = 15.0;
pub const MAX_PERCENT: f64 = 85.0;

const GRID_COLUMNS: usize = 3;
const GRID_START: f64 = 25.0;
const GRID_STEP: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

/// Region name fragments and the box drawn for them. First match wins.
const REGIONS: &[(&str, BoundingBox)] = &[
    (
        "new cairo",
        BoundingBox { min_lat: 29.95, max_lat: 30.10, min_lng: 31.38, max_lng: 31.60 },
    ),
    (
        "sheikh zayed",
        BoundingBox { min_lat: 29.98, max_lat: 30.08, min_lng: 30.90, max_lng: 31.05 },
    ),
    (
        "october",
        BoundingBox { min_lat: 29.85, max_lat: 30.05, min_lng: 30.85, max_lng: 31.05 },
    ),
    (
        "north coast",
        BoundingBox { min_lat: 30.80, max_lat: 31.40, min_lng: 27.50, max_lng: 29.50 },
    ),
    (
        "cairo",
        BoundingBox { min_lat: 29.90, max_lat: 30.20, min_lng: 31.10, max_lng: 31.50 },
    ),
];

/// Pin position as percentages of the map's width (`x`) and height (`y`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapPosition {
    pub x: f64,
    pub y: f64,
}

pub fn region_bounds(region: &str) -> Option<BoundingBox> {
    let haystack = region.to_lowercase();
    REGIONS
        .iter()
        .find(|(pattern, _)| haystack.contains(pattern))
        .map(|(_, bounds)| *bounds)
}

fn scale(value: f64, min: f64, max: f64) -> f64 {
    let t = (value - min) / (max - min);
    (MIN_PERCENT + t * (MAX_PERCENT - MIN_PERCENT)).clamp(MIN_PERCENT, MAX_PERCENT)
}

/// Linear interpolation within `bounds`, north at the top.
pub fn project_within(point: GeoPoint, bounds: BoundingBox) -> MapPosition {
    MapPosition {
        x: scale(point.longitude, bounds.min_lng, bounds.max_lng),
        y: scale(-point.latitude, -bounds.max_lat, -bounds.min_lat),
    }
}

/// Spreads unplaceable pins over a 3x3 grid, wrapping after nine.
pub fn fallback_position(index: usize) -> MapPosition {
    let slot = index % (GRID_COLUMNS * GRID_COLUMNS);
    MapPosition {
        x: GRID_START + (slot % GRID_COLUMNS) as f64 * GRID_STEP,
        y: GRID_START + (slot / GRID_COLUMNS) as f64 * GRID_STEP,
    }
}

pub fn project(point: Option<GeoPoint>, region: &str, index: usize) -> MapPosition {
    match (point, region_bounds(region)) {
        (Some(point), Some(bounds)) => project_within(point, bounds),
        _ => fallback_position(index),
    }
}

/// Positions for a result list; `index` is the listing's place in `properties`.
/// A region without a known box falls back to the listing's location.
pub fn project_properties(properties: &[Property]) -> Vec<(String, MapPosition)> {
    properties
        .iter()
        .enumerate()
        .map(|(index, p)| {
            let hint = p
                .region
                .as_deref()
                .filter(|region| region_bounds(region).is_some())
                .unwrap_or(p.location.as_str());
            (p.id.clone(), project(p.coordinates, hint, index))
        })
        .collect()
}
