//! crates/rental_core/src/domain.rs
//!
//! Defines the pure, core data structures for the listings marketplace.
//! These structs carry serde derives so adapters can persist and expose them,
//! but they know nothing about the database or the HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Availability of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyStatus {
    Available,
    Rented,
    Pending,
}

impl PropertyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::Available => "available",
            PropertyStatus::Rented => "rented",
            PropertyStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for PropertyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(PropertyStatus::Available),
            "rented" => Ok(PropertyStatus::Rented),
            "pending" => Ok(PropertyStatus::Pending),
            other => Err(format!("unknown property status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Furnishing {
    Furnished,
    SemiFurnished,
    Unfurnished,
}

impl Furnishing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Furnishing::Furnished => "furnished",
            Furnishing::SemiFurnished => "semi-furnished",
            Furnishing::Unfurnished => "unfurnished",
        }
    }
}

impl fmt::Display for Furnishing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Furnishing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "furnished" => Ok(Furnishing::Furnished),
            "semi-furnished" | "semi_furnished" | "semifurnished" => Ok(Furnishing::SemiFurnished),
            "unfurnished" => Ok(Furnishing::Unfurnished),
            other => Err(format!("unknown furnishing '{}'", other)),
        }
    }
}

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Display identifiers derived from a property's attributes.
/// None of these are keys; shortcodes may collide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyMetadata {
    pub shortcode: String,
    pub reference_code: String,
    pub qr_code_url: String,
    pub property_url: String,
    pub cycle: u32,
}

/// The flattened property view model handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area: i32,
    pub location: String,
    pub region: Option<String>,
    pub status: PropertyStatus,
    pub furnishing: Furnishing,
    pub images: Vec<String>,
    pub video_url: Option<String>,
    pub amenities: Vec<String>,
    pub agent_id: Option<String>,
    pub metadata: Option<PropertyMetadata>,
    pub coordinates: Option<GeoPoint>,
    pub created_at: DateTime<Utc>,
}

/// One image row as stored; ordering is resolved by `listing::order_images`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyImage {
    pub url: String,
    pub is_primary: bool,
    pub sort_order: i32,
}

/// Data entered by an owner or agent when creating a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProperty {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area: i32,
    pub location: String,
    pub region: Option<String>,
    pub status: PropertyStatus,
    pub furnishing: Furnishing,
    #[serde(default)]
    pub images: Vec<String>,
    pub video_url: Option<String>,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub agent_id: Option<String>,
    pub coordinates: Option<GeoPoint>,
}

/// Read-only agent reference data joined to properties by `agent_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub whatsapp: Option<String>,
    pub listing_count: i64,
}
