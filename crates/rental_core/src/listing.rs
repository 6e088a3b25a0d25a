//! crates/rental_core/src/listing.rs
//!
//! Browse/search filtering and image ordering for the flattened property view.

use serde::{Deserialize, Serialize};

use crate::domain::{Furnishing, Property, PropertyImage, PropertyStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

/// Criteria from the listings search bar and filter panel. Every field is
/// optional; an empty filter matches every listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyFilter {
    /// Free text matched against title, description and location.
    pub search: Option<String>,
    pub location: Option<String>,
    pub status: Option<PropertyStatus>,
    pub furnishing: Option<Furnishing>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub min_bedrooms: Option<i32>,
    pub agent_id: Option<String>,
    #[serde(default)]
    pub sort: SortOrder,
}

impl PropertyFilter {
    pub fn matches(&self, property: &Property) -> bool {
        if let Some(search) = non_blank(&self.search) {
            let needle = search.to_lowercase();
            let hit = [&property.title, &property.description, &property.location]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if let Some(location) = non_blank(&self.location) {
            let needle = location.to_lowercase();
            let in_location = property.location.to_lowercase().contains(&needle);
            let in_region = property
                .region
                .as_deref()
                .is_some_and(|r| r.to_lowercase().contains(&needle));
            if !in_location && !in_region {
                return false;
            }
        }
        if self.status.is_some_and(|s| s != property.status) {
            return false;
        }
        if self.furnishing.is_some_and(|f| f != property.furnishing) {
            return false;
        }
        if self.min_price.is_some_and(|min| property.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| property.price > max) {
            return false;
        }
        if self.min_bedrooms.is_some_and(|min| property.bedrooms < min) {
            return false;
        }
        if let Some(agent_id) = &self.agent_id {
            if property.agent_id.as_ref() != Some(agent_id) {
                return false;
            }
        }
        true
    }

    /// Filters and sorts in one pass. Sorting is stable, so ties keep the
    /// order the repository returned them in.
    pub fn apply(&self, properties: Vec<Property>) -> Vec<Property> {
        let mut kept: Vec<Property> = properties.into_iter().filter(|p| self.matches(p)).collect();
        match self.sort {
            SortOrder::Newest => kept.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortOrder::PriceAsc => kept.sort_by_key(|p| p.price),
            SortOrder::PriceDesc => kept.sort_by(|a, b| b.price.cmp(&a.price)),
        }
        kept
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Primary image first, then ascending `sort_order`. Equal keys keep their
/// row order.
pub fn order_images(mut images: Vec<PropertyImage>) -> Vec<String> {
    images.sort_by_key(|img| (!img.is_primary, img.sort_order));
    images.into_iter().map(|img| img.url).collect()
}
