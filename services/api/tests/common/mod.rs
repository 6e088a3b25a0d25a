//! Shared fixtures for the API integration tests: an in-memory repository and
//! an application state seeded with four listings and one agent.

#![allow(dead_code)]

use api_lib::config::Config;
use api_lib::web::state::AppState;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rental_core::domain::{Agent, Furnishing, GeoPoint, NewProperty, Property, PropertyMetadata, PropertyStatus};
use rental_core::listing::PropertyFilter;
use rental_core::ports::{PortError, PortResult, PropertyRepository};
use rental_core::reference::{build_metadata, MetadataSettings};
use rental_core::MemoryStore;
use std::sync::{Arc, Mutex};

//=========================================================================================
// In-memory repository
//=========================================================================================

#[derive(Default)]
pub struct InMemoryRepository {
    pub properties: Mutex<Vec<(Property, bool)>>,
    pub agents: Vec<Agent>,
    /// Makes every display-code write fail, as a lost database connection would.
    pub metadata_writes_fail: bool,
}

impl InMemoryRepository {
    fn live(&self) -> Vec<Property> {
        self.properties
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, deleted)| !deleted)
            .map(|(p, _)| p.clone())
            .collect()
    }

    fn metadata_write(&self) -> PortResult<()> {
        if self.metadata_writes_fail {
            return Err(PortError::Unexpected("connection reset while writing metadata".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PropertyRepository for InMemoryRepository {
    async fn list_properties(&self, filter: &PropertyFilter) -> PortResult<Vec<Property>> {
        Ok(filter.apply(self.live()))
    }

    async fn get_property(&self, id: &str) -> PortResult<Property> {
        self.live()
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| PortError::NotFound(format!("Property {} not found", id)))
    }

    async fn get_properties_by_ids(&self, ids: &[String]) -> PortResult<Vec<Property>> {
        let live = self.live();
        Ok(ids
            .iter()
            .filter_map(|id| live.iter().find(|p| &p.id == id).cloned())
            .collect())
    }

    async fn create_property(
        &self,
        new_property: NewProperty,
        shortcode: &str,
        settings: &MetadataSettings,
    ) -> PortResult<Property> {
        let mut properties = self.properties.lock().unwrap();
        let id = (properties.len() + 1).to_string();
        // Nothing is pushed until the codes are written, like a rolled back transaction.
        self.metadata_write()?;
        let metadata = build_metadata(&id, &new_property.location, &new_property.title, shortcode, 1, settings);
        let property = Property {
            id,
            title: new_property.title,
            description: new_property.description,
            price: new_property.price,
            bedrooms: new_property.bedrooms,
            bathrooms: new_property.bathrooms,
            area: new_property.area,
            location: new_property.location,
            region: new_property.region,
            status: new_property.status,
            furnishing: new_property.furnishing,
            images: new_property.images,
            video_url: new_property.video_url,
            amenities: new_property.amenities,
            agent_id: new_property.agent_id,
            metadata: Some(metadata),
            coordinates: new_property.coordinates,
            created_at: Utc::now(),
        };
        properties.push((property.clone(), false));
        Ok(property)
    }

    async fn save_metadata(&self, id: &str, metadata: &PropertyMetadata) -> PortResult<()> {
        self.metadata_write()?;
        let mut properties = self.properties.lock().unwrap();
        let (property, _) = properties
            .iter_mut()
            .find(|(p, deleted)| p.id == id && !deleted)
            .ok_or_else(|| PortError::NotFound(format!("Property {} not found", id)))?;
        property.metadata = Some(metadata.clone());
        Ok(())
    }

    async fn soft_delete_property(&self, id: &str) -> PortResult<()> {
        let mut properties = self.properties.lock().unwrap();
        let entry = properties
            .iter_mut()
            .find(|(p, deleted)| p.id == id && !deleted)
            .ok_or_else(|| PortError::NotFound(format!("Property {} not found", id)))?;
        entry.1 = true;
        Ok(())
    }

    async fn get_agent(&self, id: &str) -> PortResult<Agent> {
        self.agents
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Agent {} not found", id)))
    }
}

//=========================================================================================
// Fixtures
//=========================================================================================

pub fn listing(id: &str, title: &str, location: &str, price: i64, agent: Option<&str>) -> Property {
    Property {
        id: id.to_string(),
        title: title.to_string(),
        description: String::new(),
        price,
        bedrooms: 2,
        bathrooms: 1,
        area: 100,
        location: location.to_string(),
        region: Some("Cairo".to_string()),
        status: PropertyStatus::Available,
        furnishing: Furnishing::Furnished,
        images: vec![],
        video_url: None,
        amenities: vec![],
        agent_id: agent.map(str::to_string),
        metadata: None,
        coordinates: Some(GeoPoint { latitude: 30.05, longitude: 31.30 }),
        created_at: Utc.with_ymd_and_hms(2024, 2, price as u32 % 28 + 1, 0, 0, 0).unwrap(),
    }
}

/// Four live listings; agent 7 manages the first two.
pub fn repository() -> InMemoryRepository {
    InMemoryRepository {
        properties: Mutex::new(vec![
            (listing("1", "Apartment in Maadi", "Maadi", 10, Some("7")), false),
            (listing("2", "Villa in New Cairo", "New Cairo", 20, Some("7")), false),
            (listing("3", "Studio in Zamalek", "Zamalek", 5, None), false),
            (listing("4", "Chalet in Sahel", "North Coast", 15, None), false),
        ]),
        agents: vec![Agent {
            id: "7".to_string(),
            name: "Nour".to_string(),
            email: "nour@example.test".to_string(),
            phone: None,
            whatsapp: None,
            listing_count: 2,
        }],
        metadata_writes_fail: false,
    }
}

pub fn state_with(repo: InMemoryRepository) -> Arc<AppState> {
    let config = Config::from_lookup(|name| match name {
        "DATABASE_URL" => Some("postgres://unused".to_string()),
        "SITE_URL" => Some("https://listings.test".to_string()),
        _ => None,
    })
    .unwrap();
    Arc::new(AppState {
        repo: Arc::new(repo),
        selections: Arc::new(MemoryStore::new()),
        config: Arc::new(config),
    })
}

pub fn state() -> Arc<AppState> {
    state_with(repository())
}
