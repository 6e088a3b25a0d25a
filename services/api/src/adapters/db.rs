//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `PropertyRepository` port from the `core` crate. It queries PostgreSQL
//! with `sqlx` and flattens property, image and amenity rows into the `Property`
//! view model.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rental_core::domain::{
    Agent, Furnishing, GeoPoint, NewProperty, Property, PropertyImage, PropertyMetadata, PropertyStatus,
};
use rental_core::listing::{order_images, PropertyFilter};
use rental_core::ports::{PortError, PortResult, PropertyRepository};
use rental_core::reference::{build_metadata, MetadataSettings};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use tracing::{debug, info};

const PROPERTY_COLUMNS: &str = "id, title, description, price, bedrooms, bathrooms, area, location, \
     region, status, furnishing, video_url, latitude, longitude, agent_id, shortcode, \
     reference_code, qr_code_url, property_url, reference_cycle, created_at";

const UPDATE_METADATA: &str = "UPDATE properties SET shortcode = $1, reference_code = $2, qr_code_url = $3, \
     property_url = $4, reference_cycle = $5 WHERE id = $6 AND is_deleted = FALSE";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `PropertyRepository` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Loads images and amenities for `records` and assembles the view models.
    async fn hydrate(&self, records: Vec<PropertyRecord>) -> PortResult<Vec<Property>> {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();

        let images = sqlx::query_as::<_, ImageRecord>(
            "SELECT property_id, url, is_primary, sort_order FROM property_images \
             WHERE property_id = ANY($1) ORDER BY property_id, id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let amenities = sqlx::query_as::<_, AmenityRecord>(
            "SELECT pa.property_id, a.name FROM property_amenities pa \
             JOIN amenities a ON a.id = pa.amenity_id \
             WHERE pa.property_id = ANY($1) ORDER BY pa.property_id, a.name",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        assemble(records, images, amenities)
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Property ids are opaque strings outside this adapter; here they are BIGINT keys.
fn parse_id(kind: &str, id: &str) -> PortResult<i64> {
    id.trim()
        .parse::<i64>()
        .map_err(|_| PortError::NotFound(format!("{} {} not found", kind, id)))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct PropertyRecord {
    id: i64,
    title: String,
    description: String,
    price: i64,
    bedrooms: i32,
    bathrooms: i32,
    area: i32,
    location: String,
    region: Option<String>,
    status: String,
    furnishing: String,
    video_url: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    agent_id: Option<i64>,
    shortcode: Option<String>,
    reference_code: Option<String>,
    qr_code_url: Option<String>,
    property_url: Option<String>,
    reference_cycle: Option<i32>,
    created_at: DateTime<Utc>,
}

impl PropertyRecord {
    fn to_domain(self, images: Vec<PropertyImage>, amenities: Vec<String>) -> PortResult<Property> {
        let status = self.status.parse::<PropertyStatus>().map_err(PortError::Unexpected)?;
        let furnishing = self.furnishing.parse::<Furnishing>().map_err(PortError::Unexpected)?;

        let metadata = match (self.shortcode, self.reference_code, self.qr_code_url, self.property_url) {
            (Some(shortcode), Some(reference_code), Some(qr_code_url), Some(property_url)) => {
                Some(PropertyMetadata {
                    shortcode,
                    reference_code,
                    qr_code_url,
                    property_url,
                    cycle: self.reference_cycle.map_or(1, |c| c.max(1) as u32),
                })
            }
            _ => None,
        };
        let coordinates = match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint { latitude, longitude }),
            _ => None,
        };

        Ok(Property {
            id: self.id.to_string(),
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
            images: order_images(images),
            video_url: self.video_url,
            amenities,
            agent_id: self.agent_id.map(|id| id.to_string()),
            metadata,
            coordinates,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct ImageRecord {
    property_id: i64,
    url: String,
    is_primary: bool,
    sort_order: i32,
}

#[derive(FromRow)]
struct AmenityRecord {
    property_id: i64,
    name: String,
}

#[derive(FromRow)]
struct AgentRecord {
    id: i64,
    name: String,
    email: String,
    phone: Option<String>,
    whatsapp: Option<String>,
    listing_count: i64,
}
impl AgentRecord {
    fn to_domain(self) -> Agent {
        Agent {
            id: self.id.to_string(),
            name: self.name,
            email: self.email,
            phone: self.phone,
            whatsapp: self.whatsapp,
            listing_count: self.listing_count,
        }
    }
}

#[derive(FromRow)]
struct IdRecord {
    id: i64,
}

/// Groups joined child rows under their property and builds the view models,
/// keeping the order of `records`.
fn assemble(
    records: Vec<PropertyRecord>,
    images: Vec<ImageRecord>,
    amenities: Vec<AmenityRecord>,
) -> PortResult<Vec<Property>> {
    let mut images_by_property: HashMap<i64, Vec<PropertyImage>> = HashMap::new();
    for image in images {
        images_by_property
            .entry(image.property_id)
            .or_default()
            .push(PropertyImage {
                url: image.url,
                is_primary: image.is_primary,
                sort_order: image.sort_order,
            });
    }
    let mut amenities_by_property: HashMap<i64, Vec<String>> = HashMap::new();
    for amenity in amenities {
        amenities_by_property
            .entry(amenity.property_id)
            .or_default()
            .push(amenity.name);
    }

    records
        .into_iter()
        .map(|record| {
            let images = images_by_property.remove(&record.id).unwrap_or_default();
            let amenities = amenities_by_property.remove(&record.id).unwrap_or_default();
            record.to_domain(images, amenities)
        })
        .collect()
}

//=========================================================================================
// `PropertyRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl PropertyRepository for DbAdapter {
    async fn list_properties(&self, filter: &PropertyFilter) -> PortResult<Vec<Property>> {
        // Structured criteria go to the database; free-text matching and sorting
        // run over the hydrated rows.
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM properties WHERE is_deleted = FALSE",
            PROPERTY_COLUMNS
        ));
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(furnishing) = filter.furnishing {
            query.push(" AND furnishing = ").push_bind(furnishing.as_str());
        }
        if let Some(min_price) = filter.min_price {
            query.push(" AND price >= ").push_bind(min_price);
        }
        if let Some(max_price) = filter.max_price {
            query.push(" AND price <= ").push_bind(max_price);
        }
        if let Some(min_bedrooms) = filter.min_bedrooms {
            query.push(" AND bedrooms >= ").push_bind(min_bedrooms);
        }
        if let Some(agent_id) = &filter.agent_id {
            let Ok(agent_id) = agent_id.trim().parse::<i64>() else {
                return Ok(Vec::new());
            };
            query.push(" AND agent_id = ").push_bind(agent_id);
        }
        query.push(" ORDER BY created_at DESC");

        let records = query
            .build_query_as::<PropertyRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        debug!("Fetched {} candidate properties", records.len());

        let properties = self.hydrate(records).await?;
        Ok(filter.apply(properties))
    }

    async fn get_property(&self, id: &str) -> PortResult<Property> {
        let key = parse_id("Property", id)?;
        let record = sqlx::query_as::<_, PropertyRecord>(&format!(
            "SELECT {} FROM properties WHERE id = $1 AND is_deleted = FALSE",
            PROPERTY_COLUMNS
        ))
        .bind(key)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Property {} not found", id)),
            _ => unexpected(e),
        })?;

        self.hydrate(vec![record])
            .await?
            .pop()
            .ok_or_else(|| PortError::NotFound(format!("Property {} not found", id)))
    }

    async fn get_properties_by_ids(&self, ids: &[String]) -> PortResult<Vec<Property>> {
        let keys: Vec<i64> = ids.iter().filter_map(|id| id.trim().parse().ok()).collect();
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let records = sqlx::query_as::<_, PropertyRecord>(&format!(
            "SELECT {} FROM properties WHERE id = ANY($1) AND is_deleted = FALSE",
            PROPERTY_COLUMNS
        ))
        .bind(&keys)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let mut by_id: HashMap<String, Property> = self
            .hydrate(records)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        Ok(keys
            .iter()
            .filter_map(|key| by_id.remove(&key.to_string()))
            .collect())
    }

    async fn create_property(
        &self,
        new_property: NewProperty,
        shortcode: &str,
        settings: &MetadataSettings,
    ) -> PortResult<Property> {
        let agent_id = match &new_property.agent_id {
            Some(id) => Some(
                id.trim()
                    .parse::<i64>()
                    .map_err(|_| PortError::InvalidInput(format!("Invalid agent id '{}'", id)))?,
            ),
            None => None,
        };

        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let created = sqlx::query_as::<_, IdRecord>(
            "INSERT INTO properties (title, description, price, bedrooms, bathrooms, area, location, \
             region, status, furnishing, video_url, latitude, longitude, agent_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) RETURNING id",
        )
        .bind(&new_property.title)
        .bind(&new_property.description)
        .bind(new_property.price)
        .bind(new_property.bedrooms)
        .bind(new_property.bathrooms)
        .bind(new_property.area)
        .bind(&new_property.location)
        .bind(&new_property.region)
        .bind(new_property.status.as_str())
        .bind(new_property.furnishing.as_str())
        .bind(&new_property.video_url)
        .bind(new_property.coordinates.map(|c| c.latitude))
        .bind(new_property.coordinates.map(|c| c.longitude))
        .bind(agent_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        // The first uploaded image becomes the primary one.
        for (position, url) in new_property.images.iter().enumerate() {
            sqlx::query(
                "INSERT INTO property_images (property_id, url, is_primary, sort_order) \
                 VALUES ($1, $2, $3, $4)",
            )
            .bind(created.id)
            .bind(url)
            .bind(position == 0)
            .bind(position as i32)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }

        for name in &new_property.amenities {
            let amenity = sqlx::query_as::<_, IdRecord>(
                "INSERT INTO amenities (name) VALUES ($1) \
                 ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name RETURNING id",
            )
            .bind(name.trim())
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected)?;

            sqlx::query(
                "INSERT INTO property_amenities (property_id, amenity_id) VALUES ($1, $2) \
                 ON CONFLICT DO NOTHING",
            )
            .bind(created.id)
            .bind(amenity.id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }

        // Display codes need the new id, so they are written before the commit.
        let metadata = build_metadata(
            &created.id.to_string(),
            &new_property.location,
            &new_property.title,
            shortcode,
            1,
            settings,
        );
        sqlx::query(UPDATE_METADATA)
            .bind(&metadata.shortcode)
            .bind(&metadata.reference_code)
            .bind(&metadata.qr_code_url)
            .bind(&metadata.property_url)
            .bind(metadata.cycle as i32)
            .bind(created.id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        info!(property_id = created.id, "Created property");

        self.get_property(&created.id.to_string()).await
    }

    async fn save_metadata(&self, id: &str, metadata: &PropertyMetadata) -> PortResult<()> {
        let key = parse_id("Property", id)?;
        let result = sqlx::query(UPDATE_METADATA)
            .bind(&metadata.shortcode)
            .bind(&metadata.reference_code)
            .bind(&metadata.qr_code_url)
            .bind(&metadata.property_url)
            .bind(metadata.cycle as i32)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Property {} not found", id)));
        }
        Ok(())
    }

    async fn soft_delete_property(&self, id: &str) -> PortResult<()> {
        let key = parse_id("Property", id)?;
        let result = sqlx::query("UPDATE properties SET is_deleted = TRUE WHERE id = $1 AND is_deleted = FALSE")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Property {} not found", id)));
        }
        info!(property_id = key, "Soft-deleted property");
        Ok(())
    }

    async fn get_agent(&self, id: &str) -> PortResult<Agent> {
        let key = parse_id("Agent", id)?;
        let record = sqlx::query_as::<_, AgentRecord>(
            "SELECT a.id, a.name, a.email, a.phone, a.whatsapp, COUNT(p.id) AS listing_count \
             FROM agents a \
             LEFT JOIN properties p ON p.agent_id = a.id AND p.is_deleted = FALSE \
             WHERE a.id = $1 \
             GROUP BY a.id, a.name, a.email, a.phone, a.whatsapp",
        )
        .bind(key)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("Agent {} not found", id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }
}
