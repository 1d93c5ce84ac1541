//! Car entity - Represents a rentable vehicle listing.
//!
//! The `features` and `images` columns hold JSON-encoded string arrays in TEXT
//! columns; [`Model::feature_list`] and [`Model::image_list`] decode them.
//! `rating` and `review_count` are derived fields recomputed by the review
//! aggregator whenever a review targets this car.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Car database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cars")]
pub struct Model {
    /// Unique identifier for the car
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User who owns this listing
    pub owner_id: i64,
    /// Manufacturer (e.g., "Toyota")
    pub make: String,
    /// Model name (e.g., "Corolla")
    pub model: String,
    /// Model year
    pub year: i32,
    /// Body style (e.g., "sedan", "suv")
    pub car_type: String,
    /// Number of seats
    pub seats: i32,
    /// Exterior color
    pub color: String,
    /// License plate, unique per listing
    pub license_plate: String,
    /// Odometer reading in miles
    pub mileage: i32,
    /// Rental price per day in dollars
    pub price_per_day: f64,
    /// Free-form listing description
    pub description: String,
    /// JSON array of feature labels (e.g., `["GPS","Bluetooth"]`)
    pub features: String,
    /// JSON array of image references
    pub images: String,
    /// Street address of the pickup location
    pub address: String,
    /// Pickup latitude
    pub latitude: f64,
    /// Pickup longitude
    pub longitude: f64,
    /// Average review rating, one decimal place, 0.0 when unreviewed
    pub rating: f64,
    /// Number of reviews backing `rating`
    pub review_count: i32,
    /// Coarse owner-controlled availability override
    pub is_available: bool,
    /// When the listing was created
    pub created_at: DateTimeUtc,
}

impl Model {
    /// Decodes the JSON `features` column into a list of feature labels.
    /// An unreadable column decodes as an empty list rather than an error.
    #[must_use]
    pub fn feature_list(&self) -> Vec<String> {
        serde_json::from_str(&self.features).unwrap_or_default()
    }

    /// Decodes the JSON `images` column into a list of image references.
    #[must_use]
    pub fn image_list(&self) -> Vec<String> {
        serde_json::from_str(&self.images).unwrap_or_default()
    }
}

/// Encodes a list of strings into the JSON form stored in TEXT columns.
#[must_use]
pub fn encode_string_list(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

/// Defines relationships between Car and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each car belongs to one owner
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id"
    )]
    Owner,
    /// One car has many bookings
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
    /// One car has many availability windows
    #[sea_orm(has_many = "super::availability_window::Entity")]
    AvailabilityWindows,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl Related<super::availability_window::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AvailabilityWindows.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
