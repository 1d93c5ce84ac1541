//! Availability window entity - An explicit "open for rental" date range.
//!
//! Windows form an optional allowlist per car: a car with zero windows is open
//! for any dates not already booked, while a car with windows only accepts
//! requests fully contained in one of them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Availability window database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "availability_windows")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Car this window belongs to
    pub car_id: i64,
    /// Inclusive start of the open range
    pub start_date: DateTimeUtc,
    /// Exclusive end of the open range
    pub end_date: DateTimeUtc,
}

/// Defines relationships between `AvailabilityWindow` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each window belongs to one car
    #[sea_orm(
        belongs_to = "super::car::Entity",
        from = "Column::CarId",
        to = "super::car::Column::Id"
    )]
    Car,
}

impl Related<super::car::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Car.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
