//! User entity - Represents a marketplace account.
//!
//! The core only ever reads and writes the `balance` field; the remaining
//! columns are carried on behalf of the identity collaborator, which owns
//! registration, sessions, and credential checks.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Login email, unique per account
    pub email: String,
    /// Current account balance in dollars, never negative
    pub balance: f64,
    /// Whether this user has listed at least one car
    pub is_car_owner: bool,
    /// When the account was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user owns many car listings
    #[sea_orm(has_many = "super::car::Entity")]
    Cars,
    /// One user rents through many bookings
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
}

impl Related<super::car::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cars.def()
    }
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
