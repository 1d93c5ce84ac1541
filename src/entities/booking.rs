//! Booking entity - A reservation of a car by a renter for a date range.
//!
//! Date ranges are half-open `[start_date, end_date)`. A booking row is never
//! deleted; cancellation is a status transition, and the availability check
//! ignores cancelled rows, so inserting a booking *is* the calendar
//! reservation and cancelling it *is* the release.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Booking database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    /// Unique identifier for the booking
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Car being reserved
    pub car_id: i64,
    /// User renting the car
    pub renter_id: i64,
    /// Inclusive start of the rental
    pub start_date: DateTimeUtc,
    /// Exclusive end of the rental
    pub end_date: DateTimeUtc,
    /// Total price: rental days times the car's daily price at creation
    pub total_price: f64,
    /// Booking status: `pending`, `confirmed`, `completed`, or `cancelled`
    pub status: String,
    /// When the booking was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Booking and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each booking reserves one car
    #[sea_orm(
        belongs_to = "super::car::Entity",
        from = "Column::CarId",
        to = "super::car::Column::Id"
    )]
    Car,
    /// Each booking belongs to one renter
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::RenterId",
        to = "super::user::Column::Id"
    )]
    Renter,
    /// One booking has at most one completed transaction, but the ledger
    /// keeps the relation open-ended
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
    /// One booking collects up to one review per role
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
}

impl Related<super::car::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Car.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Renter.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
