//! Transaction entity - A record of a balance transfer tied to a booking.
//!
//! Rows are written once by the ledger and never mutated afterwards. The
//! `amount` always equals the booking's `total_price`, and at most one
//! completed transaction may exist per booking.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Booking this payment settles
    pub booking_id: i64,
    /// Paying user (the renter)
    pub from_user_id: i64,
    /// Receiving user (the car owner)
    pub to_user_id: i64,
    /// Transferred amount in dollars, always positive
    pub amount: f64,
    /// Transaction status: `pending`, `completed`, or `failed`
    pub status: String,
    /// When the transfer settled
    pub timestamp: DateTimeUtc,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction settles one booking
    #[sea_orm(
        belongs_to = "super::booking::Entity",
        from = "Column::BookingId",
        to = "super::booking::Column::Id"
    )]
    Booking,
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Booking.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
