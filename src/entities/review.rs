//! Review entity - A rating and comment left for a completed booking.
//!
//! `target_type` discriminates what `target_id` points at: `"car"` for the
//! rented vehicle, `"user"` for the counter-party. One review is allowed per
//! `(booking_id, target_type)` pair, giving each side of a booking one voice.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Review database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    /// Unique identifier for the review
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Booking this review refers to
    pub booking_id: i64,
    /// User who wrote the review
    pub reviewer_id: i64,
    /// Reviewed car or user, per `target_type`
    pub target_id: i64,
    /// Target discriminator: `"car"` or `"user"`
    pub target_type: String,
    /// Star rating, integer 1 to 5
    pub rating: i32,
    /// Free-form comment
    pub comment: String,
    /// When the review was written
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Review and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each review refers to one booking
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
