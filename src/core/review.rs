//! Review business logic - Per-booking reviews and rating aggregation.
//!
//! Each side of a booking gets one review: the renter reviews the car, the
//! owner reviews the renter. A car-targeted review recomputes the car's
//! aggregate rating (mean over all its reviews, one decimal place) and pushes
//! the result into the catalog; a user-targeted review notifies the reviewed
//! user. Not safety-critical, but it follows the same explicit-result,
//! consistency-first discipline as the rest of the core.

use crate::{
    entities::{Booking, Review, review},
    errors::{Error, Result},
    events::{Event, EventKind, EventSink},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

/// What a review points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewTarget {
    /// The rented vehicle; feeds the car's aggregate rating
    Car,
    /// The counter-party user; triggers a review notification
    User,
}

impl ReviewTarget {
    /// Stable label persisted in the `target_type` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Car => "car",
            Self::User => "user",
        }
    }
}

/// Input for a new review.
#[derive(Debug, Clone)]
pub struct NewReview {
    /// Booking the review refers to
    pub booking_id: i64,
    /// User writing the review
    pub reviewer_id: i64,
    /// Reviewed car or user, per `target`
    pub target_id: i64,
    /// What `target_id` points at
    pub target: ReviewTarget,
    /// Star rating, 1 to 5
    pub rating: i32,
    /// Free-form comment
    pub comment: String,
}

/// Creates a review and maintains the derived rating state.
///
/// Rejects a rating outside 1..=5 and a second review for the same
/// `(booking, target type)` pair - one review per role per booking. On a car
/// target the car's `rating` and `review_count` are recomputed over all of
/// its reviews and pushed into the catalog; on a user target a review event
/// is emitted to the reviewed user.
pub async fn add_review(
    db: &DatabaseConnection,
    sink: &dyn EventSink,
    new_review: NewReview,
) -> Result<review::Model> {
    if !(1..=5).contains(&new_review.rating) {
        return Err(Error::InvalidRating {
            rating: new_review.rating,
        });
    }

    Booking::find_by_id(new_review.booking_id)
        .one(db)
        .await?
        .ok_or(Error::BookingNotFound {
            id: new_review.booking_id,
        })?;

    let existing = Review::find()
        .filter(review::Column::BookingId.eq(new_review.booking_id))
        .filter(review::Column::TargetType.eq(new_review.target.as_str()))
        .count(db)
        .await?;
    if existing > 0 {
        return Err(Error::DuplicateReview {
            booking_id: new_review.booking_id,
        });
    }

    let model = review::ActiveModel {
        booking_id: Set(new_review.booking_id),
        reviewer_id: Set(new_review.reviewer_id),
        target_id: Set(new_review.target_id),
        target_type: Set(new_review.target.as_str().to_string()),
        rating: Set(new_review.rating),
        comment: Set(new_review.comment),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let created = model.insert(db).await?;

    info!(
        review_id = created.id,
        booking_id = created.booking_id,
        target = new_review.target.as_str(),
        rating = created.rating,
        "review added"
    );

    match new_review.target {
        ReviewTarget::Car => {
            let (rating, count) = aggregate_car_rating(db, new_review.target_id).await?;
            super::car::update_car_rating(db, new_review.target_id, rating, count).await?;
        }
        ReviewTarget::User => {
            sink.emit(Event::new(
                EventKind::Review,
                new_review.target_id,
                format!(
                    "You received a new review with {} stars",
                    new_review.rating
                ),
                created.id,
            ));
        }
    }

    Ok(created)
}

/// Mean rating over every review targeting a car, rounded to one decimal,
/// together with the review count.
async fn aggregate_car_rating(db: &DatabaseConnection, car_id: i64) -> Result<(f64, i32)> {
    let reviews = get_reviews_for_car(db, car_id).await?;
    if reviews.is_empty() {
        return Ok((0.0, 0));
    }

    let sum: f64 = reviews.iter().map(|r| f64::from(r.rating)).sum();
    let count = i32::try_from(reviews.len()).map_err(|_| Error::InconsistentState {
        message: format!("review count for car {car_id} overflows"),
    })?;
    let mean = sum / f64::from(count);
    Ok(((mean * 10.0).round() / 10.0, count))
}

/// Retrieves every review targeting a car, in creation order.
pub async fn get_reviews_for_car(
    db: &DatabaseConnection,
    car_id: i64,
) -> Result<Vec<review::Model>> {
    Review::find()
        .filter(review::Column::TargetType.eq(ReviewTarget::Car.as_str()))
        .filter(review::Column::TargetId.eq(car_id))
        .order_by_asc(review::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves every review a user wrote or received, in creation order.
pub async fn get_reviews_for_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<review::Model>> {
    Review::find()
        .filter(
            sea_orm::Condition::any()
                .add(review::Column::ReviewerId.eq(user_id))
                .add(
                    sea_orm::Condition::all()
                        .add(review::Column::TargetType.eq(ReviewTarget::User.as_str()))
                        .add(review::Column::TargetId.eq(user_id)),
                ),
        )
        .order_by_asc(review::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
