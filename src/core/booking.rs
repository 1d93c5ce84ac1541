//! Booking business logic - Handles the booking lifecycle.
//!
//! The engine is the sole writer of booking status. Creation checks
//! availability and inserts the `pending` row inside one database transaction
//! while holding the car's lock, so the insert itself is the calendar
//! reservation and two racing requests for overlapping dates produce exactly
//! one winner. Payment is deliberately not part of creation: the ledger moves
//! money in a separate caller-sequenced step, and a booking may sit in
//! `pending` with no successful payment until the caller confirms, retries,
//! or cancels.

use crate::{
    entities::{Booking, Car, User, booking, car},
    errors::{Error, Result},
    events::{Event, EventKind, EventSink},
    locks::IdLocks,
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// Lifecycle states of a booking.
///
/// `confirmed` covers the whole paid span of a rental - not yet started,
/// in progress, and awaiting completion; splitting those apart is a display
/// concern derived from the current date, not a stored state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStatus {
    /// Created, awaiting payment and owner confirmation
    Pending,
    /// Paid and agreed; the rental will or did happen
    Confirmed,
    /// The rental finished normally (terminal)
    Completed,
    /// Called off before completion (terminal)
    Cancelled,
}

impl BookingStatus {
    /// Stable label persisted in the `status` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether no further transitions are allowed from this state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// The transition table: `pending -> confirmed -> completed`, with
    /// cancellation as the escape from any non-terminal state.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed)
                | (Self::Confirmed, Self::Completed)
                | (Self::Pending | Self::Confirmed, Self::Cancelled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(Error::InconsistentState {
                message: format!("unknown booking status '{other}'"),
            }),
        }
    }
}

/// Number of billable rental days for the half-open range `[start, end)`,
/// rounding any partial day up. Zero or negative when `end <= start`.
#[must_use]
pub fn rental_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    const SECONDS_PER_DAY: i64 = 86_400;
    let seconds = (end - start).num_seconds();
    if seconds <= 0 {
        return 0;
    }
    // Ceil division for the positive case (guaranteed by the guard above).
    // Equivalent to `seconds.div_ceil(SECONDS_PER_DAY)`, which is unstable for
    // signed integers on this toolchain.
    (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
}

/// Creates a booking for a car over `[start, end)`.
///
/// Validates that the car and renter exist and that the range spans at least
/// one billable day, then re-checks availability and inserts the `pending`
/// booking row inside one database transaction under the car's lock. The
/// total price is fixed at creation: billable days times the car's current
/// daily price. Emits a booking event to the car's owner.
///
/// This operation moves no money. Payment is the caller's next step; see
/// [`crate::core::payment::process_payment`].
pub async fn create_booking(
    db: &DatabaseConnection,
    locks: &IdLocks,
    sink: &dyn EventSink,
    car_id: i64,
    renter_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<booking::Model> {
    let car = Car::find_by_id(car_id)
        .one(db)
        .await?
        .ok_or(Error::CarNotFound { id: car_id })?;

    User::find_by_id(renter_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound { id: renter_id })?;

    let days = rental_days(start, end);
    if days <= 0 {
        return Err(Error::InvalidRange { start, end });
    }

    // Serialize all calendar mutations for this car; the overlap check and
    // the reserving insert must be one indivisible step.
    let _guard = locks.acquire(car_id).await;

    let txn = db.begin().await?;

    if !super::car::is_car_available(&txn, car_id, start, end).await? {
        return Err(Error::Unavailable { car_id });
    }

    // Days are small integers; the conversion to f64 is exact.
    #[allow(clippy::cast_precision_loss)]
    let total_price = days as f64 * car.price_per_day;

    let model = booking::ActiveModel {
        car_id: Set(car_id),
        renter_id: Set(renter_id),
        start_date: Set(start),
        end_date: Set(end),
        total_price: Set(total_price),
        status: Set(BookingStatus::Pending.as_str().to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let created = model.insert(&txn).await?;
    txn.commit().await?;

    info!(
        booking_id = created.id,
        car_id,
        renter_id,
        total_price,
        "booking created"
    );

    sink.emit(Event::new(
        EventKind::Booking,
        car.owner_id,
        format!("New booking request for your {} {}", car.make, car.model),
        created.id,
    ));

    Ok(created)
}

/// Transitions a booking to a new status, enforcing the transition table.
///
/// Illegal transitions (anything out of a terminal state, skipping
/// `confirmed`, or re-entering `pending`) are rejected rather than silently
/// applied. Emits a status-change event to the renter.
pub async fn update_booking_status(
    db: &DatabaseConnection,
    sink: &dyn EventSink,
    booking_id: i64,
    new_status: BookingStatus,
) -> Result<booking::Model> {
    let found = Booking::find_by_id(booking_id)
        .one(db)
        .await?
        .ok_or(Error::BookingNotFound { id: booking_id })?;

    let current: BookingStatus = found.status.parse()?;
    if !current.can_transition_to(new_status) {
        return Err(Error::InvalidStatusTransition {
            from: current.to_string(),
            to: new_status.to_string(),
        });
    }

    let renter_id = found.renter_id;
    let mut model: booking::ActiveModel = found.into();
    model.status = Set(new_status.as_str().to_string());
    let updated = model.update(db).await?;

    info!(booking_id, status = %new_status, "booking status updated");

    sink.emit(Event::new(
        EventKind::Booking,
        renter_id,
        format!("Your booking status has been updated to: {new_status}"),
        booking_id,
    ));

    Ok(updated)
}

/// Cancels a booking, freeing its calendar slot.
///
/// Cancellation is a status transition, never a deletion; the availability
/// check ignores cancelled rows, so the exact same range becomes bookable
/// again the moment this returns. Held under the car's lock so a concurrent
/// creation sees either the live booking or the freed slot, never a torn
/// intermediate.
pub async fn cancel_booking(
    db: &DatabaseConnection,
    locks: &IdLocks,
    sink: &dyn EventSink,
    booking_id: i64,
) -> Result<booking::Model> {
    let found = Booking::find_by_id(booking_id)
        .one(db)
        .await?
        .ok_or(Error::BookingNotFound { id: booking_id })?;

    let _guard = locks.acquire(found.car_id).await;
    update_booking_status(db, sink, booking_id, BookingStatus::Cancelled).await
}

/// Retrieves a specific booking by its unique ID.
pub async fn get_booking_by_id(
    db: &DatabaseConnection,
    booking_id: i64,
) -> Result<Option<booking::Model>> {
    Booking::find_by_id(booking_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the bookings a user participates in.
///
/// With `as_renter` the user's own rentals are returned; otherwise the
/// bookings made against cars the user owns, which requires a pass through
/// the catalog's owner index.
pub async fn get_bookings_for_user(
    db: &DatabaseConnection,
    user_id: i64,
    as_renter: bool,
) -> Result<Vec<booking::Model>> {
    if as_renter {
        return Booking::find()
            .filter(booking::Column::RenterId.eq(user_id))
            .order_by_asc(booking::Column::Id)
            .all(db)
            .await
            .map_err(Into::into);
    }

    let owned_car_ids: Vec<i64> = Car::find()
        .filter(car::Column::OwnerId.eq(user_id))
        .all(db)
        .await?
        .into_iter()
        .map(|c| c.id)
        .collect();

    if owned_car_ids.is_empty() {
        return Ok(Vec::new());
    }

    Booking::find()
        .filter(booking::Column::CarId.is_in(owned_car_ids))
        .order_by_asc(booking::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
