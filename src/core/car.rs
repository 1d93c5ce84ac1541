//! Catalog business logic - Handles all car-listing operations.
//!
//! This module owns the set of car listings and answers every availability and
//! search question against them. Availability combines three signals: the
//! owner's coarse `is_available` override, overlap against existing
//! non-cancelled bookings (always authoritative, half-open interval
//! semantics), and an optional allowlist of availability windows that only
//! constrains when non-empty. All functions are async and return Result types
//! for error handling.

use crate::{
    entities::{AvailabilityWindow, Booking, Car, availability_window, booking, car},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::info;

/// Required fields for a new car listing.
///
/// Replaces builder-style construction with a single validated constructor:
/// the caller fills the struct and [`create_car`] rejects anything invalid.
#[derive(Debug, Clone)]
pub struct NewCar {
    /// User who owns the listing
    pub owner_id: i64,
    /// Manufacturer
    pub make: String,
    /// Model name
    pub model: String,
    /// Model year
    pub year: i32,
    /// Body style
    pub car_type: String,
    /// Number of seats
    pub seats: i32,
    /// Exterior color
    pub color: String,
    /// License plate
    pub license_plate: String,
    /// Odometer reading in miles
    pub mileage: i32,
    /// Rental price per day in dollars
    pub price_per_day: f64,
    /// Street address of the pickup location
    pub address: String,
    /// Pickup latitude
    pub latitude: f64,
    /// Pickup longitude
    pub longitude: f64,
    /// Free-form listing description
    pub description: String,
    /// Feature labels
    pub features: Vec<String>,
    /// Image references
    pub images: Vec<String>,
}

/// Optional fields for a partial listing update.
#[derive(Debug, Clone, Default)]
pub struct CarUpdate {
    /// New daily price
    pub price_per_day: Option<f64>,
    /// New description
    pub description: Option<String>,
    /// New feature labels
    pub features: Option<Vec<String>>,
    /// New image references
    pub images: Option<Vec<String>>,
    /// New coarse availability override
    pub is_available: Option<bool>,
}

/// Search predicates applied to the catalog.
///
/// Every field is optional; an empty filter returns the whole catalog in
/// insertion order. Filtering is pure and never re-sorts the collection.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct SearchFilters {
    /// Substring match against the pickup address, case-insensitive
    pub location: Option<String>,
    /// Exact body-style match
    pub car_type: Option<String>,
    /// Minimum seat count
    pub seats: Option<i32>,
    /// Inclusive lower price bound
    pub price_min: Option<f64>,
    /// Inclusive upper price bound
    pub price_max: Option<f64>,
    /// Features the car must all carry
    #[serde(default)]
    pub features: Vec<String>,
    /// Start of a required availability range
    pub start_date: Option<DateTime<Utc>>,
    /// End of a required availability range
    pub end_date: Option<DateTime<Utc>>,
}

/// Creates a new car listing, performing input validation.
///
/// Rejects empty make/model/license plate, a seat count below one, negative
/// mileage, and a non-positive or non-finite daily price. The listing starts
/// unreviewed (rating 0.0, zero reviews), available, and with an empty
/// allowlist, meaning any unbooked dates are open.
pub async fn create_car(db: &DatabaseConnection, new_car: NewCar) -> Result<car::Model> {
    if new_car.make.trim().is_empty() || new_car.model.trim().is_empty() {
        return Err(Error::Config {
            message: "Car make and model cannot be empty".to_string(),
        });
    }

    if new_car.license_plate.trim().is_empty() {
        return Err(Error::Config {
            message: "License plate cannot be empty".to_string(),
        });
    }

    if new_car.seats < 1 {
        return Err(Error::Config {
            message: format!("Seat count must be at least 1, got {}", new_car.seats),
        });
    }

    if new_car.mileage < 0 {
        return Err(Error::Config {
            message: format!("Mileage cannot be negative, got {}", new_car.mileage),
        });
    }

    if new_car.price_per_day <= 0.0 || !new_car.price_per_day.is_finite() {
        return Err(Error::InvalidAmount {
            amount: new_car.price_per_day,
        });
    }

    let model = car::ActiveModel {
        owner_id: Set(new_car.owner_id),
        make: Set(new_car.make.trim().to_string()),
        model: Set(new_car.model.trim().to_string()),
        year: Set(new_car.year),
        car_type: Set(new_car.car_type),
        seats: Set(new_car.seats),
        color: Set(new_car.color),
        license_plate: Set(new_car.license_plate.trim().to_string()),
        mileage: Set(new_car.mileage),
        price_per_day: Set(new_car.price_per_day),
        description: Set(new_car.description),
        features: Set(car::encode_string_list(&new_car.features)),
        images: Set(car::encode_string_list(&new_car.images)),
        address: Set(new_car.address),
        latitude: Set(new_car.latitude),
        longitude: Set(new_car.longitude),
        rating: Set(0.0),
        review_count: Set(0),
        is_available: Set(true),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    let created = model.insert(db).await?;
    info!(car_id = created.id, owner_id = created.owner_id, "car listed");
    Ok(created)
}

/// Applies a partial update to an existing listing.
pub async fn update_car(
    db: &DatabaseConnection,
    car_id: i64,
    update: CarUpdate,
) -> Result<car::Model> {
    let mut model: car::ActiveModel = Car::find_by_id(car_id)
        .one(db)
        .await?
        .ok_or(Error::CarNotFound { id: car_id })?
        .into();

    if let Some(price) = update.price_per_day {
        if price <= 0.0 || !price.is_finite() {
            return Err(Error::InvalidAmount { amount: price });
        }
        model.price_per_day = Set(price);
    }
    if let Some(description) = update.description {
        model.description = Set(description);
    }
    if let Some(features) = update.features {
        model.features = Set(car::encode_string_list(&features));
    }
    if let Some(images) = update.images {
        model.images = Set(car::encode_string_list(&images));
    }
    if let Some(flag) = update.is_available {
        model.is_available = Set(flag);
    }

    model.update(db).await.map_err(Into::into)
}

/// Retrieves a specific car by its unique ID.
pub async fn get_car_by_id(db: &DatabaseConnection, car_id: i64) -> Result<Option<car::Model>> {
    Car::find_by_id(car_id).one(db).await.map_err(Into::into)
}

/// Retrieves all cars in insertion order.
pub async fn get_all_cars(db: &DatabaseConnection) -> Result<Vec<car::Model>> {
    Car::find()
        .order_by_asc(car::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves the cars owned by one user, in insertion order.
pub async fn get_cars_by_owner(db: &DatabaseConnection, owner_id: i64) -> Result<Vec<car::Model>> {
    Car::find()
        .filter(car::Column::OwnerId.eq(owner_id))
        .order_by_asc(car::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Answers whether a car can be rented for the half-open range
/// `[start, end)`.
///
/// An unknown car is an error, not "unavailable" - callers must be able to
/// tell the two apart. `Ok(false)` covers: an inverted or empty range, the
/// owner's coarse override being off, an overlap with any non-cancelled
/// booking, or a non-empty allowlist with no window fully containing the
/// request. A car with no windows is open for any unbooked dates.
///
/// Generic over the connection so the booking engine can re-check inside the
/// same database transaction that inserts the booking row.
pub async fn is_car_available<C>(
    db: &C,
    car_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    let car = Car::find_by_id(car_id)
        .one(db)
        .await?
        .ok_or(Error::CarNotFound { id: car_id })?;

    if start >= end {
        return Ok(false);
    }

    if !car.is_available {
        return Ok(false);
    }

    // Half-open overlap: [start, end) collides with [b.start, b.end) iff
    // start < b.end && end > b.start. Cancelled bookings free their slot.
    let conflicts = Booking::find()
        .filter(booking::Column::CarId.eq(car_id))
        .filter(booking::Column::Status.ne(super::booking::BookingStatus::Cancelled.as_str()))
        .filter(booking::Column::StartDate.lt(end))
        .filter(booking::Column::EndDate.gt(start))
        .count(db)
        .await?;

    if conflicts > 0 {
        return Ok(false);
    }

    let windows = AvailabilityWindow::find()
        .filter(availability_window::Column::CarId.eq(car_id))
        .all(db)
        .await?;

    if windows.is_empty() {
        return Ok(true);
    }

    Ok(windows
        .iter()
        .any(|w| w.start_date <= start && end <= w.end_date))
}

/// Replaces a car's availability allowlist.
///
/// Passing an empty list clears the allowlist, reopening the car for any
/// unbooked dates. Each window must have `start < end`.
pub async fn set_availability_windows(
    db: &DatabaseConnection,
    car_id: i64,
    windows: Vec<(DateTime<Utc>, DateTime<Utc>)>,
) -> Result<()> {
    Car::find_by_id(car_id)
        .one(db)
        .await?
        .ok_or(Error::CarNotFound { id: car_id })?;

    for &(start, end) in &windows {
        if start >= end {
            return Err(Error::InvalidRange { start, end });
        }
    }

    let txn = db.begin().await?;

    AvailabilityWindow::delete_many()
        .filter(availability_window::Column::CarId.eq(car_id))
        .exec(&txn)
        .await?;

    for (start, end) in windows {
        let window = availability_window::ActiveModel {
            car_id: Set(car_id),
            start_date: Set(start),
            end_date: Set(end),
            ..Default::default()
        };
        window.insert(&txn).await?;
    }

    txn.commit().await?;
    Ok(())
}

/// Toggles the owner's coarse availability override.
pub async fn set_car_available(db: &DatabaseConnection, car_id: i64, flag: bool) -> Result<()> {
    let mut model: car::ActiveModel = Car::find_by_id(car_id)
        .one(db)
        .await?
        .ok_or(Error::CarNotFound { id: car_id })?
        .into();

    model.is_available = Set(flag);
    model.update(db).await?;
    Ok(())
}

/// Filters the catalog against a set of search predicates.
///
/// Filtering preserves the catalog's insertion order and applies no implicit
/// sort. The optional date-range predicate re-uses [`is_car_available`] per
/// candidate, so a searched range reflects exactly what a booking attempt
/// would see.
pub async fn search_cars(
    db: &DatabaseConnection,
    filters: &SearchFilters,
) -> Result<Vec<car::Model>> {
    let cars = get_all_cars(db).await?;
    let mut matches = Vec::new();

    for car in cars {
        if let Some(location) = &filters.location {
            if !car
                .address
                .to_lowercase()
                .contains(&location.to_lowercase())
            {
                continue;
            }
        }

        if let Some(car_type) = &filters.car_type {
            if car.car_type != *car_type {
                continue;
            }
        }

        if let Some(seats) = filters.seats {
            if car.seats < seats {
                continue;
            }
        }

        if let Some(min) = filters.price_min {
            if car.price_per_day < min {
                continue;
            }
        }

        if let Some(max) = filters.price_max {
            if car.price_per_day > max {
                continue;
            }
        }

        if !filters.features.is_empty() {
            let available = car.feature_list();
            if !filters.features.iter().all(|f| available.contains(f)) {
                continue;
            }
        }

        if let (Some(start), Some(end)) = (filters.start_date, filters.end_date) {
            if !is_car_available(db, car.id, start, end).await? {
                continue;
            }
        }

        matches.push(car);
    }

    Ok(matches)
}

/// Overwrites a car's derived rating fields.
///
/// Called by the review aggregator after recomputing the mean; the catalog
/// itself never derives these values.
pub async fn update_car_rating(
    db: &DatabaseConnection,
    car_id: i64,
    rating: f64,
    review_count: i32,
) -> Result<car::Model> {
    let mut model: car::ActiveModel = Car::find_by_id(car_id)
        .one(db)
        .await?
        .ok_or(Error::CarNotFound { id: car_id })?
        .into();

    model.rating = Set(rating);
    model.review_count = Set(review_count);
    model.update(db).await.map_err(Into::into)
}
