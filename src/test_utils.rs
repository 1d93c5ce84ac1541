//! Shared test utilities for `DriveShare`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{booking, car},
    entities::{self, user},
    errors::Result,
    events::NullSink,
    locks::IdLocks,
};
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{DatabaseConnection, Set, prelude::*};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Midnight UTC on the given date; bookings in tests span whole days.
#[allow(clippy::unwrap_used)]
pub fn utc_date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// Creates a test user with a $500 starting balance.
pub async fn create_test_user(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::user::Model> {
    create_user_with_balance(db, name, 500.0).await
}

/// Creates a test user with a custom balance. The email is derived from the
/// name so repeated calls with distinct names never collide.
pub async fn create_user_with_balance(
    db: &DatabaseConnection,
    name: &str,
    balance: f64,
) -> Result<entities::user::Model> {
    let model = user::ActiveModel {
        name: Set(name.to_string()),
        email: Set(format!("{}@example.com", name.to_lowercase())),
        balance: Set(balance),
        is_car_owner: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// A valid listing spec for tests: $50/day sedan with two features.
/// Tweak individual fields to probe validation paths.
pub fn test_car_spec(owner_id: i64) -> car::NewCar {
    car::NewCar {
        owner_id,
        make: "Toyota".to_string(),
        model: "Camry".to_string(),
        year: 2020,
        car_type: "sedan".to_string(),
        seats: 5,
        color: "Silver".to_string(),
        license_plate: "TEST-123".to_string(),
        mileage: 25_000,
        price_per_day: 50.0,
        address: "123 Main St, New York, NY".to_string(),
        latitude: 40.7128,
        longitude: -74.006,
        description: "A reliable test sedan".to_string(),
        features: vec!["GPS".to_string(), "Bluetooth".to_string()],
        images: Vec::new(),
    }
}

/// Creates a test car with the default spec.
pub async fn create_test_car(
    db: &DatabaseConnection,
    owner_id: i64,
) -> Result<entities::car::Model> {
    car::create_car(db, test_car_spec(owner_id)).await
}

/// Creates a booking through the engine, with throwaway locks and a null
/// event sink. Tests asserting on lock or event behavior construct their own.
pub async fn create_test_booking(
    db: &DatabaseConnection,
    car_id: i64,
    renter_id: i64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<entities::booking::Model> {
    let locks = IdLocks::new();
    booking::create_booking(db, &locks, &NullSink, car_id, renter_id, start, end).await
}

/// Sets up a complete test environment with an owner, a renter, a $50/day
/// car, and a pending three-day booking totalling $150.
/// Returns (db, owner, renter, car, booking).
pub async fn setup_with_booking() -> Result<(
    DatabaseConnection,
    entities::user::Model,
    entities::user::Model,
    entities::car::Model,
    entities::booking::Model,
)> {
    let db = setup_test_db().await?;
    let owner = create_test_user(&db, "Owner").await?;
    let renter = create_test_user(&db, "Renter").await?;
    let car = create_test_car(&db, owner.id).await?;
    let booking = create_test_booking(
        &db,
        car.id,
        renter.id,
        utc_date(2024, 3, 1),
        utc_date(2024, 3, 4),
    )
    .await?;
    Ok((db, owner, renter, car, booking))
}
