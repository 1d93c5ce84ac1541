//! Seed data loading from seed.toml
//!
//! This module loads initial users and car listings from a TOML file and
//! inserts whatever is missing, so a fresh database comes up with a browsable
//! catalog. Seeding is idempotent: users are matched by email and cars by
//! license plate, and existing rows are never modified.

use crate::core::car::{NewCar, create_car};
use crate::entities::{Car, User, car, user};
use crate::errors::{Error, Result};
use chrono::Utc;
use sea_orm::{DatabaseConnection, Set, prelude::*};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Configuration structure representing the entire seed.toml file
#[derive(Debug, Deserialize)]
pub struct SeedConfig {
    /// Accounts to create on first run
    #[serde(default)]
    pub users: Vec<UserSeed>,
    /// Car listings to create on first run
    #[serde(default)]
    pub cars: Vec<CarSeed>,
}

/// Seed definition for a single user
#[derive(Debug, Deserialize, Clone)]
pub struct UserSeed {
    /// Display name
    pub name: String,
    /// Login email, used as the idempotency key
    pub email: String,
    /// Starting balance in dollars
    pub balance: f64,
    /// Whether the user lists cars
    #[serde(default)]
    pub is_car_owner: bool,
}

/// Seed definition for a single car listing
#[derive(Debug, Deserialize, Clone)]
pub struct CarSeed {
    /// Email of the owning user, resolved against the users table
    pub owner_email: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub car_type: String,
    pub seats: i32,
    pub color: String,
    /// Used as the idempotency key
    pub license_plate: String,
    pub mileage: i32,
    pub price_per_day: f64,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Loads seed configuration from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read, the TOML syntax is invalid,
/// or required fields are missing.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SeedConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read seed file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse seed.toml: {e}"),
    })
}

/// Inserts any seed users and cars not already present.
pub async fn seed_database(db: &DatabaseConnection, config: &SeedConfig) -> Result<()> {
    let mut seeded_users = 0usize;
    for user_seed in &config.users {
        let existing = User::find()
            .filter(user::Column::Email.eq(&user_seed.email))
            .one(db)
            .await?;
        if existing.is_some() {
            continue;
        }

        if user_seed.balance < 0.0 || !user_seed.balance.is_finite() {
            return Err(Error::InvalidAmount {
                amount: user_seed.balance,
            });
        }

        let model = user::ActiveModel {
            name: Set(user_seed.name.clone()),
            email: Set(user_seed.email.clone()),
            balance: Set(user_seed.balance),
            is_car_owner: Set(user_seed.is_car_owner),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        model.insert(db).await?;
        seeded_users += 1;
    }

    let mut seeded_cars = 0usize;
    for car_seed in &config.cars {
        let existing = Car::find()
            .filter(car::Column::LicensePlate.eq(&car_seed.license_plate))
            .one(db)
            .await?;
        if existing.is_some() {
            continue;
        }

        let owner = User::find()
            .filter(user::Column::Email.eq(&car_seed.owner_email))
            .one(db)
            .await?
            .ok_or_else(|| Error::Config {
                message: format!(
                    "Seed car '{}' references unknown owner '{}'",
                    car_seed.license_plate, car_seed.owner_email
                ),
            })?;

        create_car(
            db,
            NewCar {
                owner_id: owner.id,
                make: car_seed.make.clone(),
                model: car_seed.model.clone(),
                year: car_seed.year,
                car_type: car_seed.car_type.clone(),
                seats: car_seed.seats,
                color: car_seed.color.clone(),
                license_plate: car_seed.license_plate.clone(),
                mileage: car_seed.mileage,
                price_per_day: car_seed.price_per_day,
                address: car_seed.address.clone(),
                latitude: car_seed.latitude,
                longitude: car_seed.longitude,
                description: car_seed.description.clone(),
                features: car_seed.features.clone(),
                images: car_seed.images.clone(),
            },
        )
        .await?;
        seeded_cars += 1;
    }

    info!(seeded_users, seeded_cars, "seed data applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::setup_test_db;

    const SAMPLE: &str = r#"
        [[users]]
        name = "John Doe"
        email = "john@example.com"
        balance = 1200.0
        is_car_owner = true

        [[users]]
        name = "Jane Smith"
        email = "jane@example.com"
        balance = 800.0

        [[cars]]
        owner_email = "john@example.com"
        make = "Toyota"
        model = "Camry"
        year = 2020
        car_type = "sedan"
        seats = 5
        color = "Silver"
        license_plate = "ABC123"
        mileage = 25000
        price_per_day = 50.0
        address = "123 Main St, New York, NY"
        latitude = 40.7128
        longitude = -74.0060
        description = "A reliable and comfortable sedan."
        features = ["Bluetooth", "GPS", "Air Conditioning"]
    "#;

    #[test]
    fn test_parse_seed_config() {
        let config: SeedConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.users.len(), 2);
        assert_eq!(config.users[0].name, "John Doe");
        assert!(config.users[0].is_car_owner);
        assert!(!config.users[1].is_car_owner); // defaulted

        assert_eq!(config.cars.len(), 1);
        assert_eq!(config.cars[0].license_plate, "ABC123");
        assert_eq!(config.cars[0].price_per_day, 50.0);
        assert_eq!(config.cars[0].features.len(), 3);
        assert!(config.cars[0].images.is_empty()); // defaulted
    }

    #[tokio::test]
    async fn test_seed_database_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let config: SeedConfig = toml::from_str(SAMPLE).unwrap();

        seed_database(&db, &config).await?;
        seed_database(&db, &config).await?;

        assert_eq!(User::find().count(&db).await?, 2);
        assert_eq!(Car::find().count(&db).await?, 1);

        let car = Car::find().one(&db).await?.unwrap();
        assert_eq!(car.make, "Toyota");
        assert_eq!(car.feature_list().len(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_seed_database_unknown_owner() -> Result<()> {
        let db = setup_test_db().await?;
        let mut config: SeedConfig = toml::from_str(SAMPLE).unwrap();
        config.cars[0].owner_email = "nobody@example.com".to_string();

        let result = seed_database(&db, &config).await;
        assert!(matches!(result.unwrap_err(), Error::Config { message: _ }));

        Ok(())
    }
}
