//! Database configuration module for `DriveShare`.
//!
//! This module handles `SQLite` database connection and table creation using
//! `SeaORM`. Tables are generated straight from the entity definitions via
//! `Schema::create_table_from_entity`, so the database schema always matches
//! the Rust struct definitions without hand-written SQL. The persisted shape
//! is exactly the core's flat id-keyed collections: users, cars, availability
//! windows, bookings, transactions, and reviews.

use crate::entities::{AvailabilityWindow, Booking, Car, Review, Transaction, User};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Gets the database URL from environment variable or returns default `SQLite` path.
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data/driveshare.sqlite".to_string())
}

/// Establishes a connection to the `SQLite` database using the `DATABASE_URL`
/// environment variable, falling back to a default local file.
pub async fn create_connection() -> Result<DatabaseConnection> {
    Database::connect(get_database_url())
        .await
        .map_err(Into::into)
}

/// Creates all marketplace tables from the entity definitions.
///
/// Safe to call on every startup: each statement carries `IF NOT EXISTS`, so
/// an existing schema is left untouched.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut statements = vec![
        schema.create_table_from_entity(User),
        schema.create_table_from_entity(Car),
        schema.create_table_from_entity(AvailabilityWindow),
        schema.create_table_from_entity(Booking),
        schema.create_table_from_entity(Transaction),
        schema.create_table_from_entity(Review),
    ];

    for statement in &mut statements {
        statement.if_not_exists();
        db.execute(builder.build(&*statement)).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        availability_window::Model as AvailabilityWindowModel, booking::Model as BookingModel,
        car::Model as CarModel, review::Model as ReviewModel,
        transaction::Model as TransactionModel, user::Model as UserModel,
    };
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<UserModel> = User::find().limit(1).all(&db).await?;
        let _: Vec<CarModel> = Car::find().limit(1).all(&db).await?;
        let _: Vec<AvailabilityWindowModel> =
            AvailabilityWindow::find().limit(1).all(&db).await?;
        let _: Vec<BookingModel> = Booking::find().limit(1).all(&db).await?;
        let _: Vec<TransactionModel> = Transaction::find().limit(1).all(&db).await?;
        let _: Vec<ReviewModel> = Review::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;

        let _: Vec<CarModel> = Car::find().limit(1).all(&db).await?;
        Ok(())
    }
}
