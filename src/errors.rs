//! Unified error types for the marketplace core.
//!
//! Every expected domain failure is an explicit `Error` value surfaced to the
//! caller with a human-readable reason; nothing here is meant to be swallowed
//! silently. Infrastructure faults (database, I/O, environment) are wrapped
//! rather than re-raised as panics.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// All failure modes surfaced by the marketplace core.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Car not found: {id}")]
    CarNotFound { id: i64 },

    #[error("Booking not found: {id}")]
    BookingNotFound { id: i64 },

    #[error("User not found: {id}")]
    UserNotFound { id: i64 },

    #[error("Invalid date range: start {start} must be before end {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Car {car_id} is not available for the selected dates")]
    Unavailable { car_id: i64 },

    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: f64 },

    #[error("Insufficient funds: balance is {current}, required {required}")]
    InsufficientFunds { current: f64, required: f64 },

    #[error("Booking {booking_id} already has a completed payment")]
    AlreadyPaid { booking_id: i64 },

    #[error("A review already exists for booking {booking_id}")]
    DuplicateReview { booking_id: i64 },

    #[error("Rating must be between 1 and 5, got {rating}")]
    InvalidRating { rating: i32 },

    #[error("Illegal booking status transition: {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Inconsistent store state: {message}")]
    InconsistentState { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
