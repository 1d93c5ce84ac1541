//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod availability_window;
pub mod booking;
pub mod car;
pub mod review;
pub mod transaction;
pub mod user;

// Re-export specific types to avoid conflicts
pub use availability_window::{
    Column as AvailabilityWindowColumn, Entity as AvailabilityWindow,
    Model as AvailabilityWindowModel,
};
pub use booking::{Column as BookingColumn, Entity as Booking, Model as BookingModel};
pub use car::{Column as CarColumn, Entity as Car, Model as CarModel};
pub use review::{Column as ReviewColumn, Entity as Review, Model as ReviewModel};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
