//! Startup harness for the `DriveShare` marketplace core.
//!
//! Brings up tracing, loads environment and seed configuration, initializes
//! the `SQLite` store, and applies seed data. Interactive surfaces (screens,
//! messaging, notification delivery) live outside this crate and drive the
//! library directly.

use driveshare::config;
use driveshare::errors::Result;
use dotenvy::dotenv;
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (as early as possible)
    dotenv().ok(); // Non-fatal, env vars can be set externally
    info!("Attempted to load .env file.");

    // 3. Initialize database
    let db = config::database::create_connection()
        .await
        .inspect(|_| info!("Database connection established."))
        .inspect_err(|e| warn!("Failed to connect to database: {e}"))?;
    config::database::create_tables(&db).await?;
    info!("Database schema ready.");

    // 4. Apply seed data when a seed file is present
    let seed_path = env::var("SEED_CONFIG").unwrap_or_else(|_| "seed.toml".to_string());
    if std::path::Path::new(&seed_path).exists() {
        let seed = config::seed::load_config(&seed_path)?;
        config::seed::seed_database(&db, &seed).await?;
    } else {
        info!(%seed_path, "No seed file found, skipping seeding.");
    }

    let cars = driveshare::core::car::get_all_cars(&db).await?;
    info!(listed_cars = cars.len(), "Marketplace core ready.");

    Ok(())
}
