/// Catalog store - car listings, availability checks, and search
pub mod car;

/// Booking engine - booking lifecycle and status state machine
pub mod booking;

/// Ledger service - balance transfers, transactions, cached reads
pub mod payment;

/// Review aggregator - per-booking reviews and car rating rollups
pub mod review;
