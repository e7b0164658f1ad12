//! `PostgreSQL` adapters for the booking lifecycle engine.
//!
//! This crate implements the storage and collaborator traits of `bmp-core`
//! against `PostgreSQL` using sqlx:
//!
//! - [`PostgresBookingStore`]: bookings with a unique `booking_id` constraint,
//!   optimistic versioning and an append-only audit trail
//! - [`PostgresCatalog`]: the puja catalog
//! - [`PostgresOperatorDirectory`]: the pujari roster
//!
//! All three share one pool; [`migrate`] creates the schema.
//!
//! # Example
//!
//! ```ignore
//! use bmp_postgres::{connect, migrate, PostgresBookingStore};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = connect("postgres://localhost/bookmypujari", 10).await?;
//!     migrate(&pool).await?;
//!     let store = PostgresBookingStore::new(pool);
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bookings;
mod catalog;

pub use bookings::PostgresBookingStore;
pub use catalog::{PostgresCatalog, PostgresOperatorDirectory};

use bmp_core::StoreError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Opens a connection pool.
///
/// # Errors
///
/// Returns [`StoreError::Database`] if the database is unreachable.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, StoreError> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|e| StoreError::Database(format!("Failed to connect: {e}")))
}

/// Runs the embedded schema migrations.
///
/// # Errors
///
/// Returns [`StoreError::Database`] if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Database(format!("Migration failed: {e}")))?;
    tracing::info!("Database migrations applied");
    Ok(())
}
