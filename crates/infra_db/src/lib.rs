//! Infrastructure Database Layer
//!
//! This crate provides the database infrastructure for the trip and
//! payment system on PostgreSQL using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: each repository owns the SQL
//! for one aggregate and maps between rows and domain types. Money moves
//! inside explicit transactions with row locks taken in a deterministic
//! order, so two concurrent transfers touching the same accounts serialize
//! instead of deadlocking.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, DatabaseConfig, TripsRepository};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/ridepay")).await?;
//! let trips = TripsRepository::new(pool);
//! ```

pub mod error;
pub mod pool;
pub mod repositories;

pub use error::{DatabaseError, ServiceError};
pub use pool::{create_pool, create_pool_from_url, DatabaseConfig, DatabasePool};
pub use repositories::{
    IdempotencyRecord, IdempotencyRepository, LedgerRepository, PaymentsRepository,
    TripsRepository,
};

/// Applies all pending migrations
pub async fn run_migrations(pool: &DatabasePool) -> Result<(), DatabaseError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
}
