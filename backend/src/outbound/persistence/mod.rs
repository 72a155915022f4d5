//! PostgreSQL persistence adapters built on Diesel.
//!
//! Repositories translate between row structs and domain types and hold no
//! business rules. Row structs (`models`) and table definitions (`schema`)
//! stay private to this module.
//!
//! ```ignore
//! use foodshare::outbound::persistence::{DbPool, DieselDonationRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/foodshare")).await?;
//! let donations = DieselDonationRepository::new(pool);
//! ```

pub(crate) mod diesel_helpers;
mod diesel_donation_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_donation_repository::DieselDonationRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DEFAULT_CHECKOUT_TIMEOUT, DEFAULT_MAX_CONNECTIONS, DbPool, PoolConfig, PoolError};
