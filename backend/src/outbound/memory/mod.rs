//! In-process store adapters.
//!
//! Used when no database URL is configured and by integration tests. They
//! honour the same contracts as the Diesel adapters: unique e-mail addresses,
//! conditional donation writes and append-only ratings.

mod donations;
mod users;

pub use donations::InMemoryDonationRepository;
pub use users::InMemoryUserRepository;
