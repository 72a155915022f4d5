//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driving ports (`*Command`, `*Query`, [`Authenticator`]) are called by
//! inbound adapters. Driven ports (repositories, [`PasswordHasher`],
//! [`TokenCodec`]) are implemented by outbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod account_command;
mod account_query;
mod authenticator;
mod donation_command;
mod donation_query;
mod donation_repository;
mod password_hasher;
mod token_codec;
mod user_repository;

#[cfg(test)]
pub use account_command::MockAccountCommand;
pub use account_command::{AccountCommand, AuthSession};
#[cfg(test)]
pub use account_query::MockAccountQuery;
pub use account_query::{
    AccountQuery, DEFAULT_NEARBY_RADIUS_METERS, MAX_NEARBY_RADIUS_METERS, NearbySearch,
};
pub use authenticator::Authenticator;
#[cfg(test)]
pub use authenticator::MockAuthenticator;
pub use donation_command::{DonationCommand, PickupEvidence, RatingSubmission};
#[cfg(test)]
pub use donation_command::MockDonationCommand;
pub use donation_query::{DonationQuery, DonationView, ListDonationsRequest};
#[cfg(test)]
pub use donation_query::MockDonationQuery;
pub use donation_repository::{
    DonationListing, DonationPersistenceError, DonationRepository, DonationScope, DonationSortKey,
    ExpectedState,
};
#[cfg(test)]
pub use donation_repository::MockDonationRepository;
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use token_codec::MockTokenCodec;
pub use token_codec::{TokenCodec, TokenCodecError};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{NEARBY_RESULT_LIMIT, NearbyUser, UserPersistenceError, UserRepository};
