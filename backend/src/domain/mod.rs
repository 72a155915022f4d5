//! Domain primitives, aggregates and services.
//!
//! Purpose: Define strongly typed domain entities used by the API and
//! persistence layers, the donation lifecycle rules that govern them, and the
//! services that drive those rules through the ports in [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - User (alias to `user::User`): registered account with a role profile.
//! - Donation (alias to `donation::Donation`): donation aggregate and its
//!   state machine.
//! - DonationLifecycleService, DonationQueryService, AccountService,
//!   TokenAuthenticator: implementations of the driving ports.

pub mod access;
mod account_service;
pub mod auth;
mod authentication_service;
pub mod donation;
mod donation_query_service;
pub mod error;
pub mod food_item;
pub mod geo;
mod lifecycle_service;
pub mod ports;
pub mod store_call;
pub mod trace_id;
pub mod user;

pub use self::access::{Action, Identity, authorize, require};
pub use self::account_service::{AccountPolicy, AccountService};
pub(crate) use self::account_service::map_user_validation_error;
pub use self::auth::{
    CredentialValidationError, IssuedToken, LoginCredentials, PASSWORD_MIN_CHARS, Password,
    PasswordDigest, Registration, TokenClaims,
};
pub use self::authentication_service::TokenAuthenticator;
pub use self::donation::{
    Donation, DonationDraft, DonationId, DonationParts, DonationPatch, DonationState,
    DonationStatus, DonationTransitionError, DonationValidationError, HandoverProof,
    MAX_REVISION, Rating, Score,
};
pub use self::donation_query_service::DonationQueryService;
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::food_item::{
    ALLERGENS_MAX, FOOD_TEXT_MAX, FoodItem, FoodItemDraft, FoodItemId, FoodType, NutritionFacts,
    Quantity, QuantityUnit,
};
pub use self::geo::{GeoPoint, GeoPointError};
pub use self::lifecycle_service::DonationLifecycleService;
pub(crate) use self::lifecycle_service::map_validation_error as map_donation_validation_error;
pub use self::store_call::{DEFAULT_STORE_TIMEOUT, StoreTimeout};
pub use self::trace_id::TraceId;
pub use self::user::{
    AccountStatus, ClockTime, Email, Location, NAME_MAX, OperatingHours, PROFILE_TEXT_MAX,
    PartnerDetails, PersonName, Phone, ProfilePatch, Role, RoleProfile, User, UserId, UserParts,
    UserValidationError, bounded_text,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use foodshare::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
