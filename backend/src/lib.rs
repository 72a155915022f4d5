//! FoodShare backend library.
//!
//! Donation lifecycle rules and role-scoped access live in [`domain`];
//! [`inbound`] and [`outbound`] adapt them to HTTP, PostgreSQL and the
//! credential primitives.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
