//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the REST API. It registers:
//!
//! - **Paths**: every HTTP endpoint from the inbound layer (users, donations,
//!   health)
//! - **Schemas**: request and response DTOs plus the error wrappers
//!   ([`ErrorSchema`], [`ErrorCodeSchema`]) that describe domain errors
//!   without coupling domain types to utoipa
//! - **Security**: bearer token authentication scheme
//!
//! The generated specification is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::inbound::http::donations::{
    AssignAgentRequest, CancelRequest, CreateDonationRequest, DeletedResponse,
    DonationListResponse, DonationResponse, FoodItemResponse, HandoverResponse, PickupRequest,
    RateRequest, RatingResponse, UpdateDonationRequest,
};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::users::{
    AuthResponse, LoginRequest, NearbyUserResponse, OperatingHoursBody, RegisterRequest,
    UpdateAccountRequest, UpdateProfileRequest, UserResponse,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some(
                        "Access token issued by POST /api/v1/users/register or /users/login.",
                    ))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "FoodShare backend API",
        description = "Donation lifecycle and role-scoped access for donors, delivery agents and admins."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerAuth" = [])),
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::login,
        crate::inbound::http::users::get_profile,
        crate::inbound::http::users::update_profile,
        crate::inbound::http::users::find_nearby,
        crate::inbound::http::users::update_account,
        crate::inbound::http::donations::create_donation,
        crate::inbound::http::donations::list_own_donations,
        crate::inbound::http::donations::list_all_donations,
        crate::inbound::http::donations::list_assigned_donations,
        crate::inbound::http::donations::get_donation,
        crate::inbound::http::donations::update_donation,
        crate::inbound::http::donations::assign_agent,
        crate::inbound::http::donations::record_pickup,
        crate::inbound::http::donations::cancel_donation,
        crate::inbound::http::donations::rate_donation,
        crate::inbound::http::donations::delete_donation,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        RegisterRequest,
        LoginRequest,
        OperatingHoursBody,
        UpdateProfileRequest,
        UpdateAccountRequest,
        UserResponse,
        AuthResponse,
        NearbyUserResponse,
        CreateDonationRequest,
        UpdateDonationRequest,
        AssignAgentRequest,
        PickupRequest,
        CancelRequest,
        RateRequest,
        FoodItemResponse,
        HandoverResponse,
        RatingResponse,
        DonationResponse,
        DonationListResponse,
        DeletedResponse,
    )),
    tags(
        (name = "users", description = "Registration, login and profiles"),
        (name = "donations", description = "Donation lifecycle"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the generated OpenAPI document.

    use super::*;
    use rstest::rstest;
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    fn error_schema_has_wire_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get("Error").expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
        assert_object_schema_has_field(error_schema, "traceId");
        assert!(schemas.contains_key("ErrorCode"));
    }

    #[rstest]
    fn donation_schema_embeds_food_item() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let donation = schemas
            .get("DonationResponse")
            .expect("DonationResponse schema");

        assert_object_schema_has_field(donation, "foodItem");
        assert_object_schema_has_field(donation, "expired");
    }

    #[rstest]
    #[case("/api/v1/users/register")]
    #[case("/api/v1/users/nearby")]
    #[case("/api/v1/donations/{id}/assign")]
    #[case("/api/v1/donations/{id}/rate")]
    #[case("/health/ready")]
    fn document_lists_route(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }

    #[rstest]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("BearerAuth"));
    }
}
