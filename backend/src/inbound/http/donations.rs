//! Donation API handlers.
//!
//! Handlers parse and validate the wire format, then delegate to the
//! [`DonationCommand`] and [`DonationQuery`] ports with the caller's
//! identity. Authorization and lifecycle rules live behind the ports.
//!
//! ```text
//! POST   /api/v1/donations
//! GET    /api/v1/donations            (own)
//! GET    /api/v1/donations/all        (agents and admins)
//! GET    /api/v1/donations/assigned   (calling agent)
//! GET    /api/v1/donations/{id}
//! PATCH  /api/v1/donations/{id}
//! PATCH  /api/v1/donations/{id}/assign {"deliveryAgentId":"…"}
//! PATCH  /api/v1/donations/{id}/pickup {"signature":"sig1"}
//! PATCH  /api/v1/donations/{id}/cancel {"reason":"…"}
//! POST   /api/v1/donations/{id}/rate   {"rating":5}
//! DELETE /api/v1/donations/{id}
//! ```
//!
//! [`DonationCommand`]: crate::domain::ports::DonationCommand
//! [`DonationQuery`]: crate::domain::ports::DonationQuery

use actix_web::{HttpResponse, delete, get, patch, post, web};
use serde_json::json;

use crate::domain::Error;
use crate::domain::ports::{PickupEvidence, RatingSubmission};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerIdentity;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_donation_id, parse_optional_json_body, parse_user_id,
};

pub use super::donations_dto::{
    AssignAgentRequest, CancelRequest, CreateDonationRequest, DeletedResponse,
    DonationListResponse, DonationResponse, FoodItemResponse, HandoverResponse,
    ListDonationsQuery, PickupRequest, RateRequest, RatingResponse, UpdateDonationRequest,
};

fn missing_field(field: &'static str) -> Error {
    Error::invalid_request(format!("{field} is required"))
        .with_details(json!({ "field": field, "code": "missing_field" }))
}

/// Create a donation and its food item.
#[utoipa::path(
    post,
    path = "/api/v1/donations",
    request_body = CreateDonationRequest,
    responses(
        (status = 201, description = "Donation created", body = DonationResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Only donors may create donations", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["donations"],
    operation_id = "createDonation"
)]
#[post("/donations")]
pub async fn create_donation(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
    payload: web::Json<CreateDonationRequest>,
) -> ApiResult<HttpResponse> {
    let draft = payload.into_inner().into_draft()?;
    let view = state.donations.create(identity.into_inner(), draft).await?;
    Ok(HttpResponse::Created().json(DonationResponse::from(view)))
}

/// Donations created by the caller.
#[utoipa::path(
    get,
    path = "/api/v1/donations",
    params(ListDonationsQuery),
    responses(
        (status = 200, description = "Page of donations", body = DonationListResponse),
        (status = 400, description = "Invalid query", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["donations"],
    operation_id = "listOwnDonations"
)]
#[get("/donations")]
pub async fn list_own_donations(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
    query: web::Query<ListDonationsQuery>,
) -> ApiResult<web::Json<DonationListResponse>> {
    let request = query.into_inner().into_request()?;
    let page = state
        .donations_query
        .list_own(identity.into_inner(), request)
        .await?;
    Ok(web::Json(DonationListResponse::from(page)))
}

/// Every donation. Agents and admins only.
#[utoipa::path(
    get,
    path = "/api/v1/donations/all",
    params(ListDonationsQuery),
    responses(
        (status = 200, description = "Page of donations", body = DonationListResponse),
        (status = 400, description = "Invalid query", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["donations"],
    operation_id = "listAllDonations"
)]
#[get("/donations/all")]
pub async fn list_all_donations(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
    query: web::Query<ListDonationsQuery>,
) -> ApiResult<web::Json<DonationListResponse>> {
    let request = query.into_inner().into_request()?;
    let page = state
        .donations_query
        .list_all(identity.into_inner(), request)
        .await?;
    Ok(web::Json(DonationListResponse::from(page)))
}

/// Donations assigned to the calling agent.
#[utoipa::path(
    get,
    path = "/api/v1/donations/assigned",
    params(ListDonationsQuery),
    responses(
        (status = 200, description = "Page of donations", body = DonationListResponse),
        (status = 400, description = "Invalid query", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["donations"],
    operation_id = "listAssignedDonations"
)]
#[get("/donations/assigned")]
pub async fn list_assigned_donations(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
    query: web::Query<ListDonationsQuery>,
) -> ApiResult<web::Json<DonationListResponse>> {
    let request = query.into_inner().into_request()?;
    let page = state
        .donations_query
        .list_assigned(identity.into_inner(), request)
        .await?;
    Ok(web::Json(DonationListResponse::from(page)))
}

/// Fetch one donation.
#[utoipa::path(
    get,
    path = "/api/v1/donations/{id}",
    params(("id" = String, Path, description = "Donation identifier")),
    responses(
        (status = 200, description = "Donation", body = DonationResponse),
        (status = 400, description = "Invalid identifier", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["donations"],
    operation_id = "getDonation"
)]
#[get("/donations/{id}")]
pub async fn get_donation(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
    path: web::Path<String>,
) -> ApiResult<web::Json<DonationResponse>> {
    let id = parse_donation_id(path.into_inner())?;
    let view = state.donations_query.get(identity.into_inner(), id).await?;
    Ok(web::Json(DonationResponse::from(view)))
}

/// Apply an allow-listed patch (`status`, `notes`, `specialInstructions`).
#[utoipa::path(
    patch,
    path = "/api/v1/donations/{id}",
    params(("id" = String, Path, description = "Donation identifier")),
    request_body = UpdateDonationRequest,
    responses(
        (status = 200, description = "Updated donation", body = DonationResponse),
        (status = 400, description = "Invalid request or transition", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Concurrent modification", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["donations"],
    operation_id = "updateDonation"
)]
#[patch("/donations/{id}")]
pub async fn update_donation(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
    path: web::Path<String>,
    payload: web::Json<UpdateDonationRequest>,
) -> ApiResult<web::Json<DonationResponse>> {
    let id = parse_donation_id(path.into_inner())?;
    let patch = payload.into_inner().into_patch()?;
    let view = state
        .donations
        .update(identity.into_inner(), id, patch)
        .await?;
    Ok(web::Json(DonationResponse::from(view)))
}

/// Reserve an available donation for a delivery agent.
#[utoipa::path(
    patch,
    path = "/api/v1/donations/{id}/assign",
    params(("id" = String, Path, description = "Donation identifier")),
    request_body = AssignAgentRequest,
    responses(
        (status = 200, description = "Donation reserved", body = DonationResponse),
        (status = 400, description = "Invalid request or transition", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Concurrent modification", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["donations"],
    operation_id = "assignAgent"
)]
#[patch("/donations/{id}/assign")]
pub async fn assign_agent(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
    path: web::Path<String>,
    payload: web::Json<AssignAgentRequest>,
) -> ApiResult<web::Json<DonationResponse>> {
    let id = parse_donation_id(path.into_inner())?;
    let raw = payload
        .into_inner()
        .delivery_agent_id
        .ok_or_else(|| missing_field("deliveryAgentId"))?;
    let agent = parse_user_id(raw, FieldName::new("deliveryAgentId"))?;
    let view = state
        .donations
        .assign_agent(identity.into_inner(), id, agent)
        .await?;
    Ok(web::Json(DonationResponse::from(view)))
}

/// Record the pickup of a reserved donation by its agent.
#[utoipa::path(
    patch,
    path = "/api/v1/donations/{id}/pickup",
    params(("id" = String, Path, description = "Donation identifier")),
    request_body = PickupRequest,
    responses(
        (status = 200, description = "Donation picked up", body = DonationResponse),
        (status = 400, description = "Invalid request or transition", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Concurrent modification", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["donations"],
    operation_id = "recordPickup"
)]
#[patch("/donations/{id}/pickup")]
pub async fn record_pickup(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
    path: web::Path<String>,
    payload: web::Json<PickupRequest>,
) -> ApiResult<web::Json<DonationResponse>> {
    let id = parse_donation_id(path.into_inner())?;
    let PickupRequest { signature, photo } = payload.into_inner();
    let view = state
        .donations
        .record_pickup(
            identity.into_inner(),
            id,
            PickupEvidence { signature, photo },
        )
        .await?;
    Ok(web::Json(DonationResponse::from(view)))
}

/// Cancel an available or reserved donation.
#[utoipa::path(
    patch,
    path = "/api/v1/donations/{id}/cancel",
    params(("id" = String, Path, description = "Donation identifier")),
    request_body = CancelRequest,
    responses(
        (status = 200, description = "Donation cancelled", body = DonationResponse),
        (status = 400, description = "Invalid request or transition", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Concurrent modification", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["donations"],
    operation_id = "cancelDonation"
)]
#[patch("/donations/{id}/cancel")]
pub async fn cancel_donation(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
    path: web::Path<String>,
    body: web::Bytes,
) -> ApiResult<web::Json<DonationResponse>> {
    let id = parse_donation_id(path.into_inner())?;
    let CancelRequest { reason } = parse_optional_json_body(&body)?;
    let view = state
        .donations
        .cancel(identity.into_inner(), id, reason)
        .await?;
    Ok(web::Json(DonationResponse::from(view)))
}

/// Rate a donation.
#[utoipa::path(
    post,
    path = "/api/v1/donations/{id}/rate",
    params(("id" = String, Path, description = "Donation identifier")),
    request_body = RateRequest,
    responses(
        (status = 201, description = "Rating recorded", body = DonationResponse),
        (status = 400, description = "Invalid rating", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Concurrent modification", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["donations"],
    operation_id = "rateDonation"
)]
#[post("/donations/{id}/rate")]
pub async fn rate_donation(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
    path: web::Path<String>,
    payload: web::Json<RateRequest>,
) -> ApiResult<HttpResponse> {
    let id = parse_donation_id(path.into_inner())?;
    let RateRequest { rating, comment } = payload.into_inner();
    let score = rating.ok_or_else(|| missing_field("rating"))?;
    let view = state
        .donations
        .rate(
            identity.into_inner(),
            id,
            RatingSubmission { score, comment },
        )
        .await?;
    Ok(HttpResponse::Created().json(DonationResponse::from(view)))
}

/// Hard-delete an available donation and its food item.
#[utoipa::path(
    delete,
    path = "/api/v1/donations/{id}",
    params(("id" = String, Path, description = "Donation identifier")),
    responses(
        (status = 200, description = "Donation deleted", body = DeletedResponse),
        (status = 400, description = "Invalid identifier or donation not available", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Concurrent modification", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["donations"],
    operation_id = "deleteDonation"
)]
#[delete("/donations/{id}")]
pub async fn delete_donation(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
    path: web::Path<String>,
) -> ApiResult<web::Json<DeletedResponse>> {
    let id = parse_donation_id(path.into_inner())?;
    state.donations.delete(identity.into_inner(), id).await?;
    Ok(web::Json(DeletedResponse {
        message: "Donation deleted".to_owned(),
    }))
}

/// Register every donation route on `cfg`.
///
/// Literal segments are registered before `{id}` so `/donations/all` never
/// parses as an identifier.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(create_donation)
        .service(list_own_donations)
        .service(list_all_donations)
        .service(list_assigned_donations)
        .service(get_donation)
        .service(update_donation)
        .service(assign_agent)
        .service(record_pickup)
        .service(cancel_donation)
        .service(rate_donation)
        .service(delete_donation);
}

#[cfg(test)]
#[path = "donations_tests.rs"]
mod tests;
