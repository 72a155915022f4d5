//! Tests for the donation handlers.

use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use chrono::{DateTime, Duration, TimeZone, Utc};
use pagination::{Page, PageRequest, SortOrder};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::domain::ports::{
    DonationSortKey, DonationView, MockDonationCommand, MockDonationQuery,
};
use crate::domain::{
    Donation, DonationDraft, DonationId, DonationStatus, FoodItemDraft, FoodItemId, FoodType,
    HandoverProof, Identity, QuantityUnit, Role, UserId,
};
use crate::inbound::http::test_utils::{HttpStateBuilder, bearer};
use crate::inbound::http::validation::{json_config, path_config, query_config};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, 14, 18, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn donation(donor: &Identity) -> Donation {
    Donation::create(
        DonationId::random(),
        FoodItemId::random(),
        *donor.user_id(),
        DonationDraft {
            food: FoodItemDraft {
                name: Some("Vegetable biryani".to_owned()),
                food_type: Some(FoodType::Cooked),
                amount: Some(12.0),
                unit: Some(QuantityUnit::Servings),
                expires_at: Some(now() + Duration::hours(4)),
                ..FoodItemDraft::default()
            },
            pickup_address: Some("12 Market Road".to_owned()),
            contact_phone: Some("+91 98765 43210".to_owned()),
            ..DonationDraft::default()
        },
        now(),
    )
    .expect("valid donation")
}

fn view(donation: Donation) -> DonationView {
    DonationView {
        donation,
        expired: false,
    }
}

#[fixture]
fn donor() -> Identity {
    Identity::new(UserId::random(), Role::Donor)
}

#[fixture]
fn agent() -> Identity {
    Identity::new(UserId::random(), Role::Agent)
}

fn test_app(
    state: HttpState,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .app_data(json_config())
        .app_data(query_config())
        .app_data(path_config())
        .service(web::scope("/api/v1").configure(configure))
}

async fn send(state: HttpState, request: actix_test::TestRequest) -> (StatusCode, Value) {
    let app = actix_test::init_service(test_app(state)).await;
    let response = actix_test::call_service(&app, request.insert_header(bearer()).to_request()).await;
    let status = response.status();
    let body = actix_test::read_body(response).await;
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

#[rstest]
#[actix_web::test]
async fn create_returns_donation_with_embedded_food_item(donor: Identity) {
    let created = donation(&donor);
    let mut commands = MockDonationCommand::new();
    commands
        .expect_create()
        .withf(move |identity, draft| {
            *identity == donor
                && draft.food.food_type == Some(FoodType::Cooked)
                && draft.food.unit == Some(QuantityUnit::Servings)
                && draft.food.expires_at.is_some()
        })
        .times(1)
        .return_once(move |_, _| Ok(view(created)));
    let state = HttpStateBuilder::new()
        .donations(commands)
        .authenticated_as(donor)
        .build();

    let (status, body) = send(
        state,
        actix_test::TestRequest::post()
            .uri("/api/v1/donations")
            .set_json(json!({
                "foodName": "Vegetable biryani",
                "foodType": "cooked",
                "quantity": 12,
                "quantityUnit": "servings",
                "expiryDate": "2026-07-14T22:00:00Z",
                "pickupAddress": "12 Market Road",
                "contactPhone": "+91 98765 43210"
            })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "available");
    assert_eq!(body["expired"], false);
    assert_eq!(body["revision"], 1);
    assert_eq!(body["foodItem"]["foodName"], "Vegetable biryani");
    assert_eq!(body["foodItem"]["quantityUnit"], "servings");
    assert!(body.get("deliveryAgentId").is_none());
}

#[rstest]
#[case(json!({"foodType": "frozen"}), "foodType")]
#[case(json!({"quantityUnit": "gallons"}), "quantityUnit")]
#[case(json!({"expiryDate": "next week"}), "expiryDate")]
#[actix_web::test]
async fn create_rejects_unparseable_fields(
    donor: Identity,
    #[case] payload: Value,
    #[case] field: &str,
) {
    let state = HttpStateBuilder::new().authenticated_as(donor).build();
    let (status, body) = send(
        state,
        actix_test::TestRequest::post()
            .uri("/api/v1/donations")
            .set_json(payload),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], field);
}

#[rstest]
#[actix_web::test]
async fn list_own_uses_defaults_and_returns_envelope(donor: Identity) {
    let listed = donation(&donor);
    let mut queries = MockDonationQuery::new();
    queries
        .expect_list_own()
        .withf(|_, request| {
            request.sort_key == DonationSortKey::CreatedAt
                && request.order == SortOrder::Desc
                && request.page == PageRequest::default()
                && request.status.is_none()
        })
        .times(1)
        .return_once(move |_, request| Ok(Page::new(vec![view(listed)], request.page, 1)));
    let state = HttpStateBuilder::new()
        .donations_query(queries)
        .authenticated_as(donor)
        .build();

    let (status, body) = send(state, actix_test::TestRequest::get().uri("/api/v1/donations")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentPage"], 1);
    assert_eq!(body["totalPages"], 1);
    assert_eq!(body["totalDonations"], 1);
    assert_eq!(body["donations"].as_array().map(Vec::len), Some(1));
}

#[rstest]
#[actix_web::test]
async fn list_all_is_not_mistaken_for_an_identifier(agent: Identity) {
    let mut queries = MockDonationQuery::new();
    queries
        .expect_list_all()
        .withf(|_, request| {
            request.status == Some(DonationStatus::Available)
                && request.sort_key == DonationSortKey::ExpiryDate
                && request.order == SortOrder::Asc
                && request.page.page() == 2
                && request.page.limit() == 5
        })
        .times(1)
        .returning(|_, request| Ok(Page::new(Vec::new(), request.page, 6)));
    let state = HttpStateBuilder::new()
        .donations_query(queries)
        .authenticated_as(agent)
        .build();

    let (status, body) = send(
        state,
        actix_test::TestRequest::get().uri(
            "/api/v1/donations/all?status=available&sortBy=expiryDate&sortOrder=asc&page=2&limit=5",
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["currentPage"], 2);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["totalDonations"], 6);
}

#[rstest]
#[case("/api/v1/donations/assigned?limit=0", "limit")]
#[case("/api/v1/donations/assigned?page=0", "page")]
#[case("/api/v1/donations/assigned?sortBy=name", "sortBy")]
#[actix_web::test]
async fn listing_rejects_bad_paging(agent: Identity, #[case] uri: &str, #[case] field: &str) {
    let state = HttpStateBuilder::new().authenticated_as(agent).build();
    let (status, body) = send(state, actix_test::TestRequest::get().uri(uri)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], field);
}

#[rstest]
#[actix_web::test]
async fn non_numeric_page_is_an_invalid_query(agent: Identity) {
    let state = HttpStateBuilder::new().authenticated_as(agent).build();
    let (status, body) = send(
        state,
        actix_test::TestRequest::get().uri("/api/v1/donations/assigned?page=first"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["code"], "invalid_query");
}

#[rstest]
#[actix_web::test]
async fn get_rejects_malformed_identifier(donor: Identity) {
    let state = HttpStateBuilder::new().authenticated_as(donor).build();
    let (status, body) = send(
        state,
        actix_test::TestRequest::get().uri("/api/v1/donations/not-a-uuid"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "id");
    assert_eq!(body["details"]["code"], "invalid_uuid");
}

#[rstest]
#[actix_web::test]
async fn assign_forwards_the_agent(donor: Identity, agent: Identity) {
    let reserved = donation(&donor)
        .reserve(*agent.user_id(), now())
        .expect("available donation");
    let id = *reserved.id();
    let agent_id = *agent.user_id();
    let mut commands = MockDonationCommand::new();
    commands
        .expect_assign_agent()
        .withf(move |_, donation_id, target| *donation_id == id && *target == agent_id)
        .times(1)
        .return_once(move |_, _, _| Ok(view(reserved)));
    let state = HttpStateBuilder::new()
        .donations(commands)
        .authenticated_as(agent)
        .build();

    let (status, body) = send(
        state,
        actix_test::TestRequest::patch()
            .uri(&format!("/api/v1/donations/{id}/assign"))
            .set_json(json!({"deliveryAgentId": agent_id.to_string()})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "reserved");
    assert_eq!(body["deliveryAgentId"], agent_id.to_string());
}

#[rstest]
#[case(json!({}), "missing_field")]
#[case(json!({"deliveryAgentId": "agent-b"}), "invalid_uuid")]
#[actix_web::test]
async fn assign_requires_a_valid_agent_id(
    agent: Identity,
    #[case] payload: Value,
    #[case] code: &str,
) {
    let state = HttpStateBuilder::new().authenticated_as(agent).build();
    let id = DonationId::random();
    let (status, body) = send(
        state,
        actix_test::TestRequest::patch()
            .uri(&format!("/api/v1/donations/{id}/assign"))
            .set_json(payload),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "deliveryAgentId");
    assert_eq!(body["details"]["code"], code);
}

#[rstest]
#[actix_web::test]
async fn pickup_forwards_signature_and_reports_proof(donor: Identity, agent: Identity) {
    let donated = donation(&donor)
        .reserve(*agent.user_id(), now())
        .and_then(|reserved| {
            reserved.record_pickup(
                HandoverProof::new(now(), Some("sig1".to_owned()), None).expect("valid proof"),
                now(),
            )
        })
        .expect("reserved donation");
    let id = *donated.id();
    let mut commands = MockDonationCommand::new();
    commands
        .expect_record_pickup()
        .withf(|_, _, evidence| {
            evidence.signature.as_deref() == Some("sig1") && evidence.photo.is_none()
        })
        .times(1)
        .return_once(move |_, _, _| Ok(view(donated)));
    let state = HttpStateBuilder::new()
        .donations(commands)
        .authenticated_as(agent)
        .build();

    let (status, body) = send(
        state,
        actix_test::TestRequest::patch()
            .uri(&format!("/api/v1/donations/{id}/pickup"))
            .set_json(json!({"signature": "sig1"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "donated");
    assert_eq!(body["actualPickup"]["signature"], "sig1");
}

#[rstest]
#[case(Error::invalid_state("cannot move a donation from donated to cancelled"), StatusCode::BAD_REQUEST, "invalid_state")]
#[case(Error::conflict("donation was modified concurrently"), StatusCode::CONFLICT, "conflict")]
#[case(Error::forbidden("not allowed"), StatusCode::FORBIDDEN, "forbidden")]
#[case(Error::not_found("donation not found"), StatusCode::NOT_FOUND, "not_found")]
#[case(Error::service_unavailable("store timed out"), StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")]
#[actix_web::test]
async fn cancel_maps_service_errors(
    donor: Identity,
    #[case] error: Error,
    #[case] expected: StatusCode,
    #[case] code: &str,
) {
    let mut commands = MockDonationCommand::new();
    commands
        .expect_cancel()
        .withf(|_, _, reason| reason.as_deref() == Some("no longer needed"))
        .times(1)
        .return_once(move |_, _, _| Err(error));
    let state = HttpStateBuilder::new()
        .donations(commands)
        .authenticated_as(donor)
        .build();
    let id = DonationId::random();

    let (status, body) = send(
        state,
        actix_test::TestRequest::patch()
            .uri(&format!("/api/v1/donations/{id}/cancel"))
            .set_json(json!({"reason": "no longer needed"})),
    )
    .await;

    assert_eq!(status, expected);
    assert_eq!(body["code"], code);
}

#[rstest]
#[actix_web::test]
async fn cancel_accepts_an_empty_body(donor: Identity) {
    let cancelled = donation(&donor).cancel(None, now()).expect("available donation");
    let id = *cancelled.id();
    let mut commands = MockDonationCommand::new();
    commands
        .expect_cancel()
        .withf(|_, _, reason| reason.is_none())
        .times(1)
        .return_once(move |_, _, _| Ok(view(cancelled)));
    let state = HttpStateBuilder::new()
        .donations(commands)
        .authenticated_as(donor)
        .build();

    let (status, body) = send(
        state,
        actix_test::TestRequest::patch().uri(&format!("/api/v1/donations/{id}/cancel")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");
}

#[rstest]
#[case(r#"{"reasn":"typo field","reason":42}"#)]
#[case(r#"{"reasn":"x"}"#)]
#[case(r#"{"reason":"#)]
#[actix_web::test]
async fn cancel_rejects_malformed_bodies_without_cancelling(donor: Identity, #[case] payload: &str) {
    let mut commands = MockDonationCommand::new();
    commands.expect_cancel().times(0);
    let state = HttpStateBuilder::new()
        .donations(commands)
        .authenticated_as(donor)
        .build();
    let id = DonationId::random();

    let (status, body) = send(
        state,
        actix_test::TestRequest::patch()
            .uri(&format!("/api/v1/donations/{id}/cancel"))
            .insert_header(("Content-Type", "application/json"))
            .set_payload(payload.to_owned()),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["code"], "malformed_json");
}

#[rstest]
#[actix_web::test]
async fn rate_returns_created(donor: Identity) {
    let stored = donation(&donor);
    let id = *stored.id();
    let mut commands = MockDonationCommand::new();
    commands
        .expect_rate()
        .withf(|_, _, rating| rating.score == 5 && rating.comment.as_deref() == Some("fresh"))
        .times(1)
        .return_once(move |_, _, _| Ok(view(stored)));
    let state = HttpStateBuilder::new()
        .donations(commands)
        .authenticated_as(donor)
        .build();

    let (status, _) = send(
        state,
        actix_test::TestRequest::post()
            .uri(&format!("/api/v1/donations/{id}/rate"))
            .set_json(json!({"rating": 5, "comment": "fresh"})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
}

#[rstest]
#[actix_web::test]
async fn rate_requires_a_score(donor: Identity) {
    let state = HttpStateBuilder::new().authenticated_as(donor).build();
    let id = DonationId::random();
    let (status, body) = send(
        state,
        actix_test::TestRequest::post()
            .uri(&format!("/api/v1/donations/{id}/rate"))
            .set_json(json!({"comment": "no score"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "rating");
}

#[rstest]
#[actix_web::test]
async fn patch_rejects_fields_outside_the_allow_list(donor: Identity) {
    let state = HttpStateBuilder::new().authenticated_as(donor).build();
    let id = DonationId::random();
    let (status, body) = send(
        state,
        actix_test::TestRequest::patch()
            .uri(&format!("/api/v1/donations/{id}"))
            .set_json(json!({"deliveryAgentId": UserId::random().to_string()})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_request");
}

#[rstest]
#[actix_web::test]
async fn delete_confirms_with_a_message(donor: Identity) {
    let id = DonationId::random();
    let mut commands = MockDonationCommand::new();
    commands
        .expect_delete()
        .withf(move |_, donation_id| *donation_id == id)
        .times(1)
        .returning(|_, _| Ok(()));
    let state = HttpStateBuilder::new()
        .donations(commands)
        .authenticated_as(donor)
        .build();

    let (status, body) = send(
        state,
        actix_test::TestRequest::delete().uri(&format!("/api/v1/donations/{id}")),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Donation deleted");
}
