//! Tests for the donation lifecycle engine.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use mockable::MockClock;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{MockDonationRepository, MockUserRepository};
use crate::domain::{
    AccountStatus, DonationParts, Email, ErrorCode, FoodItemDraft, MAX_REVISION, PasswordDigest,
    PersonName, RoleProfile, User, UserParts,
};

type Service = DonationLifecycleService<MockDonationRepository, MockUserRepository>;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 7, 14, 18, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn clock() -> Arc<dyn Clock> {
    let mut clock = MockClock::new();
    clock.expect_utc().return_const(now());
    Arc::new(clock)
}

fn make_service(donations: MockDonationRepository, users: MockUserRepository) -> Service {
    DonationLifecycleService::new(
        Arc::new(donations),
        Arc::new(users),
        clock(),
        StoreTimeout::default(),
    )
}

fn draft() -> DonationDraft {
    DonationDraft {
        food: FoodItemDraft {
            name: Some("Dal and rice".to_owned()),
            amount: Some(25.0),
            expires_at: Some(now() + Duration::hours(3)),
            ..FoodItemDraft::default()
        },
        pickup_address: Some("Community hall".to_owned()),
        contact_phone: Some("+44 20 7946 0000".to_owned()),
        ..DonationDraft::default()
    }
}

fn user(role: Role, status: AccountStatus) -> User {
    User::from_parts(UserParts {
        id: UserId::random(),
        name: PersonName::new("Test User").expect("valid name"),
        email: Email::new(format!("{}@example.org", UserId::random())).expect("valid email"),
        password_digest: PasswordDigest::new("digest"),
        phone: None,
        account_status: status,
        profile: RoleProfile::empty(role),
        created_at: now(),
        updated_at: now(),
    })
}

struct Cast {
    donor: Identity,
    agent: Identity,
    other_agent: Identity,
    admin: Identity,
}

#[fixture]
fn cast() -> Cast {
    Cast {
        donor: Identity::new(UserId::random(), Role::Donor),
        agent: Identity::new(UserId::random(), Role::Agent),
        other_agent: Identity::new(UserId::random(), Role::Agent),
        admin: Identity::new(UserId::random(), Role::Admin),
    }
}

fn available_for(donor: &Identity) -> Donation {
    Donation::create(
        DonationId::random(),
        FoodItemId::random(),
        *donor.user_id(),
        draft(),
        now() - Duration::minutes(10),
    )
    .expect("valid donation")
}

fn reserved_for(donor: &Identity, agent: &Identity) -> Donation {
    available_for(donor)
        .reserve(*agent.user_id(), now())
        .expect("reserve")
}

fn repo_returning(donation: Donation) -> MockDonationRepository {
    let mut repo = MockDonationRepository::new();
    repo.expect_find_by_id()
        .times(1)
        .return_once(move |_| Ok(Some(donation)));
    repo
}

#[rstest]
#[tokio::test]
async fn create_persists_available_donation(cast: Cast) {
    let mut repo = MockDonationRepository::new();
    repo.expect_insert()
        .withf(|d: &Donation| d.status() == DonationStatus::Available && d.revision() == 1)
        .times(1)
        .return_once(|_| Ok(()));

    let view = make_service(repo, MockUserRepository::new())
        .create(cast.donor, draft())
        .await
        .expect("create succeeds");

    assert_eq!(view.donation.donor_id(), cast.donor.user_id());
    assert!(!view.expired);
}

#[rstest]
#[case::agent(Role::Agent)]
#[case::admin(Role::Admin)]
#[tokio::test]
async fn create_requires_donor(#[case] role: Role) {
    let mut repo = MockDonationRepository::new();
    repo.expect_insert().never();
    let identity = Identity::new(UserId::random(), role);

    let err = make_service(repo, MockUserRepository::new())
        .create(identity, draft())
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn create_rejects_missing_fields(cast: Cast) {
    let mut repo = MockDonationRepository::new();
    repo.expect_insert().never();
    let mut incomplete = draft();
    incomplete.food.name = None;

    let err = make_service(repo, MockUserRepository::new())
        .create(cast.donor, incomplete)
        .await
        .expect_err("invalid");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        err.details().and_then(|d| d.get("field")).and_then(|f| f.as_str()),
        Some("foodName")
    );
}

#[rstest]
#[tokio::test]
async fn agent_claims_available_donation(cast: Cast) {
    let current = available_for(&cast.donor);
    let mut repo = repo_returning(current.clone());
    repo.expect_update()
        .withf(|next: &Donation, expected: &ExpectedState| {
            next.status() == DonationStatus::Reserved
                && expected.status == DonationStatus::Available
                && expected.revision == 1
        })
        .times(1)
        .return_once(|_, _| Ok(()));

    let view = make_service(repo, MockUserRepository::new())
        .assign_agent(cast.agent, *current.id(), *cast.agent.user_id())
        .await
        .expect("claim succeeds");
    assert_eq!(view.donation.delivery_agent_id(), Some(cast.agent.user_id()));
    assert_eq!(view.donation.revision(), 2);
}

#[rstest]
#[tokio::test]
async fn agent_cannot_claim_for_someone_else(cast: Cast) {
    let current = available_for(&cast.donor);
    let mut repo = repo_returning(current.clone());
    repo.expect_update().never();

    let err = make_service(repo, MockUserRepository::new())
        .assign_agent(cast.agent, *current.id(), *cast.other_agent.user_id())
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[case::donor(Role::Donor, AccountStatus::Active)]
#[case::suspended_agent(Role::Agent, AccountStatus::Suspended)]
#[tokio::test]
async fn admin_must_pick_an_active_agent(
    cast: Cast,
    #[case] role: Role,
    #[case] status: AccountStatus,
) {
    let current = available_for(&cast.donor);
    let target = user(role, status);
    let target_id = *target.id();
    let mut repo = repo_returning(current.clone());
    repo.expect_update().never();
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .times(1)
        .return_once(move |_| Ok(Some(target)));

    let err = make_service(repo, users)
        .assign_agent(cast.admin, *current.id(), target_id)
        .await
        .expect_err("invalid assignee");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn claiming_a_reserved_donation_is_invalid_state(cast: Cast) {
    let current = reserved_for(&cast.donor, &cast.other_agent);
    let mut repo = repo_returning(current.clone());
    repo.expect_update().never();

    let err = make_service(repo, MockUserRepository::new())
        .assign_agent(cast.agent, *current.id(), *cast.agent.user_id())
        .await
        .expect_err("already reserved");
    assert_eq!(err.code(), ErrorCode::InvalidState);
}

#[rstest]
#[tokio::test]
async fn stale_write_surfaces_as_conflict(cast: Cast) {
    let current = available_for(&cast.donor);
    let id = *current.id();
    let mut repo = repo_returning(current);
    repo.expect_update().times(1).return_once(move |_, _| {
        Err(DonationPersistenceError::stale_write(id.to_string(), 1_u32))
    });

    let err = make_service(repo, MockUserRepository::new())
        .assign_agent(cast.agent, id, *cast.agent.user_id())
        .await
        .expect_err("lost the race");
    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(
        err.details().and_then(|d| d.get("code")).and_then(|c| c.as_str()),
        Some("stale_write")
    );
}

#[rstest]
#[tokio::test]
async fn missing_donation_is_not_found(cast: Cast) {
    let mut repo = MockDonationRepository::new();
    repo.expect_find_by_id().times(1).return_once(|_| Ok(None));

    let err = make_service(repo, MockUserRepository::new())
        .cancel(cast.donor, DonationId::random(), None)
        .await
        .expect_err("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn store_outage_is_service_unavailable(cast: Cast) {
    let mut repo = MockDonationRepository::new();
    repo.expect_find_by_id()
        .times(1)
        .return_once(|_| Err(DonationPersistenceError::connection("pool exhausted")));

    let err = make_service(repo, MockUserRepository::new())
        .cancel(cast.donor, DonationId::random(), None)
        .await
        .expect_err("unavailable");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn pickup_by_other_agent_is_forbidden(cast: Cast) {
    let current = reserved_for(&cast.donor, &cast.agent);
    let mut repo = repo_returning(current.clone());
    repo.expect_update().never();
    let evidence = PickupEvidence {
        signature: Some("sig".to_owned()),
        photo: None,
    };

    let err = make_service(repo, MockUserRepository::new())
        .record_pickup(cast.other_agent, *current.id(), evidence)
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn pickup_requires_signature(cast: Cast) {
    let current = reserved_for(&cast.donor, &cast.agent);
    let mut repo = repo_returning(current.clone());
    repo.expect_update().never();

    let err = make_service(repo, MockUserRepository::new())
        .record_pickup(cast.agent, *current.id(), PickupEvidence::default())
        .await
        .expect_err("signature missing");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn pickup_marks_donated(cast: Cast) {
    let current = reserved_for(&cast.donor, &cast.agent);
    let mut repo = repo_returning(current.clone());
    repo.expect_update()
        .withf(|next: &Donation, expected: &ExpectedState| {
            next.status() == DonationStatus::Donated
                && expected.status == DonationStatus::Reserved
        })
        .times(1)
        .return_once(|_, _| Ok(()));
    let evidence = PickupEvidence {
        signature: Some("sig1".to_owned()),
        photo: Some("https://cdn.example.org/p.jpg".to_owned()),
    };

    let view = make_service(repo, MockUserRepository::new())
        .record_pickup(cast.agent, *current.id(), evidence)
        .await
        .expect("pickup succeeds");
    let pickup = view.donation.state().pickup().expect("pickup recorded");
    assert_eq!(pickup.signature, "sig1");
    assert_eq!(pickup.time, now());
}

#[rstest]
#[tokio::test]
async fn cancelling_donated_is_invalid_state(cast: Cast) {
    let proof = HandoverProof::new(now(), Some("sig".to_owned()), None).expect("proof");
    let current = reserved_for(&cast.donor, &cast.agent)
        .record_pickup(proof, now())
        .expect("donated");
    let mut repo = repo_returning(current.clone());
    repo.expect_update().never();

    let err = make_service(repo, MockUserRepository::new())
        .cancel(cast.donor, *current.id(), Some("changed mind".to_owned()))
        .await
        .expect_err("terminal");
    assert_eq!(err.code(), ErrorCode::InvalidState);
}

#[rstest]
#[case(0)]
#[case(6)]
#[tokio::test]
async fn out_of_range_rating_is_rejected(cast: Cast, #[case] score: i64) {
    let current = reserved_for(&cast.donor, &cast.agent);
    let mut repo = repo_returning(current.clone());
    repo.expect_update().never();

    let err = make_service(repo, MockUserRepository::new())
        .rate(
            cast.donor,
            *current.id(),
            RatingSubmission {
                score,
                comment: None,
            },
        )
        .await
        .expect_err("out of range");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn rating_at_the_last_revision_is_a_conflict(cast: Cast) {
    let reserved = reserved_for(&cast.donor, &cast.agent);
    let current = Donation::from_parts(DonationParts {
        id: *reserved.id(),
        donor_id: *reserved.donor_id(),
        food_item: reserved.food_item().clone(),
        state: reserved.state().clone(),
        pickup_address: reserved.pickup_address().to_owned(),
        contact_phone: reserved.contact_phone().clone(),
        delivery: None,
        ratings: Vec::new(),
        notes: None,
        special_instructions: None,
        revision: MAX_REVISION,
        created_at: now(),
        updated_at: now(),
    });
    let mut repo = repo_returning(current.clone());
    repo.expect_update().never();

    let err = make_service(repo, MockUserRepository::new())
        .rate(
            cast.donor,
            *current.id(),
            RatingSubmission {
                score: 4,
                comment: None,
            },
        )
        .await
        .expect_err("revision exhausted");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn no_op_patch_skips_the_write(cast: Cast) {
    let current = available_for(&cast.donor);
    let mut repo = repo_returning(current.clone());
    repo.expect_update().never();
    let patch = DonationPatch {
        status: Some(DonationStatus::Available),
        ..DonationPatch::default()
    };

    let view = make_service(repo, MockUserRepository::new())
        .update(cast.donor, *current.id(), patch)
        .await
        .expect("no-op");
    assert_eq!(view.donation, current);
}

#[rstest]
#[tokio::test]
async fn delete_requires_available(cast: Cast) {
    let current = reserved_for(&cast.donor, &cast.agent);
    let mut repo = repo_returning(current.clone());
    repo.expect_delete().never();

    let err = make_service(repo, MockUserRepository::new())
        .delete(cast.donor, *current.id())
        .await
        .expect_err("reserved");
    assert_eq!(err.code(), ErrorCode::InvalidState);
}

#[rstest]
#[tokio::test]
async fn admin_deletes_available_donation(cast: Cast) {
    let current = available_for(&cast.donor);
    let mut repo = repo_returning(current.clone());
    repo.expect_delete()
        .withf(|_, expected: &ExpectedState| expected.revision == 1)
        .times(1)
        .return_once(|_, _| Ok(()));

    make_service(repo, MockUserRepository::new())
        .delete(cast.admin, *current.id())
        .await
        .expect("delete succeeds");
}
