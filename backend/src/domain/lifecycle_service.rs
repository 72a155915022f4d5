//! Donation lifecycle engine.
//!
//! Implements [`DonationCommand`]. Every mutation follows the same shape:
//! re-read the donation, authorize against the stored copy, compute the next
//! state with the pure transition methods on [`Donation`], then issue one
//! conditional write guarded by the status and revision that were read. A
//! concurrent writer therefore surfaces as a conflict and never as a lost
//! update.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::access::{Action, Identity, require};
use crate::domain::food_item::optional_text;
use crate::domain::ports::{
    DonationCommand, DonationPersistenceError, DonationRepository, DonationView, ExpectedState,
    PickupEvidence, RatingSubmission, UserPersistenceError, UserRepository,
};
use crate::domain::store_call::StoreTimeout;
use crate::domain::{
    Donation, DonationDraft, DonationId, DonationPatch, DonationStatus, DonationTransitionError,
    DonationValidationError, Error, FoodItemId, HandoverProof, Rating, Role, Score, UserId,
};

/// Maps donation repository failures onto domain errors.
pub(crate) fn map_donation_error(error: DonationPersistenceError) -> Error {
    match error {
        DonationPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("donation store unavailable: {message}"))
        }
        DonationPersistenceError::Query { message } => {
            Error::internal(format!("donation store error: {message}"))
        }
        DonationPersistenceError::StaleWrite {
            id,
            expected_revision,
        } => Error::conflict("donation was changed by another request; reload and retry")
            .with_details(json!({
                "donationId": id,
                "expectedRevision": expected_revision,
                "code": "stale_write",
            })),
        DonationPersistenceError::Corrupt { message } => {
            Error::internal(format!("stored donation is corrupt: {message}"))
        }
    }
}

/// Maps user repository failures onto domain errors.
pub(crate) fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user store unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user store error: {message}"))
        }
        UserPersistenceError::DuplicateEmail { email } => {
            Error::conflict(format!("email {email} is already registered"))
                .with_details(json!({ "field": "email", "code": "duplicate_email" }))
        }
        UserPersistenceError::Missing { id } => Error::not_found(format!("user {id} not found")),
    }
}

pub(crate) fn map_validation_error(error: DonationValidationError) -> Error {
    let details = json!({ "field": error.field() });
    Error::invalid_request(error.to_string()).with_details(details)
}

fn map_transition_error(error: DonationTransitionError) -> Error {
    let details = match error {
        DonationTransitionError::RevisionExhausted => {
            return Error::conflict(error.to_string());
        }
        DonationTransitionError::NotAllowed { from, to } => {
            json!({ "status": from, "requestedStatus": to })
        }
        DonationTransitionError::Expired => json!({ "status": "available", "expired": true }),
        DonationTransitionError::Closed { status } => json!({ "status": status }),
    };
    Error::invalid_state(error.to_string()).with_details(details)
}

/// Lifecycle engine implementing [`DonationCommand`].
#[derive(Clone)]
pub struct DonationLifecycleService<D, U> {
    donations: Arc<D>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
    timeout: StoreTimeout,
}

impl<D, U> DonationLifecycleService<D, U> {
    /// Create a new service over the given stores.
    pub fn new(donations: Arc<D>, users: Arc<U>, clock: Arc<dyn Clock>, timeout: StoreTimeout) -> Self {
        Self {
            donations,
            users,
            clock,
            timeout,
        }
    }
}

impl<D, U> DonationLifecycleService<D, U>
where
    D: DonationRepository,
    U: UserRepository,
{
    fn view(&self, donation: Donation) -> DonationView {
        let expired = donation.is_expired_at(self.clock.utc());
        DonationView { donation, expired }
    }

    async fn load(&self, id: &DonationId) -> Result<Donation, Error> {
        self.timeout
            .run("load donation", self.donations.find_by_id(id), map_donation_error)
            .await?
            .ok_or_else(|| Error::not_found(format!("donation {id} not found")))
    }

    /// Persist `next` if the stored copy still matches `current`.
    async fn commit(
        &self,
        identity: &Identity,
        current: &Donation,
        next: Donation,
    ) -> Result<DonationView, Error> {
        self.timeout
            .run(
                "update donation",
                self.donations.update(&next, ExpectedState::of(current)),
                map_donation_error,
            )
            .await?;
        if current.status() != next.status() {
            info!(
                donation_id = %next.id(),
                from = %current.status(),
                to = %next.status(),
                user_id = %identity.user_id(),
                revision = next.revision(),
                "donation transitioned"
            );
        }
        Ok(self.view(next))
    }

    /// Check that an admin-chosen assignee is an active agent.
    async fn ensure_assignable(&self, agent: &UserId) -> Result<(), Error> {
        let user = self
            .timeout
            .run("load agent", self.users.find_by_id(agent), map_user_error)
            .await?;
        match user {
            Some(user) if user.role() == Role::Agent && user.is_active() => Ok(()),
            Some(user) if user.role() == Role::Agent => Err(Error::invalid_request(format!(
                "agent {agent} is not active"
            ))
            .with_details(json!({ "field": "deliveryAgentId" }))),
            Some(_) => Err(Error::invalid_request(format!("user {agent} is not an agent"))
                .with_details(json!({ "field": "deliveryAgentId" }))),
            None => Err(Error::invalid_request(format!("agent {agent} does not exist"))
                .with_details(json!({ "field": "deliveryAgentId" }))),
        }
    }
}

#[async_trait]
impl<D, U> DonationCommand for DonationLifecycleService<D, U>
where
    D: DonationRepository,
    U: UserRepository,
{
    async fn create(&self, identity: Identity, draft: DonationDraft) -> Result<DonationView, Error> {
        require(&identity, Action::CreateDonation, None)?;
        let donation = Donation::create(
            DonationId::random(),
            FoodItemId::random(),
            *identity.user_id(),
            draft,
            self.clock.utc(),
        )
        .map_err(map_validation_error)?;

        self.timeout
            .run("insert donation", self.donations.insert(&donation), map_donation_error)
            .await?;
        info!(
            donation_id = %donation.id(),
            user_id = %identity.user_id(),
            to = %DonationStatus::Available,
            "donation created"
        );
        Ok(self.view(donation))
    }

    async fn assign_agent(
        &self,
        identity: Identity,
        id: DonationId,
        agent: UserId,
    ) -> Result<DonationView, Error> {
        let current = self.load(&id).await?;
        require(&identity, Action::AssignAgent { agent }, Some(&current))?;
        if identity.is_admin() {
            self.ensure_assignable(&agent).await?;
        }
        let next = current
            .reserve(agent, self.clock.utc())
            .map_err(map_transition_error)?;
        self.commit(&identity, &current, next).await
    }

    async fn record_pickup(
        &self,
        identity: Identity,
        id: DonationId,
        evidence: PickupEvidence,
    ) -> Result<DonationView, Error> {
        let current = self.load(&id).await?;
        require(&identity, Action::RecordPickup, Some(&current))?;
        let now = self.clock.utc();
        let proof = HandoverProof::new(now, evidence.signature, evidence.photo)
            .map_err(map_validation_error)?;
        let next = current
            .record_pickup(proof, now)
            .map_err(map_transition_error)?;
        self.commit(&identity, &current, next).await
    }

    async fn cancel(
        &self,
        identity: Identity,
        id: DonationId,
        reason: Option<String>,
    ) -> Result<DonationView, Error> {
        let current = self.load(&id).await?;
        require(&identity, Action::CancelDonation, Some(&current))?;
        let reason = optional_text("reason", reason).map_err(map_validation_error)?;
        let next = current
            .cancel(reason, self.clock.utc())
            .map_err(map_transition_error)?;
        self.commit(&identity, &current, next).await
    }

    async fn rate(
        &self,
        identity: Identity,
        id: DonationId,
        rating: RatingSubmission,
    ) -> Result<DonationView, Error> {
        let current = self.load(&id).await?;
        require(&identity, Action::RateDonation, Some(&current))?;
        let now = self.clock.utc();
        let rating = Rating {
            rater: *identity.user_id(),
            score: Score::new(rating.score).map_err(map_validation_error)?,
            comment: optional_text("comment", rating.comment).map_err(map_validation_error)?,
            created_at: now,
        };
        let next = current
            .add_rating(rating, now)
            .map_err(map_transition_error)?;
        self.commit(&identity, &current, next).await
    }

    async fn update(
        &self,
        identity: Identity,
        id: DonationId,
        patch: DonationPatch,
    ) -> Result<DonationView, Error> {
        let current = self.load(&id).await?;
        require(&identity, Action::UpdateDonation, Some(&current))?;
        match current
            .apply_patch(patch, self.clock.utc())
            .map_err(map_transition_error)?
        {
            Some(next) => self.commit(&identity, &current, next).await,
            None => Ok(self.view(current)),
        }
    }

    async fn delete(&self, identity: Identity, id: DonationId) -> Result<(), Error> {
        let current = self.load(&id).await?;
        require(&identity, Action::DeleteDonation, Some(&current))?;
        if current.status() != DonationStatus::Available {
            return Err(Error::invalid_state(format!(
                "only available donations can be deleted; this one is {}",
                current.status()
            ))
            .with_details(json!({ "status": current.status() })));
        }
        self.timeout
            .run(
                "delete donation",
                self.donations.delete(&id, ExpectedState::of(&current)),
                map_donation_error,
            )
            .await?;
        info!(donation_id = %id, user_id = %identity.user_id(), "donation deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "lifecycle_service_tests.rs"]
mod tests;
