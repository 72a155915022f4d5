//! Driving port for donation lifecycle operations.
//!
//! Inbound adapters call [`DonationCommand`] with the authenticated
//! [`Identity`]; implementations re-read the donation, authorize, validate
//! the transition and issue one conditional write. Every method returns the
//! donation as stored after the change.

use async_trait::async_trait;

use crate::domain::access::Identity;
use crate::domain::{DonationDraft, DonationId, DonationPatch, Error, UserId};

use super::DonationView;

/// Signature and optional photo reference captured at pickup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickupEvidence {
    pub signature: Option<String>,
    pub photo: Option<String>,
}

/// Rating submission. `score` is validated by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingSubmission {
    pub score: i64,
    pub comment: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DonationCommand: Send + Sync {
    /// Create an `available` donation and its food item for a donor.
    async fn create(&self, identity: Identity, draft: DonationDraft)
    -> Result<DonationView, Error>;

    /// Reserve an available donation for `agent`.
    async fn assign_agent(
        &self,
        identity: Identity,
        id: DonationId,
        agent: UserId,
    ) -> Result<DonationView, Error>;

    /// Mark a reserved donation as donated.
    async fn record_pickup(
        &self,
        identity: Identity,
        id: DonationId,
        evidence: PickupEvidence,
    ) -> Result<DonationView, Error>;

    /// Cancel an available or reserved donation.
    async fn cancel(
        &self,
        identity: Identity,
        id: DonationId,
        reason: Option<String>,
    ) -> Result<DonationView, Error>;

    /// Append a rating.
    async fn rate(
        &self,
        identity: Identity,
        id: DonationId,
        rating: RatingSubmission,
    ) -> Result<DonationView, Error>;

    /// Apply an allow-listed patch.
    async fn update(
        &self,
        identity: Identity,
        id: DonationId,
        patch: DonationPatch,
    ) -> Result<DonationView, Error>;

    /// Hard-delete an available donation and its food item.
    async fn delete(&self, identity: Identity, id: DonationId) -> Result<(), Error>;
}
