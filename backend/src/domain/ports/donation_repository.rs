//! Port for donation persistence.
//!
//! Every mutation is a conditional write guarded by an [`ExpectedState`]:
//! the stored row must still have the status and revision the caller read.
//! Adapters report a failed guard as [`DonationPersistenceError::StaleWrite`]
//! and must never overwrite a concurrent change.

use async_trait::async_trait;
use pagination::{PageRequest, SortOrder};

use crate::domain::{Donation, DonationId, DonationStatus, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by donation repository adapters.
    pub enum DonationPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "donation repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "donation repository query failed: {message}",
        /// The conditional write found a different status or revision.
        StaleWrite { id: String, expected_revision: u32 } =>
            "donation {id} changed since revision {expected_revision}",
        /// A stored row could not be turned back into a donation.
        Corrupt { message: String } =>
            "stored donation is corrupt: {message}",
    }
}

/// Status and revision a conditional write expects to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedState {
    pub status: DonationStatus,
    pub revision: u32,
}

impl ExpectedState {
    /// Guard matching `donation` exactly as it was read.
    pub fn of(donation: &Donation) -> Self {
        Self {
            status: donation.status(),
            revision: donation.revision(),
        }
    }

    pub fn matches(&self, donation: &Donation) -> bool {
        *self == Self::of(donation)
    }
}

/// Which donations a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonationScope {
    All,
    Donor(UserId),
    Agent(UserId),
}

/// Column a listing is sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DonationSortKey {
    #[default]
    CreatedAt,
    UpdatedAt,
    ExpiryDate,
}

/// Filter, sort and page parameters for a donation listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DonationListing {
    pub scope: DonationScope,
    pub status: Option<DonationStatus>,
    pub sort_key: DonationSortKey,
    pub order: SortOrder,
    pub page: PageRequest,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DonationRepository: Send + Sync {
    /// Persist a new donation together with its food item, both or neither.
    async fn insert(&self, donation: &Donation) -> Result<(), DonationPersistenceError>;

    /// Fetch a donation and its food item.
    async fn find_by_id(&self, id: &DonationId)
    -> Result<Option<Donation>, DonationPersistenceError>;

    /// Replace the stored donation if it still matches `expected`.
    ///
    /// Ratings are append-only: adapters persist any ratings in `donation`
    /// that are not yet stored.
    async fn update(
        &self,
        donation: &Donation,
        expected: ExpectedState,
    ) -> Result<(), DonationPersistenceError>;

    /// Delete the donation and its food item if it still matches `expected`.
    async fn delete(
        &self,
        id: &DonationId,
        expected: ExpectedState,
    ) -> Result<(), DonationPersistenceError>;

    /// One page of donations plus the total count matching the filter.
    async fn list(
        &self,
        listing: &DonationListing,
    ) -> Result<(Vec<Donation>, u64), DonationPersistenceError>;
}
