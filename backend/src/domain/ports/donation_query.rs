//! Driving port for reading donations.

use async_trait::async_trait;
use pagination::{Page, PageRequest, SortOrder};

use crate::domain::access::Identity;
use crate::domain::{Donation, DonationId, DonationStatus, Error};

use super::DonationSortKey;

/// Donation as presented to callers, with the read-time expiry flag.
#[derive(Debug, Clone, PartialEq)]
pub struct DonationView {
    pub donation: Donation,
    pub expired: bool,
}

/// Listing options shared by every listing operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListDonationsRequest {
    pub status: Option<DonationStatus>,
    pub sort_key: DonationSortKey,
    pub order: SortOrder,
    pub page: PageRequest,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DonationQuery: Send + Sync {
    /// Fetch one donation visible to the caller.
    async fn get(&self, identity: Identity, id: DonationId) -> Result<DonationView, Error>;

    /// Donations created by the caller.
    async fn list_own(
        &self,
        identity: Identity,
        request: ListDonationsRequest,
    ) -> Result<Page<DonationView>, Error>;

    /// Every donation; agents and admins only.
    async fn list_all(
        &self,
        identity: Identity,
        request: ListDonationsRequest,
    ) -> Result<Page<DonationView>, Error>;

    /// Donations assigned to the calling agent.
    async fn list_assigned(
        &self,
        identity: Identity,
        request: ListDonationsRequest,
    ) -> Result<Page<DonationView>, Error>;
}
