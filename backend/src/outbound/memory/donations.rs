//! `DonationRepository` over a map guarded by an async lock.
//!
//! The write lock is held across the guard check and the write, which makes
//! every conditional update atomic with respect to other writers.

use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{
    DonationListing, DonationPersistenceError, DonationRepository, DonationScope, DonationSortKey,
    ExpectedState,
};
use crate::domain::{Donation, DonationId};

#[derive(Default)]
pub struct InMemoryDonationRepository {
    donations: RwLock<HashMap<DonationId, Donation>>,
}

impl InMemoryDonationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn stale(id: &DonationId, expected: ExpectedState) -> DonationPersistenceError {
    DonationPersistenceError::stale_write(id.to_string(), expected.revision)
}

fn in_scope(donation: &Donation, scope: DonationScope) -> bool {
    match scope {
        DonationScope::All => true,
        DonationScope::Donor(donor) => *donation.donor_id() == donor,
        DonationScope::Agent(agent) => donation.delivery_agent_id() == Some(&agent),
    }
}

fn compare(a: &Donation, b: &Donation, key: DonationSortKey) -> Ordering {
    let primary = match key {
        DonationSortKey::CreatedAt => a.created_at().cmp(&b.created_at()),
        DonationSortKey::UpdatedAt => a.updated_at().cmp(&b.updated_at()),
        DonationSortKey::ExpiryDate => a.food_item().expires_at.cmp(&b.food_item().expires_at),
    };
    primary.then_with(|| a.id().as_uuid().cmp(b.id().as_uuid()))
}

#[async_trait]
impl DonationRepository for InMemoryDonationRepository {
    async fn insert(&self, donation: &Donation) -> Result<(), DonationPersistenceError> {
        let mut donations = self.donations.write().await;
        if donations.contains_key(donation.id()) {
            return Err(DonationPersistenceError::query(format!(
                "donation {} already exists",
                donation.id()
            )));
        }
        donations.insert(*donation.id(), donation.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &DonationId,
    ) -> Result<Option<Donation>, DonationPersistenceError> {
        Ok(self.donations.read().await.get(id).cloned())
    }

    async fn update(
        &self,
        donation: &Donation,
        expected: ExpectedState,
    ) -> Result<(), DonationPersistenceError> {
        let mut donations = self.donations.write().await;
        match donations.get_mut(donation.id()) {
            Some(stored) if expected.matches(stored) => {
                *stored = donation.clone();
                Ok(())
            }
            _ => Err(stale(donation.id(), expected)),
        }
    }

    async fn delete(
        &self,
        id: &DonationId,
        expected: ExpectedState,
    ) -> Result<(), DonationPersistenceError> {
        let mut donations = self.donations.write().await;
        match donations.get(id) {
            Some(stored) if expected.matches(stored) => {
                donations.remove(id);
                Ok(())
            }
            _ => Err(stale(id, expected)),
        }
    }

    async fn list(
        &self,
        listing: &DonationListing,
    ) -> Result<(Vec<Donation>, u64), DonationPersistenceError> {
        let donations = self.donations.read().await;
        let mut matching: Vec<&Donation> = donations
            .values()
            .filter(|donation| in_scope(donation, listing.scope))
            .filter(|donation| listing.status.is_none_or(|status| donation.status() == status))
            .collect();
        matching.sort_by(|a, b| {
            let ordering = compare(a, b, listing.sort_key);
            if listing.order.is_ascending() {
                ordering
            } else {
                ordering.reverse()
            }
        });

        let total = matching.len() as u64;
        let offset = usize::try_from(listing.page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(listing.page.limit()).unwrap_or(usize::MAX);
        let page = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok((page, total))
    }
}
