//! Read side for donations.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::Page;

use crate::domain::access::{Action, Identity, require};
use crate::domain::lifecycle_service::map_donation_error;
use crate::domain::ports::{
    DonationListing, DonationQuery, DonationRepository, DonationScope, DonationView,
    ListDonationsRequest,
};
use crate::domain::store_call::StoreTimeout;
use crate::domain::{DonationId, Error};

/// Query service implementing [`DonationQuery`].
#[derive(Clone)]
pub struct DonationQueryService<D> {
    donations: Arc<D>,
    clock: Arc<dyn Clock>,
    timeout: StoreTimeout,
}

impl<D> DonationQueryService<D> {
    pub fn new(donations: Arc<D>, clock: Arc<dyn Clock>, timeout: StoreTimeout) -> Self {
        Self {
            donations,
            clock,
            timeout,
        }
    }
}

impl<D: DonationRepository> DonationQueryService<D> {
    async fn list(
        &self,
        scope: DonationScope,
        request: ListDonationsRequest,
    ) -> Result<Page<DonationView>, Error> {
        let listing = DonationListing {
            scope,
            status: request.status,
            sort_key: request.sort_key,
            order: request.order,
            page: request.page,
        };
        let (items, total) = self
            .timeout
            .run("list donations", self.donations.list(&listing), map_donation_error)
            .await?;
        let now = self.clock.utc();
        let views = items
            .into_iter()
            .map(|donation| DonationView {
                expired: donation.is_expired_at(now),
                donation,
            })
            .collect();
        Ok(Page::new(views, request.page, total))
    }
}

#[async_trait]
impl<D: DonationRepository> DonationQuery for DonationQueryService<D> {
    async fn get(&self, identity: Identity, id: DonationId) -> Result<DonationView, Error> {
        let donation = self
            .timeout
            .run("load donation", self.donations.find_by_id(&id), map_donation_error)
            .await?
            .ok_or_else(|| Error::not_found(format!("donation {id} not found")))?;
        require(&identity, Action::ViewDonation, Some(&donation))?;
        Ok(DonationView {
            expired: donation.is_expired_at(self.clock.utc()),
            donation,
        })
    }

    async fn list_own(
        &self,
        identity: Identity,
        request: ListDonationsRequest,
    ) -> Result<Page<DonationView>, Error> {
        require(&identity, Action::ListOwnDonations, None)?;
        self.list(DonationScope::Donor(*identity.user_id()), request)
            .await
    }

    async fn list_all(
        &self,
        identity: Identity,
        request: ListDonationsRequest,
    ) -> Result<Page<DonationView>, Error> {
        require(&identity, Action::ListAllDonations, None)?;
        self.list(DonationScope::All, request).await
    }

    async fn list_assigned(
        &self,
        identity: Identity,
        request: ListDonationsRequest,
    ) -> Result<Page<DonationView>, Error> {
        require(&identity, Action::ListAssignedDonations, None)?;
        self.list(DonationScope::Agent(*identity.user_id()), request)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockDonationRepository;
    use crate::domain::{
        Donation, DonationDraft, DonationStatus, ErrorCode, FoodItemDraft, FoodItemId, Role,
        UserId,
    };
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use mockable::MockClock;
    use pagination::PageRequest;
    use rstest::rstest;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 2, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn service_at(repo: MockDonationRepository, at: DateTime<Utc>) -> DonationQueryService<MockDonationRepository> {
        let mut clock = MockClock::new();
        clock.expect_utc().return_const(at);
        DonationQueryService::new(Arc::new(repo), Arc::new(clock), StoreTimeout::default())
    }

    fn donation(donor: UserId) -> Donation {
        let draft = DonationDraft {
            food: FoodItemDraft {
                name: Some("Bread".to_owned()),
                amount: Some(12.0),
                expires_at: Some(now() + Duration::hours(1)),
                ..FoodItemDraft::default()
            },
            pickup_address: Some("Bakery lane".to_owned()),
            contact_phone: Some("0201234567".to_owned()),
            ..DonationDraft::default()
        };
        Donation::create(DonationId::random(), FoodItemId::random(), donor, draft, now())
            .expect("valid donation")
    }

    #[rstest]
    #[tokio::test]
    async fn list_own_scopes_to_the_caller() {
        let donor = Identity::new(UserId::random(), Role::Donor);
        let expected_scope = DonationScope::Donor(*donor.user_id());
        let mut repo = MockDonationRepository::new();
        let item = donation(*donor.user_id());
        repo.expect_list()
            .withf(move |listing: &DonationListing| {
                listing.scope == expected_scope
                    && listing.status == Some(DonationStatus::Available)
            })
            .times(1)
            .return_once(move |_| Ok((vec![item], 21)));

        let request = ListDonationsRequest {
            status: Some(DonationStatus::Available),
            page: PageRequest::new(Some(1), Some(10)).expect("valid page"),
            ..ListDonationsRequest::default()
        };
        let page = service_at(repo, now())
            .list_own(donor, request)
            .await
            .expect("listing succeeds");
        assert_eq!(page.items().len(), 1);
        assert_eq!(page.total_items(), 21);
        assert_eq!(page.total_pages(), 3);
    }

    #[rstest]
    #[tokio::test]
    async fn donors_cannot_list_everything() {
        let mut repo = MockDonationRepository::new();
        repo.expect_list().never();
        let donor = Identity::new(UserId::random(), Role::Donor);

        let err = service_at(repo, now())
            .list_all(donor, ListDonationsRequest::default())
            .await
            .expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[tokio::test]
    async fn get_flags_expired_available_donations() {
        let donor = UserId::random();
        let item = donation(donor);
        let mut repo = MockDonationRepository::new();
        repo.expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(item)));
        let agent = Identity::new(UserId::random(), Role::Agent);

        let view = service_at(repo, now() + Duration::hours(2))
            .get(agent, DonationId::random())
            .await
            .expect("agents see donations");
        assert!(view.expired);
    }

    #[rstest]
    #[tokio::test]
    async fn other_donors_cannot_view() {
        let item = donation(UserId::random());
        let mut repo = MockDonationRepository::new();
        repo.expect_find_by_id()
            .times(1)
            .return_once(move |_| Ok(Some(item)));
        let stranger = Identity::new(UserId::random(), Role::Donor);

        let err = service_at(repo, now())
            .get(stranger, DonationId::random())
            .await
            .expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }
}
