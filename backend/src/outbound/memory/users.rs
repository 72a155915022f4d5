//! `UserRepository` over a map guarded by an async lock.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::ports::{NEARBY_RESULT_LIMIT, NearbyUser, UserPersistenceError, UserRepository};
use crate::domain::{AccountStatus, Email, GeoPoint, Role, User, UserId};

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(users: &HashMap<UserId, User>, email: &Email, except: &UserId) -> bool {
    users
        .values()
        .any(|user| user.email() == email && user.id() != except)
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut users = self.users.write().await;
        if email_taken(&users, user.email(), user.id()) {
            return Err(UserPersistenceError::duplicate_email(user.email().as_ref()));
        }
        if users.contains_key(user.id()) {
            return Err(UserPersistenceError::query(format!(
                "user {} already exists",
                user.id()
            )));
        }
        users.insert(*user.id(), user.clone());
        Ok(())
    }

    async fn update_profile(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut users = self.users.write().await;
        if email_taken(&users, user.email(), user.id()) {
            return Err(UserPersistenceError::duplicate_email(user.email().as_ref()));
        }
        let Some(slot) = users.get_mut(user.id()) else {
            return Err(UserPersistenceError::missing(user.id().to_string()));
        };
        let mut next = user.clone();
        next.keep_credentials_and_status_of(slot);
        *slot = next;
        Ok(())
    }

    async fn update_account_status(
        &self,
        id: &UserId,
        status: AccountStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), UserPersistenceError> {
        let mut users = self.users.write().await;
        let Some(slot) = users.get_mut(id) else {
            return Err(UserPersistenceError::missing(id.to_string()));
        };
        slot.set_account_status(status, updated_at);
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserPersistenceError> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.email() == email).cloned())
    }

    async fn find_near(
        &self,
        center: GeoPoint,
        radius_meters: f64,
        role: Option<Role>,
    ) -> Result<Vec<NearbyUser>, UserPersistenceError> {
        let users = self.users.read().await;
        let mut found: Vec<NearbyUser> = users
            .values()
            .filter(|user| role.is_none_or(|wanted| user.role() == wanted))
            .filter_map(|user| {
                let point = user.profile().coordinates()?;
                let distance_meters = center.distance_meters(&point);
                (distance_meters <= radius_meters).then(|| NearbyUser {
                    user: user.clone(),
                    distance_meters,
                })
            })
            .collect();
        found.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));
        found.truncate(NEARBY_RESULT_LIMIT);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AccountStatus, Location, PartnerDetails, PasswordDigest, PersonName, RoleProfile,
        UserParts,
    };
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    fn located(email: &str, role: Role, at: Option<(f64, f64)>) -> User {
        let location = at.map(|(longitude, latitude)| Location {
            address: None,
            city: None,
            state: None,
            pincode: None,
            coordinates: GeoPoint::new(longitude, latitude).expect("valid point"),
        });
        let partner = PartnerDetails {
            location,
            ..PartnerDetails::default()
        };
        let profile = match role {
            Role::Donor => RoleProfile::Donor(partner),
            Role::Agent => RoleProfile::Agent {
                partner,
                vehicle_info: None,
            },
            Role::Admin => RoleProfile::Admin,
        };
        let now = Utc
            .with_ymd_and_hms(2026, 1, 5, 10, 0, 0)
            .single()
            .expect("valid timestamp");
        User::from_parts(UserParts {
            id: UserId::random(),
            name: PersonName::new("Someone").expect("valid name"),
            email: Email::new(email).expect("valid email"),
            password_digest: PasswordDigest::new("digest"),
            phone: None,
            account_status: AccountStatus::Active,
            profile,
            created_at: now,
            updated_at: now,
        })
    }

    #[rstest]
    #[tokio::test]
    async fn duplicate_email_is_rejected_on_create_and_update() {
        let repo = InMemoryUserRepository::new();
        let first = located("a@example.org", Role::Donor, None);
        let second = located("b@example.org", Role::Donor, None);
        repo.create(&first).await.expect("first insert");
        repo.create(&second).await.expect("second insert");

        let clash = located("a@example.org", Role::Agent, None);
        let err = repo.create(&clash).await.expect_err("duplicate");
        assert_eq!(err.kind(), "duplicate_email");

        let mut renamed = second.clone();
        renamed
            .apply_profile_patch(
                crate::domain::ProfilePatch {
                    email: Some(Email::new("A@example.org").expect("valid email")),
                    ..Default::default()
                },
                second.updated_at(),
            )
            .expect("valid patch");
        let err = repo
            .update_profile(&renamed)
            .await
            .expect_err("duplicate on update");
        assert_eq!(err.kind(), "duplicate_email");
    }

    #[rstest]
    #[tokio::test]
    async fn updating_an_unknown_user_reports_missing() {
        let repo = InMemoryUserRepository::new();
        let ghost = located("ghost@example.org", Role::Agent, None);
        let err = repo.update_profile(&ghost).await.expect_err("missing");
        assert_eq!(err.kind(), "missing");
        let err = repo
            .update_account_status(ghost.id(), AccountStatus::Suspended, ghost.updated_at())
            .await
            .expect_err("missing");
        assert_eq!(err.kind(), "missing");
    }

    #[rstest]
    #[tokio::test]
    async fn profile_write_from_a_stale_read_keeps_a_later_suspension() {
        let repo = InMemoryUserRepository::new();
        let user = located("donor@example.org", Role::Donor, None);
        repo.create(&user).await.expect("insert");

        let mut stale = repo
            .find_by_id(user.id())
            .await
            .expect("lookup")
            .expect("stored user");
        repo.update_account_status(user.id(), AccountStatus::Suspended, user.updated_at())
            .await
            .expect("suspend");
        stale
            .apply_profile_patch(
                crate::domain::ProfilePatch {
                    name: Some(PersonName::new("Renamed Donor").expect("valid name")),
                    ..Default::default()
                },
                user.updated_at(),
            )
            .expect("valid patch");
        repo.update_profile(&stale).await.expect("profile write");

        let stored = repo
            .find_by_id(user.id())
            .await
            .expect("lookup")
            .expect("stored user");
        assert_eq!(stored.account_status(), AccountStatus::Suspended);
        assert_eq!(stored.name().as_ref(), "Renamed Donor");
    }

    #[rstest]
    #[tokio::test]
    async fn find_near_sorts_by_distance_and_filters_role() {
        let repo = InMemoryUserRepository::new();
        // Roughly 1.1 km and 5.5 km north of the centre.
        let near = located("near@example.org", Role::Donor, Some((0.0, 0.01)));
        let far = located("far@example.org", Role::Donor, Some((0.0, 0.05)));
        let agent = located("agent@example.org", Role::Agent, Some((0.0, 0.02)));
        let unplaced = located("nowhere@example.org", Role::Donor, None);
        for user in [&far, &near, &agent, &unplaced] {
            repo.create(user).await.expect("insert");
        }
        let centre = GeoPoint::new(0.0, 0.0).expect("valid point");

        let donors = repo
            .find_near(centre, 10_000.0, Some(Role::Donor))
            .await
            .expect("search");
        let ids: Vec<_> = donors.iter().map(|found| *found.user.id()).collect();
        assert_eq!(ids, vec![*near.id(), *far.id()]);

        let close = repo.find_near(centre, 3_000.0, None).await.expect("search");
        assert_eq!(close.len(), 2);
        assert!(close[0].distance_meters < close[1].distance_meters);
    }
}
