//! Role-scoped authorization policy.
//!
//! [`authorize`] is a pure function over the caller's [`Identity`], the
//! requested [`Action`] and, for donation actions, the donation as it is
//! currently stored. Lifecycle preconditions such as "must be available" are
//! not checked here; the state machine reports those as invalid state.

use crate::domain::{Donation, Error, Role, UserId};

/// Authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    user_id: UserId,
    role: Role,
}

impl Identity {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Operation a caller wants to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateDonation,
    ListOwnDonations,
    ListAllDonations,
    ListAssignedDonations,
    ViewDonation,
    AssignAgent { agent: UserId },
    RecordPickup,
    CancelDonation,
    RateDonation,
    UpdateDonation,
    DeleteDonation,
    UpdateAccount,
    UpdateOwnProfile { user: UserId },
    FindNearbyUsers,
}

impl Action {
    fn describe(&self) -> &'static str {
        match self {
            Self::CreateDonation => "create donations",
            Self::ListOwnDonations => "list your donations",
            Self::ListAllDonations => "list all donations",
            Self::ListAssignedDonations => "list assigned donations",
            Self::ViewDonation => "view this donation",
            Self::AssignAgent { .. } => "assign an agent to this donation",
            Self::RecordPickup => "record the pickup of this donation",
            Self::CancelDonation => "cancel this donation",
            Self::RateDonation => "rate this donation",
            Self::UpdateDonation => "update this donation",
            Self::DeleteDonation => "delete this donation",
            Self::UpdateAccount => "change account status",
            Self::UpdateOwnProfile { .. } => "edit this profile",
            Self::FindNearbyUsers => "search for nearby users",
        }
    }
}

/// Decide whether `identity` may perform `action` on `donation`.
///
/// Donation-scoped actions without a donation are denied.
///
/// # Examples
/// ```
/// use foodshare::domain::access::{Action, Identity, authorize};
/// use foodshare::domain::{Role, UserId};
///
/// let donor = Identity::new(UserId::random(), Role::Donor);
/// assert!(authorize(&donor, Action::CreateDonation, None));
/// assert!(!authorize(&donor, Action::ListAllDonations, None));
/// ```
pub fn authorize(identity: &Identity, action: Action, donation: Option<&Donation>) -> bool {
    let me = identity.user_id();
    let is_owner = |d: &Donation| d.donor_id() == me;
    let is_assigned = |d: &Donation| d.delivery_agent_id() == Some(me);

    match action {
        Action::CreateDonation => identity.role() == Role::Donor,
        Action::ListOwnDonations | Action::FindNearbyUsers => true,
        Action::ListAllDonations => matches!(identity.role(), Role::Agent | Role::Admin),
        Action::ListAssignedDonations => identity.role() == Role::Agent,
        Action::UpdateAccount => identity.is_admin(),
        Action::UpdateOwnProfile { user } => &user == me,
        Action::AssignAgent { agent } => {
            donation.is_some()
                && (identity.is_admin() || (identity.role() == Role::Agent && &agent == me))
        }
        Action::ViewDonation => donation.is_some_and(|d| {
            is_owner(d) || matches!(identity.role(), Role::Agent | Role::Admin)
        }),
        Action::RecordPickup => donation.is_some_and(is_assigned),
        Action::CancelDonation | Action::UpdateDonation | Action::DeleteDonation => {
            donation.is_some_and(|d| is_owner(d) || identity.is_admin())
        }
        Action::RateDonation => donation.is_some_and(|d| is_owner(d) || is_assigned(d)),
    }
}

/// [`authorize`] that reports a denial as a forbidden error.
pub fn require(identity: &Identity, action: Action, donation: Option<&Donation>) -> Result<(), Error> {
    if authorize(identity, action, donation) {
        Ok(())
    } else {
        Err(Error::forbidden(format!(
            "{} accounts may not {}",
            identity.role(),
            action.describe()
        )))
    }
}
