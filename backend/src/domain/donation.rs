//! Donation aggregate and its lifecycle state machine.
//!
//! Status and the data that depends on it form a single sum type,
//! [`DonationState`], so a reserved donation always has an agent and an
//! available one never does. Transitions are pure: each returns a new
//! [`Donation`] with the revision advanced, leaving persistence and
//! authorization to the caller.
//!
//! ```text
//! available ──assign──▶ reserved ──pickup──▶ donated
//!     │                    │
//!     └──────cancel────────┴──────▶ cancelled
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::food_item::{optional_text, required_text};
use crate::domain::{FoodItem, FoodItemDraft, FoodItemId, Phone, UserId};

/// Validation failures for donation input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DonationValidationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    TextTooLong { field: &'static str, max: usize },
    #[error("quantity must be greater than zero")]
    NonPositiveQuantity,
    #[error("expiry date must be in the future")]
    ExpiryNotInFuture,
    #[error("preparation time must not be in the future")]
    PreparedInFuture,
    #[error("at most {max} allergens may be listed")]
    TooManyAllergens { max: usize },
    #[error("{field} must be a non-negative number")]
    NegativeValue { field: &'static str },
    #[error("{value:?} is not a valid {field}")]
    UnknownValue { field: &'static str, value: String },
    #[error("contact phone is not valid")]
    InvalidContactPhone,
    #[error("rating must be an integer between {min} and {max}, got {score}")]
    ScoreOutOfRange { score: i64, min: u8, max: u8 },
    #[error("stored donation is inconsistent: {reason}")]
    Inconsistent { reason: String },
}

impl DonationValidationError {
    /// Input field the error refers to, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::MissingField { field }
            | Self::TextTooLong { field, .. }
            | Self::NegativeValue { field }
            | Self::UnknownValue { field, .. } => Some(field),
            Self::NonPositiveQuantity => Some("quantity"),
            Self::ExpiryNotInFuture => Some("expiryDate"),
            Self::PreparedInFuture => Some("preparedAt"),
            Self::TooManyAllergens { .. } => Some("allergenInfo"),
            Self::InvalidContactPhone => Some("contactPhone"),
            Self::ScoreOutOfRange { .. } => Some("rating"),
            Self::Inconsistent { .. } => None,
        }
    }
}

/// Rejected lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DonationTransitionError {
    #[error("cannot move a donation from {from} to {to}")]
    NotAllowed {
        from: DonationStatus,
        to: DonationStatus,
    },
    #[error("donation expired and can no longer be claimed")]
    Expired,
    #[error("notes cannot be edited once a donation is {status}")]
    Closed { status: DonationStatus },
    #[error("donation has reached its last revision and cannot change further")]
    RevisionExhausted,
}

/// Identifier of a donation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DonationId(Uuid);

impl DonationId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for DonationId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for DonationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Stored lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DonationStatus {
    Available,
    Reserved,
    Donated,
    Cancelled,
}

impl DonationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Reserved => "reserved",
            Self::Donated => "donated",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Donated | Self::Cancelled)
    }

    /// The transition table.
    ///
    /// # Examples
    /// ```
    /// use foodshare::domain::DonationStatus::*;
    ///
    /// assert!(Available.can_transition_to(Reserved));
    /// assert!(!Donated.can_transition_to(Cancelled));
    /// ```
    pub fn can_transition_to(self, next: DonationStatus) -> bool {
        matches!(
            (self, next),
            (Self::Available, Self::Reserved)
                | (Self::Reserved, Self::Donated)
                | (Self::Available | Self::Reserved, Self::Cancelled)
        )
    }

    fn ensure_transition(self, next: DonationStatus) -> Result<(), DonationTransitionError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(DonationTransitionError::NotAllowed {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DonationStatus {
    type Err = DonationValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "reserved" => Ok(Self::Reserved),
            "donated" => Ok(Self::Donated),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DonationValidationError::UnknownValue {
                field: "status",
                value: other.to_owned(),
            }),
        }
    }
}

/// Evidence captured at a hand-over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoverProof {
    pub time: DateTime<Utc>,
    pub signature: String,
    pub photo: Option<String>,
}

impl HandoverProof {
    /// Validate the signature and photo reference captured at `time`.
    pub fn new(
        time: DateTime<Utc>,
        signature: Option<String>,
        photo: Option<String>,
    ) -> Result<Self, DonationValidationError> {
        Ok(Self {
            time,
            signature: required_text("signature", signature)?,
            photo: optional_text("photo", photo)?,
        })
    }
}

/// Lifecycle state together with the data each state requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DonationState {
    Available,
    Reserved {
        agent: UserId,
    },
    Donated {
        agent: UserId,
        pickup: HandoverProof,
    },
    Cancelled {
        agent: Option<UserId>,
        reason: Option<String>,
    },
}

impl DonationState {
    pub fn status(&self) -> DonationStatus {
        match self {
            Self::Available => DonationStatus::Available,
            Self::Reserved { .. } => DonationStatus::Reserved,
            Self::Donated { .. } => DonationStatus::Donated,
            Self::Cancelled { .. } => DonationStatus::Cancelled,
        }
    }

    /// Agent currently or formerly attached to the donation.
    pub fn agent(&self) -> Option<&UserId> {
        match self {
            Self::Available => None,
            Self::Reserved { agent } | Self::Donated { agent, .. } => Some(agent),
            Self::Cancelled { agent, .. } => agent.as_ref(),
        }
    }

    pub fn pickup(&self) -> Option<&HandoverProof> {
        match self {
            Self::Donated { pickup, .. } => Some(pickup),
            _ => None,
        }
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        match self {
            Self::Cancelled { reason, .. } => reason.as_deref(),
            _ => None,
        }
    }

    /// Rebuild the state from flat stored columns, rejecting combinations
    /// the lifecycle can never produce.
    pub fn from_stored(
        status: DonationStatus,
        agent: Option<UserId>,
        pickup: Option<HandoverProof>,
        cancellation_reason: Option<String>,
    ) -> Result<Self, DonationValidationError> {
        let inconsistent = |reason: &str| DonationValidationError::Inconsistent {
            reason: reason.to_owned(),
        };
        match (status, agent, pickup) {
            (DonationStatus::Available, None, None) => Ok(Self::Available),
            (DonationStatus::Available, _, _) => {
                Err(inconsistent("available donation has an agent or pickup"))
            }
            (DonationStatus::Reserved, Some(agent), None) => Ok(Self::Reserved { agent }),
            (DonationStatus::Reserved, _, _) => {
                Err(inconsistent("reserved donation needs an agent and no pickup"))
            }
            (DonationStatus::Donated, Some(agent), Some(pickup)) => {
                Ok(Self::Donated { agent, pickup })
            }
            (DonationStatus::Donated, _, _) => {
                Err(inconsistent("donated donation needs an agent and a pickup"))
            }
            (DonationStatus::Cancelled, agent, None) => Ok(Self::Cancelled {
                agent,
                reason: cancellation_reason,
            }),
            (DonationStatus::Cancelled, _, Some(_)) => {
                Err(inconsistent("cancelled donation cannot have a pickup"))
            }
        }
    }
}

/// Rating score, an integer in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(score: i64) -> Result<Self, DonationValidationError> {
        u8::try_from(score)
            .ok()
            .filter(|value| (Self::MIN..=Self::MAX).contains(value))
            .map(Self)
            .ok_or(DonationValidationError::ScoreOutOfRange {
                score,
                min: Self::MIN,
                max: Self::MAX,
            })
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl From<Score> for u8 {
    fn from(value: Score) -> Self {
        value.0
    }
}

impl TryFrom<i64> for Score {
    type Error = DonationValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Feedback left by a donor or agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rating {
    pub rater: UserId,
    pub score: Score,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Allow-listed donation fields editable through a patch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DonationPatch {
    pub status: Option<DonationStatus>,
    pub notes: Option<String>,
    pub special_instructions: Option<String>,
}

impl DonationPatch {
    /// Trim and bound the free-text fields. Blank text counts as absent.
    pub fn new(
        status: Option<DonationStatus>,
        notes: Option<String>,
        special_instructions: Option<String>,
    ) -> Result<Self, DonationValidationError> {
        Ok(Self {
            status,
            notes: optional_text("notes", notes)?,
            special_instructions: optional_text("specialInstructions", special_instructions)?,
        })
    }
}

/// Donor-supplied input for a new donation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DonationDraft {
    pub food: FoodItemDraft,
    pub pickup_address: Option<String>,
    pub contact_phone: Option<String>,
    pub notes: Option<String>,
    pub special_instructions: Option<String>,
}

/// Flat field bundle used to rehydrate a stored [`Donation`].
#[derive(Debug, Clone, PartialEq)]
pub struct DonationParts {
    pub id: DonationId,
    pub donor_id: UserId,
    pub food_item: FoodItem,
    pub state: DonationState,
    pub pickup_address: String,
    pub contact_phone: Phone,
    pub delivery: Option<HandoverProof>,
    pub ratings: Vec<Rating>,
    pub notes: Option<String>,
    pub special_instructions: Option<String>,
    pub revision: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Highest revision a donation may reach. Revisions are stored as signed
/// 32-bit integers.
pub const MAX_REVISION: u32 = 0x7FFF_FFFF;

/// A donation and its embedded food item.
///
/// ## Invariants
/// - `revision` starts at 1 and increases by one with every change, up to
///   [`MAX_REVISION`].
/// - Status-dependent data is only reachable through [`DonationState`].
#[derive(Debug, Clone, PartialEq)]
pub struct Donation {
    id: DonationId,
    donor_id: UserId,
    food_item: FoodItem,
    state: DonationState,
    pickup_address: String,
    contact_phone: Phone,
    delivery: Option<HandoverProof>,
    ratings: Vec<Rating>,
    notes: Option<String>,
    special_instructions: Option<String>,
    revision: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Donation {
    /// Validate a donor's draft and build a fresh `available` donation.
    pub fn create(
        id: DonationId,
        food_item_id: FoodItemId,
        donor_id: UserId,
        draft: DonationDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, DonationValidationError> {
        let DonationDraft {
            food,
            pickup_address,
            contact_phone,
            notes,
            special_instructions,
        } = draft;
        let food_item = FoodItem::from_draft(food, food_item_id, now)?;
        let pickup_address = required_text("pickupAddress", pickup_address)?;
        let contact_phone = required_text("contactPhone", contact_phone)?;
        let contact_phone =
            Phone::new(contact_phone).map_err(|_| DonationValidationError::InvalidContactPhone)?;

        Ok(Self {
            id,
            donor_id,
            food_item,
            state: DonationState::Available,
            pickup_address,
            contact_phone,
            delivery: None,
            ratings: Vec::new(),
            notes: optional_text("notes", notes)?,
            special_instructions: optional_text("specialInstructions", special_instructions)?,
            revision: 1,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn from_parts(parts: DonationParts) -> Self {
        let DonationParts {
            id,
            donor_id,
            food_item,
            state,
            pickup_address,
            contact_phone,
            delivery,
            ratings,
            notes,
            special_instructions,
            revision,
            created_at,
            updated_at,
        } = parts;
        Self {
            id,
            donor_id,
            food_item,
            state,
            pickup_address,
            contact_phone,
            delivery,
            ratings,
            notes,
            special_instructions,
            revision,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &DonationId {
        &self.id
    }

    pub fn donor_id(&self) -> &UserId {
        &self.donor_id
    }

    pub fn food_item(&self) -> &FoodItem {
        &self.food_item
    }

    pub fn state(&self) -> &DonationState {
        &self.state
    }

    pub fn status(&self) -> DonationStatus {
        self.state.status()
    }

    pub fn delivery_agent_id(&self) -> Option<&UserId> {
        self.state.agent()
    }

    pub fn pickup_address(&self) -> &str {
        &self.pickup_address
    }

    pub fn contact_phone(&self) -> &Phone {
        &self.contact_phone
    }

    pub fn delivery(&self) -> Option<&HandoverProof> {
        self.delivery.as_ref()
    }

    pub fn ratings(&self) -> &[Rating] {
        &self.ratings
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn special_instructions(&self) -> Option<&str> {
        self.special_instructions.as_deref()
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether the donation is still open but its food has expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.status() == DonationStatus::Available && self.food_item.is_expired_at(now)
    }

    fn advanced(
        &self,
        state: DonationState,
        now: DateTime<Utc>,
    ) -> Result<Self, DonationTransitionError> {
        let revision = self
            .revision
            .checked_add(1)
            .filter(|next| *next <= MAX_REVISION)
            .ok_or(DonationTransitionError::RevisionExhausted)?;
        Ok(Self {
            state,
            revision,
            updated_at: now,
            ..self.clone()
        })
    }

    /// Reserve the donation for `agent`.
    pub fn reserve(&self, agent: UserId, now: DateTime<Utc>) -> Result<Self, DonationTransitionError> {
        self.status().ensure_transition(DonationStatus::Reserved)?;
        if self.is_expired_at(now) {
            return Err(DonationTransitionError::Expired);
        }
        self.advanced(DonationState::Reserved { agent }, now)
    }

    /// Record the pickup by the reserved agent.
    pub fn record_pickup(
        &self,
        proof: HandoverProof,
        now: DateTime<Utc>,
    ) -> Result<Self, DonationTransitionError> {
        self.status().ensure_transition(DonationStatus::Donated)?;
        let DonationState::Reserved { agent } = &self.state else {
            return Err(DonationTransitionError::NotAllowed {
                from: self.status(),
                to: DonationStatus::Donated,
            });
        };
        let state = DonationState::Donated {
            agent: *agent,
            pickup: proof,
        };
        self.advanced(state, now)
    }

    /// Cancel an open donation.
    pub fn cancel(
        &self,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, DonationTransitionError> {
        self.status().ensure_transition(DonationStatus::Cancelled)?;
        let state = DonationState::Cancelled {
            agent: self.state.agent().copied(),
            reason,
        };
        self.advanced(state, now)
    }

    /// Append a rating. Allowed in every state.
    pub fn add_rating(
        &self,
        rating: Rating,
        now: DateTime<Utc>,
    ) -> Result<Self, DonationTransitionError> {
        let mut next = self.advanced(self.state.clone(), now)?;
        next.ratings.push(rating);
        Ok(next)
    }

    /// Apply an allow-listed patch.
    ///
    /// Returns `Ok(None)` when the patch changes nothing. Only cancellation is
    /// reachable through `status`; reservation and pickup have dedicated
    /// operations.
    pub fn apply_patch(
        &self,
        patch: DonationPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<Self>, DonationTransitionError> {
        let DonationPatch {
            status,
            notes,
            special_instructions,
        } = patch;
        let current = self.status();
        let target = status.filter(|requested| *requested != current);
        let edits_text = notes.is_some() || special_instructions.is_some();

        if edits_text && current.is_terminal() {
            return Err(DonationTransitionError::Closed { status: current });
        }

        let mut next = match target {
            None => self.advanced(self.state.clone(), now)?,
            Some(DonationStatus::Cancelled) => self.cancel(None, now)?,
            Some(other) => {
                return Err(DonationTransitionError::NotAllowed {
                    from: current,
                    to: other,
                });
            }
        };
        let mut changed = target.is_some();
        if let Some(notes) = notes.filter(|value| Some(value.as_str()) != self.notes()) {
            next.notes = Some(notes);
            changed = true;
        }
        if let Some(text) =
            special_instructions.filter(|value| Some(value.as_str()) != self.special_instructions())
        {
            next.special_instructions = Some(text);
            changed = true;
        }
        Ok(changed.then_some(next))
    }
}
