//! User accounts and their role-specific profiles.
//!
//! A user's role is fixed at registration. Role-specific attributes live in
//! [`RoleProfile`], whose variant always matches the role, so donor-only or
//! agent-only data can never be attached to the wrong kind of account.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{GeoPoint, PasswordDigest};

/// Maximum length of a person or business name.
pub const NAME_MAX: usize = 120;
/// Maximum length of free-text profile fields.
pub const PROFILE_TEXT_MAX: usize = 500;

/// Validation errors raised while building users and profiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    InvalidId,
    EmptyName,
    NameTooLong { max: usize },
    InvalidEmail,
    InvalidPhone,
    InvalidClockTime { value: String },
    TextTooLong { field: &'static str, max: usize },
    InvalidRole { value: String },
    InvalidAccountStatus { value: String },
    FieldNotApplicable { field: &'static str, role: Role },
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::NameTooLong { max } => write!(f, "name must be at most {max} characters"),
            Self::InvalidEmail => write!(f, "email address is not valid"),
            Self::InvalidPhone => write!(f, "phone number is not valid"),
            Self::InvalidClockTime { value } => {
                write!(f, "time of day must use HH:MM, got {value:?}")
            }
            Self::TextTooLong { field, max } => {
                write!(f, "{field} must be at most {max} characters")
            }
            Self::InvalidRole { value } => {
                write!(f, "user type must be donor, agent or admin, got {value:?}")
            }
            Self::InvalidAccountStatus { value } => write!(
                f,
                "account status must be pending, active or suspended, got {value:?}"
            ),
            Self::FieldNotApplicable { field, role } => {
                write!(f, "{field} cannot be set on a {role} account")
            }
        }
    }
}

impl std::error::Error for UserValidationError {}

impl UserValidationError {
    /// Name of the offending input field, when one applies.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidId => Some("id"),
            Self::EmptyName | Self::NameTooLong { .. } => Some("name"),
            Self::InvalidEmail => Some("email"),
            Self::InvalidPhone => Some("phone"),
            Self::InvalidClockTime { .. } => Some("operatingHours"),
            Self::TextTooLong { field, .. } | Self::FieldNotApplicable { field, .. } => Some(field),
            Self::InvalidRole { .. } => Some("userType"),
            Self::InvalidAccountStatus { .. } => Some("accountStatus"),
        }
    }
}

/// Stable user identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Parse a [`UserId`] from its textual UUID form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Uuid::parse_str(id.as_ref())
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for UserId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for UserId {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| {
        Regex::new(pattern).unwrap_or_else(|error| panic!("pattern {pattern:?} must compile: {error}"))
    })
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static PHONE_RE: OnceLock<Regex> = OnceLock::new();
static CLOCK_RE: OnceLock<Regex> = OnceLock::new();

/// Trimmed display or business name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PersonName(String);

impl PersonName {
    pub fn new(name: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyName);
        }
        if trimmed.chars().count() > NAME_MAX {
            return Err(UserValidationError::NameTooLong { max: NAME_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for PersonName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<PersonName> for String {
    fn from(value: PersonName) -> Self {
        value.0
    }
}

impl TryFrom<String> for PersonName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Normalised e-mail address: trimmed and lower-cased.
///
/// Uniqueness is case-insensitive because the stored form is already
/// lower-cased.
///
/// # Examples
/// ```
/// use foodshare::domain::Email;
///
/// let email = Email::new("  Ada@Example.ORG ").expect("valid address");
/// assert_eq!(email.as_ref(), "ada@example.org");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = raw.as_ref().trim().to_lowercase();
        if normalised.len() > 254
            || !compiled(&EMAIL_RE, r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_match(&normalised)
        {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl TryFrom<String> for Email {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Contact phone number. Digits with optional leading `+` and common
/// separators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        let digits = trimmed.chars().filter(char::is_ascii_digit).count();
        if !(7..=15).contains(&digits)
            || !compiled(&PHONE_RE, r"^\+?[0-9][0-9 ()\-]*$").is_match(trimmed)
        {
            return Err(UserValidationError::InvalidPhone);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Phone {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<Phone> for String {
    fn from(value: Phone) -> Self {
        value.0
    }
}

impl TryFrom<String> for Phone {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Account role. Immutable once the account exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Donor,
    Agent,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Donor => "donor",
            Self::Agent => "agent",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "donor" => Ok(Self::Donor),
            "agent" => Ok(Self::Agent),
            "admin" => Ok(Self::Admin),
            other => Err(UserValidationError::InvalidRole {
                value: other.to_owned(),
            }),
        }
    }
}

/// Administrative account state. Only `active` accounts may act.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Pending,
    #[default]
    Active,
    Suspended,
}

impl AccountStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Suspended => "suspended",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = UserValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "suspended" => Ok(Self::Suspended),
            other => Err(UserValidationError::InvalidAccountStatus {
                value: other.to_owned(),
            }),
        }
    }
}

/// Time of day in 24-hour `HH:MM` form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(String);

impl ClockTime {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = raw.as_ref().trim();
        if !compiled(&CLOCK_RE, r"^([01][0-9]|2[0-3]):[0-5][0-9]$").is_match(raw) {
            return Err(UserValidationError::InvalidClockTime {
                value: raw.to_owned(),
            });
        }
        Ok(Self(raw.to_owned()))
    }
}

impl AsRef<str> for ClockTime {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.0
    }
}

impl TryFrom<String> for ClockTime {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Daily window in which a donor or agent can hand food over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OperatingHours {
    #[schema(value_type = String, example = "09:00")]
    pub start: ClockTime,
    #[schema(value_type = String, example = "21:30")]
    pub end: ClockTime,
}

/// Postal address plus the point used for proximity searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
    pub coordinates: GeoPoint,
}

/// Attributes shared by donors and agents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartnerDetails {
    pub business_name: Option<String>,
    pub operating_hours: Option<OperatingHours>,
    pub location: Option<Location>,
}

/// Role-specific profile data. The variant always matches [`User::role`].
#[derive(Debug, Clone, PartialEq)]
pub enum RoleProfile {
    Donor(PartnerDetails),
    Agent {
        partner: PartnerDetails,
        vehicle_info: Option<String>,
    },
    Admin,
}

impl RoleProfile {
    /// Empty profile for `role`.
    pub fn empty(role: Role) -> Self {
        match role {
            Role::Donor => Self::Donor(PartnerDetails::default()),
            Role::Agent => Self::Agent {
                partner: PartnerDetails::default(),
                vehicle_info: None,
            },
            Role::Admin => Self::Admin,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Self::Donor(_) => Role::Donor,
            Self::Agent { .. } => Role::Agent,
            Self::Admin => Role::Admin,
        }
    }

    pub fn partner(&self) -> Option<&PartnerDetails> {
        match self {
            Self::Donor(partner) | Self::Agent { partner, .. } => Some(partner),
            Self::Admin => None,
        }
    }

    pub fn vehicle_info(&self) -> Option<&str> {
        match self {
            Self::Agent { vehicle_info, .. } => vehicle_info.as_deref(),
            _ => None,
        }
    }

    /// Location used for proximity searches, if one was recorded.
    pub fn coordinates(&self) -> Option<GeoPoint> {
        self.partner()
            .and_then(|partner| partner.location.as_ref())
            .map(|location| location.coordinates)
    }

    /// Merge `patch` into this profile, rejecting fields the role cannot hold.
    pub fn apply(&mut self, patch: ProfilePatch) -> Result<(), UserValidationError> {
        let role = self.role();
        let ProfilePatch {
            business_name,
            operating_hours,
            location,
            vehicle_info,
            ..
        } = patch;

        if vehicle_info.is_some() && role != Role::Agent {
            return Err(UserValidationError::FieldNotApplicable {
                field: "vehicleInfo",
                role,
            });
        }
        let (partner, vehicle) = match self {
            Self::Donor(partner) => (partner, None),
            Self::Agent {
                partner,
                vehicle_info,
            } => (partner, Some(vehicle_info)),
            Self::Admin => {
                let offending = [
                    ("businessName", business_name.is_some()),
                    ("operatingHours", operating_hours.is_some()),
                    ("location", location.is_some()),
                ]
                .into_iter()
                .find_map(|(field, present)| present.then_some(field));
                return match offending {
                    Some(field) => Err(UserValidationError::FieldNotApplicable { field, role }),
                    None => Ok(()),
                };
            }
        };

        if let Some(name) = business_name {
            partner.business_name = Some(bounded_text("businessName", name, NAME_MAX)?);
        }
        if let Some(hours) = operating_hours {
            partner.operating_hours = Some(hours);
        }
        if let Some(location) = location {
            partner.location = Some(location);
        }
        if let (Some(slot), Some(info)) = (vehicle, vehicle_info) {
            *slot = Some(bounded_text("vehicleInfo", info, PROFILE_TEXT_MAX)?);
        }
        Ok(())
    }
}

/// Trim free text and enforce a maximum length.
pub fn bounded_text(
    field: &'static str,
    value: impl AsRef<str>,
    max: usize,
) -> Result<String, UserValidationError> {
    let trimmed = value.as_ref().trim();
    if trimmed.chars().count() > max {
        return Err(UserValidationError::TextTooLong { field, max });
    }
    Ok(trimmed.to_owned())
}

/// Allow-listed profile changes a user may make to their own account.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfilePatch {
    pub name: Option<PersonName>,
    pub email: Option<Email>,
    pub phone: Option<Phone>,
    pub business_name: Option<String>,
    pub operating_hours: Option<OperatingHours>,
    pub location: Option<Location>,
    pub vehicle_info: Option<String>,
}

/// Registered account.
///
/// ## Invariants
/// - `profile.role()` never changes after construction.
/// - `email` is stored normalised.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: UserId,
    name: PersonName,
    email: Email,
    password_digest: PasswordDigest,
    phone: Option<Phone>,
    account_status: AccountStatus,
    profile: RoleProfile,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Plain field bundle used to create or rehydrate a [`User`].
#[derive(Debug, Clone)]
pub struct UserParts {
    pub id: UserId,
    pub name: PersonName,
    pub email: Email,
    pub password_digest: PasswordDigest,
    pub phone: Option<Phone>,
    pub account_status: AccountStatus,
    pub profile: RoleProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn from_parts(parts: UserParts) -> Self {
        let UserParts {
            id,
            name,
            email,
            password_digest,
            phone,
            account_status,
            profile,
            created_at,
            updated_at,
        } = parts;
        Self {
            id,
            name,
            email,
            password_digest,
            phone,
            account_status,
            profile,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn name(&self) -> &PersonName {
        &self.name
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn password_digest(&self) -> &PasswordDigest {
        &self.password_digest
    }

    pub fn phone(&self) -> Option<&Phone> {
        self.phone.as_ref()
    }

    pub fn role(&self) -> Role {
        self.profile.role()
    }

    pub fn account_status(&self) -> AccountStatus {
        self.account_status
    }

    pub fn is_active(&self) -> bool {
        self.account_status == AccountStatus::Active
    }

    pub fn profile(&self) -> &RoleProfile {
        &self.profile
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Apply a self-service profile patch.
    ///
    /// The user is left untouched when any field is rejected.
    pub fn apply_profile_patch(
        &mut self,
        patch: ProfilePatch,
        now: DateTime<Utc>,
    ) -> Result<(), UserValidationError> {
        let mut profile = self.profile.clone();
        profile.apply(patch.clone())?;
        let ProfilePatch {
            name, email, phone, ..
        } = patch;
        self.profile = profile;
        if let Some(name) = name {
            self.name = name;
        }
        if let Some(email) = email {
            self.email = email;
        }
        if let Some(phone) = phone {
            self.phone = Some(phone);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Change the administrative account state.
    pub fn set_account_status(&mut self, status: AccountStatus, now: DateTime<Utc>) {
        self.account_status = status;
        self.updated_at = now;
    }

    /// Take the password digest and account status from `stored`, leaving
    /// the self-service fields as they are.
    pub fn keep_credentials_and_status_of(&mut self, stored: &User) {
        self.password_digest = stored.password_digest.clone();
        self.account_status = stored.account_status;
    }
}
