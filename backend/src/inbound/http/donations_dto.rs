//! Request and response payloads for the donation handlers.
//!
//! Requests carry raw strings for identifiers, timestamps and enumerations so
//! failures can name the offending field. Responses are built from
//! [`DonationView`] and always embed the food item.

use chrono::{DateTime, Utc};
use pagination::{Page, SortOrder};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{DonationSortKey, DonationView, ListDonationsRequest};
use crate::domain::{
    Donation, DonationDraft, DonationPatch, DonationStatus, Error, FoodItem, FoodItemDraft,
    FoodType, HandoverProof, NutritionFacts, QuantityUnit, Rating, map_donation_validation_error,
};
use crate::inbound::http::validation::{
    FieldName, invalid_value_error, parse_optional_enum, parse_optional_rfc3339_timestamp,
    parse_page_request,
};

const FOOD_TYPES: &[&str] = &["cooked", "packaged", "produce", "dairy", "grains", "other"];
const QUANTITY_UNITS: &[&str] = &["kg", "items", "servings", "liters"];
const STATUSES: &[&str] = &["available", "reserved", "donated", "cancelled"];
const SORT_KEYS: &[&str] = &["createdAt", "updatedAt", "expiryDate"];
const SORT_ORDERS: &[&str] = &["asc", "desc"];

/// Body of `POST /api/v1/donations`. The food item fields sit at the top level.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateDonationRequest {
    #[schema(example = "Vegetable biryani")]
    pub food_name: Option<String>,
    #[schema(example = "cooked")]
    pub food_type: Option<String>,
    #[schema(example = 12.0)]
    pub quantity: Option<f64>,
    #[schema(example = "servings")]
    pub quantity_unit: Option<String>,
    #[schema(example = "2026-05-10T18:00:00Z")]
    pub expiry_date: Option<String>,
    pub prepared_at: Option<String>,
    #[serde(default)]
    pub allergen_info: Vec<String>,
    pub nutritional_info: Option<NutritionFacts>,
    pub storage_instructions: Option<String>,
    pub packaging_details: Option<String>,
    pub pickup_address: Option<String>,
    pub contact_phone: Option<String>,
    pub notes: Option<String>,
    pub special_instructions: Option<String>,
}

impl CreateDonationRequest {
    /// Parse enumerations and timestamps into a draft; content rules are the
    /// lifecycle service's job.
    pub(crate) fn into_draft(self) -> Result<DonationDraft, Error> {
        let food_type =
            parse_optional_enum::<FoodType>(self.food_type, FieldName::new("foodType"), FOOD_TYPES)?;
        let unit = parse_optional_enum::<QuantityUnit>(
            self.quantity_unit,
            FieldName::new("quantityUnit"),
            QUANTITY_UNITS,
        )?;
        let expires_at =
            parse_optional_rfc3339_timestamp(self.expiry_date, FieldName::new("expiryDate"))?;
        let prepared_at =
            parse_optional_rfc3339_timestamp(self.prepared_at, FieldName::new("preparedAt"))?;
        Ok(DonationDraft {
            food: FoodItemDraft {
                name: self.food_name,
                food_type,
                amount: self.quantity,
                unit,
                expires_at,
                prepared_at,
                allergens: self.allergen_info,
                nutrition: self.nutritional_info,
                storage_instructions: self.storage_instructions,
                packaging_details: self.packaging_details,
            },
            pickup_address: self.pickup_address,
            contact_phone: self.contact_phone,
            notes: self.notes,
            special_instructions: self.special_instructions,
        })
    }
}

/// Body of `PATCH /api/v1/donations/{id}`. Only these fields may change.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateDonationRequest {
    #[schema(example = "cancelled")]
    pub status: Option<String>,
    pub notes: Option<String>,
    pub special_instructions: Option<String>,
}

impl UpdateDonationRequest {
    pub(crate) fn into_patch(self) -> Result<DonationPatch, Error> {
        let status =
            parse_optional_enum::<DonationStatus>(self.status, FieldName::new("status"), STATUSES)?;
        DonationPatch::new(status, self.notes, self.special_instructions)
            .map_err(map_donation_validation_error)
    }
}

/// Body of `PATCH /api/v1/donations/{id}/assign`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AssignAgentRequest {
    #[schema(format = Uuid)]
    pub delivery_agent_id: Option<String>,
}

/// Body of `PATCH /api/v1/donations/{id}/pickup`.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PickupRequest {
    #[schema(example = "sig1")]
    pub signature: Option<String>,
    /// Reference to an uploaded photo.
    pub photo: Option<String>,
}

/// Body of `PATCH /api/v1/donations/{id}/cancel`.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

/// Body of `POST /api/v1/donations/{id}/rate`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RateRequest {
    #[schema(example = 5, minimum = 1, maximum = 5)]
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

/// Query string shared by the listing endpoints.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListDonationsQuery {
    /// One-based page number; defaults to 1.
    pub page: Option<u32>,
    /// Page size between 1 and 100; defaults to 10.
    pub limit: Option<u32>,
    /// Restrict to one status.
    pub status: Option<String>,
    /// `createdAt`, `updatedAt` or `expiryDate`; defaults to `createdAt`.
    pub sort_by: Option<String>,
    /// `asc` or `desc`; defaults to `desc`.
    pub sort_order: Option<String>,
}

fn parse_sort_key(value: Option<String>) -> Result<DonationSortKey, Error> {
    let field = FieldName::new("sortBy");
    match value.as_deref().map(str::trim) {
        None | Some("createdAt") => Ok(DonationSortKey::CreatedAt),
        Some("updatedAt") => Ok(DonationSortKey::UpdatedAt),
        Some("expiryDate") => Ok(DonationSortKey::ExpiryDate),
        Some(other) => Err(invalid_value_error(field, other, SORT_KEYS)),
    }
}

fn parse_sort_order(value: Option<String>) -> Result<SortOrder, Error> {
    match value.as_deref().map(str::trim) {
        None => Ok(SortOrder::default()),
        Some(raw) if raw.eq_ignore_ascii_case("asc") => Ok(SortOrder::Asc),
        Some(raw) if raw.eq_ignore_ascii_case("desc") => Ok(SortOrder::Desc),
        Some(other) => Err(invalid_value_error(
            FieldName::new("sortOrder"),
            other,
            SORT_ORDERS,
        )),
    }
}

impl ListDonationsQuery {
    pub(crate) fn into_request(self) -> Result<ListDonationsRequest, Error> {
        Ok(ListDonationsRequest {
            status: parse_optional_enum::<DonationStatus>(
                self.status,
                FieldName::new("status"),
                STATUSES,
            )?,
            sort_key: parse_sort_key(self.sort_by)?,
            order: parse_sort_order(self.sort_order)?,
            page: parse_page_request(self.page, self.limit)?,
        })
    }
}

/// Food item embedded in every donation response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FoodItemResponse {
    #[schema(format = Uuid)]
    pub id: String,
    pub food_name: String,
    pub food_type: FoodType,
    pub quantity: f64,
    pub quantity_unit: QuantityUnit,
    pub expiry_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prepared_at: Option<DateTime<Utc>>,
    pub allergen_info: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutritional_info: Option<NutritionFacts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub packaging_details: Option<String>,
}

impl From<&FoodItem> for FoodItemResponse {
    fn from(item: &FoodItem) -> Self {
        Self {
            id: item.id.to_string(),
            food_name: item.name.clone(),
            food_type: item.food_type,
            quantity: item.quantity.amount(),
            quantity_unit: item.quantity.unit(),
            expiry_date: item.expires_at,
            prepared_at: item.prepared_at,
            allergen_info: item.allergens.clone(),
            nutritional_info: item.nutrition,
            storage_instructions: item.storage_instructions.clone(),
            packaging_details: item.packaging_details.clone(),
        }
    }
}

/// Signature and photo captured at a hand-over.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HandoverResponse {
    pub time: DateTime<Utc>,
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl From<&HandoverProof> for HandoverResponse {
    fn from(proof: &HandoverProof) -> Self {
        Self {
            time: proof.time,
            signature: proof.signature.clone(),
            photo: proof.photo.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingResponse {
    #[schema(format = Uuid)]
    pub rater_id: String,
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Rating> for RatingResponse {
    fn from(rating: &Rating) -> Self {
        Self {
            rater_id: rating.rater.to_string(),
            rating: rating.score.value(),
            comment: rating.comment.clone(),
            created_at: rating.created_at,
        }
    }
}

/// Donation with its embedded food item and read-time expiry flag.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DonationResponse {
    #[schema(format = Uuid)]
    pub id: String,
    #[schema(format = Uuid)]
    pub donor_id: String,
    pub food_item: FoodItemResponse,
    pub status: DonationStatus,
    /// Whether the food item is past its expiry date.
    pub expired: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(format = Uuid)]
    pub delivery_agent_id: Option<String>,
    pub pickup_address: String,
    pub contact_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_pickup: Option<HandoverResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery: Option<HandoverResponse>,
    pub ratings: Vec<RatingResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    pub revision: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DonationResponse {
    fn build(donation: &Donation, expired: bool) -> Self {
        let state = donation.state();
        Self {
            id: donation.id().to_string(),
            donor_id: donation.donor_id().to_string(),
            food_item: FoodItemResponse::from(donation.food_item()),
            status: donation.status(),
            expired,
            delivery_agent_id: donation.delivery_agent_id().map(ToString::to_string),
            pickup_address: donation.pickup_address().to_owned(),
            contact_phone: donation.contact_phone().as_ref().to_owned(),
            actual_pickup: state.pickup().map(HandoverResponse::from),
            delivery: donation.delivery().map(HandoverResponse::from),
            ratings: donation.ratings().iter().map(RatingResponse::from).collect(),
            notes: donation.notes().map(str::to_owned),
            special_instructions: donation.special_instructions().map(str::to_owned),
            cancellation_reason: state.cancellation_reason().map(str::to_owned),
            revision: donation.revision(),
            created_at: donation.created_at(),
            updated_at: donation.updated_at(),
        }
    }
}

impl From<DonationView> for DonationResponse {
    fn from(view: DonationView) -> Self {
        Self::build(&view.donation, view.expired)
    }
}

/// Envelope returned by the listing endpoints.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DonationListResponse {
    pub donations: Vec<DonationResponse>,
    pub current_page: u32,
    pub total_pages: u64,
    pub total_donations: u64,
}

impl From<Page<DonationView>> for DonationListResponse {
    fn from(page: Page<DonationView>) -> Self {
        let current_page = page.current_page();
        let total_pages = page.total_pages();
        let total_donations = page.total_items();
        Self {
            donations: page
                .into_items()
                .into_iter()
                .map(DonationResponse::from)
                .collect(),
            current_page,
            total_pages,
            total_donations,
        }
    }
}

/// Confirmation returned by `DELETE /api/v1/donations/{id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeletedResponse {
    #[schema(example = "Donation deleted")]
    pub message: String,
}
