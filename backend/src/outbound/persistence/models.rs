//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{donation_ratings, donations, users};

/// Full users row, used for reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_digest: String,
    pub phone: Option<String>,
    pub role: String,
    pub account_status: String,
    pub business_name: Option<String>,
    pub hours_start: Option<String>,
    pub hours_end: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub vehicle_info: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Self-service user columns. `None` clears the column. Account status and
/// password digest are written separately.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserProfileChanges {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub business_name: Option<String>,
    pub hours_start: Option<String>,
    pub hours_end: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub vehicle_info: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserProfileChanges {
    fn from(row: UserRow) -> Self {
        Self {
            name: row.name,
            email: row.email,
            phone: row.phone,
            business_name: row.business_name,
            hours_start: row.hours_start,
            hours_end: row.hours_end,
            address: row.address,
            city: row.city,
            state: row.state,
            pincode: row.pincode,
            longitude: row.longitude,
            latitude: row.latitude,
            vehicle_info: row.vehicle_info,
            updated_at: row.updated_at,
        }
    }
}

/// Full donations row including the inline food item.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = donations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DonationRow {
    pub id: Uuid,
    pub donor_id: Uuid,
    pub food_item_id: Uuid,
    pub food_name: String,
    pub food_type: String,
    pub quantity_amount: f64,
    pub quantity_unit: String,
    pub expiry_date: DateTime<Utc>,
    pub prepared_at: Option<DateTime<Utc>>,
    pub allergens: Vec<String>,
    pub calories: Option<f64>,
    pub proteins: Option<f64>,
    pub carbohydrates: Option<f64>,
    pub fats: Option<f64>,
    pub storage_instructions: Option<String>,
    pub packaging_details: Option<String>,
    pub status: String,
    pub delivery_agent_id: Option<Uuid>,
    pub pickup_address: String,
    pub contact_phone: String,
    pub pickup_time: Option<DateTime<Utc>>,
    pub pickup_signature: Option<String>,
    pub pickup_photo: Option<String>,
    pub delivery_time: Option<DateTime<Utc>>,
    pub delivery_signature: Option<String>,
    pub delivery_photo: Option<String>,
    pub notes: Option<String>,
    pub special_instructions: Option<String>,
    pub cancellation_reason: Option<String>,
    pub revision: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Donation columns the lifecycle may change. The food item is immutable.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = donations)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct DonationChanges {
    pub status: String,
    pub delivery_agent_id: Option<Uuid>,
    pub pickup_time: Option<DateTime<Utc>>,
    pub pickup_signature: Option<String>,
    pub pickup_photo: Option<String>,
    pub delivery_time: Option<DateTime<Utc>>,
    pub delivery_signature: Option<String>,
    pub delivery_photo: Option<String>,
    pub notes: Option<String>,
    pub special_instructions: Option<String>,
    pub cancellation_reason: Option<String>,
    pub revision: i32,
    pub updated_at: DateTime<Utc>,
}

impl From<DonationRow> for DonationChanges {
    fn from(row: DonationRow) -> Self {
        Self {
            status: row.status,
            delivery_agent_id: row.delivery_agent_id,
            pickup_time: row.pickup_time,
            pickup_signature: row.pickup_signature,
            pickup_photo: row.pickup_photo,
            delivery_time: row.delivery_time,
            delivery_signature: row.delivery_signature,
            delivery_photo: row.delivery_photo,
            notes: row.notes,
            special_instructions: row.special_instructions,
            cancellation_reason: row.cancellation_reason,
            revision: row.revision,
            updated_at: row.updated_at,
        }
    }
}

/// Rating row without its surrogate key, used for reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = donation_ratings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RatingRow {
    pub donation_id: Uuid,
    pub position: i32,
    pub rater_id: Uuid,
    pub score: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
