//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered accounts. Role-specific profile columns are nullable and
    /// only populated for the roles that hold them.
    users (id) {
        id -> Uuid,
        #[max_length = 120]
        name -> Varchar,
        #[max_length = 254]
        email -> Varchar,
        password_digest -> Text,
        #[max_length = 32]
        phone -> Nullable<Varchar>,
        #[max_length = 16]
        role -> Varchar,
        #[max_length = 16]
        account_status -> Varchar,
        #[max_length = 120]
        business_name -> Nullable<Varchar>,
        #[max_length = 5]
        hours_start -> Nullable<Varchar>,
        #[max_length = 5]
        hours_end -> Nullable<Varchar>,
        address -> Nullable<Text>,
        city -> Nullable<Text>,
        state -> Nullable<Text>,
        pincode -> Nullable<Text>,
        longitude -> Nullable<Float8>,
        latitude -> Nullable<Float8>,
        vehicle_info -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Donations with their food item stored inline.
    donations (id) {
        id -> Uuid,
        donor_id -> Uuid,
        food_item_id -> Uuid,
        food_name -> Text,
        #[max_length = 16]
        food_type -> Varchar,
        quantity_amount -> Float8,
        #[max_length = 16]
        quantity_unit -> Varchar,
        expiry_date -> Timestamptz,
        prepared_at -> Nullable<Timestamptz>,
        allergens -> Array<Text>,
        calories -> Nullable<Float8>,
        proteins -> Nullable<Float8>,
        carbohydrates -> Nullable<Float8>,
        fats -> Nullable<Float8>,
        storage_instructions -> Nullable<Text>,
        packaging_details -> Nullable<Text>,
        #[max_length = 16]
        status -> Varchar,
        delivery_agent_id -> Nullable<Uuid>,
        pickup_address -> Text,
        #[max_length = 32]
        contact_phone -> Varchar,
        pickup_time -> Nullable<Timestamptz>,
        pickup_signature -> Nullable<Text>,
        pickup_photo -> Nullable<Text>,
        delivery_time -> Nullable<Timestamptz>,
        delivery_signature -> Nullable<Text>,
        delivery_photo -> Nullable<Text>,
        notes -> Nullable<Text>,
        special_instructions -> Nullable<Text>,
        cancellation_reason -> Nullable<Text>,
        /// Optimistic concurrency counter, starting at 1.
        revision -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only ratings; `position` preserves submission order.
    donation_ratings (id) {
        id -> Int8,
        donation_id -> Uuid,
        position -> Int4,
        rater_id -> Uuid,
        score -> Int2,
        comment -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(donation_ratings -> donations (donation_id));

diesel::allow_tables_to_appear_in_same_query!(users, donations, donation_ratings);
