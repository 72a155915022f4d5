//! PostgreSQL-backed `DonationRepository` implementation using Diesel ORM.
//!
//! The food item is stored inline on the donation row so a donation and its
//! item are written and deleted together. Every mutation filters on the
//! expected status and revision; a write that touches no rows is reported as
//! a stale write. Ratings live in `donation_ratings` and are only appended.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::AsyncConnection as _;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use uuid::Uuid;

use crate::domain::ports::{
    DonationListing, DonationPersistenceError, DonationRepository, DonationScope,
    DonationSortKey, ExpectedState,
};
use crate::domain::{
    Donation, DonationId, DonationParts, DonationState, DonationStatus, FoodItem, FoodItemId,
    FoodType, HandoverProof, NutritionFacts, Phone, Quantity, QuantityUnit, Rating, Score, UserId,
};

use super::diesel_helpers::{
    DieselFailure, cast_count, cast_revision, cast_revision_for_db, classify_diesel_error,
    collect_rows, pool_error_message,
};
use super::models::{DonationChanges, DonationRow, RatingRow};
use super::pool::{DbPool, PoolError};
use super::schema::{donation_ratings, donations};

/// Diesel-backed implementation of the `DonationRepository` port.
#[derive(Clone)]
pub struct DieselDonationRepository {
    pool: DbPool,
}

impl DieselDonationRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> DonationPersistenceError {
    DonationPersistenceError::connection(pool_error_message(error))
}

fn map_diesel_error(
    error: diesel::result::Error,
    operation: &'static str,
) -> DonationPersistenceError {
    match classify_diesel_error(error, operation) {
        DieselFailure::Connection(message) => DonationPersistenceError::connection(message),
        DieselFailure::UniqueViolation { constraint } => DonationPersistenceError::query(format!(
            "unique constraint {} violated",
            constraint.as_deref().unwrap_or("unknown")
        )),
        DieselFailure::Query(message) => DonationPersistenceError::query(message),
    }
}

fn stale(id: &DonationId, expected: ExpectedState) -> DonationPersistenceError {
    DonationPersistenceError::stale_write(id.to_string(), expected.revision)
}

// ---------------------------------------------------------------------------
// Domain-to-row converters
// ---------------------------------------------------------------------------

fn donation_to_row(donation: &Donation) -> Result<DonationRow, DonationPersistenceError> {
    let food = donation.food_item();
    let state = donation.state();
    let nutrition = food.nutrition.unwrap_or_default();
    let pickup = state.pickup();
    let delivery = donation.delivery();
    let revision = cast_revision_for_db(donation.revision())
        .map_err(|message| DonationPersistenceError::query(message))?;
    Ok(DonationRow {
        id: *donation.id().as_uuid(),
        donor_id: *donation.donor_id().as_uuid(),
        food_item_id: *food.id.as_uuid(),
        food_name: food.name.clone(),
        food_type: food.food_type.as_str().to_owned(),
        quantity_amount: food.quantity.amount(),
        quantity_unit: food.quantity.unit().as_str().to_owned(),
        expiry_date: food.expires_at,
        prepared_at: food.prepared_at,
        allergens: food.allergens.clone(),
        calories: nutrition.calories,
        proteins: nutrition.proteins,
        carbohydrates: nutrition.carbohydrates,
        fats: nutrition.fats,
        storage_instructions: food.storage_instructions.clone(),
        packaging_details: food.packaging_details.clone(),
        status: donation.status().as_str().to_owned(),
        delivery_agent_id: state.agent().map(|agent| *agent.as_uuid()),
        pickup_address: donation.pickup_address().to_owned(),
        contact_phone: donation.contact_phone().as_ref().to_owned(),
        pickup_time: pickup.map(|proof| proof.time),
        pickup_signature: pickup.map(|proof| proof.signature.clone()),
        pickup_photo: pickup.and_then(|proof| proof.photo.clone()),
        delivery_time: delivery.map(|proof| proof.time),
        delivery_signature: delivery.map(|proof| proof.signature.clone()),
        delivery_photo: delivery.and_then(|proof| proof.photo.clone()),
        notes: donation.notes().map(str::to_owned),
        special_instructions: donation.special_instructions().map(str::to_owned),
        cancellation_reason: state.cancellation_reason().map(str::to_owned),
        revision,
        created_at: donation.created_at(),
        updated_at: donation.updated_at(),
    })
}

fn rating_rows(donation: &Donation) -> Result<Vec<RatingRow>, DonationPersistenceError> {
    donation
        .ratings()
        .iter()
        .enumerate()
        .map(|(index, rating)| {
            let position = i32::try_from(index).map_err(|_| {
                DonationPersistenceError::query(format!(
                    "donation {} has too many ratings",
                    donation.id()
                ))
            })?;
            Ok(RatingRow {
                donation_id: *donation.id().as_uuid(),
                position,
                rater_id: *rating.rater.as_uuid(),
                score: i16::from(rating.score.value()),
                comment: rating.comment.clone(),
                created_at: rating.created_at,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Row-to-domain converters
// ---------------------------------------------------------------------------

fn proof_from_columns(
    label: &str,
    time: Option<chrono::DateTime<chrono::Utc>>,
    signature: Option<String>,
    photo: Option<String>,
) -> Result<Option<HandoverProof>, String> {
    match (time, signature) {
        (Some(time), Some(signature)) => Ok(Some(HandoverProof {
            time,
            signature,
            photo,
        })),
        (None, None) if photo.is_none() => Ok(None),
        _ => Err(format!("{label} proof is only partially recorded")),
    }
}

fn row_to_rating(row: RatingRow) -> Result<Rating, String> {
    let score = Score::new(i64::from(row.score)).map_err(|error| error.to_string())?;
    Ok(Rating {
        rater: UserId::from(row.rater_id),
        score,
        comment: row.comment,
        created_at: row.created_at,
    })
}

fn row_to_donation(row: DonationRow, ratings: Vec<RatingRow>) -> Result<Donation, String> {
    let DonationRow {
        id,
        donor_id,
        food_item_id,
        food_name,
        food_type,
        quantity_amount,
        quantity_unit,
        expiry_date,
        prepared_at,
        allergens,
        calories,
        proteins,
        carbohydrates,
        fats,
        storage_instructions,
        packaging_details,
        status,
        delivery_agent_id,
        pickup_address,
        contact_phone,
        pickup_time,
        pickup_signature,
        pickup_photo,
        delivery_time,
        delivery_signature,
        delivery_photo,
        notes,
        special_instructions,
        cancellation_reason,
        revision,
        created_at,
        updated_at,
    } = row;

    let unit = QuantityUnit::from_str(&quantity_unit).map_err(|error| error.to_string())?;
    let nutrition = [calories, proteins, carbohydrates, fats]
        .iter()
        .any(Option::is_some)
        .then_some(NutritionFacts {
            calories,
            proteins,
            carbohydrates,
            fats,
        });
    let food_item = FoodItem {
        id: FoodItemId::from(food_item_id),
        name: food_name,
        food_type: FoodType::from_str(&food_type).map_err(|error| error.to_string())?,
        quantity: Quantity::new(quantity_amount, unit).map_err(|error| error.to_string())?,
        expires_at: expiry_date,
        prepared_at,
        allergens,
        nutrition,
        storage_instructions,
        packaging_details,
    };

    let status = DonationStatus::from_str(&status).map_err(|error| error.to_string())?;
    let pickup = proof_from_columns("pickup", pickup_time, pickup_signature, pickup_photo)?;
    let delivery =
        proof_from_columns("delivery", delivery_time, delivery_signature, delivery_photo)?;
    let state = DonationState::from_stored(
        status,
        delivery_agent_id.map(UserId::from),
        pickup,
        cancellation_reason,
    )
    .map_err(|error| error.to_string())?;

    let ratings = ratings
        .into_iter()
        .map(row_to_rating)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Donation::from_parts(DonationParts {
        id: DonationId::from(id),
        donor_id: UserId::from(donor_id),
        food_item,
        state,
        pickup_address,
        contact_phone: Phone::new(contact_phone).map_err(|error| error.to_string())?,
        delivery,
        ratings,
        notes,
        special_instructions,
        revision: cast_revision(revision),
        created_at,
        updated_at,
    }))
}

fn corrupt(id: Uuid) -> impl FnOnce(String) -> DonationPersistenceError {
    move |message| DonationPersistenceError::corrupt(format!("donation {id}: {message}"))
}

// ---------------------------------------------------------------------------
// Query builders
// ---------------------------------------------------------------------------

fn filtered(listing: &DonationListing) -> donations::BoxedQuery<'static, Pg> {
    let mut query = donations::table.into_boxed();
    query = match listing.scope {
        DonationScope::All => query,
        DonationScope::Donor(donor) => query.filter(donations::donor_id.eq(*donor.as_uuid())),
        DonationScope::Agent(agent) => {
            query.filter(donations::delivery_agent_id.eq(*agent.as_uuid()))
        }
    };
    if let Some(status) = listing.status {
        query = query.filter(donations::status.eq(status.as_str()));
    }
    query
}

fn ordered(
    query: donations::BoxedQuery<'static, Pg>,
    listing: &DonationListing,
) -> donations::BoxedQuery<'static, Pg> {
    use DonationSortKey::{CreatedAt, ExpiryDate, UpdatedAt};

    match (listing.sort_key, listing.order.is_ascending()) {
        (CreatedAt, true) => query.order_by((donations::created_at.asc(), donations::id.asc())),
        (CreatedAt, false) => query.order_by((donations::created_at.desc(), donations::id.desc())),
        (UpdatedAt, true) => query.order_by((donations::updated_at.asc(), donations::id.asc())),
        (UpdatedAt, false) => query.order_by((donations::updated_at.desc(), donations::id.desc())),
        (ExpiryDate, true) => query.order_by((donations::expiry_date.asc(), donations::id.asc())),
        (ExpiryDate, false) => {
            query.order_by((donations::expiry_date.desc(), donations::id.desc()))
        }
    }
}

// ---------------------------------------------------------------------------
// Trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl DonationRepository for DieselDonationRepository {
    async fn insert(&self, donation: &Donation) -> Result<(), DonationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = donation_to_row(donation)?;
        let ratings = rating_rows(donation)?;

        conn.transaction(|conn| {
            async move {
                diesel::insert_into(donations::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                if !ratings.is_empty() {
                    diesel::insert_into(donation_ratings::table)
                        .values(&ratings)
                        .execute(conn)
                        .await?;
                }
                Ok::<_, diesel::result::Error>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|error| map_diesel_error(error, "insert donation"))
    }

    async fn find_by_id(
        &self,
        id: &DonationId,
    ) -> Result<Option<Donation>, DonationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let uuid = *id.as_uuid();

        let found = conn
            .transaction(|conn| {
                async move {
                    let row: Option<DonationRow> = donations::table
                        .find(uuid)
                        .select(DonationRow::as_select())
                        .first(conn)
                        .await
                        .optional()?;
                    let Some(row) = row else {
                        return Ok(None);
                    };
                    let ratings: Vec<RatingRow> = donation_ratings::table
                        .filter(donation_ratings::donation_id.eq(uuid))
                        .order_by(donation_ratings::position.asc())
                        .select(RatingRow::as_select())
                        .load(conn)
                        .await?;
                    Ok::<_, diesel::result::Error>(Some((row, ratings)))
                }
                .scope_boxed()
            })
            .await
            .map_err(|error| map_diesel_error(error, "find donation"))?;

        found
            .map(|(row, ratings)| row_to_donation(row, ratings).map_err(corrupt(uuid)))
            .transpose()
    }

    async fn update(
        &self,
        donation: &Donation,
        expected: ExpectedState,
    ) -> Result<(), DonationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let uuid = *donation.id().as_uuid();
        let changes = DonationChanges::from(donation_to_row(donation)?);
        let ratings = rating_rows(donation)?;
        let expected_status = expected.status.as_str();
        let expected_revision = cast_revision_for_db(expected.revision)
            .map_err(|message| DonationPersistenceError::query(message))?;

        let applied = conn
            .transaction(|conn| {
                async move {
                    let updated = diesel::update(
                        donations::table
                            .filter(donations::id.eq(uuid))
                            .filter(donations::status.eq(expected_status))
                            .filter(donations::revision.eq(expected_revision)),
                    )
                    .set(&changes)
                    .execute(conn)
                    .await?;
                    if updated == 0 {
                        return Ok(false);
                    }

                    let stored: i64 = donation_ratings::table
                        .filter(donation_ratings::donation_id.eq(uuid))
                        .count()
                        .get_result(conn)
                        .await?;
                    let fresh: Vec<RatingRow> = ratings
                        .into_iter()
                        .filter(|rating| i64::from(rating.position) >= stored)
                        .collect();
                    if !fresh.is_empty() {
                        diesel::insert_into(donation_ratings::table)
                            .values(&fresh)
                            .execute(conn)
                            .await?;
                    }
                    Ok::<_, diesel::result::Error>(true)
                }
                .scope_boxed()
            })
            .await
            .map_err(|error| map_diesel_error(error, "update donation"))?;

        if applied {
            Ok(())
        } else {
            Err(stale(donation.id(), expected))
        }
    }

    async fn delete(
        &self,
        id: &DonationId,
        expected: ExpectedState,
    ) -> Result<(), DonationPersistenceError> {
        let expected_revision = cast_revision_for_db(expected.revision)
            .map_err(|message| DonationPersistenceError::query(message))?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            donations::table
                .filter(donations::id.eq(*id.as_uuid()))
                .filter(donations::status.eq(expected.status.as_str()))
                .filter(donations::revision.eq(expected_revision)),
        )
        .execute(&mut conn)
        .await
        .map_err(|error| map_diesel_error(error, "delete donation"))?;
        if deleted == 0 {
            return Err(stale(id, expected));
        }
        Ok(())
    }

    async fn list(
        &self,
        listing: &DonationListing,
    ) -> Result<(Vec<Donation>, u64), DonationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let offset = i64::try_from(listing.page.offset()).unwrap_or(i64::MAX);
        let limit = i64::from(listing.page.limit());
        let listing = *listing;

        // Count, page and ratings come from one snapshot so totals agree
        // with the rows returned.
        let (total, rows, ratings) = conn
            .transaction(|conn| {
                async move {
                    let total: i64 = filtered(&listing).count().get_result(conn).await?;
                    let rows: Vec<DonationRow> = ordered(filtered(&listing), &listing)
                        .select(DonationRow::as_select())
                        .offset(offset)
                        .limit(limit)
                        .load(conn)
                        .await?;
                    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
                    let ratings: Vec<RatingRow> = donation_ratings::table
                        .filter(donation_ratings::donation_id.eq_any(ids))
                        .order_by((
                            donation_ratings::donation_id.asc(),
                            donation_ratings::position.asc(),
                        ))
                        .select(RatingRow::as_select())
                        .load(conn)
                        .await?;
                    Ok::<_, diesel::result::Error>((total, rows, ratings))
                }
                .scope_boxed()
            })
            .await
            .map_err(|error| map_diesel_error(error, "list donations"))?;

        let mut by_donation: HashMap<Uuid, Vec<RatingRow>> = HashMap::new();
        for rating in ratings {
            by_donation.entry(rating.donation_id).or_default().push(rating);
        }
        let donations = collect_rows(
            rows.into_iter().map(|row| {
                let ratings = by_donation.remove(&row.id).unwrap_or_default();
                let id = row.id;
                row_to_donation(row, ratings).map_err(|message| format!("donation {id}: {message}"))
            }),
            DonationPersistenceError::corrupt,
        )?;
        Ok((donations, cast_count(total)))
    }
}
