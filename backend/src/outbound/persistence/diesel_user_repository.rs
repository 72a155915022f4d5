//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Role-specific profile data is flattened into nullable columns and rebuilt
//! into a [`RoleProfile`] on read. Proximity searches narrow candidates with a
//! latitude/longitude bounding box in SQL and rank them by great-circle
//! distance in Rust.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::geo::EARTH_RADIUS_METERS;
use crate::domain::ports::{NEARBY_RESULT_LIMIT, NearbyUser, UserPersistenceError, UserRepository};
use crate::domain::{
    AccountStatus, ClockTime, Email, GeoPoint, Location, OperatingHours, PartnerDetails,
    PasswordDigest, PersonName, Phone, Role, RoleProfile, User, UserId, UserParts,
};

use super::diesel_helpers::{DieselFailure, classify_diesel_error, pool_error_message};
use super::models::{UserProfileChanges, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

const EMAIL_CONSTRAINT: &str = "users_email_key";

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    UserPersistenceError::connection(pool_error_message(error))
}

fn map_diesel_error(
    error: diesel::result::Error,
    operation: &'static str,
    email: &Email,
) -> UserPersistenceError {
    match classify_diesel_error(error, operation) {
        DieselFailure::UniqueViolation { constraint }
            if constraint.as_deref() == Some(EMAIL_CONSTRAINT) =>
        {
            UserPersistenceError::duplicate_email(email.as_ref())
        }
        DieselFailure::UniqueViolation { .. } => {
            UserPersistenceError::query("unique constraint violated")
        }
        DieselFailure::Connection(message) => UserPersistenceError::connection(message),
        DieselFailure::Query(message) => UserPersistenceError::query(message),
    }
}

fn map_read_error(error: diesel::result::Error, operation: &'static str) -> UserPersistenceError {
    match classify_diesel_error(error, operation) {
        DieselFailure::Connection(message) => UserPersistenceError::connection(message),
        DieselFailure::UniqueViolation { .. } => UserPersistenceError::query("database error"),
        DieselFailure::Query(message) => UserPersistenceError::query(message),
    }
}

/// Flatten a domain user into a row.
fn user_to_row(user: &User) -> UserRow {
    let profile = user.profile();
    let partner = profile.partner();
    let hours = partner.and_then(|details| details.operating_hours.as_ref());
    let location = partner.and_then(|details| details.location.as_ref());
    UserRow {
        id: *user.id().as_uuid(),
        name: user.name().as_ref().to_owned(),
        email: user.email().as_ref().to_owned(),
        password_digest: user.password_digest().as_str().to_owned(),
        phone: user.phone().map(|phone| phone.as_ref().to_owned()),
        role: user.role().as_str().to_owned(),
        account_status: user.account_status().as_str().to_owned(),
        business_name: partner.and_then(|details| details.business_name.clone()),
        hours_start: hours.map(|window| window.start.as_ref().to_owned()),
        hours_end: hours.map(|window| window.end.as_ref().to_owned()),
        address: location.and_then(|place| place.address.clone()),
        city: location.and_then(|place| place.city.clone()),
        state: location.and_then(|place| place.state.clone()),
        pincode: location.and_then(|place| place.pincode.clone()),
        longitude: location.map(|place| place.coordinates.longitude()),
        latitude: location.map(|place| place.coordinates.latitude()),
        vehicle_info: profile.vehicle_info().map(str::to_owned),
        created_at: user.created_at(),
        updated_at: user.updated_at(),
    }
}

/// Rebuild a domain user from a row.
fn row_to_user(row: UserRow) -> Result<User, String> {
    let role: Role = row.role.parse().map_err(|error| format!("{error}"))?;
    let account_status: AccountStatus = row
        .account_status
        .parse()
        .map_err(|error| format!("{error}"))?;
    let operating_hours = match (row.hours_start, row.hours_end) {
        (Some(start), Some(end)) => Some(OperatingHours {
            start: ClockTime::new(start).map_err(|error| error.to_string())?,
            end: ClockTime::new(end).map_err(|error| error.to_string())?,
        }),
        (None, None) => None,
        _ => return Err("operating hours are only half recorded".to_owned()),
    };
    let location = match (row.longitude, row.latitude) {
        (Some(longitude), Some(latitude)) => Some(Location {
            address: row.address,
            city: row.city,
            state: row.state,
            pincode: row.pincode,
            coordinates: GeoPoint::new(longitude, latitude).map_err(|error| error.to_string())?,
        }),
        (None, None) => None,
        _ => return Err("coordinates are only half recorded".to_owned()),
    };
    let partner = PartnerDetails {
        business_name: row.business_name,
        operating_hours,
        location,
    };
    let profile = match role {
        Role::Donor => RoleProfile::Donor(partner),
        Role::Agent => RoleProfile::Agent {
            partner,
            vehicle_info: row.vehicle_info,
        },
        Role::Admin => RoleProfile::Admin,
    };

    Ok(User::from_parts(UserParts {
        id: UserId::from(row.id),
        name: PersonName::new(&row.name).map_err(|error| error.to_string())?,
        email: Email::new(&row.email).map_err(|error| error.to_string())?,
        password_digest: PasswordDigest::new(row.password_digest),
        phone: row
            .phone
            .map(Phone::new)
            .transpose()
            .map_err(|error| error.to_string())?,
        account_status,
        profile,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn convert(row: UserRow) -> Result<User, UserPersistenceError> {
    let id = row.id;
    row_to_user(row)
        .map_err(|message| UserPersistenceError::query(format!("stored user {id} is invalid: {message}")))
}

/// Latitude and optional longitude ranges enclosing a search circle.
///
/// The longitude range is omitted near the poles and when the box would wrap
/// the antimeridian; the distance filter applied afterwards stays exact.
fn bounding_box(center: GeoPoint, radius_meters: f64) -> ((f64, f64), Option<(f64, f64)>) {
    let lat_delta = (radius_meters / EARTH_RADIUS_METERS).to_degrees();
    let latitudes = (center.latitude() - lat_delta, center.latitude() + lat_delta);
    let cos_lat = center.latitude().to_radians().cos();
    if cos_lat < 1e-6 {
        return (latitudes, None);
    }
    let lon_delta = lat_delta / cos_lat;
    let west = center.longitude() - lon_delta;
    let east = center.longitude() + lon_delta;
    let longitudes = (west >= -180.0 && east <= 180.0).then_some((west, east));
    (latitudes, longitudes)
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(users::table)
            .values(&user_to_row(user))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|error| map_diesel_error(error, "insert user", user.email()))
    }

    async fn update_profile(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let changes = UserProfileChanges::from(user_to_row(user));
        let updated = diesel::update(users::table.find(*user.id().as_uuid()))
            .set(&changes)
            .execute(&mut conn)
            .await
            .map_err(|error| map_diesel_error(error, "update user profile", user.email()))?;
        if updated == 0 {
            return Err(UserPersistenceError::missing(user.id().to_string()));
        }
        Ok(())
    }

    async fn update_account_status(
        &self,
        id: &UserId,
        status: AccountStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated = diesel::update(users::table.find(*id.as_uuid()))
            .set((
                users::account_status.eq(status.as_str()),
                users::updated_at.eq(updated_at),
            ))
            .execute(&mut conn)
            .await
            .map_err(|error| map_read_error(error, "update account status"))?;
        if updated == 0 {
            return Err(UserPersistenceError::missing(id.to_string()));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .find(*id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|error| map_read_error(error, "find user by id"))?;
        row.map(convert).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|error| map_read_error(error, "find user by email"))?;
        row.map(convert).transpose()
    }

    async fn find_near(
        &self,
        center: GeoPoint,
        radius_meters: f64,
        role: Option<Role>,
    ) -> Result<Vec<NearbyUser>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let ((south, north), longitudes) = bounding_box(center, radius_meters);

        let mut query = users::table
            .filter(users::latitude.between(south, north))
            .filter(users::longitude.is_not_null())
            .select(UserRow::as_select())
            .into_boxed();
        if let Some((west, east)) = longitudes {
            query = query.filter(users::longitude.between(west, east));
        }
        if let Some(role) = role {
            query = query.filter(users::role.eq(role.as_str()));
        }
        let rows: Vec<UserRow> = query
            .load(&mut conn)
            .await
            .map_err(|error| map_read_error(error, "find nearby users"))?;

        let mut found = Vec::with_capacity(rows.len());
        for row in rows {
            let user = convert(row)?;
            let Some(point) = user.profile().coordinates() else {
                continue;
            };
            let distance_meters = center.distance_meters(&point);
            if distance_meters <= radius_meters {
                found.push(NearbyUser {
                    user,
                    distance_meters,
                });
            }
        }
        found.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));
        found.truncate(NEARBY_RESULT_LIMIT);
        Ok(found)
    }
}
