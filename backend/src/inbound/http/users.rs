//! Account API handlers.
//!
//! ```text
//! POST  /api/v1/users/register {"name":"Ada","email":"ada@example.org","password":"hunter22","userType":"donor"}
//! POST  /api/v1/users/login    {"email":"ada@example.org","password":"hunter22"}
//! GET   /api/v1/users/profile
//! PATCH /api/v1/users/profile  {"businessName":"Ada's Kitchen"}
//! PATCH /api/v1/users/{id}     {"accountStatus":"suspended"}
//! GET   /api/v1/users/nearby?longitude=72.87&latitude=19.07&maxDistance=5000&userType=agent
//! ```

use actix_web::{HttpResponse, get, patch, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{AuthSession, DEFAULT_NEARBY_RADIUS_METERS, NearbySearch, NearbyUser};
use crate::domain::{
    AccountStatus, ClockTime, Email, Error, GeoPoint, Location, LoginCredentials, OperatingHours,
    Password, PersonName, Phone, ProfilePatch, Registration, Role, RoleProfile, User,
    UserValidationError, map_user_validation_error,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::BearerIdentity;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_value_error, map_credential_error, parse_optional_enum, parse_user_id,
};

const ROLES: &[&str] = &["donor", "agent", "admin"];
const ACCOUNT_STATUSES: &[&str] = &["pending", "active", "suspended"];

/// `HH:MM` window as sent by clients.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct OperatingHoursBody {
    #[schema(example = "09:00")]
    pub start: String,
    #[schema(example = "21:30")]
    pub end: String,
}

impl OperatingHoursBody {
    fn into_domain(self) -> Result<OperatingHours, UserValidationError> {
        Ok(OperatingHours {
            start: ClockTime::new(self.start)?,
            end: ClockTime::new(self.end)?,
        })
    }
}

/// Registration body for `POST /api/v1/users/register`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[schema(example = "donor")]
    pub user_type: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub operating_hours: Option<OperatingHoursBody>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub vehicle_info: Option<String>,
}

/// Login body for `POST /api/v1/users/login`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Self-service profile changes. Unknown fields are rejected.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub operating_hours: Option<OperatingHoursBody>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub vehicle_info: Option<String>,
}

/// Administrative account change for `PATCH /api/v1/users/{id}`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateAccountRequest {
    #[serde(default)]
    #[schema(example = "suspended")]
    pub account_status: Option<String>,
    /// Always rejected: roles cannot change.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub role: Option<Value>,
    /// Always rejected: roles cannot change.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub user_type: Option<Value>,
}

/// Query string for `GET /api/v1/users/nearby`.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NearbyQuery {
    pub longitude: f64,
    pub latitude: f64,
    /// Search radius in metres; defaults to 10 km.
    pub max_distance: Option<f64>,
    pub user_type: Option<String>,
}

/// Account as shown to clients. Never carries the password digest.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(value_type = String, format = Uuid)]
    pub id: String,
    pub name: String,
    pub email: String,
    pub user_type: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub account_status: AccountStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operating_hours: Option<OperatingHours>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_info: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        let partner = user.profile().partner();
        Self {
            id: user.id().to_string(),
            name: user.name().as_ref().to_owned(),
            email: user.email().as_ref().to_owned(),
            user_type: user.role(),
            phone: user.phone().map(|phone| phone.as_ref().to_owned()),
            account_status: user.account_status(),
            business_name: partner.and_then(|p| p.business_name.clone()),
            operating_hours: partner.and_then(|p| p.operating_hours.clone()),
            location: partner.and_then(|p| p.location.clone()),
            vehicle_info: user.profile().vehicle_info().map(str::to_owned),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
        }
    }
}

/// Registration or login result.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            user: UserResponse::from(&session.user),
            token: session.token.token.as_str().to_owned(),
            expires_at: session.token.expires_at,
        }
    }
}

/// Proximity search hit.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NearbyUserResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub distance_meters: f64,
}

impl From<NearbyUser> for NearbyUserResponse {
    fn from(hit: NearbyUser) -> Self {
        Self {
            user: UserResponse::from(&hit.user),
            distance_meters: hit.distance_meters,
        }
    }
}

fn optional<T>(
    value: Option<String>,
    build: impl FnOnce(String) -> Result<T, UserValidationError>,
) -> Result<Option<T>, Error> {
    value
        .map(build)
        .transpose()
        .map_err(map_user_validation_error)
}

fn hours(value: Option<OperatingHoursBody>) -> Result<Option<OperatingHours>, Error> {
    value
        .map(OperatingHoursBody::into_domain)
        .transpose()
        .map_err(map_user_validation_error)
}

impl UpdateProfileRequest {
    fn into_patch(self) -> Result<ProfilePatch, Error> {
        Ok(ProfilePatch {
            name: optional(self.name, PersonName::new)?,
            email: optional(self.email, Email::new)?,
            phone: optional(self.phone, Phone::new)?,
            business_name: self.business_name,
            operating_hours: hours(self.operating_hours)?,
            location: self.location,
            vehicle_info: self.vehicle_info,
        })
    }
}

impl RegisterRequest {
    fn into_registration(self) -> Result<Registration, Error> {
        let role = self
            .user_type
            .trim()
            .parse::<Role>()
            .map_err(|_| invalid_value_error(FieldName::new("userType"), &self.user_type, ROLES))?;
        let name = PersonName::new(&self.name).map_err(map_user_validation_error)?;
        let email = Email::new(&self.email).map_err(map_user_validation_error)?;
        let password = Password::new_secret(&self.password).map_err(map_credential_error)?;
        let phone = optional(self.phone, Phone::new)?;
        let mut profile = RoleProfile::empty(role);
        profile
            .apply(ProfilePatch {
                business_name: self.business_name,
                operating_hours: hours(self.operating_hours)?,
                location: self.location,
                vehicle_info: self.vehicle_info,
                ..ProfilePatch::default()
            })
            .map_err(map_user_validation_error)?;
        Ok(Registration {
            name,
            email,
            password,
            phone,
            profile,
        })
    }
}

fn immutable_role_error(field: &'static str) -> Error {
    Error::invalid_request("user type cannot be changed")
        .with_details(json!({ "field": field, "code": "immutable" }))
}

/// Create an account and issue a token.
#[utoipa::path(
    post,
    path = "/api/v1/users/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Role may not self-register", body = ErrorSchema),
        (status = 409, description = "E-mail already registered", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "register",
    security([])
)]
#[post("/users/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let registration = payload.into_inner().into_registration()?;
    let session = state.accounts.register(registration).await?;
    Ok(HttpResponse::Created().json(AuthResponse::from(session)))
}

/// Exchange e-mail and password for a token.
///
/// Unknown e-mail addresses and wrong passwords produce the same response.
#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = AuthResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 403, description = "Account not active", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/users/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<AuthResponse>> {
    let LoginRequest { email, password } = payload.into_inner();
    let credentials =
        LoginCredentials::try_from_parts(&email, &password).map_err(map_credential_error)?;
    let session = state.accounts.login(credentials).await?;
    Ok(web::Json(AuthResponse::from(session)))
}

/// Current caller's account.
#[utoipa::path(
    get,
    path = "/api/v1/users/profile",
    responses(
        (status = 200, description = "Profile", body = UserResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "getProfile"
)]
#[get("/users/profile")]
pub async fn get_profile(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
) -> ApiResult<web::Json<UserResponse>> {
    let user = state.accounts_query.profile(identity.into_inner()).await?;
    Ok(web::Json(UserResponse::from(&user)))
}

/// Update the caller's own profile.
#[utoipa::path(
    patch,
    path = "/api/v1/users/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 400, description = "Invalid or disallowed field", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 409, description = "E-mail already registered", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "updateProfile"
)]
#[patch("/users/profile")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
    payload: web::Json<UpdateProfileRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let patch = payload.into_inner().into_patch()?;
    let user = state
        .accounts
        .update_profile(identity.into_inner(), patch)
        .await?;
    Ok(web::Json(UserResponse::from(&user)))
}

/// Users near a point, nearest first.
#[utoipa::path(
    get,
    path = "/api/v1/users/nearby",
    params(NearbyQuery),
    responses(
        (status = 200, description = "Nearby users", body = [NearbyUserResponse]),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "findNearbyUsers"
)]
#[get("/users/nearby")]
pub async fn find_nearby(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
    query: web::Query<NearbyQuery>,
) -> ApiResult<web::Json<Vec<NearbyUserResponse>>> {
    let NearbyQuery {
        longitude,
        latitude,
        max_distance,
        user_type,
    } = query.into_inner();
    let center = GeoPoint::new(longitude, latitude).map_err(|error| {
        Error::invalid_request(error.to_string()).with_details(json!({ "field": "coordinates" }))
    })?;
    let role = parse_optional_enum::<Role>(user_type, FieldName::new("userType"), ROLES)?;
    let search = NearbySearch {
        center,
        max_distance_meters: max_distance.unwrap_or(DEFAULT_NEARBY_RADIUS_METERS),
        role,
    };
    let hits = state
        .accounts_query
        .find_nearby(identity.into_inner(), search)
        .await?;
    Ok(web::Json(
        hits.into_iter().map(NearbyUserResponse::from).collect(),
    ))
}

/// Change another account's status. Admins only.
#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User identifier")),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Updated account", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "updateAccount"
)]
#[patch("/users/{id}")]
pub async fn update_account(
    state: web::Data<HttpState>,
    identity: BearerIdentity,
    path: web::Path<String>,
    payload: web::Json<UpdateAccountRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let target = parse_user_id(path.into_inner(), FieldName::new("id"))?;
    let UpdateAccountRequest {
        account_status,
        role,
        user_type,
    } = payload.into_inner();
    if role.is_some() {
        return Err(immutable_role_error("role"));
    }
    if user_type.is_some() {
        return Err(immutable_role_error("userType"));
    }
    let status = parse_optional_enum::<AccountStatus>(
        account_status,
        FieldName::new("accountStatus"),
        ACCOUNT_STATUSES,
    )?
    .ok_or_else(|| {
        Error::invalid_request("accountStatus is required")
            .with_details(json!({ "field": "accountStatus", "code": "missing_field" }))
    })?;
    let user = state
        .accounts
        .update_account(identity.into_inner(), target, status)
        .await?;
    Ok(web::Json(UserResponse::from(&user)))
}

/// Register every account route on `cfg`.
///
/// `/users/profile` and `/users/nearby` come before `/users/{id}`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(register)
        .service(login)
        .service(get_profile)
        .service(update_profile)
        .service(find_nearby)
        .service(update_account);
}

#[cfg(test)]
#[path = "users_tests.rs"]
mod tests;
