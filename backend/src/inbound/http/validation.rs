//! Shared validation helpers for inbound HTTP adapters.

use actix_web::{HttpRequest, error::JsonPayloadError, error::PathError, error::QueryPayloadError, web};
use chrono::{DateTime, Utc};
use pagination::{PageRequest, PageRequestError};
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

use crate::domain::{
    CredentialValidationError, DonationId, Error, UserId, map_user_validation_error,
};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidUuid,
    InvalidTimestamp,
    InvalidValue,
    OutOfRange,
    MalformedJson,
    UnsupportedContentType,
    InvalidQuery,
    InvalidPath,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidTimestamp => "invalid_timestamp",
            ErrorCode::InvalidValue => "invalid_value",
            ErrorCode::OutOfRange => "out_of_range",
            ErrorCode::MalformedJson => "malformed_json",
            ErrorCode::UnsupportedContentType => "unsupported_content_type",
            ErrorCode::InvalidQuery => "invalid_query",
            ErrorCode::InvalidPath => "invalid_path",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: String,
    message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

/// Request-level failure with no single offending field.
fn malformed_request(code: ErrorCode, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({ "code": code.as_str() }))
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be a valid UUID"))
        .with_value(ErrorCode::InvalidUuid, value)
}

pub(crate) fn parse_uuid(value: String, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(&value).map_err(|_| invalid_uuid_error(field, &value))
}

pub(crate) fn parse_donation_id(value: String) -> Result<DonationId, Error> {
    parse_uuid(value, FieldName::new("id")).map(DonationId::from)
}

pub(crate) fn parse_user_id(value: String, field: FieldName) -> Result<UserId, Error> {
    parse_uuid(value, field).map(UserId::from)
}

pub(crate) fn invalid_timestamp_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be an RFC 3339 timestamp"))
        .with_value(ErrorCode::InvalidTimestamp, value)
}

pub(crate) fn parse_rfc3339_timestamp(
    value: String,
    field: FieldName,
) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(&value)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|_| invalid_timestamp_error(field, &value))
}

pub(crate) fn parse_optional_rfc3339_timestamp(
    value: Option<String>,
    field: FieldName,
) -> Result<Option<DateTime<Utc>>, Error> {
    value
        .map(|raw| parse_rfc3339_timestamp(raw, field))
        .transpose()
}

/// Reject `value` for `field`, listing the accepted spellings.
pub(crate) fn invalid_value_error(field: FieldName, value: &str, accepted: &[&str]) -> Error {
    let field = field.as_str();
    ValidationError::new(
        field,
        format!("{field} must be one of {}", accepted.join(", ")),
    )
    .with_value(ErrorCode::InvalidValue, value)
}

/// Parse an optional value through `FromStr`, reporting `accepted` on failure.
pub(crate) fn parse_optional_enum<T: std::str::FromStr>(
    value: Option<String>,
    field: FieldName,
    accepted: &[&str],
) -> Result<Option<T>, Error> {
    value
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| invalid_value_error(field, &raw, accepted))
        })
        .transpose()
}

/// Validate `page`/`limit` query parameters.
pub(crate) fn parse_page_request(
    page: Option<u32>,
    limit: Option<u32>,
) -> Result<PageRequest, Error> {
    PageRequest::new(page, limit).map_err(|error| {
        let (field, value) = match error {
            PageRequestError::PageOutOfRange => ("page", page),
            PageRequestError::LimitOutOfRange { .. } => ("limit", limit),
        };
        ValidationError::new(field, error.to_string()).with_value(
            ErrorCode::OutOfRange,
            value.map(|v| v.to_string()).unwrap_or_default(),
        )
    })
}

pub(crate) fn map_credential_error(error: CredentialValidationError) -> Error {
    match error {
        CredentialValidationError::User(inner) => map_user_validation_error(inner),
        other => Error::invalid_request(other.to_string())
            .with_details(json!({ "field": other.field() })),
    }
}

fn json_error(error: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let mapped = match &error {
        JsonPayloadError::ContentType => malformed_request(
            ErrorCode::UnsupportedContentType,
            "request body must be application/json",
        ),
        JsonPayloadError::Deserialize(inner) => {
            malformed_request(ErrorCode::MalformedJson, format!("invalid JSON body: {inner}"))
        }
        other => malformed_request(ErrorCode::MalformedJson, other.to_string()),
    };
    mapped.into()
}

/// Parse a JSON body the caller may omit. An empty or blank body yields
/// `T::default()`; anything else must deserialize cleanly.
pub(crate) fn parse_optional_json_body<T>(body: &[u8]) -> Result<T, Error>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|err| {
        malformed_request(ErrorCode::MalformedJson, format!("invalid JSON body: {err}"))
    })
}

fn query_error(error: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    malformed_request(
        ErrorCode::InvalidQuery,
        format!("invalid query string: {error}"),
    )
    .into()
}

fn path_error(error: PathError, _req: &HttpRequest) -> actix_web::Error {
    malformed_request(ErrorCode::InvalidPath, format!("invalid path: {error}")).into()
}

/// JSON extractor configuration answering malformed bodies with `invalid_request`.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(json_error)
}

/// Query extractor configuration answering bad query strings with `invalid_request`.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(query_error)
}

/// Path extractor configuration answering bad path segments with `invalid_request`.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(path_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DonationStatus, ErrorCode as ApiErrorCode};
    use rstest::rstest;

    const STATUSES: &[&str] = &["available", "reserved", "donated", "cancelled"];

    #[rstest]
    fn donation_id_rejects_garbage_with_field_details() {
        let err = parse_donation_id("not-a-uuid".to_owned()).expect_err("invalid id");
        assert_eq!(err.code(), ApiErrorCode::InvalidRequest);
        let details = err.details().expect("details");
        assert_eq!(details["field"], "id");
        assert_eq!(details["value"], "not-a-uuid");
        assert_eq!(details["code"], "invalid_uuid");
    }

    #[rstest]
    fn timestamps_are_normalised_to_utc() {
        let parsed = parse_rfc3339_timestamp(
            "2026-03-01T12:00:00+05:30".to_owned(),
            FieldName::new("expiryDate"),
        )
        .expect("valid timestamp");
        assert_eq!(parsed.to_rfc3339(), "2026-03-01T06:30:00+00:00");
    }

    #[rstest]
    #[case(Some(0), None, "page")]
    #[case(None, Some(0), "limit")]
    #[case(Some(2), Some(101), "limit")]
    fn page_request_errors_name_the_field(
        #[case] page: Option<u32>,
        #[case] limit: Option<u32>,
        #[case] field: &str,
    ) {
        let err = parse_page_request(page, limit).expect_err("out of range");
        assert_eq!(err.details().expect("details")["field"], field);
    }

    #[rstest]
    fn status_filter_accepts_known_values_only() {
        let parsed: Option<DonationStatus> = parse_optional_enum(
            Some("reserved".to_owned()),
            FieldName::new("status"),
            STATUSES,
        )
        .expect("known status");
        assert_eq!(parsed, Some(DonationStatus::Reserved));

        let err = parse_optional_enum::<DonationStatus>(
            Some("lost".to_owned()),
            FieldName::new("status"),
            STATUSES,
        )
        .expect_err("unknown status");
        assert_eq!(err.details().expect("details")["code"], "invalid_value");
    }

    #[rstest]
    fn short_passwords_point_at_the_password_field() {
        let err = map_credential_error(CredentialValidationError::PasswordTooShort { min: 8 });
        assert_eq!(err.details().expect("details")["field"], "password");
    }
}
