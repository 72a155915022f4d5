//! HS256 JSON Web Token implementation of the `TokenCodec` port.
//!
//! Expiry is checked against the `now` supplied by the caller rather than the
//! system clock, so `jsonwebtoken`'s own `exp` validation is switched off.

use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::domain::ports::{TokenCodec, TokenCodecError};
use crate::domain::{IssuedToken, TokenClaims, UserId};

/// Shortest signing secret accepted in release builds, in bytes.
pub const TOKEN_SECRET_MIN_LEN: usize = 32;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Signs and verifies HS256 tokens carrying `sub`, `iat` and `exp`.
#[derive(Clone)]
pub struct JwtTokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtTokenCodec {
    /// Build a codec from a shared secret and token lifetime.
    pub fn new(secret: &Zeroizing<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "exp"]);
        validation
    }
}

fn timestamp(seconds: i64) -> Result<DateTime<Utc>, TokenCodecError> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| TokenCodecError::invalid(format!("timestamp {seconds} out of range")))
}

impl TokenCodec for JwtTokenCodec {
    fn issue(&self, subject: &UserId, now: DateTime<Utc>) -> Result<IssuedToken, TokenCodecError> {
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|error| TokenCodecError::signing(error.to_string()))?;
        Ok(IssuedToken {
            token: Zeroizing::new(token),
            expires_at,
        })
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<TokenClaims, TokenCodecError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &Self::validation())
            .map_err(|error| match error.kind() {
                ErrorKind::ExpiredSignature => TokenCodecError::expired(),
                _ => TokenCodecError::invalid(error.to_string()),
            })?;
        let claims = data.claims;
        let expires_at = timestamp(claims.exp)?;
        if now >= expires_at {
            return Err(TokenCodecError::expired());
        }
        let subject = UserId::new(&claims.sub)
            .map_err(|error| TokenCodecError::invalid(error.to_string()))?;
        Ok(TokenClaims {
            subject,
            issued_at: timestamp(claims.iat)?,
            expires_at,
        })
    }
}
