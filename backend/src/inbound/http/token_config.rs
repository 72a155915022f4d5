//! Access token configuration parsing and validation.
//!
//! Token settings come from the environment so they can be mounted as
//! secrets. Debug builds fall back to defaults with a warning; release builds
//! require every toggle to be explicit and valid.

use std::path::PathBuf;

use argon2::password_hash::rand_core::{OsRng, RngCore};
use chrono::Duration;
use mockable::Env;
use tracing::warn;
use zeroize::Zeroizing;

use crate::outbound::security::TOKEN_SECRET_MIN_LEN;

const TOKEN_SECRET_DEFAULT_PATH: &str = "/var/run/secrets/token_secret";
const DEFAULT_TTL_MINUTES: i64 = 60;
const MAX_TTL_MINUTES: i64 = 60 * 24 * 30;
const SECRET_FILE_ENV: &str = "TOKEN_SECRET_FILE";
const TTL_ENV: &str = "TOKEN_TTL_MINUTES";
const ALLOW_EPHEMERAL_ENV: &str = "TOKEN_ALLOW_EPHEMERAL";
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const TTL_EXPECTED: &str = "whole minutes between 1 and 43200";

/// Build mode for token configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds tolerate defaults and emit warnings for missing toggles.
    Debug,
    /// Release builds require explicit, valid toggles.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use foodshare::inbound::http::token_config::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// if cfg!(debug_assertions) {
    ///     assert_eq!(mode, BuildMode::Debug);
    /// } else {
    ///     assert_eq!(mode, BuildMode::Release);
    /// }
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Signing secret and lifetime for issued access tokens.
pub struct TokenSettings {
    /// HS256 shared secret.
    pub secret: Zeroizing<Vec<u8>>,
    /// Lifetime of each issued token.
    pub ttl: Duration,
}

/// Errors raised while validating token configuration.
#[derive(thiserror::Error, Debug)]
pub enum TokenConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    /// A variable is present but contains an invalid value.
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    /// Reading the secret file failed.
    #[error("failed to read token secret at {path}: {source}")]
    SecretRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The secret file exists but is too short for release builds.
    #[error("token secret at {path} too short: need >= {min_len} bytes, got {length}")]
    SecretTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    /// Release builds must not sign with a throwaway secret.
    #[error("TOKEN_ALLOW_EPHEMERAL must be 0 in release builds")]
    EphemeralNotAllowed,
}

/// Build token settings from environment variables and build mode.
///
/// # Examples
///
/// ```rust
/// use foodshare::inbound::http::token_config::{BuildMode, token_settings_from_env};
/// use mockable::MockEnv;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let secret_path = std::env::temp_dir().join("token_secret_example");
/// std::fs::write(&secret_path, vec![b'k'; 32])?;
///
/// let secret_path = secret_path.to_str().expect("valid path").to_owned();
/// let mut env = MockEnv::new();
/// env.expect_string().returning(move |name| match name {
///     "TOKEN_SECRET_FILE" => Some(secret_path.clone()),
///     "TOKEN_TTL_MINUTES" => Some("15".to_owned()),
///     "TOKEN_ALLOW_EPHEMERAL" => Some("0".to_owned()),
///     _ => None,
/// });
///
/// let settings = token_settings_from_env(&env, BuildMode::Release)?;
/// assert_eq!(settings.ttl.num_minutes(), 15);
/// # Ok(())
/// # }
/// ```
pub fn token_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<TokenSettings, TokenConfigError> {
    let ttl = ttl_from_env(env, mode)?;
    let allow_ephemeral = allow_ephemeral_from_env(env, mode)?;
    let secret = secret_from_env(env, mode, allow_ephemeral)?;
    Ok(TokenSettings { secret, ttl })
}

fn ttl_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<Duration, TokenConfigError> {
    let default = Duration::minutes(DEFAULT_TTL_MINUTES);
    let Some(value) = env.string(TTL_ENV) else {
        if mode.is_debug() {
            warn!("TOKEN_TTL_MINUTES not set; using default");
            return Ok(default);
        }
        return Err(TokenConfigError::MissingEnv { name: TTL_ENV });
    };
    match value.trim().parse::<i64>() {
        Ok(minutes) if (1..=MAX_TTL_MINUTES).contains(&minutes) => Ok(Duration::minutes(minutes)),
        _ if mode.is_debug() => {
            warn!(value = %value, "invalid TOKEN_TTL_MINUTES; using default");
            Ok(default)
        }
        _ => Err(TokenConfigError::InvalidEnv {
            name: TTL_ENV,
            value,
            expected: TTL_EXPECTED,
        }),
    }
}

fn allow_ephemeral_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<bool, TokenConfigError> {
    match env.string(ALLOW_EPHEMERAL_ENV) {
        Some(value) => match parse_bool(&value) {
            Some(true) if mode.is_debug() => Ok(true),
            Some(true) => Err(TokenConfigError::EphemeralNotAllowed),
            Some(false) => Ok(false),
            None if mode.is_debug() => {
                warn!(
                    value = %value,
                    "invalid TOKEN_ALLOW_EPHEMERAL; defaulting to disabled"
                );
                Ok(false)
            }
            None => Err(TokenConfigError::InvalidEnv {
                name: ALLOW_EPHEMERAL_ENV,
                value,
                expected: BOOL_EXPECTED,
            }),
        },
        None if mode.is_debug() => {
            warn!("TOKEN_ALLOW_EPHEMERAL not set; defaulting to disabled");
            Ok(false)
        }
        None => Err(TokenConfigError::MissingEnv {
            name: ALLOW_EPHEMERAL_ENV,
        }),
    }
}

fn secret_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<Zeroizing<Vec<u8>>, TokenConfigError> {
    let path = PathBuf::from(
        env.string(SECRET_FILE_ENV)
            .unwrap_or_else(|| TOKEN_SECRET_DEFAULT_PATH.to_owned()),
    );

    match std::fs::read(&path) {
        Ok(bytes) => {
            let bytes = Zeroizing::new(bytes);
            let length = bytes.len();
            if mode == BuildMode::Release && length < TOKEN_SECRET_MIN_LEN {
                return Err(TokenConfigError::SecretTooShort {
                    path,
                    length,
                    min_len: TOKEN_SECRET_MIN_LEN,
                });
            }
            Ok(bytes)
        }
        Err(error) if mode.is_debug() || allow_ephemeral => {
            warn!(
                path = %path.display(),
                error = %error,
                "using temporary token secret (dev only); tokens will not survive a restart"
            );
            Ok(ephemeral_secret())
        }
        Err(error) => Err(TokenConfigError::SecretRead {
            path,
            source: error,
        }),
    }
}

fn ephemeral_secret() -> Zeroizing<Vec<u8>> {
    let mut secret = Zeroizing::new(vec![0_u8; TOKEN_SECRET_MIN_LEN * 2]);
    OsRng.fill_bytes(&mut secret);
    secret
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}
