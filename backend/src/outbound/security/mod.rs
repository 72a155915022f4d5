//! Credential adapters: password hashing and signed access tokens.

mod argon2_hasher;
mod jwt_token_codec;

pub use argon2_hasher::Argon2PasswordHasher;
pub use jwt_token_codec::{JwtTokenCodec, TOKEN_SECRET_MIN_LEN};
