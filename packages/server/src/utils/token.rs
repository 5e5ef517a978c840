//! One-time tokens mailed to users (email verification, password reset).
//!
//! Only the SHA-256 of a token is stored, so a leaked database row can't be
//! replayed as a link.

use rand::Rng;
use rand::distr::Alphanumeric;
use sha2::{Digest, Sha256};

const TOKEN_LEN: usize = 48;

/// Generate a fresh URL-safe token.
pub fn generate() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
