pub mod jwt;
pub mod password;
pub mod totp;

use sha2::{Digest, Sha256};

pub use jwt::{TokenKind, TokenSigner, VerifiedToken};

/// SHA-256 digest of a bearer token, used as the storage key for both the
/// refresh-token store and the revocation list. Raw token material never
/// lands in Postgres.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
