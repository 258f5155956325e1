/// Signed bearer-token issuance and verification.
///
/// Access and refresh tokens use distinct HMAC secrets and distinct JWT
/// subjects, so a token of one kind can never pass verification as the
/// other even if the secrets leak independently.
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

const ACCESS_SUBJECT: &str = "accessApi";
const REFRESH_SUBJECT: &str = "refreshToken";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn subject(self) -> &'static str {
        match self {
            TokenKind::Access => ACCESS_SUBJECT,
            TokenKind::Refresh => REFRESH_SUBJECT,
        }
    }
}

/// Verification failure kinds. Callers surface different messages for
/// each, so the distinction is part of the contract.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token malformed or signature invalid")]
    Malformed,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    user_id: Uuid,
    iat: i64,
    exp: i64,
}

/// Decoded claims of a token that passed signature and expiry checks.
#[derive(Debug, Clone)]
pub struct VerifiedToken {
    pub user_id: Uuid,
    pub expires_at: i64,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

pub struct TokenSigner {
    access: KeyPair,
    refresh: KeyPair,
}

impl TokenSigner {
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl_secs: i64,
        refresh_ttl_secs: i64,
    ) -> Self {
        Self {
            access: KeyPair {
                encoding: EncodingKey::from_secret(access_secret.as_bytes()),
                decoding: DecodingKey::from_secret(access_secret.as_bytes()),
                ttl: Duration::seconds(access_ttl_secs),
            },
            refresh: KeyPair {
                encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
                decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
                ttl: Duration::seconds(refresh_ttl_secs),
            },
        }
    }

    pub fn issue_access(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.issue(user_id, TokenKind::Access)
    }

    pub fn issue_refresh(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.issue(user_id, TokenKind::Refresh)
    }

    fn issue(&self, user_id: Uuid, kind: TokenKind) -> anyhow::Result<String> {
        let keys = self.keys(kind);
        let now = Utc::now();
        let claims = Claims {
            sub: kind.subject().to_string(),
            user_id,
            iat: now.timestamp(),
            exp: (now + keys.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|e| anyhow::anyhow!("failed to sign {:?} token: {e}", kind))
    }

    /// Signature check first, then expiry. A token of the wrong kind
    /// (subject mismatch) is reported as `Malformed`.
    pub fn verify(&self, token: &str, kind: TokenKind) -> Result<VerifiedToken, TokenError> {
        let keys = self.keys(kind);

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.sub = Some(kind.subject().to_string());

        let data = decode::<Claims>(token, &keys.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;

        Ok(VerifiedToken {
            user_id: data.claims.user_id,
            expires_at: data.claims.exp,
        })
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }
}
