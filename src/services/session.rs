/// Session state machine: login, second-factor completion, refresh
/// rotation, logout, and per-request authentication.
///
/// A login attempt moves Unauthenticated -> Authenticated directly, or
/// Unauthenticated -> PendingSecondFactor -> Authenticated when a TOTP
/// factor is enrolled. The pending state is represented solely by an
/// entry in the temporary-token cache.
use chrono::{TimeZone, Utc};
use sqlx::PgPool;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::cache::TempTokenCache;
use crate::db;
use crate::error::{AuthError, Result};
use crate::security::jwt::TokenError;
use crate::security::{password, TokenKind, TokenSigner};
use crate::services::SecondFactorManager;

pub struct SessionManager {
    db: PgPool,
    signer: TokenSigner,
    temp_tokens: TempTokenCache,
    second_factor: SecondFactorManager,
    temp_token_ttl: Duration,
}

/// Bearer-token pair plus the profile fields returned alongside it.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Outcome of a successful password check.
#[derive(Debug, Clone)]
pub enum LoginOutcome {
    Authenticated(SessionTokens),
    SecondFactorRequired {
        temp_token: String,
        expires_in_seconds: u64,
    },
}

/// The authenticated caller of a protected operation, as established by
/// `authenticate`. Carries the raw token and its expiry so logout can
/// blacklist exactly what was presented.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: i64,
}

impl SessionManager {
    pub fn new(
        db: PgPool,
        signer: TokenSigner,
        second_factor: SecondFactorManager,
        temp_token_ttl: Duration,
    ) -> Self {
        Self {
            db,
            signer,
            temp_tokens: TempTokenCache::new(),
            second_factor,
            temp_token_ttl,
        }
    }

    pub fn second_factor(&self) -> &SecondFactorManager {
        &self.second_factor
    }

    /// Verify credentials and either issue a token pair or park the
    /// attempt behind a second-factor challenge. Unknown email and wrong
    /// password surface the same error.
    pub async fn login(&self, email: &str, plain_password: &str) -> Result<LoginOutcome> {
        let user = db::users::find_by_email(&self.db, email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        password::verify_password(plain_password, &user.password_hash)?;

        if user.totp_enabled {
            let temp_token = Uuid::new_v4().to_string();
            self.temp_tokens
                .put(&temp_token, user.id, self.temp_token_ttl);

            info!(user_id = %user.id, "login pending second factor");
            return Ok(LoginOutcome::SecondFactorRequired {
                temp_token,
                expires_in_seconds: self.temp_token_ttl.as_secs(),
            });
        }

        let tokens = self.issue_pair(&user).await?;
        info!(user_id = %user.id, "user logged in");
        Ok(LoginOutcome::Authenticated(tokens))
    }

    /// Complete a pending login with a TOTP code. A wrong code leaves the
    /// temporary token in place so the user can retry within its TTL; a
    /// correct code consumes it.
    pub async fn complete_second_factor(
        &self,
        temp_token: &str,
        code: &str,
    ) -> Result<SessionTokens> {
        let user_id = self
            .temp_tokens
            .get(temp_token)
            .ok_or(AuthError::TempTokenInvalid)?;

        let user = db::users::find_by_id(&self.db, user_id)
            .await?
            .ok_or(AuthError::TempTokenInvalid)?;

        if !self.second_factor.verify(&user, code)? {
            return Err(AuthError::InvalidTotp);
        }

        self.temp_tokens.remove(temp_token);

        let tokens = self.issue_pair(&user).await?;
        info!(user_id = %user.id, "second factor verified, user logged in");
        Ok(tokens)
    }

    /// Rotate a refresh token: exactly one refresh succeeds per issued
    /// token. Signature or expiry failure, a rotated-out token, and a
    /// never-issued token all collapse into the same error.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        let verified = self
            .signer
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(|_| AuthError::RefreshTokenInvalid)?;

        // The atomic delete-and-return is the arbiter: when the same token
        // is presented twice concurrently, only one claim gets the record.
        // It also runs before the replacement is minted, so a crash in
        // between loses the session and forces re-login; the store never
        // holds old and new as simultaneously valid.
        let record = db::refresh_tokens::claim(&self.db, refresh_token, verified.user_id)
            .await?
            .ok_or(AuthError::RefreshTokenInvalid)?;

        let access_token = self
            .signer
            .issue_access(record.user_id)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        let new_refresh = self
            .signer
            .issue_refresh(record.user_id)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        db::refresh_tokens::insert(&self.db, &new_refresh, record.user_id).await?;

        info!(user_id = %record.user_id, "refresh token rotated");
        Ok(TokenPair {
            access_token,
            refresh_token: new_refresh,
        })
    }

    /// Terminate every session lineage for the user and blacklist the
    /// access token that was presented, until its natural expiry. Safe to
    /// call twice: the second call finds nothing to remove and the
    /// blacklist insert is idempotent.
    pub async fn logout(&self, principal: &Principal) -> Result<()> {
        let removed = db::refresh_tokens::delete_all_for_user(&self.db, principal.user_id).await?;

        let expires_at = Utc
            .timestamp_opt(principal.expires_at, 0)
            .single()
            .unwrap_or_else(Utc::now);

        db::revoked_tokens::insert(&self.db, &principal.token, principal.user_id, expires_at)
            .await?;

        info!(
            user_id = %principal.user_id,
            refresh_tokens_removed = removed,
            "user logged out"
        );
        Ok(())
    }

    /// Establish the caller of a protected operation.
    ///
    /// Revocation is checked before signature verification, so a revoked
    /// token is rejected as revoked even if it would also fail (or pass)
    /// the cryptographic check.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<Principal> {
        let token = match token {
            Some(t) if !t.is_empty() => t,
            _ => return Err(AuthError::MissingToken),
        };

        if db::revoked_tokens::contains(&self.db, token).await? {
            warn!("rejected revoked access token");
            return Err(AuthError::TokenRevoked);
        }

        let verified = self
            .signer
            .verify(token, TokenKind::Access)
            .map_err(|e| match e {
                TokenError::Expired => AuthError::TokenExpired,
                TokenError::Malformed => AuthError::TokenMalformed,
            })?;

        Ok(Principal {
            user_id: verified.user_id,
            token: token.to_string(),
            expires_at: verified.expires_at,
        })
    }

    /// Sweep expired second-factor challenges; driven by a background
    /// interval task in `main`.
    pub fn purge_expired_temp_tokens(&self) {
        self.temp_tokens.purge_expired();
    }

    async fn issue_pair(&self, user: &crate::models::User) -> Result<SessionTokens> {
        let access_token = self
            .signer
            .issue_access(user.id)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        let refresh_token = self
            .signer
            .issue_refresh(user.id)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        db::refresh_tokens::insert(&self.db, &refresh_token, user.id).await?;

        Ok(SessionTokens {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            access_token,
            refresh_token,
        })
    }
}
