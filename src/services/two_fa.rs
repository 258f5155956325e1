/// Second-factor (TOTP) enrollment and verification.
use sqlx::PgPool;
use tracing::info;

use crate::db;
use crate::error::{AuthError, Result};
use crate::models::User;
use crate::security::totp;

#[derive(Clone)]
pub struct SecondFactorManager {
    db: PgPool,
    issuer: String,
}

impl SecondFactorManager {
    pub fn new(db: PgPool, issuer: String) -> Self {
        Self { db, issuer }
    }

    /// Generate a fresh secret for the user and persist it, replacing any
    /// previous secret. The factor stays disabled until the user proves
    /// possession via `verify_and_activate`.
    pub async fn generate_secret(&self, user: &User) -> Result<(String, String)> {
        let secret = totp::generate_secret();
        let uri = totp::provisioning_uri(&user.email, &self.issuer, &secret);

        db::users::set_totp_secret(&self.db, user.id, &secret).await?;

        info!(user_id = %user.id, "TOTP secret generated");
        Ok((secret, uri))
    }

    /// Check the code against the stored secret and, on success, flip the
    /// factor on. Subsequent logins will require a code.
    pub async fn verify_and_activate(&self, user: &User, code: &str) -> Result<()> {
        if !self.verify(user, code)? {
            return Err(AuthError::InvalidTotp);
        }

        db::users::enable_totp(&self.db, user.id).await?;

        info!(user_id = %user.id, "second factor activated");
        Ok(())
    }

    /// Side-effect-free code check, used at login time once the factor is
    /// enabled. A user without a stored secret never verifies.
    pub fn verify(&self, user: &User, code: &str) -> Result<bool> {
        match user.totp_secret.as_deref() {
            Some(secret) => totp::check(code, secret),
            None => Ok(false),
        }
    }
}
