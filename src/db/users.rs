/// User repository
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AuthError, Result};
use crate::models::User;

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn find_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool> {
    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(pool)
            .await?;

    Ok(exists)
}

pub async fn create_user(
    pool: &PgPool,
    name: &str,
    email: &str,
    password_hash: &str,
    role: &str,
) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, name, email, password_hash, role, totp_enabled, totp_secret, created_at)
        VALUES (gen_random_uuid(), $1, $2, $3, $4, false, NULL, CURRENT_TIMESTAMP)
        RETURNING *
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        // Two registrations racing past the pre-insert existence check
        // both reach here; the unique index on email decides.
        if e.as_database_error()
            .is_some_and(|db| db.is_unique_violation())
        {
            AuthError::DuplicateEmail
        } else {
            AuthError::from(e)
        }
    })?;

    Ok(user)
}

/// Store a freshly generated TOTP secret. Overwrites any previous secret;
/// enabling the factor is a separate step gated on code verification.
pub async fn set_totp_secret(pool: &PgPool, user_id: Uuid, secret: &str) -> Result<()> {
    sqlx::query("UPDATE users SET totp_secret = $1 WHERE id = $2")
        .bind(secret)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn enable_totp(pool: &PgPool, user_id: Uuid) -> Result<()> {
    sqlx::query("UPDATE users SET totp_enabled = true WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}
