/// Revocation list for access tokens invalidated before natural expiry.
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::security::hash_token;

pub async fn insert(
    pool: &PgPool,
    token: &str,
    user_id: Uuid,
    expires_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO revoked_access_tokens (token_hash, user_id, expires_at, created_at)
        VALUES ($1, $2, $3, CURRENT_TIMESTAMP)
        ON CONFLICT (token_hash) DO NOTHING
        "#,
    )
    .bind(hash_token(token))
    .bind(user_id)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn contains(pool: &PgPool, token: &str) -> Result<bool> {
    let revoked = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM revoked_access_tokens WHERE token_hash = $1)",
    )
    .bind(hash_token(token))
    .fetch_one(pool)
    .await?;

    Ok(revoked)
}

/// Delete entries whose token has passed its natural expiry. Stale rows
/// are harmless for correctness; this exists for operators to reclaim
/// space on their own schedule.
pub async fn cleanup_expired(pool: &PgPool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM revoked_access_tokens WHERE expires_at < NOW()")
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
