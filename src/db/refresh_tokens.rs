/// Refresh-token store. One row per live session lineage link; the token
/// digest is the primary key, so a token string can never map to two
/// records. No in-process caching: every lookup round-trips Postgres.
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::Result;
use crate::models::RefreshTokenRecord;
use crate::security::hash_token;

pub async fn insert(pool: &PgPool, token: &str, user_id: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (token_hash, user_id, created_at)
        VALUES ($1, $2, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(hash_token(token))
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Atomically consume the record for this exact (token, user) pair. The
/// single DELETE arbitrates concurrent presentations of the same token:
/// exactly one caller gets the record back, every other caller gets
/// `None`. A token that was rotated out, or that was signed with a leaked
/// secret but never issued, also comes back `None`.
pub async fn claim(
    pool: &PgPool,
    token: &str,
    user_id: Uuid,
) -> Result<Option<RefreshTokenRecord>> {
    let record = sqlx::query_as::<_, RefreshTokenRecord>(
        "DELETE FROM refresh_tokens WHERE token_hash = $1 AND user_id = $2 RETURNING *",
    )
    .bind(hash_token(token))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Remove every record for a user, terminating all session lineages at
/// once (logout is a broad invalidation, not per-device).
pub async fn delete_all_for_user(pool: &PgPool, user_id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM refresh_tokens WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
