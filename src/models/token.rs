use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// One live session lineage link. A user may hold many records
/// concurrently (multi-device); each token digest appears at most once.
#[derive(Debug, Clone, FromRow)]
pub struct RefreshTokenRecord {
    pub token_hash: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

