/// Server-side login sessions
///
/// A session token is only honoured while its row exists and has not
/// expired. Logging out deletes the row.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE sessions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     expires_at TIMESTAMPTZ NOT NULL
/// );
/// ```

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Opens a session for `user_id` lasting `ttl`
    pub async fn create(pool: &PgPool, user_id: i64, ttl: Duration) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (user_id, expires_at)
            VALUES ($1, $2)
            RETURNING id, user_id, created_at, expires_at
            "#,
        )
        .bind(user_id)
        .bind(Utc::now() + ttl)
        .fetch_one(pool)
        .await
    }

    /// Resolves a live session to its user's `(id, username)`
    ///
    /// Returns `None` if the session is gone, expired, or belongs to a
    /// different user than the token claims.
    pub async fn find_active_user(
        pool: &PgPool,
        id: Uuid,
        user_id: i64,
    ) -> Result<Option<(i64, String)>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT u.id, u.username
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.id = $1 AND s.user_id = $2 AND s.expires_at > NOW()
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Ends a session; false if it was already gone
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Purges expired sessions, returning how many were removed
    pub async fn delete_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(pool)
            .await?;

        let removed = result.rows_affected();
        if removed > 0 {
            info!(removed, "Purged expired sessions");
        }

        Ok(removed)
    }
}
