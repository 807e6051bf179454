/// Confirmation and password-reset codes
///
/// A token is a six digit code mailed to the user. It is looked up by value,
/// is valid for a limited time after `created_at` and is deleted as soon as it
/// is redeemed.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tokens (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     token VARCHAR(6) NOT NULL,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Default lifetime of a code in minutes
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 10;

/// A one-time code owned by a user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: Uuid,

    /// The six digit code itself
    pub token: String,

    /// Owner of the code
    pub user_id: Uuid,

    pub created_at: DateTime<Utc>,
}

impl Token {
    /// Whether the code is still redeemable at `now` given its lifetime
    pub fn is_live(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        self.created_at > now - ttl
    }

    /// Stores a new code for a user
    ///
    /// Codes are not deduplicated: a user may hold several outstanding codes.
    pub async fn create<'e, E>(executor: E, user_id: Uuid, token: &str) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let token = sqlx::query_as::<_, Token>(
            r#"
            INSERT INTO tokens (token, user_id)
            VALUES ($1, $2)
            RETURNING id, token, user_id, created_at
            "#,
        )
        .bind(token)
        .bind(user_id)
        .fetch_one(executor)
        .await?;

        Ok(token)
    }

    /// Finds a code by value that was issued after `issued_after`
    ///
    /// Older codes are treated as absent even before the purge removes them.
    /// If two live rows share a value, the newest one wins.
    pub async fn find_live<'e, E>(
        executor: E,
        token: &str,
        issued_after: DateTime<Utc>,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let token = sqlx::query_as::<_, Token>(
            r#"
            SELECT id, token, user_id, created_at
            FROM tokens
            WHERE token = $1 AND created_at > $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(token)
        .bind(issued_after)
        .fetch_optional(executor)
        .await?;

        Ok(token)
    }

    /// Deletes a code by ID
    ///
    /// # Returns
    ///
    /// True if the code existed
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM tokens WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes every code issued at or before `issued_before`
    ///
    /// # Returns
    ///
    /// Number of codes removed
    pub async fn purge_expired<'e, E>(
        executor: E,
        issued_before: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM tokens WHERE created_at <= $1")
            .bind(issued_before)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
