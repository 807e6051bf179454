/// User model and database operations
///
/// Users register unconfirmed and become confirmed once they redeem a
/// confirmation code. Accounts are never hard-deleted.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     name VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     confirmed BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use uptask_shared::models::user::{User, CreateUser};
/// use uptask_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let new_user = CreateUser {
///     email: "user@example.com".to_string(),
///     name: "John Doe".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// };
///
/// let user = User::create(&pool, new_user).await?;
/// println!("Created user: {}", user.id);
///
/// let found = User::find_by_email(&pool, "user@example.com").await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// User model representing an account
///
/// Passwords are stored as Argon2id hashes and never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Email address, unique and stored lowercase
    pub email: String,

    /// Display name
    pub name: String,

    /// Argon2id password hash
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Whether the account has been confirmed through the emailed code
    pub confirmed: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Public projection of a user (`id`, `name`, `email`)
///
/// This is what other users get to see: team listings, status history
/// and note authors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Email address, already lowercased by the caller
    pub email: String,

    /// Display name
    pub name: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,
}

const USER_COLUMNS: &str = "id, email, name, password_hash, confirmed, created_at, updated_at";

impl User {
    /// Creates a new, unconfirmed user
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Email already exists (unique constraint violation)
    /// - Database connection fails
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use uptask_shared::models::user::{User, CreateUser};
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
    /// let user = User::create(&pool, CreateUser {
    ///     email: "user@example.com".to_string(),
    ///     name: "John Doe".to_string(),
    ///     password_hash: "$argon2id$...".to_string(),
    /// }).await?;
    /// assert!(!user.confirmed);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn create<'e, E>(executor: E, data: CreateUser) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(data.email)
        .bind(data.name)
        .bind(data.password_hash)
        .fetch_one(executor)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    ///
    /// # Returns
    ///
    /// The user if found, None otherwise
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    /// Finds a user by email address
    ///
    /// Emails are stored lowercase, so callers pass a lowercased address.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use uptask_shared::models::user::User;
    /// # use sqlx::PgPool;
    /// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
    /// if let Some(u) = User::find_by_email(&pool, "user@example.com").await? {
    ///     println!("Found user: {}", u.id);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    /// Loads the public projections of the given users
    ///
    /// Results follow the order of `ids`; ids with no matching user are
    /// skipped.
    pub async fn summaries<'e, E>(executor: E, ids: &[Uuid]) -> Result<Vec<UserSummary>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let users = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.name, u.email
            FROM UNNEST($1::UUID[]) WITH ORDINALITY AS wanted(id, ord)
            JOIN users u ON u.id = wanted.id
            ORDER BY wanted.ord
            "#,
        )
        .bind(ids)
        .fetch_all(executor)
        .await?;

        Ok(users)
    }

    /// Rewrites name and email in place
    ///
    /// # Returns
    ///
    /// The updated user, None if the user doesn't exist
    ///
    /// # Errors
    ///
    /// Returns a unique violation if the email belongs to another user
    pub async fn update_profile<'e, E>(
        executor: E,
        id: Uuid,
        name: &str,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = $2, email = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_optional(executor)
        .await?;

        Ok(user)
    }

    /// Replaces the stored password hash
    ///
    /// # Returns
    ///
    /// True if the user was found and updated
    pub async fn set_password_hash<'e, E>(
        executor: E,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Flips the confirmed flag to true
    pub async fn mark_confirmed<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE users SET confirmed = TRUE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
