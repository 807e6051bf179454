/// Database models for UpTask
///
/// Each model owns its SQL. Operations are associated functions generic over
/// [`sqlx::PgExecutor`], so the same call works against a pool or inside a
/// transaction (`&mut *tx`).
///
/// # Models
///
/// - `user`: accounts and their public projection
/// - `token`: six digit confirmation and password-reset codes
/// - `project`: projects, manager and team membership
/// - `task`: tasks, status and status history
/// - `note`: notes attached to tasks
///
/// # Example
///
/// ```no_run
/// use uptask_shared::models::user::{User, CreateUser};
/// use uptask_shared::models::token::Token;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let mut tx = pool.begin().await?;
/// let user = User::create(&mut *tx, CreateUser {
///     email: "user@example.com".to_string(),
///     name: "John Doe".to_string(),
///     password_hash: "$argon2id$...".to_string(),
/// }).await?;
/// Token::create(&mut *tx, user.id, "123456").await?;
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```

pub mod note;
pub mod project;
pub mod task;
pub mod token;
pub mod user;
