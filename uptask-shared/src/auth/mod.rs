/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: HS256 session token creation and validation
/// - [`token`]: six digit confirmation and reset codes
/// - [`middleware`]: bearer header parsing and session authentication
/// - [`authorization`]: manager, member, author and team rules
///
/// # Example
///
/// ```no_run
/// use uptask_shared::auth::password::{hash_password, verify_password};
/// use uptask_shared::auth::jwt::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let token = create_token(&Claims::new(Uuid::new_v4()), "secret-key-at-least-32-bytes-long")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod token;
