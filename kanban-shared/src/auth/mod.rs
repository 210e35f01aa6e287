/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`session`]: Signed session tokens issued at login
/// - [`middleware`]: Resolves the current user for each request
/// - [`access`]: Ownership-chain checks for kanban resources
///
/// # Example
///
/// ```no_run
/// use kanban_shared::auth::password::{hash_password, verify_password};
/// use kanban_shared::auth::session::{create_token, validate_token, SessionClaims};
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("pw1")?;
/// assert!(verify_password("pw1", &hash)?);
///
/// let claims = SessionClaims::new(42, Uuid::new_v4(), Duration::hours(1));
/// let token = create_token(&claims, "a-secret-that-is-at-least-32-bytes!")?;
/// let validated = validate_token(&token, "a-secret-that-is-at-least-32-bytes!")?;
/// assert_eq!(validated.sub, 42);
/// # Ok(())
/// # }
/// ```

pub mod access;
pub mod middleware;
pub mod password;
pub mod session;
