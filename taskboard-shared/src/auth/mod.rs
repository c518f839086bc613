/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and the signup password policy
/// - [`jwt`]: access/refresh token issuance and validation
/// - [`middleware`]: bearer authentication and tenant-context resolution
/// - [`access`]: pluggable project access strategies
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::password::{hash_password, verify_password};
/// use taskboard_shared::auth::jwt::{create_token, Claims, TokenType};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("password123")?;
/// assert!(verify_password("password123", &hash)?);
///
/// let token = create_token(&Claims::new(Uuid::new_v4(), TokenType::Access), "secret-key")?;
/// # Ok(())
/// # }
/// ```

pub mod access;
pub mod jwt;
pub mod middleware;
pub mod password;
