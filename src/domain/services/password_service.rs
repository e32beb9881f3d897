use crate::domain::{error::DomainError, models::credential::HashedPassword};

/// Service for hashing and verifying passwords
///
/// Both calls block the current thread for the whole key derivation; async
/// callers should run them through `HashAdmission`.
pub trait PasswordHasher: Clone + Send + Sync + 'static {
    /// Hash a plain text password
    fn hash(&self, plain_password: &str) -> Result<HashedPassword, DomainError>;

    /// Verify a plain text password against a hashed password.
    ///
    /// `Ok(false)` means the password is wrong; `Err` means the stored hash
    /// could not be used at all.
    fn verify(&self, plain_password: &str, hashed_password: &HashedPassword) -> Result<bool, DomainError>;
}
