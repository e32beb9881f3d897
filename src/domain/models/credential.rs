use crate::domain::{error::DomainError, models::user::User};

/// Cost parameters of an Argon2id derivation.
///
/// These are generation defaults only. Verification always uses the
/// parameters embedded in the stored hash, so changing them never breaks
/// existing credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub time_cost: u32,
    /// Lanes
    pub parallelism: u8,
    /// Derived key length in bytes
    pub key_len: usize,
    /// Salt length in bytes
    pub salt_len: usize,
}

impl HashParams {
    pub const DEFAULT_MEMORY_KIB: u32 = 19 * 1024;
    pub const DEFAULT_TIME_COST: u32 = 2;
    pub const DEFAULT_PARALLELISM: u8 = 1;
    pub const DEFAULT_KEY_LEN: usize = 32;
    pub const DEFAULT_SALT_LEN: usize = 16;

    /// Working memory reserved by one in-flight hash or verify call.
    pub fn memory_bytes(&self) -> u64 {
        u64::from(self.memory_kib) * 1024
    }
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_kib: Self::DEFAULT_MEMORY_KIB,
            time_cost: Self::DEFAULT_TIME_COST,
            parallelism: Self::DEFAULT_PARALLELISM,
            key_len: Self::DEFAULT_KEY_LEN,
            salt_len: Self::DEFAULT_SALT_LEN,
        }
    }
}

/// Value object representing an encoded password hash
/// (`$argon2id$v=19$m=..,t=..,p=..$salt$key`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedPassword(String);

impl HashedPassword {
    /// Create a new HashedPassword from an already encoded string
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    /// Get the hash as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A user together with the stored password hash, as loaded for sign-in.
#[derive(Debug, Clone)]
pub struct Credential {
    user: User,
    password_hash: HashedPassword,
}

impl Credential {
    pub fn new(user: User, password_hash: HashedPassword) -> Self {
        Self {
            user,
            password_hash,
        }
    }

    pub fn validate(&self, is_valid: bool) -> Result<(), DomainError> {
        if is_valid {
            Ok(())
        } else {
            Err(DomainError::AuthenticationFailed)
        }
    }

    pub fn password_hash(&self) -> &HashedPassword {
        &self.password_hash
    }

    pub fn into_user(self) -> User {
        self.user
    }
}
