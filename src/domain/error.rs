use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Password hash error: {0}")]
    Hash(#[from] HashError),

    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("Weak password (minimum 8 characters required)")]
    WeakPassword,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Empty name")]
    EmptyName,

    #[error("Password hashing unavailable")]
    HashingUnavailable,
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Failures of the credential codec and verifier.
///
/// A password that simply does not match is never one of these; it is
/// reported as `Ok(false)` by the verifier.
#[derive(Debug, Error)]
pub enum HashError {
    /// The OS random source could not produce a salt.
    #[error("random source unavailable: {0}")]
    RandomSource(String),

    #[error("malformed hash: {0}")]
    MalformedFormat(String),

    #[error("unsupported hash algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("unsupported hash version: {0}")]
    UnsupportedVersion(String),

    #[error("invalid hash parameters: {0}")]
    ParameterFormat(String),

    #[error("invalid base64 in {field}: {reason}")]
    Encoding { field: &'static str, reason: String },

    /// Rejected by the Argon2 primitive itself (e.g. salt shorter than 8 bytes).
    #[error("key derivation failed: {0}")]
    Derivation(argon2::Error),
}
