use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(Uuid);
impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email(String);
impl Email {
    pub fn new(value: String) -> Result<Self, DomainError> {
        let value = value.trim().to_string();
        match value.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(Self(value)),
            _ => Err(DomainError::InvalidEmail),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct User {
    id: UserId,
    email: Email,
    first_name: String,
    last_name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Create a brand-new user with a fresh id and timestamps
    pub fn create(email: Email, first_name: String, last_name: String) -> Result<Self, DomainError> {
        let now = Utc::now();
        Self::reconstruct(UserId::new(), email, first_name, last_name, now, now)
    }

    pub fn reconstruct(
        id: UserId,
        email: Email,
        first_name: String,
        last_name: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        if first_name.trim().is_empty() {
            return Err(DomainError::EmptyName);
        }

        Ok(Self {
            id,
            email,
            first_name,
            last_name,
            created_at,
            updated_at,
        })
    }

    // getters only
    pub fn id(&self) -> &UserId {
        &self.id
    }
    pub fn email(&self) -> &Email {
        &self.email
    }
    pub fn first_name(&self) -> &str {
        &self.first_name
    }
    pub fn last_name(&self) -> &str {
        &self.last_name
    }
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
