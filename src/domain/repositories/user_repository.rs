use async_trait::async_trait;

use crate::domain::{
    error::RepositoryError,
    models::{
        credential::{Credential, HashedPassword},
        user::{Email, User},
    },
};

#[async_trait]
pub trait UserRepository {
    /// Persist a new user with its encoded password hash, stored verbatim
    async fn create_user(
        &self,
        user: &User,
        password_hash: &HashedPassword,
    ) -> Result<(), RepositoryError>;

    async fn find_credential_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Credential>, RepositoryError>;
}
