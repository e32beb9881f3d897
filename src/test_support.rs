use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use crate::{
    domain::{
        error::RepositoryError,
        models::{
            credential::{Credential, HashParams, HashedPassword},
            user::{Email, User},
        },
        repositories::user_repository::UserRepository,
    },
    infrastructure::argon2_password_hasher::Argon2PasswordHasher,
};

/// Argon2 hasher with the smallest costs the primitive accepts
pub fn cheap_hasher() -> Argon2PasswordHasher {
    Argon2PasswordHasher::new(HashParams {
        memory_kib: 64,
        time_cost: 1,
        parallelism: 1,
        ..HashParams::default()
    })
}

/// Users keyed by email
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<Mutex<HashMap<String, Credential>>>,
}

impl InMemoryUserRepository {
    pub fn stored_hash(&self, email: &str) -> Option<HashedPassword> {
        self.users
            .lock()
            .unwrap()
            .get(email)
            .map(|credential| credential.password_hash().clone())
    }

    pub fn overwrite_hash(&self, email: &str, password_hash: HashedPassword) {
        let mut users = self.users.lock().unwrap();
        let user = users.remove(email).unwrap().into_user();
        users.insert(email.to_string(), Credential::new(user, password_hash));
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create_user(
        &self,
        user: &User,
        password_hash: &HashedPassword,
    ) -> Result<(), RepositoryError> {
        let mut users = self.users.lock().unwrap();
        let email = user.email().as_str().to_string();
        if users.contains_key(&email) {
            return Err(RepositoryError::Conflict(format!("{email} already registered")));
        }
        users.insert(email, Credential::new(user.clone(), password_hash.clone()));
        Ok(())
    }

    async fn find_credential_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Credential>, RepositoryError> {
        Ok(self.users.lock().unwrap().get(email.as_str()).cloned())
    }
}
