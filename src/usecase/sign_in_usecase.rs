use crate::{
    domain::{
        error::DomainError,
        models::{
            credential::HashedPassword,
            user::{Email, User},
        },
        repositories::user_repository::UserRepository,
        services::password_service::PasswordHasher,
    },
    usecase::admission::HashAdmission,
};

/// Password checked against when no account matches the email
const DUMMY_PASSWORD: &str = "no such account";

pub struct SignInUsecase<R: UserRepository, P: PasswordHasher> {
    user_repository: R,
    password_hasher: P,
    admission: HashAdmission,
    dummy_hash: HashedPassword,
}

impl<R: UserRepository, P: PasswordHasher> SignInUsecase<R, P> {
    /// Hashes a throwaway password once with the hasher's own parameters.
    pub fn new(
        user_repository: R,
        password_hasher: P,
        admission: HashAdmission,
    ) -> Result<Self, DomainError> {
        let dummy_hash = password_hasher.hash(DUMMY_PASSWORD)?;
        Ok(Self {
            user_repository,
            password_hasher,
            admission,
            dummy_hash,
        })
    }

    /// Unknown email and wrong password both yield `AuthenticationFailed`,
    /// and both pay for exactly one key derivation.
    /// A stored hash that cannot be decoded surfaces as `DomainError::Hash`.
    pub async fn sign_in(&self, email: String, password: String) -> Result<User, DomainError>
    where
        R: Send + Sync,
    {
        let credential = match Email::new(email) {
            Ok(email) => self.user_repository.find_credential_by_email(&email).await?,
            Err(_) => None,
        };

        let hasher = self.password_hasher.clone();
        let stored = credential
            .as_ref()
            .map_or_else(|| self.dummy_hash.clone(), |c| c.password_hash().clone());
        let outcome = self
            .admission
            .run(move || hasher.verify(&password, &stored))
            .await;

        match credential {
            Some(credential) => {
                credential.validate(outcome?)?;
                Ok(credential.into_user())
            }
            None => Err(DomainError::AuthenticationFailed),
        }
    }
}
