use crate::{
    domain::{
        error::DomainError,
        models::user::{Email, User},
        repositories::user_repository::UserRepository,
        services::password_service::PasswordHasher,
    },
    usecase::admission::HashAdmission,
};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct SignUpInput {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

pub struct SignUpUsecase<R: UserRepository, P: PasswordHasher> {
    user_repository: R,
    password_hasher: P,
    admission: HashAdmission,
}

impl<R: UserRepository, P: PasswordHasher> SignUpUsecase<R, P> {
    pub fn new(user_repository: R, password_hasher: P, admission: HashAdmission) -> Self {
        Self {
            user_repository,
            password_hasher,
            admission,
        }
    }

    pub async fn sign_up(&self, input: SignUpInput) -> Result<User, DomainError>
    where
        R: Send + Sync,
    {
        // Validate password strength
        if input.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::WeakPassword);
        }

        let email = Email::new(input.email)?;
        let user = User::create(email, input.first_name, input.last_name)?;

        // Hash password
        let hasher = self.password_hasher.clone();
        let password = input.password;
        let password_hash = self.admission.run(move || hasher.hash(&password)).await?;

        self.user_repository
            .create_user(&user, &password_hash)
            .await?;

        tracing::info!(user_id = %user.id().as_uuid(), "user signed up");
        Ok(user)
    }
}
