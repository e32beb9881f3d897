use async_trait::async_trait;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Schema, SqlErr,
};

use crate::{
    domain::{
        error::RepositoryError,
        models::{
            credential::{Credential, HashedPassword},
            user::{Email, User, UserId},
        },
        repositories::user_repository::UserRepository,
    },
    infrastructure::entity::users,
};

#[derive(Clone)]
pub struct PostgresUserRepository {
    db: DatabaseConnection,
}

impl PostgresUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Create the `users` table from the entity definition if it is missing.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let mut table = Schema::new(backend).create_table_from_entity(users::Entity);
    table.if_not_exists();
    db.execute(backend.build(&table)).await?;
    Ok(())
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create_user(
        &self,
        user: &User,
        password_hash: &HashedPassword,
    ) -> Result<(), RepositoryError> {
        let model = users::ActiveModel {
            id: Set(*user.id().as_uuid()),
            first_name: Set(user.first_name().to_string()),
            last_name: Set(user.last_name().to_string()),
            email: Set(user.email().as_str().to_string()),
            hashed_password: Set(password_hash.as_str().to_string()),
            created_at: Set(user.created_at().fixed_offset()),
            updated_at: Set(user.updated_at().fixed_offset()),
        };

        users::Entity::insert(model)
            .exec(&self.db)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }

    async fn find_credential_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Credential>, RepositoryError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email.as_str()))
            .one(&self.db)
            .await
            .map_err(map_db_error)?;

        match model {
            Some(model) => {
                let email = Email::new(model.email)
                    .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;
                let user = User::reconstruct(
                    UserId::from_uuid(model.id),
                    email,
                    model.first_name,
                    model.last_name,
                    model.created_at.naive_utc().and_utc(),
                    model.updated_at.naive_utc().and_utc(),
                )
                .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

                Ok(Some(Credential::new(
                    user,
                    HashedPassword::new(model.hashed_password),
                )))
            }
            None => Ok(None),
        }
    }
}

fn map_db_error(err: DbErr) -> RepositoryError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => RepositoryError::Conflict(detail),
        _ => RepositoryError::DatabaseError(err.to_string()),
    }
}
