use std::sync::Arc;

use crate::{
    domain::{
        error::{DomainError, RepositoryError},
        models::user::User,
        repositories::user_repository::UserRepository,
        services::password_service::PasswordHasher,
    },
    usecase::{
        sign_in_usecase::SignInUsecase,
        sign_up_usecase::{SignUpInput, SignUpUsecase},
    },
};
use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use serde::{Deserialize, Serialize};

// Request

/// json for sign-up request
#[derive(Serialize, Deserialize)]
pub struct SignUpRequest {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

/// json for sign-in request
#[derive(Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

// Response

#[derive(Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id().as_uuid().to_string(),
            email: user.email().as_str().to_string(),
            first_name: user.first_name().to_string(),
            last_name: user.last_name().to_string(),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/* Router Function and Handler Function */

/// Routes for `/signup` and `/signin`, meant to be nested under `/identity`
pub fn create_identity_router<
    R: UserRepository + Send + Sync + 'static,
    P: PasswordHasher,
>(
    sign_up_service: SignUpUsecase<R, P>,
    sign_in_service: SignInUsecase<R, P>,
) -> Router {
    let state = AppState {
        sign_up_service: Arc::new(sign_up_service),
        sign_in_service: Arc::new(sign_in_service),
    };

    Router::new()
        .route("/signup", post(sign_up::<R, P>))
        .route("/signin", post(sign_in::<R, P>))
        .with_state(state)
}

pub struct AppState<R: UserRepository, P: PasswordHasher> {
    pub sign_up_service: Arc<SignUpUsecase<R, P>>,
    pub sign_in_service: Arc<SignInUsecase<R, P>>,
}

impl<R: UserRepository, P: PasswordHasher> Clone for AppState<R, P> {
    fn clone(&self) -> Self {
        Self {
            sign_up_service: self.sign_up_service.clone(),
            sign_in_service: self.sign_in_service.clone(),
        }
    }
}

// handler function

/// handler function for sign-up
async fn sign_up<R: UserRepository + Send + Sync, P: PasswordHasher>(
    State(state): State<AppState<R, P>>,
    Json(payload): Json<SignUpRequest>,
) -> impl IntoResponse {
    let input = SignUpInput {
        email: payload.email,
        first_name: payload.first_name,
        last_name: payload.last_name,
        password: payload.password,
    };

    match state.sign_up_service.sign_up(input).await {
        Ok(user) => (StatusCode::CREATED, Json(UserResponse::from(user))).into_response(),
        Err(
            err @ (DomainError::WeakPassword | DomainError::InvalidEmail | DomainError::EmptyName),
        ) => error_response(StatusCode::BAD_REQUEST, err.to_string()),
        Err(DomainError::Repository(RepositoryError::Conflict(_))) => {
            error_response(StatusCode::CONFLICT, "Email already registered")
        }
        Err(err) => {
            tracing::error!("sign-up failed: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// handler function for sign-in
async fn sign_in<R: UserRepository + Send + Sync, P: PasswordHasher>(
    State(state): State<AppState<R, P>>,
    Json(payload): Json<SignInRequest>,
) -> impl IntoResponse {
    match state
        .sign_in_service
        .sign_in(payload.email, payload.password)
        .await
    {
        Ok(user) => (StatusCode::OK, Json(UserResponse::from(user))).into_response(),
        Err(DomainError::AuthenticationFailed) => {
            error_response(StatusCode::UNAUTHORIZED, "Authentication failed")
        }
        Err(DomainError::Hash(err)) => {
            // corrupted or tampered row, not a wrong password
            tracing::error!("stored password hash rejected: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
        Err(err) => {
            tracing::error!("sign-in failed: {err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}
