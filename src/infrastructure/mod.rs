pub mod argon2_password_hasher;
pub mod entity;
pub mod phc_string;
pub mod user_repository;
