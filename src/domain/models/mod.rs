pub mod credential;
pub mod user;
