pub mod admission;
pub mod sign_in_usecase;
pub mod sign_up_usecase;
