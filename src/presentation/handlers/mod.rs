pub mod identity_handler;
