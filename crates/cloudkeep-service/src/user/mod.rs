//! User accounts.

pub mod service;

pub use service::UserService;
