//! Item sharing between users.

pub mod service;

pub use service::ShareService;
