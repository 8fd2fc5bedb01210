//! Concrete repository implementations.

pub mod directory;
pub mod file;
pub mod share;
pub mod user;
