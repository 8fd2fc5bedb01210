//! Directory entity.

pub mod model;

pub use model::{CreateDirectory, Directory};
