//! Share grant entity.

pub mod model;

pub use model::{CreateShareGrant, ItemType, ShareGrant};
