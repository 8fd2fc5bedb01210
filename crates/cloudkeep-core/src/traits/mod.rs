//! Trait seams between crates.

pub mod content;

pub use content::{ByteStream, ContentStore};
