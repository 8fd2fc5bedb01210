//! # cloudkeep-database
//!
//! SQLite database connection management and concrete repository
//! implementations for all CloudKeep entities. Multi-statement mutations
//! (cascading deletes) run inside a single transaction here so that
//! partial deletions are never observed by concurrent readers.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
