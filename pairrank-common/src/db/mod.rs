//! Database models and queries

pub mod collections;
pub mod init;
pub mod models;

pub use collections::*;
pub use init::*;
pub use models::*;
