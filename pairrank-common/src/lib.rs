//! # pairrank common library
//!
//! Shared code for the pairrank service:
//! - Database initialization, models and collection/item queries
//! - Pairwise ranking engine (pair generation, session store, results)
//! - Configuration loading
//! - Error types

pub mod config;
pub mod db;
pub mod error;
pub mod ranking;

pub use error::{Error, Result};
pub use ranking::RankingContext;
