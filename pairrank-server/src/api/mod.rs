//! HTTP API handlers for pairrank-server

pub mod collections;
pub mod error;
pub mod health;
pub mod ranking;
pub mod session_key;

pub use collections::{
    create_collection, create_item, delete_collection, delete_item, get_collection,
    list_collections,
};
pub use error::ApiError;
pub use health::health_routes;
pub use ranking::{get_results, next_matchup, submit_decision};
pub use session_key::SessionKey;
