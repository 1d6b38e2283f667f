//! pairrank-server library
//!
//! JSON HTTP surface over the collection store and the ranking engine.

use std::sync::Arc;

use axum::Router;
use pairrank_common::RankingContext;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Ranking engine sharing the same pool
    pub ranking: Arc<RankingContext>,
}

impl AppState {
    pub fn new(db: SqlitePool, ranking: Arc<RankingContext>) -> Self {
        Self { db, ranking }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{delete, get, post};

    let collections = Router::new()
        .route(
            "/api/collections",
            get(api::list_collections).post(api::create_collection),
        )
        .route(
            "/api/collections/:id",
            get(api::get_collection).delete(api::delete_collection),
        )
        .route("/api/collections/:id/items", post(api::create_item))
        .route("/api/items/:id", delete(api::delete_item));

    let ranking = Router::new()
        .route(
            "/api/collections/:id/rank",
            get(api::next_matchup).post(api::submit_decision),
        )
        .route("/api/collections/:id/result", get(api::get_results));

    Router::new()
        .merge(collections)
        .merge(ranking)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
