//! Ranking flow endpoints
//!
//! - GET  /api/collections/:id/rank   - start or resume a session, return the next pair
//! - POST /api/collections/:id/rank   - record the winner of a pair
//! - GET  /api/collections/:id/result - final table once every pair is decided

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use pairrank_common::db::{self, Collection, Item};
use pairrank_common::ranking::{MatchupView, Rank, SessionProgress, WinnerUpdate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ApiError, SessionKey};
use crate::AppState;

/// Response of GET /api/collections/:id/rank
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchupResponse {
    /// A pair is waiting for a decision
    Pending {
        first: Item,
        second: Item,
        progress: SessionProgress,
    },
    /// Every pair is decided; results are available
    Complete { progress: SessionProgress },
    /// Fewer than two items, nothing to rank
    NotRankable { item_count: usize },
}

#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub first_id: i64,
    pub second_id: i64,
    pub winner_id: i64,
}

#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    /// False when the pair was already decided (stale or repeated submission)
    pub recorded: bool,
    pub progress: SessionProgress,
}

/// Response of GET /api/collections/:id/result
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResultResponse {
    /// Undecided pairs remain, or ranking never started
    Pending { progress: SessionProgress },
    Complete {
        collection: Collection,
        ranks: Vec<Rank>,
        history: Vec<MatchupView>,
    },
}

/// GET /api/collections/:id/rank
pub async fn next_matchup(
    State(state): State<AppState>,
    Path(collection_id): Path<i64>,
    session: SessionKey,
) -> Result<Json<MatchupResponse>, ApiError> {
    let collection = db::get_collection(&state.db, collection_id).await?;
    if collection.items.len() < 2 {
        return Ok(Json(MatchupResponse::NotRankable {
            item_count: collection.items.len(),
        }));
    }

    let key = session.as_str();
    let mut rng = StdRng::from_entropy();
    let start = state.ranking.start_session(key, collection_id, &mut rng).await?;
    if start.created {
        info!(
            session_key = key,
            collection_id,
            matchups = start.matchups,
            "Started ranking session"
        );
    }

    let progress = state.ranking.progress(key, collection_id).await?;
    let response = match state.ranking.next_pending_pair(key, collection_id).await? {
        Some(pair) => MatchupResponse::Pending {
            first: db::get_item(&state.db, pair.first).await?,
            second: db::get_item(&state.db, pair.second).await?,
            progress,
        },
        None => MatchupResponse::Complete { progress },
    };

    Ok(Json(response))
}

/// POST /api/collections/:id/rank
pub async fn submit_decision(
    State(state): State<AppState>,
    Path(collection_id): Path<i64>,
    session: SessionKey,
    payload: Result<Json<DecisionRequest>, JsonRejection>,
) -> Result<Json<DecisionResponse>, ApiError> {
    let Json(decision) = payload?;
    let key = session.as_str();
    let update = state
        .ranking
        .record_winner(
            key,
            collection_id,
            decision.first_id,
            decision.second_id,
            decision.winner_id,
        )
        .await?;

    let progress = state.ranking.progress(key, collection_id).await?;

    Ok(Json(DecisionResponse {
        recorded: update == WinnerUpdate::Recorded,
        progress,
    }))
}

/// GET /api/collections/:id/result
pub async fn get_results(
    State(state): State<AppState>,
    Path(collection_id): Path<i64>,
    session: SessionKey,
) -> Result<Json<ResultResponse>, ApiError> {
    let collection = db::get_collection(&state.db, collection_id).await?;
    let key = session.as_str();

    if state.ranking.has_pending(key, collection_id).await? {
        let progress = state.ranking.progress(key, collection_id).await?;
        return Ok(Json(ResultResponse::Pending { progress }));
    }

    let results = state.ranking.compute_results(key, collection_id).await?;

    Ok(Json(ResultResponse::Complete {
        collection: collection.collection,
        ranks: results.ranks,
        history: results.history,
    }))
}
