//! Pairwise ranking engine
//!
//! A ranking session is the set of matchup rows for one
//! (session key, collection). It is generated once, decided one matchup at
//! a time, and turned into a ranked table when nothing is pending.
//!
//! [`RankingContext`] owns the storage handle and the lock that serializes
//! the ranking flow, so two concurrent starts for the same session cannot
//! both see "no session" and insert the pair set twice.

pub mod pairs;
pub mod results;
pub mod session;

pub use pairs::{generate_pairs, shuffle_pairs, Pair, PairOrder};
pub use results::{MatchupView, Rank, RankingResults};
pub use session::{SessionProgress, WinnerUpdate};

use crate::db;
use crate::Result;
use rand::Rng;
use serde::Serialize;
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use tracing::debug;

/// Result of [`RankingContext::start_session`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStart {
    /// True if this call generated the matchups
    pub created: bool,
    /// Matchups in the session after the call
    pub matchups: i64,
}

/// Storage handle plus the lock guarding the ranking flow
///
/// One lock per context: every session shares it, trading cross-session
/// throughput for a simple correctness argument.
pub struct RankingContext {
    db: SqlitePool,
    lock: Mutex<()>,
    pair_order: PairOrder,
}

impl RankingContext {
    pub fn new(db: SqlitePool, pair_order: PairOrder) -> Self {
        Self {
            db,
            lock: Mutex::new(()),
            pair_order,
        }
    }

    pub fn db(&self) -> &SqlitePool {
        &self.db
    }

    /// Generate the session's matchups unless they already exist
    ///
    /// Collections with fewer than two items produce no matchups; the call
    /// succeeds with `matchups == 0`. Fails with `NotFound` for an unknown
    /// collection.
    pub async fn start_session<R: Rng + ?Sized>(
        &self,
        session_key: &str,
        collection_id: i64,
        rng: &mut R,
    ) -> Result<SessionStart> {
        let _guard = self.lock.lock().await;

        if session::session_exists(&self.db, session_key, collection_id).await? {
            let progress = session::session_progress(&self.db, session_key, collection_id).await?;
            debug!(session_key, collection_id, "Resuming ranking session");
            return Ok(SessionStart {
                created: false,
                matchups: progress.total,
            });
        }

        let collection = db::get_collection(&self.db, collection_id).await?;
        let mut pairs = generate_pairs(&collection.items);
        if pairs.is_empty() {
            debug!(session_key, collection_id, "Collection has fewer than two items");
            return Ok(SessionStart {
                created: false,
                matchups: 0,
            });
        }

        if self.pair_order == PairOrder::Shuffled {
            shuffle_pairs(&mut pairs, rng);
        }

        let inserted = session::create_session(&self.db, session_key, collection_id, &pairs).await?;

        Ok(SessionStart {
            created: true,
            matchups: inserted as i64,
        })
    }

    /// Next undecided pair, or `None` when complete or empty
    pub async fn next_pending_pair(&self, session_key: &str, collection_id: i64) -> Result<Option<Pair>> {
        let _guard = self.lock.lock().await;
        session::next_pending_pair(&self.db, session_key, collection_id).await
    }

    /// Record a decision; see [`session::record_winner`]
    pub async fn record_winner(
        &self,
        session_key: &str,
        collection_id: i64,
        first_id: i64,
        second_id: i64,
        winner_id: i64,
    ) -> Result<WinnerUpdate> {
        let _guard = self.lock.lock().await;
        session::record_winner(&self.db, session_key, collection_id, first_id, second_id, winner_id)
            .await
    }

    pub async fn has_pending(&self, session_key: &str, collection_id: i64) -> Result<bool> {
        session::has_pending(&self.db, session_key, collection_id).await
    }

    pub async fn progress(&self, session_key: &str, collection_id: i64) -> Result<SessionProgress> {
        session::session_progress(&self.db, session_key, collection_id).await
    }

    pub async fn compute_results(&self, session_key: &str, collection_id: i64) -> Result<RankingResults> {
        results::compute_results(&self.db, session_key, collection_id).await
    }
}
