//! Session store: matchup rows for one (session key, collection)
//!
//! These functions do not lock anything themselves. Check-then-create and
//! winner recording must run under the [`RankingContext`] lock.
//!
//! [`RankingContext`]: crate::ranking::RankingContext

use crate::db::models::Matchup;
use crate::ranking::pairs::Pair;
use crate::{Error, Result};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

/// Outcome of a winner submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WinnerUpdate {
    /// A pending matchup was decided
    Recorded,
    /// No pending matchup matched (duplicate or stale submission)
    Ignored,
}

/// Decided vs total matchups in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionProgress {
    pub total: i64,
    pub decided: i64,
}

impl SessionProgress {
    pub fn pending(&self) -> i64 {
        self.total - self.decided
    }

    /// True when there is nothing to show yet, or anything left to decide
    pub fn has_pending(&self) -> bool {
        self.total == 0 || self.decided < self.total
    }
}

/// True iff at least one matchup row exists for the session
pub async fn session_exists(db: &SqlitePool, session_key: &str, collection_id: i64) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM matchups WHERE session_key = ? AND collection_id = ?)",
    )
    .bind(session_key)
    .bind(collection_id)
    .fetch_one(db)
    .await?;

    Ok(exists)
}

/// Insert one pending matchup per pair, all or nothing
///
/// Rows are inserted in `pairs` order, which becomes the presentation order.
/// Returns the number of rows inserted.
pub async fn create_session(
    db: &SqlitePool,
    session_key: &str,
    collection_id: i64,
    pairs: &[Pair],
) -> Result<u64> {
    let mut tx = db.begin().await?;
    let mut inserted = 0;

    for pair in pairs {
        let result = sqlx::query(
            "INSERT INTO matchups (session_key, first_item_id, second_item_id, collection_id)
             VALUES (?, ?, ?, ?)",
        )
        .bind(session_key)
        .bind(pair.first)
        .bind(pair.second)
        .bind(collection_id)
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;

    info!(session_key, collection_id, matchups = inserted, "Created ranking session");
    Ok(inserted)
}

/// First pending pair by creation order, or `None` if complete or empty
pub async fn next_pending_pair(
    db: &SqlitePool,
    session_key: &str,
    collection_id: i64,
) -> Result<Option<Pair>> {
    let row = sqlx::query_as::<_, (i64, i64)>(
        "SELECT first_item_id, second_item_id FROM matchups
         WHERE session_key = ? AND collection_id = ? AND winner_id IS NULL
         ORDER BY created_at ASC, id ASC
         LIMIT 1",
    )
    .bind(session_key)
    .bind(collection_id)
    .fetch_optional(db)
    .await?;

    Ok(row.map(|(first, second)| Pair::new(first, second)))
}

/// Decide the pending matchup `(first, second)`
///
/// `winner_id` must be `first_id` or `second_id`; anything else is an
/// integrity error and nothing is written. The update only touches a row
/// that is still pending, so a repeated submission is `Ignored`.
pub async fn record_winner(
    db: &SqlitePool,
    session_key: &str,
    collection_id: i64,
    first_id: i64,
    second_id: i64,
    winner_id: i64,
) -> Result<WinnerUpdate> {
    if !Pair::new(first_id, second_id).contains(winner_id) {
        warn!(
            session_key,
            collection_id, first_id, second_id, winner_id, "Rejected winner outside the matchup"
        );
        return Err(Error::Integrity(format!(
            "winner {} is not part of matchup ({}, {})",
            winner_id, first_id, second_id
        )));
    }

    let result = sqlx::query(
        "UPDATE matchups SET winner_id = ?
         WHERE session_key = ? AND collection_id = ?
           AND first_item_id = ? AND second_item_id = ?
           AND winner_id IS NULL",
    )
    .bind(winner_id)
    .bind(session_key)
    .bind(collection_id)
    .bind(first_id)
    .bind(second_id)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        debug!(
            session_key,
            collection_id, first_id, second_id, "No pending matchup, submission ignored"
        );
        Ok(WinnerUpdate::Ignored)
    } else {
        debug!(session_key, collection_id, first_id, second_id, winner_id, "Recorded winner");
        Ok(WinnerUpdate::Recorded)
    }
}

/// Total and decided matchup counts for the session
pub async fn session_progress(
    db: &SqlitePool,
    session_key: &str,
    collection_id: i64,
) -> Result<SessionProgress> {
    let (total, decided) = sqlx::query_as::<_, (i64, i64)>(
        "SELECT COUNT(*), COUNT(winner_id) FROM matchups
         WHERE session_key = ? AND collection_id = ?",
    )
    .bind(session_key)
    .bind(collection_id)
    .fetch_one(db)
    .await?;

    Ok(SessionProgress { total, decided })
}

/// True if the session has no matchups at all or any undecided one
pub async fn has_pending(db: &SqlitePool, session_key: &str, collection_id: i64) -> Result<bool> {
    Ok(session_progress(db, session_key, collection_id)
        .await?
        .has_pending())
}

/// Every matchup of the session in creation order
pub async fn list_matchups(
    db: &SqlitePool,
    session_key: &str,
    collection_id: i64,
) -> Result<Vec<Matchup>> {
    let matchups = sqlx::query_as::<_, Matchup>(
        "SELECT id, session_key, first_item_id, second_item_id, winner_id, collection_id, created_at
         FROM matchups
         WHERE session_key = ? AND collection_id = ?
         ORDER BY created_at ASC, id ASC",
    )
    .bind(session_key)
    .bind(collection_id)
    .fetch_all(db)
    .await?;

    Ok(matchups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_collection, create_item, open_in_memory};
    use crate::ranking::pairs::pairs_for_ids;

    const KEY: &str = "127.0.0.1";

    /// Collection with `n` items; returns (collection id, item ids)
    async fn seed(db: &SqlitePool, n: usize) -> (i64, Vec<i64>) {
        let c = create_collection(db, "Seed").await.unwrap();
        let mut ids = Vec::new();
        for i in 0..n {
            ids.push(create_item(db, c.id, &format!("item {}", i), None).await.unwrap().id);
        }
        (c.id, ids)
    }

    #[tokio::test]
    async fn test_create_session_and_walk_pending() {
        let db = open_in_memory().await.unwrap();
        let (cid, ids) = seed(&db, 3).await;
        let pairs = pairs_for_ids(ids.clone());

        assert!(!session_exists(&db, KEY, cid).await.unwrap());
        assert_eq!(create_session(&db, KEY, cid, &pairs).await.unwrap(), 3);
        assert!(session_exists(&db, KEY, cid).await.unwrap());

        // Presentation follows insertion order
        for pair in &pairs {
            assert_eq!(next_pending_pair(&db, KEY, cid).await.unwrap(), Some(*pair));
            let update = record_winner(&db, KEY, cid, pair.first, pair.second, pair.first)
                .await
                .unwrap();
            assert_eq!(update, WinnerUpdate::Recorded);
        }

        assert_eq!(next_pending_pair(&db, KEY, cid).await.unwrap(), None);
        assert!(!has_pending(&db, KEY, cid).await.unwrap());
    }

    #[tokio::test]
    async fn test_sessions_isolated_by_key() {
        let db = open_in_memory().await.unwrap();
        let (cid, ids) = seed(&db, 2).await;
        create_session(&db, KEY, cid, &pairs_for_ids(ids)).await.unwrap();

        assert!(!session_exists(&db, "10.0.0.9", cid).await.unwrap());
        assert_eq!(next_pending_pair(&db, "10.0.0.9", cid).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_record_winner_twice_changes_state_once() {
        let db = open_in_memory().await.unwrap();
        let (cid, ids) = seed(&db, 2).await;
        create_session(&db, KEY, cid, &pairs_for_ids(ids.clone())).await.unwrap();

        let first = record_winner(&db, KEY, cid, ids[0], ids[1], ids[1]).await.unwrap();
        let second = record_winner(&db, KEY, cid, ids[0], ids[1], ids[0]).await.unwrap();
        assert_eq!(first, WinnerUpdate::Recorded);
        assert_eq!(second, WinnerUpdate::Ignored);

        let matchups = list_matchups(&db, KEY, cid).await.unwrap();
        assert_eq!(matchups.len(), 1);
        assert_eq!(matchups[0].winner_id, Some(ids[1]));
    }

    #[tokio::test]
    async fn test_record_winner_rejects_outsider() {
        let db = open_in_memory().await.unwrap();
        let (cid, ids) = seed(&db, 3).await;
        create_session(&db, KEY, cid, &pairs_for_ids(ids.clone())).await.unwrap();

        let err = record_winner(&db, KEY, cid, ids[0], ids[1], ids[2])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Integrity(_)));

        let progress = session_progress(&db, KEY, cid).await.unwrap();
        assert_eq!(progress, SessionProgress { total: 3, decided: 0 });
        assert_eq!(progress.pending(), 3);
        assert!(list_matchups(&db, KEY, cid).await.unwrap().iter().all(Matchup::is_pending));
    }

    #[tokio::test]
    async fn test_record_winner_needs_stored_orientation() {
        let db = open_in_memory().await.unwrap();
        let (cid, ids) = seed(&db, 2).await;
        create_session(&db, KEY, cid, &pairs_for_ids(ids.clone())).await.unwrap();

        // Stored as (ids[0], ids[1]); the reversed tuple matches no row
        let update = record_winner(&db, KEY, cid, ids[1], ids[0], ids[0]).await.unwrap();
        assert_eq!(update, WinnerUpdate::Ignored);
    }

    #[tokio::test]
    async fn test_has_pending_without_matchups() {
        let db = open_in_memory().await.unwrap();
        let (empty, _) = seed(&db, 0).await;
        let (single, ids) = seed(&db, 1).await;
        create_session(&db, KEY, single, &pairs_for_ids(ids)).await.unwrap();

        assert!(has_pending(&db, KEY, empty).await.unwrap());
        assert!(has_pending(&db, KEY, single).await.unwrap());
        assert!(!session_exists(&db, KEY, single).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_bulk_insert_leaves_nothing() {
        let db = open_in_memory().await.unwrap();
        let (cid, ids) = seed(&db, 3).await;

        // Second pair references a missing item, so the foreign key fails mid-insert
        let pairs = vec![Pair::new(ids[0], ids[1]), Pair::new(ids[0], 9999)];
        assert!(create_session(&db, KEY, cid, &pairs).await.is_err());

        assert!(!session_exists(&db, KEY, cid).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_pair_rejected_by_index() {
        let db = open_in_memory().await.unwrap();
        let (cid, ids) = seed(&db, 2).await;

        let pairs = vec![Pair::new(ids[0], ids[1]), Pair::new(ids[1], ids[0])];
        assert!(create_session(&db, KEY, cid, &pairs).await.is_err());
        assert!(!session_exists(&db, KEY, cid).await.unwrap());
    }

    #[tokio::test]
    async fn test_deleting_item_removes_its_matchups() {
        let db = open_in_memory().await.unwrap();
        let (cid, ids) = seed(&db, 3).await;
        create_session(&db, KEY, cid, &pairs_for_ids(ids.clone())).await.unwrap();

        crate::db::delete_item(&db, ids[0]).await.unwrap();

        let remaining = list_matchups(&db, KEY, cid).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert!(remaining.iter().all(|m| m.first_item_id != ids[0] && m.second_item_id != ids[0]));
    }
}
