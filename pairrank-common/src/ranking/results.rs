//! Ranking aggregation
//!
//! Wins and losses per item are counted from decided matchups, items are
//! sorted by wins, and a single bottom-up adjacent-swap pass uses
//! head-to-head results to reorder equal-win neighbours.
//!
//! The tie-break pass is deliberately partial: it moves a head-to-head
//! winner above the neighbour it beat, but cycles among three or more tied
//! items (A beat B, B beat C, C beat A) are not resolved.

use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;

use crate::Result;

/// Final standing of one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rank {
    pub item_id: i64,
    pub name: String,
    pub wins: i64,
    pub losses: i64,
    /// 1-based, assigned after sorting and tie-breaking
    pub position: usize,
}

/// A decided matchup with item names, for match history display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct MatchupView {
    pub matchup_id: i64,
    pub first_item_id: i64,
    pub first_name: String,
    pub second_item_id: i64,
    pub second_name: String,
    pub winner_id: i64,
    pub winner_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingResults {
    pub ranks: Vec<Rank>,
    pub history: Vec<MatchupView>,
}

/// Recorded winner for each unordered pair
#[derive(Debug, Clone, Default)]
pub struct HeadToHead {
    winners: HashMap<(i64, i64), i64>,
}

impl HeadToHead {
    pub fn record(&mut self, a: i64, b: i64, winner: i64) {
        self.winners.insert(Self::key(a, b), winner);
    }

    pub fn from_history(history: &[MatchupView]) -> Self {
        let mut h2h = Self::default();
        for m in history {
            h2h.record(m.first_item_id, m.second_item_id, m.winner_id);
        }
        h2h
    }

    /// Winner of the direct matchup between `a` and `b`, if decided
    pub fn winner(&self, a: i64, b: i64) -> Option<i64> {
        self.winners.get(&Self::key(a, b)).copied()
    }

    fn key(a: i64, b: i64) -> (i64, i64) {
        (a.min(b), a.max(b))
    }
}

/// Compute the final table and match history for a session
pub async fn compute_results(
    db: &SqlitePool,
    session_key: &str,
    collection_id: i64,
) -> Result<RankingResults> {
    let tallies = fetch_tallies(db, session_key, collection_id).await?;
    let history = fetch_history(db, session_key, collection_id).await?;

    let head_to_head = HeadToHead::from_history(&history);
    let ranks = rank_items(tallies, &head_to_head);

    Ok(RankingResults { ranks, history })
}

/// Sort, tie-break and number a set of tallies
pub fn rank_items(mut ranks: Vec<Rank>, head_to_head: &HeadToHead) -> Vec<Rank> {
    // Stable: equal win counts keep their incoming order
    ranks.sort_by(|a, b| b.wins.cmp(&a.wins));
    tie_break(&mut ranks, head_to_head);
    for (index, rank) in ranks.iter_mut().enumerate() {
        rank.position = index + 1;
    }
    ranks
}

/// One bottom-up pass over adjacent positions
///
/// When neighbours have equal wins and the lower one won their direct
/// matchup, the two are swapped. A swapped item is compared again with its
/// new upper neighbour on the next step of the same pass.
pub fn tie_break(ranks: &mut [Rank], head_to_head: &HeadToHead) {
    for lower in (1..ranks.len()).rev() {
        let upper = lower - 1;
        if ranks[upper].wins != ranks[lower].wins {
            continue;
        }
        let lower_id = ranks[lower].item_id;
        if head_to_head.winner(ranks[upper].item_id, lower_id) == Some(lower_id) {
            ranks.swap(upper, lower);
        }
    }
}

/// Win/loss counts for every item of the collection, ordered by item id
///
/// Items that never took part in a decided matchup get zero wins and losses.
async fn fetch_tallies(db: &SqlitePool, session_key: &str, collection_id: i64) -> Result<Vec<Rank>> {
    let rows = sqlx::query_as::<_, (i64, String, i64, i64)>(
        r#"
        SELECT i.id, i.name,
               COUNT(CASE WHEN m.winner_id = i.id THEN 1 END) AS wins,
               COUNT(CASE WHEN m.winner_id <> i.id THEN 1 END) AS losses
        FROM items i
        LEFT JOIN matchups m
               ON m.collection_id = i.collection_id
              AND m.session_key = ?
              AND m.winner_id IS NOT NULL
              AND (m.first_item_id = i.id OR m.second_item_id = i.id)
        WHERE i.collection_id = ?
        GROUP BY i.id, i.name
        ORDER BY i.id ASC
        "#,
    )
    .bind(session_key)
    .bind(collection_id)
    .fetch_all(db)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(item_id, name, wins, losses)| Rank {
            item_id,
            name,
            wins,
            losses,
            position: 0,
        })
        .collect())
}

/// Decided matchups joined with item names, in creation order
async fn fetch_history(
    db: &SqlitePool,
    session_key: &str,
    collection_id: i64,
) -> Result<Vec<MatchupView>> {
    let history = sqlx::query_as::<_, MatchupView>(
        r#"
        SELECT m.id AS matchup_id,
               m.first_item_id, f.name AS first_name,
               m.second_item_id, s.name AS second_name,
               m.winner_id, w.name AS winner_name
        FROM matchups m
        JOIN items f ON f.id = m.first_item_id
        JOIN items s ON s.id = m.second_item_id
        JOIN items w ON w.id = m.winner_id
        WHERE m.session_key = ? AND m.collection_id = ? AND m.winner_id IS NOT NULL
        ORDER BY m.created_at ASC, m.id ASC
        "#,
    )
    .bind(session_key)
    .bind(collection_id)
    .fetch_all(db)
    .await?;

    Ok(history)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rank(item_id: i64, wins: i64) -> Rank {
        Rank {
            item_id,
            name: format!("item-{}", item_id),
            wins,
            losses: 0,
            position: 0,
        }
    }

    fn order(ranks: &[Rank]) -> Vec<i64> {
        ranks.iter().map(|r| r.item_id).collect()
    }

    #[test]
    fn test_sorted_by_wins_descending() {
        let ranks = rank_items(vec![rank(1, 0), rank(2, 2), rank(3, 1)], &HeadToHead::default());
        assert_eq!(order(&ranks), vec![2, 3, 1]);
        assert_eq!(ranks.iter().map(|r| r.position).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_head_to_head_winner_moves_up() {
        // Y (2) precedes X (1) among equal wins, but X beat Y
        let mut h2h = HeadToHead::default();
        h2h.record(1, 2, 1);

        let mut ranks = vec![rank(2, 1), rank(1, 1)];
        tie_break(&mut ranks, &h2h);
        assert_eq!(order(&ranks), vec![1, 2]);
    }

    #[test]
    fn test_no_swap_across_different_wins() {
        let mut h2h = HeadToHead::default();
        h2h.record(1, 2, 2);

        let mut ranks = vec![rank(1, 2), rank(2, 1)];
        tie_break(&mut ranks, &h2h);
        assert_eq!(order(&ranks), vec![1, 2]);
    }

    #[test]
    fn test_no_swap_without_direct_matchup() {
        let mut ranks = vec![rank(5, 1), rank(6, 1)];
        tie_break(&mut ranks, &HeadToHead::default());
        assert_eq!(order(&ranks), vec![5, 6]);
    }

    #[test]
    fn test_three_cycle_left_unresolved() {
        // A beat B, B beat C, C beat A: all on one win
        let mut h2h = HeadToHead::default();
        h2h.record(1, 2, 1);
        h2h.record(2, 3, 2);
        h2h.record(1, 3, 3);

        let mut ranks = vec![rank(1, 1), rank(2, 1), rank(3, 1)];
        tie_break(&mut ranks, &h2h);
        // C stays below A even though it beat A
        assert_eq!(order(&ranks), vec![1, 2, 3]);

        let mut ranks = vec![rank(1, 1), rank(3, 1), rank(2, 1)];
        tie_break(&mut ranks, &h2h);
        assert_eq!(order(&ranks), vec![1, 2, 3]);
    }

    #[test]
    fn test_single_pass_carries_winner_upward() {
        // Tied on wins; 3 beat 2 and 3 beat 1, so the pass lifts 3 twice
        let mut h2h = HeadToHead::default();
        h2h.record(2, 3, 3);
        h2h.record(1, 3, 3);

        let mut ranks = vec![rank(1, 1), rank(2, 1), rank(3, 1)];
        tie_break(&mut ranks, &h2h);
        assert_eq!(order(&ranks), vec![3, 1, 2]);
    }

    #[test]
    fn test_empty_and_single() {
        assert!(rank_items(Vec::new(), &HeadToHead::default()).is_empty());
        let ranks = rank_items(vec![rank(9, 0)], &HeadToHead::default());
        assert_eq!(ranks[0].position, 1);
    }
}
