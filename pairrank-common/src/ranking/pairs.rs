//! Round-robin pair generation
//!
//! Which pairs exist depends only on the set of item ids. Sequence order
//! and orientation are a separate concern, randomized by [`shuffle_pairs`]
//! with a caller-supplied random source.

use crate::db::models::Item;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Two distinct item ids presented against each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pair {
    pub first: i64,
    pub second: i64,
}

impl Pair {
    pub fn new(first: i64, second: i64) -> Self {
        Self { first, second }
    }

    /// Same pair with the smaller id first
    pub fn canonical(self) -> Self {
        if self.first <= self.second {
            self
        } else {
            self.swapped()
        }
    }

    pub fn swapped(self) -> Self {
        Self {
            first: self.second,
            second: self.first,
        }
    }

    pub fn contains(&self, item_id: i64) -> bool {
        self.first == item_id || self.second == item_id
    }
}

/// Presentation order for a newly generated session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PairOrder {
    /// Canonical order: ascending by first id, then second id
    Sequential,
    /// Shuffled sequence with random orientation per pair
    #[default]
    Shuffled,
}

impl PairOrder {
    pub fn from_shuffle_flag(shuffle: bool) -> Self {
        if shuffle {
            PairOrder::Shuffled
        } else {
            PairOrder::Sequential
        }
    }
}

/// All unordered pairs of the given items, N·(N-1)/2 of them
///
/// Output is canonical (smaller id first) and sorted. Duplicate ids are
/// collapsed, so fewer than two distinct items yield no pairs.
pub fn generate_pairs(items: &[Item]) -> Vec<Pair> {
    pairs_for_ids(items.iter().map(|item| item.id))
}

/// Same as [`generate_pairs`], from bare ids
pub fn pairs_for_ids(ids: impl IntoIterator<Item = i64>) -> Vec<Pair> {
    let ids: Vec<i64> = ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect();

    let mut pairs = Vec::with_capacity(ids.len() * ids.len().saturating_sub(1) / 2);
    for (i, &first) in ids.iter().enumerate() {
        for &second in &ids[i + 1..] {
            pairs.push(Pair::new(first, second));
        }
    }
    pairs
}

/// Shuffle pair order, then flip each pair's orientation with probability 0.5
pub fn shuffle_pairs<R: Rng + ?Sized>(pairs: &mut [Pair], rng: &mut R) {
    pairs.shuffle(rng);
    for pair in pairs.iter_mut() {
        if rng.gen_bool(0.5) {
            *pair = pair.swapped();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn item(id: i64) -> Item {
        Item {
            id,
            name: format!("item-{}", id),
            image: None,
            collection_id: 1,
        }
    }

    fn canonical_set(pairs: &[Pair]) -> HashSet<Pair> {
        pairs.iter().map(|p| p.canonical()).collect()
    }

    #[test]
    fn test_pair_count_is_n_choose_two() {
        for n in 0..9i64 {
            let items: Vec<Item> = (1..=n).map(item).collect();
            let pairs = generate_pairs(&items);
            let expected = (n * (n - 1) / 2).max(0) as usize;

            assert_eq!(pairs.len(), expected, "n = {}", n);
            assert_eq!(canonical_set(&pairs).len(), expected, "duplicate pair for n = {}", n);
            assert!(pairs.iter().all(|p| p.first != p.second), "self pair for n = {}", n);
        }
    }

    #[test]
    fn test_three_items() {
        let pairs = generate_pairs(&[item(1), item(2), item(3)]);
        assert_eq!(pairs, vec![Pair::new(1, 2), Pair::new(1, 3), Pair::new(2, 3)]);
    }

    #[test]
    fn test_fewer_than_two_items() {
        assert!(generate_pairs(&[]).is_empty());
        assert!(generate_pairs(&[item(7)]).is_empty());
        assert!(pairs_for_ids([7, 7]).is_empty());
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let forward = generate_pairs(&[item(1), item(5), item(9), item(12)]);
        let backward = generate_pairs(&[item(12), item(9), item(5), item(1)]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_shuffle_keeps_pair_set() {
        let original = pairs_for_ids(1..=6);
        let mut shuffled = original.clone();
        let mut rng = StdRng::seed_from_u64(42);
        shuffle_pairs(&mut shuffled, &mut rng);

        assert_eq!(shuffled.len(), original.len());
        assert_eq!(canonical_set(&shuffled), canonical_set(&original));
    }

    #[test]
    fn test_shuffle_reproducible_with_seed() {
        let mut a = pairs_for_ids(1..=6);
        let mut b = a.clone();
        shuffle_pairs(&mut a, &mut StdRng::seed_from_u64(7));
        shuffle_pairs(&mut b, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_shuffle_flips_some_orientations() {
        // 45 pairs: all orientations surviving a fair coin is ~2^-45
        let mut pairs = pairs_for_ids(1..=10);
        shuffle_pairs(&mut pairs, &mut StdRng::seed_from_u64(3));
        assert!(pairs.iter().any(|p| p.first > p.second));
    }

    #[test]
    fn test_pair_helpers() {
        let pair = Pair::new(4, 2);
        assert_eq!(pair.canonical(), Pair::new(2, 4));
        assert_eq!(pair.swapped(), Pair::new(2, 4));
        assert!(pair.contains(4));
        assert!(!pair.contains(3));
        assert_eq!(PairOrder::from_shuffle_flag(false), PairOrder::Sequential);
    }
}
