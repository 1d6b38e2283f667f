//! Database models

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Collection {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub image: Option<String>,
    pub collection_id: i64,
}

/// A collection together with its items, ordered by item id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionWithItems {
    #[serde(flatten)]
    pub collection: Collection,
    pub items: Vec<Item>,
}

/// One pairing of two items inside a ranking session
///
/// `winner_id` is `None` while the matchup is pending and otherwise equals
/// `first_item_id` or `second_item_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Matchup {
    pub id: i64,
    pub session_key: String,
    pub first_item_id: i64,
    pub second_item_id: i64,
    pub winner_id: Option<i64>,
    pub collection_id: i64,
    pub created_at: NaiveDateTime,
}

impl Matchup {
    pub fn is_pending(&self) -> bool {
        self.winner_id.is_none()
    }
}
