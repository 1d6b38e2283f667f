//! Collection and item CRUD
//!
//! Deleting a collection or an item relies on `ON DELETE CASCADE` to drop
//! the dependent items and matchups.

use crate::db::models::{Collection, CollectionWithItems, Item};
use crate::{Error, Result};
use sqlx::SqlitePool;
use std::collections::HashMap;
use tracing::info;

/// List every collection with its items, ordered by id
pub async fn list_collections(db: &SqlitePool) -> Result<Vec<CollectionWithItems>> {
    let collections = sqlx::query_as::<_, Collection>(
        "SELECT id, name FROM collections ORDER BY id ASC",
    )
    .fetch_all(db)
    .await?;

    let items = sqlx::query_as::<_, Item>(
        "SELECT id, name, image, collection_id FROM items ORDER BY collection_id ASC, id ASC",
    )
    .fetch_all(db)
    .await?;

    let mut by_collection: HashMap<i64, Vec<Item>> = HashMap::new();
    for item in items {
        by_collection.entry(item.collection_id).or_default().push(item);
    }

    Ok(collections
        .into_iter()
        .map(|collection| {
            let items = by_collection.remove(&collection.id).unwrap_or_default();
            CollectionWithItems { collection, items }
        })
        .collect())
}

/// Get a single collection with its items
pub async fn get_collection(db: &SqlitePool, collection_id: i64) -> Result<CollectionWithItems> {
    let collection = sqlx::query_as::<_, Collection>(
        "SELECT id, name FROM collections WHERE id = ?",
    )
    .bind(collection_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Collection not found: {}", collection_id)))?;

    let items = list_items(db, collection_id).await?;

    Ok(CollectionWithItems { collection, items })
}

/// Create a collection
pub async fn create_collection(db: &SqlitePool, name: &str) -> Result<Collection> {
    let name = validate_name(name)?;

    let result = sqlx::query("INSERT INTO collections (name) VALUES (?)")
        .bind(&name)
        .execute(db)
        .await?;

    let collection = Collection {
        id: result.last_insert_rowid(),
        name,
    };
    info!(collection_id = collection.id, "Created collection '{}'", collection.name);

    Ok(collection)
}

/// Delete a collection, its items and all of their matchups
pub async fn delete_collection(db: &SqlitePool, collection_id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM collections WHERE id = ?")
        .bind(collection_id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Collection not found: {}", collection_id)));
    }

    info!(collection_id, "Deleted collection");
    Ok(())
}

/// Items of one collection, ordered by id
pub async fn list_items(db: &SqlitePool, collection_id: i64) -> Result<Vec<Item>> {
    let items = sqlx::query_as::<_, Item>(
        "SELECT id, name, image, collection_id FROM items WHERE collection_id = ? ORDER BY id ASC",
    )
    .bind(collection_id)
    .fetch_all(db)
    .await?;

    Ok(items)
}

pub async fn get_item(db: &SqlitePool, item_id: i64) -> Result<Item> {
    sqlx::query_as::<_, Item>("SELECT id, name, image, collection_id FROM items WHERE id = ?")
        .bind(item_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Item not found: {}", item_id)))
}

/// Add an item to an existing collection
///
/// An empty image reference is stored as NULL.
pub async fn create_item(
    db: &SqlitePool,
    collection_id: i64,
    name: &str,
    image: Option<&str>,
) -> Result<Item> {
    let name = validate_name(name)?;
    let image = image
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM collections WHERE id = ?)")
        .bind(collection_id)
        .fetch_one(db)
        .await?;
    if !exists {
        return Err(Error::NotFound(format!("Collection not found: {}", collection_id)));
    }

    let result = sqlx::query("INSERT INTO items (name, image, collection_id) VALUES (?, ?, ?)")
        .bind(&name)
        .bind(&image)
        .bind(collection_id)
        .execute(db)
        .await?;

    let item = Item {
        id: result.last_insert_rowid(),
        name,
        image,
        collection_id,
    };
    info!(collection_id, item_id = item.id, "Created item '{}'", item.name);

    Ok(item)
}

/// Delete an item and every matchup that references it
pub async fn delete_item(db: &SqlitePool, item_id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM items WHERE id = ?")
        .bind(item_id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Item not found: {}", item_id)));
    }

    info!(item_id, "Deleted item");
    Ok(())
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("name must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}
