//! Database initialization
//!
//! Opens (creating on first run) the SQLite database and creates the
//! `collections`, `items` and `matchups` tables if they are missing.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// SQLite busy timeout applied to every connection
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Foreign keys and busy timeout are per-connection settings, so they go
    // on the connect options rather than through a one-off PRAGMA.
    // WAL allows concurrent readers with one writer.
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_schema(&pool).await?;

    Ok(pool)
}

/// Open a private in-memory database with the full schema
///
/// Limited to a single connection: every in-memory connection would
/// otherwise see its own empty database.
pub async fn open_in_memory() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes (idempotent - safe to call multiple times)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_collections_table(pool).await?;
    create_items_table(pool).await?;
    create_matchups_table(pool).await?;
    Ok(())
}

async fn create_collections_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS collections (
            id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_items_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS items (
            id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            image TEXT,
            collection_id INTEGER NOT NULL
                REFERENCES collections(id) ON DELETE CASCADE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_items_collection ON items(collection_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Create the matchups table
///
/// One row per generated pair per (session_key, collection). Only
/// `winner_id` changes after insert.
async fn create_matchups_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS matchups (
            id INTEGER NOT NULL PRIMARY KEY AUTOINCREMENT,
            session_key TEXT NOT NULL,
            first_item_id INTEGER NOT NULL
                REFERENCES items(id) ON DELETE CASCADE,
            second_item_id INTEGER NOT NULL
                REFERENCES items(id) ON DELETE CASCADE,
            winner_id INTEGER
                REFERENCES items(id) ON DELETE CASCADE,
            collection_id INTEGER NOT NULL
                REFERENCES collections(id) ON DELETE CASCADE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK (first_item_id <> second_item_id),
            CHECK (winner_id IS NULL OR winner_id IN (first_item_id, second_item_id))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_matchups_session
         ON matchups(session_key, collection_id, winner_id)",
    )
    .execute(pool)
    .await?;

    // A pair exists at most once per session, whichever way round it is stored
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_matchups_pair
         ON matchups(session_key, collection_id,
                     min(first_item_id, second_item_id),
                     max(first_item_id, second_item_id))",
    )
    .execute(pool)
    .await?;

    Ok(())
}
