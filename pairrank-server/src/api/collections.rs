//! Collection and item CRUD endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use pairrank_common::db::{self, Collection, CollectionWithItems, Item};
use serde::Deserialize;

use super::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCollectionRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    /// Image reference (URL or path); empty means none
    #[serde(default)]
    pub image: Option<String>,
}

/// GET /api/collections
pub async fn list_collections(
    State(state): State<AppState>,
) -> Result<Json<Vec<CollectionWithItems>>, ApiError> {
    Ok(Json(db::list_collections(&state.db).await?))
}

/// POST /api/collections
pub async fn create_collection(
    State(state): State<AppState>,
    payload: Result<Json<CreateCollectionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Collection>), ApiError> {
    let Json(request) = payload?;
    let collection = db::create_collection(&state.db, &request.name).await?;
    Ok((StatusCode::CREATED, Json(collection)))
}

/// GET /api/collections/:id
pub async fn get_collection(
    State(state): State<AppState>,
    Path(collection_id): Path<i64>,
) -> Result<Json<CollectionWithItems>, ApiError> {
    Ok(Json(db::get_collection(&state.db, collection_id).await?))
}

/// DELETE /api/collections/:id
///
/// Removes the collection's items and every ranking session over it.
pub async fn delete_collection(
    State(state): State<AppState>,
    Path(collection_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    db::delete_collection(&state.db, collection_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/collections/:id/items
pub async fn create_item(
    State(state): State<AppState>,
    Path(collection_id): Path<i64>,
    payload: Result<Json<CreateItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Item>), ApiError> {
    let Json(request) = payload?;
    let item = db::create_item(
        &state.db,
        collection_id,
        &request.name,
        request.image.as_deref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// DELETE /api/items/:id
pub async fn delete_item(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    db::delete_item(&state.db, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
