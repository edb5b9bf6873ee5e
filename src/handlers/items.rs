use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppResult;
use crate::models::{CreateItemRequest, Item, ItemsListResponse, UpdateItemRequest};

#[derive(Deserialize)]
pub struct ItemsQuery {
    // Kept as raw text so that ?page=abc falls back to the first page
    // instead of failing query deserialization.
    pub page: Option<String>,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub deleted_count: u64,
}

#[derive(Serialize)]
pub struct InventoryResponse {
    pub inventory: i64,
}

pub async fn list_items(
    State((item_service, _warehouse_service)): State<crate::AppState>,
    Query(params): Query<ItemsQuery>,
) -> AppResult<Json<ItemsListResponse>> {
    let page = params.page.as_deref().and_then(|p| p.parse::<i64>().ok());
    let response = item_service.list_items(page).await?;
    Ok(Json(response))
}

pub async fn get_item(
    State((item_service, _warehouse_service)): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Item>> {
    let item = item_service.get_item(&id).await?;
    Ok(Json(item))
}

pub async fn create_item(
    State((item_service, _warehouse_service)): State<crate::AppState>,
    Json(req): Json<CreateItemRequest>,
) -> AppResult<(StatusCode, Json<Item>)> {
    req.validate()
        .map_err(|e| crate::error::AppError::ValidationError(e.to_string()))?;

    let item = item_service.create_item(req).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_item(
    State((item_service, _warehouse_service)): State<crate::AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateItemRequest>,
) -> AppResult<Json<Item>> {
    req.validate()
        .map_err(|e| crate::error::AppError::ValidationError(e.to_string()))?;

    let item = item_service.update_item(&id, req).await?;
    Ok(Json(item))
}

pub async fn delete_item(
    State((item_service, _warehouse_service)): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DeleteResponse>> {
    let deleted_count = item_service.delete_item(&id).await?;
    Ok(Json(DeleteResponse { deleted_count }))
}

pub async fn get_item_inventory(
    State((item_service, _warehouse_service)): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<InventoryResponse>> {
    let inventory = item_service.get_total_inventory(&id).await?;
    Ok(Json(InventoryResponse { inventory }))
}
