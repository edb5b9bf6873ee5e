use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::items::DeleteResponse;
use crate::models::{
    find_duplicate_item_ref, CreateWarehouseRequest, UpdateWarehouseRequest, Warehouse,
};

pub async fn create_warehouse(
    State((_item_service, warehouse_service)): State<crate::AppState>,
    Json(req): Json<CreateWarehouseRequest>,
) -> AppResult<(StatusCode, Json<Warehouse>)> {
    req.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;
    if let Some(duplicate) = find_duplicate_item_ref(&req.inventory) {
        return Err(AppError::ValidationError(format!(
            "inventory references item {} more than once",
            duplicate
        )));
    }

    let warehouse = warehouse_service.create_warehouse(req).await?;
    Ok((StatusCode::CREATED, Json(warehouse)))
}

pub async fn get_warehouse(
    State((_item_service, warehouse_service)): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Warehouse>> {
    let warehouse = warehouse_service.get_warehouse(&id).await?;
    Ok(Json(warehouse))
}

pub async fn update_warehouse(
    State((_item_service, warehouse_service)): State<crate::AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateWarehouseRequest>,
) -> AppResult<Json<Warehouse>> {
    req.validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;
    if let Some(inventory) = &req.inventory {
        if let Some(duplicate) = find_duplicate_item_ref(inventory) {
            return Err(AppError::ValidationError(format!(
                "inventory references item {} more than once",
                duplicate
            )));
        }
    }

    let warehouse = warehouse_service.update_warehouse(&id, req).await?;
    Ok(Json(warehouse))
}

pub async fn delete_warehouse(
    State((_item_service, warehouse_service)): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DeleteResponse>> {
    let deleted_count = warehouse_service.delete_warehouse(&id).await?;
    Ok(Json(DeleteResponse { deleted_count }))
}
