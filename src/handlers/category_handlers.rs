//! HTTP handlers for category records, including the best-effort duplicate
//! cleanup pass.

use crate::{
    errors::AppError,
    models::category::Category,
    services::{
        AppState,
        library_service::{CategoryPatch, NewCategory},
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateCategoryReq {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateCategoryReq {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DedupeResult {
    pub removed: usize,
}

/// GET `/api/categories` — ordered by name ascending.
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, AppError> {
    let categories = state.library.list_categories().await?;
    Ok(Json(categories))
}

/// POST `/api/categories`
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CreateCategoryReq>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let category = state
        .library
        .create_category(NewCategory {
            name: payload.name,
            description: payload.description,
            color: payload.color,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PATCH `/api/categories/{id}`
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryReq>,
) -> Result<Json<Category>, AppError> {
    let category = state
        .library
        .update_category(
            id,
            CategoryPatch {
                name: payload.name,
                description: payload.description,
                color: payload.color,
            },
        )
        .await?;
    Ok(Json(category))
}

/// DELETE `/api/categories/{id}`
///
/// Documents referencing the category's name keep it; only the category
/// record itself is removed.
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.library.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/api/categories/dedupe` — run the duplicate cleanup pass.
pub async fn dedupe_categories(
    State(state): State<AppState>,
) -> Result<Json<DedupeResult>, AppError> {
    let removed = state.library.dedupe_categories().await?;
    Ok(Json(DedupeResult { removed }))
}
