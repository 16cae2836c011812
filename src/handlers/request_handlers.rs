//! HTTP handlers for out-of-band access and category requests, relayed to
//! the admin over email.

use crate::{
    clients::email::{AccessRequest, CategoryRequest},
    errors::AppError,
    services::AppState,
};
use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct AccessRequestReq {
    pub name: String,
    pub email: String,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRequestReq {
    pub name: String,
    pub email: String,
    pub category_name: String,
    #[serde(default)]
    pub description: String,
    pub examples: Option<String>,
}

/// POST `/api/requests/access`
pub async fn access_request(
    State(state): State<AppState>,
    Json(payload): Json<AccessRequestReq>,
) -> Result<StatusCode, AppError> {
    state
        .email
        .send_access_request(&AccessRequest {
            name: payload.name,
            email: payload.email,
            reason: payload.reason,
        })
        .await?;
    Ok(StatusCode::ACCEPTED)
}

/// POST `/api/requests/category`
pub async fn category_request(
    State(state): State<AppState>,
    Json(payload): Json<CategoryRequestReq>,
) -> Result<StatusCode, AppError> {
    state
        .email
        .send_category_request(&CategoryRequest {
            name: payload.name,
            email: payload.email,
            category_name: payload.category_name,
            description: payload.description,
            examples: payload.examples,
        })
        .await?;
    Ok(StatusCode::ACCEPTED)
}
