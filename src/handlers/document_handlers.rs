//! HTTP handlers for document records: listing with search/category
//! filters, link registration, fetch, patch, delete, and the view/download
//! counters. File uploads live in `upload_handlers`.

use crate::{
    errors::AppError,
    models::document::Document,
    services::{
        AppState,
        library_service::{DocumentFilter, DocumentPatch},
        upload_service::DocumentSubmission,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

/// Query params accepted by the document listing.
#[derive(Debug, Deserialize)]
pub struct ListDocumentsQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

/// Body for registering an externally-hosted document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterLinkReq {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub pdf_url: String,
    #[serde(default = "default_uploader")]
    pub uploaded_by: String,
}

/// Body for partial document updates.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentReq {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub categories: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub pdf_url: Option<String>,
}

pub(crate) fn default_uploader() -> String {
    "anonymous".into()
}

/// GET `/api/documents` — list documents, newest first.
pub async fn list_documents(
    State(state): State<AppState>,
    Query(query): Query<ListDocumentsQuery>,
) -> Result<Json<Vec<Document>>, AppError> {
    let documents = state
        .library
        .list_documents(DocumentFilter {
            search: query.search,
            category: query.category,
        })
        .await?;
    Ok(Json(documents))
}

/// POST `/api/documents` — register an externally-hosted document link.
pub async fn register_link(
    State(state): State<AppState>,
    Json(payload): Json<RegisterLinkReq>,
) -> Result<(StatusCode, Json<Document>), AppError> {
    let document = state
        .uploads
        .register_link(
            DocumentSubmission {
                title: payload.title,
                author: payload.author,
                description: payload.description,
                categories: payload.categories,
                tags: payload.tags,
                uploaded_by: payload.uploaded_by,
            },
            payload.pdf_url,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(document)))
}

/// GET `/api/documents/{id}`
pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Document>, AppError> {
    let document = state.library.get_document(id).await?;
    Ok(Json(document))
}

/// PATCH `/api/documents/{id}`
pub async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateDocumentReq>,
) -> Result<Json<Document>, AppError> {
    let document = state
        .library
        .update_document(
            id,
            DocumentPatch {
                title: payload.title,
                author: payload.author,
                description: payload.description,
                categories: payload.categories,
                tags: payload.tags,
                pdf_url: payload.pdf_url,
            },
        )
        .await?;
    Ok(Json(document))
}

/// DELETE `/api/documents/{id}` — removes the record and dispatches
/// best-effort provider cleanup on its stored tag.
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.uploads.delete_document(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/api/documents/{id}/views`
pub async fn record_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.library.increment_view_count(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/api/documents/{id}/downloads`
pub async fn record_download(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.library.increment_download_count(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
