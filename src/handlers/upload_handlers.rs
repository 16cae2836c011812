//! HTTP handler for multipart file uploads.
//!
//! The multipart form mirrors the browser upload form: one `file` field
//! plus text fields for the record metadata. Repeated `category`/`tags`
//! fields accumulate; `tags` values may also be comma-separated.

use crate::{
    errors::AppError,
    models::document::Document,
    services::{
        AppState,
        upload_service::{DocumentSubmission, IncomingFile},
    },
};
use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};

/// POST `/api/documents/upload`
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Document>), AppError> {
    let mut title = String::new();
    let mut author = String::new();
    let mut description = String::new();
    let mut categories: Vec<String> = Vec::new();
    let mut tags: Vec<String> = Vec::new();
    let mut uploaded_by: Option<String> = None;
    let mut file: Option<IncomingFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(err.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("document.pdf").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::bad_request(err.to_string()))?;
                file = Some(IncomingFile {
                    name: file_name,
                    content_type,
                    bytes,
                });
            }
            "title" => title = read_text(field).await?,
            "author" => author = read_text(field).await?,
            "description" => description = read_text(field).await?,
            "category" | "categories" => {
                let value = read_text(field).await?;
                if !value.trim().is_empty() {
                    categories.push(value.trim().to_string());
                }
            }
            "tags" => {
                let value = read_text(field).await?;
                tags.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(String::from),
                );
            }
            "uploadedBy" => uploaded_by = Some(read_text(field).await?),
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::bad_request("missing `file` field"))?;

    let document = state
        .uploads
        .upload_document(
            DocumentSubmission {
                title,
                author,
                description,
                categories,
                tags,
                uploaded_by: uploaded_by
                    .unwrap_or_else(super::document_handlers::default_uploader),
            },
            file,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(document)))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|err| AppError::bad_request(err.to_string()))
}
