//! Defines routes for all document-library operations.
//!
//! ## Structure
//! - **Document endpoints**
//!   - `GET    /api/documents` — list (supports search, category)
//!   - `POST   /api/documents` — register an externally-hosted link
//!   - `POST   /api/documents/upload` — multipart file upload
//!   - `GET    /api/documents/{id}` — fetch one record
//!   - `PATCH  /api/documents/{id}` — partial update
//!   - `DELETE /api/documents/{id}` — delete record + provider cleanup
//!   - `POST   /api/documents/{id}/views` — bump view count
//!   - `POST   /api/documents/{id}/downloads` — bump download count
//!
//! - **Category endpoints**
//!   - `GET    /api/categories` — list by name
//!   - `POST   /api/categories` — create
//!   - `PATCH  /api/categories/{id}` — partial update
//!   - `DELETE /api/categories/{id}` — delete
//!   - `POST   /api/categories/dedupe` — duplicate cleanup pass
//!
//! - **Request endpoints** (email relay)
//!   - `POST   /api/requests/access`
//!   - `POST   /api/requests/category`

use crate::{
    handlers::{
        category_handlers::{
            create_category, dedupe_categories, delete_category, list_categories, update_category,
        },
        document_handlers::{
            delete_document, get_document, list_documents, record_download, record_view,
            register_link, update_document,
        },
        health_handlers::{healthz, readyz},
        request_handlers::{access_request, category_request},
        upload_handlers::upload_document,
    },
    services::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

/// Room above the 25 MiB payload ceiling for the multipart framing, so
/// oversize rejections come from the classifier rather than the extractor.
const UPLOAD_BODY_LIMIT: usize = crate::services::upload_service::MAX_FILE_SIZE as usize
    + 1024 * 1024;

/// Build and return the router for all library routes.
///
/// The router carries shared state (`AppState`) to all handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Document routes
        .route("/api/documents", get(list_documents).post(register_link))
        .route(
            "/api/documents/upload",
            post(upload_document).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/documents/{id}",
            get(get_document)
                .patch(update_document)
                .delete(delete_document),
        )
        .route("/api/documents/{id}/views", post(record_view))
        .route("/api/documents/{id}/downloads", post(record_download))
        // Category routes
        .route("/api/categories", get(list_categories).post(create_category))
        .route(
            "/api/categories/{id}",
            axum::routing::patch(update_category).delete(delete_category),
        )
        .route("/api/categories/dedupe", post(dedupe_categories))
        // Email relay routes
        .route("/api/requests/access", post(access_request))
        .route("/api/requests/category", post(category_request))
}
