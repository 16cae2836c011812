//! Represents a single document-library entry.

use crate::models::provider::ProviderTag;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

/// A PDF document known to the library.
///
/// The record stores metadata only; the payload lives at `pdf_url`, hosted
/// by whichever storage account `upload_provider` names. Category and tag
/// lists are plain strings with no referential link to the `Category`
/// collection.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Unique identifier for this document (UUID for internal DB use).
    pub id: Uuid,

    /// Display title, limited to 18 characters at input.
    pub title: String,

    pub author: String,

    pub description: String,

    /// Category names this document is filed under.
    pub categories: Json<Vec<String>>,

    /// Free-form tags used by text search.
    pub tags: Json<Vec<String>>,

    /// Original filename of the uploaded file. Absent for link registrations.
    pub file_name: Option<String>,

    /// Size in bytes as reported by the storage provider.
    pub file_size: Option<i64>,

    /// Content type (MIME type).
    pub mime_type: Option<String>,

    /// Canonical URL where the payload can be fetched.
    pub pdf_url: String,

    /// Which storage account handled the upload.
    pub upload_provider: ProviderTag,

    /// Remote identifier at the storage provider, used for deletion.
    pub provider_file_id: Option<String>,

    /// Number of recorded views. Only ever incremented.
    pub view_count: i64,

    /// Number of recorded downloads. Only ever incremented.
    pub download_count: i64,

    /// Identity of the uploader as supplied by the caller.
    pub uploaded_by: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}
