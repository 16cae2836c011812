//! UploadService — routes incoming PDFs across the storage accounts and
//! records their metadata.
//!
//! Control flow for a file upload: validate → classify by size → one
//! provider upload → one metadata write. There is no queueing, no retry,
//! and no rollback: a provider failure aborts before anything is recorded,
//! and a metadata failure after a successful upload leaves the remote
//! object behind for manual cleanup.

use crate::clients::imagekit::{ImageKitClient, ProviderError};
use crate::models::{document::Document, provider::ProviderTag};
use crate::services::library_service::{
    LibraryError, LibraryService, NewDocumentRecord,
};
use bytes::Bytes;
use thiserror::Error;
use tracing::{info, warn};

/// Uploads strictly below this go to the small-files account.
pub const SMALL_FILE_THRESHOLD: i64 = 10 * 1024 * 1024;
/// Hard ceiling; anything at or above is rejected outright.
pub const MAX_FILE_SIZE: i64 = 25 * 1024 * 1024;

pub const ACCEPTED_MIME_TYPE: &str = "application/pdf";

/// Sorted `(exclusive upper bound, tier)` pairs, scanned in order. The first
/// bound a size falls under wins; falling past the table means oversized.
const TIER_TABLE: [(i64, ProviderTag); 2] = [
    (SMALL_FILE_THRESHOLD, ProviderTag::ImagekitSmall),
    (MAX_FILE_SIZE, ProviderTag::ImagekitLarge),
];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("file appears to be empty")]
    EmptyFile,
    #[error("only PDF files are allowed, got `{0}`")]
    UnsupportedFileType(String),
    #[error("file size {size} bytes exceeds the {limit} byte limit")]
    Oversized { size: i64, limit: i64 },
    #[error("invalid document link `{url}`: {reason}")]
    InvalidLink { url: String, reason: String },
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Store(#[from] LibraryError),
}

/// Caller-supplied metadata accompanying an upload or link registration.
#[derive(Clone, Debug)]
pub struct DocumentSubmission {
    pub title: String,
    pub author: String,
    pub description: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub uploaded_by: String,
}

/// A file received from the caller, still unrouted.
#[derive(Clone, Debug)]
pub struct IncomingFile {
    pub name: String,
    /// Declared content type; must be `application/pdf`.
    pub content_type: String,
    pub bytes: Bytes,
}

#[derive(Clone)]
pub struct UploadService {
    library: LibraryService,
    small_account: ImageKitClient,
    large_account: ImageKitClient,
}

impl UploadService {
    pub fn new(
        library: LibraryService,
        small_account: ImageKitClient,
        large_account: ImageKitClient,
    ) -> Self {
        Self {
            library,
            small_account,
            large_account,
        }
    }

    /// Both storage accounts have credentials present.
    pub fn accounts_configured(&self) -> bool {
        self.small_account.is_configured() && self.large_account.is_configured()
    }

    /// Decide which storage tier handles a payload of `size_bytes`.
    ///
    /// Each tier's upper bound is exclusive: a file of exactly 10 MiB goes
    /// to the large account, a file of exactly 25 MiB is rejected.
    /// Zero-byte (or negative) sizes are invalid.
    pub fn classify(size_bytes: i64) -> Result<ProviderTag, UploadError> {
        if size_bytes <= 0 {
            return Err(UploadError::EmptyFile);
        }
        for (upper_bound, tier) in TIER_TABLE {
            if size_bytes < upper_bound {
                return Ok(tier);
            }
        }
        Err(UploadError::Oversized {
            size: size_bytes,
            limit: MAX_FILE_SIZE,
        })
    }

    fn account_for(&self, tier: ProviderTag) -> Option<&ImageKitClient> {
        match tier {
            ProviderTag::ImagekitSmall => Some(&self.small_account),
            ProviderTag::ImagekitLarge => Some(&self.large_account),
            ProviderTag::External => None,
        }
    }

    /// Upload a PDF and record its metadata.
    ///
    /// All validation happens before any network call: an empty file, a
    /// non-PDF declared type, an oversized payload, or invalid metadata
    /// never reaches a provider. On success the returned document carries
    /// the tag of the account actually used.
    pub async fn upload_document(
        &self,
        submission: DocumentSubmission,
        file: IncomingFile,
    ) -> Result<Document, UploadError> {
        LibraryService::ensure_metadata_valid(&submission.title, &submission.author)?;
        if file.content_type != ACCEPTED_MIME_TYPE {
            return Err(UploadError::UnsupportedFileType(file.content_type));
        }

        let size_bytes = file.bytes.len() as i64;
        let tier = Self::classify(size_bytes)?;
        let account = self
            .account_for(tier)
            .expect("classifier only yields storage tiers");

        info!(file = %file.name, size_bytes, tier = %tier, "routing upload");
        let uploaded = account.upload(&file.name, file.bytes).await?;

        // No compensating provider delete if this write fails; the uploaded
        // object stays behind for manual cleanup.
        let document = self
            .library
            .create_document(NewDocumentRecord {
                title: submission.title,
                author: submission.author,
                description: submission.description,
                categories: submission.categories,
                tags: submission.tags,
                file_name: Some(uploaded.name),
                file_size: Some(uploaded.size),
                mime_type: Some(ACCEPTED_MIME_TYPE.to_string()),
                pdf_url: uploaded.url,
                upload_provider: tier,
                provider_file_id: Some(uploaded.file_id),
                uploaded_by: submission.uploaded_by,
            })
            .await?;

        info!(document = %document.id, tier = %tier, "upload recorded");
        Ok(document)
    }

    /// Record a document hosted elsewhere. No payload moves; the record is
    /// tagged `external` and carries the caller's URL verbatim.
    pub async fn register_link(
        &self,
        submission: DocumentSubmission,
        url: String,
    ) -> Result<Document, UploadError> {
        LibraryService::ensure_metadata_valid(&submission.title, &submission.author)?;

        let parsed = reqwest::Url::parse(&url).map_err(|err| UploadError::InvalidLink {
            url: url.clone(),
            reason: err.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(UploadError::InvalidLink {
                url,
                reason: "only http(s) links are accepted".into(),
            });
        }

        let document = self
            .library
            .create_document(NewDocumentRecord {
                title: submission.title,
                author: submission.author,
                description: submission.description,
                categories: submission.categories,
                tags: submission.tags,
                file_name: None,
                file_size: None,
                mime_type: None,
                pdf_url: url,
                upload_provider: ProviderTag::External,
                provider_file_id: None,
                uploaded_by: submission.uploaded_by,
            })
            .await?;

        Ok(document)
    }

    /// Delete a document, dispatching remote cleanup on its provider tag.
    ///
    /// The metadata delete is authoritative; provider-side cleanup is
    /// best-effort and a failure there only logs (matching the independent
    /// lifecycles of record and payload).
    pub async fn delete_document(&self, id: uuid::Uuid) -> Result<Document, UploadError> {
        let document = self.library.delete_document(id).await?;

        if let Some(account) = self.account_for(document.upload_provider) {
            if let Some(file_id) = &document.provider_file_id {
                if let Err(err) = account.delete_file(file_id).await {
                    warn!(
                        document = %document.id,
                        provider = %document.upload_provider,
                        %err,
                        "provider file cleanup failed; remote object must be removed manually"
                    );
                }
            }
        }

        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::imagekit::AccountConfig;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::Arc;

    fn account(tag: ProviderTag, prefix: &str) -> ImageKitClient {
        // Empty credentials: any attempted provider call fails with
        // NotConfigured instead of reaching the network.
        ImageKitClient::new(
            AccountConfig {
                tag,
                public_key: String::new(),
                private_key: String::new(),
                folder: format!("/pdf-library/{prefix}-pdfs"),
                file_prefix: prefix.into(),
            },
            "http://127.0.0.1:1/upload".into(),
            "http://127.0.0.1:1/api".into(),
        )
    }

    async fn test_services() -> (UploadService, LibraryService) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory sqlite");
        for stmt in include_str!("../../migrations/0001_init.sql")
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            sqlx::query(stmt).execute(&pool).await.expect("schema");
        }
        let library = LibraryService::new(Arc::new(pool));
        let uploads = UploadService::new(
            library.clone(),
            account(ProviderTag::ImagekitSmall, "small"),
            account(ProviderTag::ImagekitLarge, "large"),
        );
        (uploads, library)
    }

    fn submission() -> DocumentSubmission {
        DocumentSubmission {
            title: "Notes".into(),
            author: "Ada Lovelace".into(),
            description: String::new(),
            categories: vec![],
            tags: vec![],
            uploaded_by: "admin".into(),
        }
    }

    fn pdf(bytes: &'static [u8]) -> IncomingFile {
        IncomingFile {
            name: "notes.pdf".into(),
            content_type: ACCEPTED_MIME_TYPE.into(),
            bytes: Bytes::from_static(bytes),
        }
    }

    #[test]
    fn classifier_respects_exclusive_upper_bounds() {
        assert_eq!(
            UploadService::classify(1).unwrap(),
            ProviderTag::ImagekitSmall
        );
        assert_eq!(
            UploadService::classify(SMALL_FILE_THRESHOLD - 1).unwrap(),
            ProviderTag::ImagekitSmall
        );
        assert_eq!(
            UploadService::classify(SMALL_FILE_THRESHOLD).unwrap(),
            ProviderTag::ImagekitLarge
        );
        assert_eq!(
            UploadService::classify(MAX_FILE_SIZE - 1).unwrap(),
            ProviderTag::ImagekitLarge
        );
        assert!(matches!(
            UploadService::classify(MAX_FILE_SIZE),
            Err(UploadError::Oversized { .. })
        ));
    }

    #[test]
    fn classifier_rejects_empty_input() {
        assert!(matches!(
            UploadService::classify(0),
            Err(UploadError::EmptyFile)
        ));
        assert!(matches!(
            UploadService::classify(-1),
            Err(UploadError::EmptyFile)
        ));
    }

    #[tokio::test]
    async fn empty_files_never_reach_a_provider() {
        let (uploads, library) = test_services().await;
        let result = uploads.upload_document(submission(), pdf(b"")).await;
        assert!(matches!(result, Err(UploadError::EmptyFile)));
        assert!(library.list_documents(Default::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_pdf_types_never_reach_a_provider() {
        let (uploads, library) = test_services().await;
        let file = IncomingFile {
            name: "notes.docx".into(),
            content_type: "application/msword".into(),
            bytes: Bytes::from_static(b"not a pdf"),
        };
        let result = uploads.upload_document(submission(), file).await;
        assert!(matches!(result, Err(UploadError::UnsupportedFileType(_))));
        assert!(library.list_documents(Default::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_metadata_is_caught_before_upload() {
        let (uploads, _) = test_services().await;
        let mut meta = submission();
        meta.title = "a title that is way too long".into();
        let result = uploads.upload_document(meta, pdf(b"%PDF-1.7")).await;
        assert!(matches!(
            result,
            Err(UploadError::Store(LibraryError::InvalidTitle))
        ));
    }

    #[tokio::test]
    async fn provider_failure_writes_no_record() {
        let (uploads, library) = test_services().await;
        // Valid metadata and file; the unconfigured account fails the
        // provider step, so nothing may appear in the store.
        let result = uploads.upload_document(submission(), pdf(b"%PDF-1.7")).await;
        assert!(matches!(result, Err(UploadError::Provider(_))));
        assert!(library.list_documents(Default::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn link_registrations_bypass_the_classifier() {
        let (uploads, _) = test_services().await;
        let doc = uploads
            .register_link(submission(), "https://example.com/paper.pdf".into())
            .await
            .unwrap();
        assert_eq!(doc.upload_provider, ProviderTag::External);
        assert_eq!(doc.pdf_url, "https://example.com/paper.pdf");
        assert!(doc.file_size.is_none());
    }

    #[tokio::test]
    async fn non_http_links_are_rejected() {
        let (uploads, _) = test_services().await;
        let result = uploads
            .register_link(submission(), "ftp://example.com/paper.pdf".into())
            .await;
        assert!(matches!(result, Err(UploadError::InvalidLink { .. })));
    }

    #[tokio::test]
    async fn deleting_an_external_document_skips_provider_cleanup() {
        let (uploads, library) = test_services().await;
        let doc = uploads
            .register_link(submission(), "https://example.com/paper.pdf".into())
            .await
            .unwrap();

        // Must succeed without any provider credentials configured.
        uploads.delete_document(doc.id).await.unwrap();
        assert!(matches!(
            library.get_document(doc.id).await,
            Err(LibraryError::DocumentNotFound(_))
        ));
    }
}
