//! LibraryService — document and category metadata operations backed by
//! SQLite. This file owns every read and write against the metadata store;
//! payload bytes never pass through it (they live at the storage providers,
//! addressed by `pdf_url`).

use crate::models::{category::Category, document::Document, provider::ProviderTag};
use chrono::Utc;
use sqlx::types::Json;
use sqlx::{QueryBuilder, SqlitePool, sqlite::Sqlite};
use std::{collections::HashSet, sync::Arc};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Titles are capped at input; longer ones never reach the store.
pub const MAX_TITLE_LEN: usize = 18;

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("document `{0}` not found")]
    DocumentNotFound(Uuid),
    #[error("category `{0}` not found")]
    CategoryNotFound(Uuid),
    #[error("title must be between 1 and {MAX_TITLE_LEN} characters")]
    InvalidTitle,
    #[error("author is required")]
    MissingAuthor,
    #[error("category name is required")]
    MissingCategoryName,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type LibraryResult<T> = Result<T, LibraryError>;

/// Filters accepted by the document listing.
#[derive(Clone, Debug, Default)]
pub struct DocumentFilter {
    /// Case-insensitive substring over title, description, and tags.
    pub search: Option<String>,
    /// Exact category name the document must be filed under.
    pub category: Option<String>,
}

/// Fields for a new document record. Timestamps, counters, and the id are
/// stamped by the store.
#[derive(Clone, Debug)]
pub struct NewDocumentRecord {
    pub title: String,
    pub author: String,
    pub description: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub file_name: Option<String>,
    pub file_size: Option<i64>,
    pub mime_type: Option<String>,
    pub pdf_url: String,
    pub upload_provider: ProviderTag,
    pub provider_file_id: Option<String>,
    pub uploaded_by: String,
}

/// Partial update for a document. Absent fields are left untouched;
/// `updated_at` is always restamped.
#[derive(Clone, Debug, Default)]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub categories: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub pdf_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

/// LibraryService provides the document-store operations:
/// - Create / fetch / list / patch / delete document records
/// - Monotonic view and download counters
/// - Category CRUD plus the best-effort duplicate cleanup pass
///
/// Deleting a category deliberately leaves documents that reference its
/// name untouched; the two collections have independent lifecycles.
#[derive(Clone)]
pub struct LibraryService {
    /// Shared SQLite connection pool used for metadata operations.
    pub db: Arc<SqlitePool>,
}

const DOCUMENT_COLUMNS: &str = "id, title, author, description, categories, tags, file_name, \
     file_size, mime_type, pdf_url, upload_provider, provider_file_id, view_count, \
     download_count, uploaded_by, created_at, updated_at";

impl LibraryService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Validate the caller-supplied record fields that gate every write.
    ///
    /// Runs before any network call on the upload path, so an invalid title
    /// or missing author never costs a provider round trip.
    pub fn ensure_metadata_valid(title: &str, author: &str) -> LibraryResult<()> {
        Self::ensure_title_valid(title)?;
        if author.trim().is_empty() {
            return Err(LibraryError::MissingAuthor);
        }
        Ok(())
    }

    fn ensure_title_valid(title: &str) -> LibraryResult<()> {
        let trimmed = title.trim();
        if trimmed.is_empty() || trimmed.chars().count() > MAX_TITLE_LEN {
            return Err(LibraryError::InvalidTitle);
        }
        Ok(())
    }

    /// Fetch a document record by id. Returns DocumentNotFound if missing.
    pub async fn get_document(&self, id: Uuid) -> LibraryResult<Document> {
        let query = format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?");
        sqlx::query_as::<Sqlite, Document>(&query)
            .bind(id)
            .fetch_one(&*self.db)
            .await
            .map_err(|err| match err {
                sqlx::Error::RowNotFound => LibraryError::DocumentNotFound(id),
                other => LibraryError::Sqlx(other),
            })
    }

    /// List documents, newest first.
    ///
    /// Category containment is pushed down to SQLite (`json_each` over the
    /// stored list); the free-text filter runs over the fetched rows, the
    /// same shape the original library search had.
    pub async fn list_documents(&self, filter: DocumentFilter) -> LibraryResult<Vec<Document>> {
        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents"
        ));

        if let Some(category) = &filter.category {
            builder.push(
                " WHERE EXISTS (SELECT 1 FROM json_each(documents.categories) \
                 WHERE json_each.value = ",
            );
            builder.push_bind(category);
            builder.push(")");
        }
        builder.push(" ORDER BY created_at DESC");

        let mut rows: Vec<Document> = builder.build_query_as().fetch_all(&*self.db).await?;

        if let Some(term) = &filter.search {
            let needle = term.to_lowercase();
            rows.retain(|doc| matches_search(doc, &needle));
        }

        Ok(rows)
    }

    /// Insert one new document record, stamping id and both timestamps.
    ///
    /// Returns the stored record so callers hand the caller-visible result
    /// straight back.
    pub async fn create_document(&self, record: NewDocumentRecord) -> LibraryResult<Document> {
        Self::ensure_metadata_valid(&record.title, &record.author)?;

        let now = Utc::now();
        let document = Document {
            id: Uuid::new_v4(),
            title: record.title.trim().to_string(),
            author: record.author.trim().to_string(),
            description: record.description,
            categories: Json(record.categories),
            tags: Json(record.tags),
            file_name: record.file_name,
            file_size: record.file_size,
            mime_type: record.mime_type,
            pdf_url: record.pdf_url,
            upload_provider: record.upload_provider,
            provider_file_id: record.provider_file_id,
            view_count: 0,
            download_count: 0,
            uploaded_by: record.uploaded_by,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO documents (
                id, title, author, description, categories, tags, file_name, file_size,
                mime_type, pdf_url, upload_provider, provider_file_id, view_count,
                download_count, uploaded_by, created_at, updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(document.id)
        .bind(&document.title)
        .bind(&document.author)
        .bind(&document.description)
        .bind(document.categories.clone())
        .bind(document.tags.clone())
        .bind(&document.file_name)
        .bind(document.file_size)
        .bind(&document.mime_type)
        .bind(&document.pdf_url)
        .bind(document.upload_provider)
        .bind(&document.provider_file_id)
        .bind(document.view_count)
        .bind(document.download_count)
        .bind(&document.uploaded_by)
        .bind(document.created_at)
        .bind(document.updated_at)
        .execute(&*self.db)
        .await?;

        Ok(document)
    }

    /// Apply a partial update and restamp `updated_at`.
    pub async fn update_document(&self, id: Uuid, patch: DocumentPatch) -> LibraryResult<Document> {
        if let Some(title) = &patch.title {
            Self::ensure_title_valid(title)?;
        }
        if let Some(author) = &patch.author {
            if author.trim().is_empty() {
                return Err(LibraryError::MissingAuthor);
            }
        }

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE documents SET updated_at = ");
        builder.push_bind(Utc::now());
        if let Some(title) = &patch.title {
            builder.push(", title = ");
            builder.push_bind(title.trim().to_string());
        }
        if let Some(author) = &patch.author {
            builder.push(", author = ");
            builder.push_bind(author.trim().to_string());
        }
        if let Some(description) = &patch.description {
            builder.push(", description = ");
            builder.push_bind(description.clone());
        }
        if let Some(categories) = &patch.categories {
            builder.push(", categories = ");
            builder.push_bind(Json(categories.clone()));
        }
        if let Some(tags) = &patch.tags {
            builder.push(", tags = ");
            builder.push_bind(Json(tags.clone()));
        }
        if let Some(pdf_url) = &patch.pdf_url {
            builder.push(", pdf_url = ");
            builder.push_bind(pdf_url.clone());
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);

        let result = builder.build().execute(&*self.db).await?;
        if result.rows_affected() == 0 {
            return Err(LibraryError::DocumentNotFound(id));
        }

        self.get_document(id).await
    }

    /// Delete a document record and return it, so callers can dispatch
    /// provider-side cleanup on the stored provider tag.
    pub async fn delete_document(&self, id: Uuid) -> LibraryResult<Document> {
        let document = self.get_document(id).await?;

        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(LibraryError::DocumentNotFound(id));
        }

        Ok(document)
    }

    /// Record one view. A single-statement increment keeps the counter
    /// monotonic under concurrent requests.
    pub async fn increment_view_count(&self, id: Uuid) -> LibraryResult<()> {
        let result = sqlx::query("UPDATE documents SET view_count = view_count + 1 WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(LibraryError::DocumentNotFound(id));
        }
        Ok(())
    }

    /// Record one download. Same increment shape as views.
    pub async fn increment_download_count(&self, id: Uuid) -> LibraryResult<()> {
        let result =
            sqlx::query("UPDATE documents SET download_count = download_count + 1 WHERE id = ?")
                .bind(id)
                .execute(&*self.db)
                .await?;
        if result.rows_affected() == 0 {
            return Err(LibraryError::DocumentNotFound(id));
        }
        Ok(())
    }

    /// List every category, ordered by name ascending.
    pub async fn list_categories(&self) -> LibraryResult<Vec<Category>> {
        let categories = sqlx::query_as::<Sqlite, Category>(
            "SELECT id, name, description, color, created_at FROM categories ORDER BY name ASC",
        )
        .fetch_all(&*self.db)
        .await?;
        Ok(categories)
    }

    async fn get_category(&self, id: Uuid) -> LibraryResult<Category> {
        sqlx::query_as::<Sqlite, Category>(
            "SELECT id, name, description, color, created_at FROM categories WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&*self.db)
        .await
        .map_err(|err| match err {
            sqlx::Error::RowNotFound => LibraryError::CategoryNotFound(id),
            other => LibraryError::Sqlx(other),
        })
    }

    /// Create a category. Name collisions are allowed here; the dedup pass
    /// cleans them up after the fact.
    pub async fn create_category(&self, record: NewCategory) -> LibraryResult<Category> {
        let name = record.name.trim();
        if name.is_empty() {
            return Err(LibraryError::MissingCategoryName);
        }

        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: record.description,
            color: record.color,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO categories (id, name, description, color, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.color)
        .bind(category.created_at)
        .execute(&*self.db)
        .await?;

        Ok(category)
    }

    /// Apply a partial update to a category.
    pub async fn update_category(&self, id: Uuid, patch: CategoryPatch) -> LibraryResult<Category> {
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(LibraryError::MissingCategoryName);
            }
        }
        if patch.name.is_none() && patch.description.is_none() && patch.color.is_none() {
            return self.get_category(id).await;
        }

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE categories SET ");
        let mut separated = builder.separated(", ");
        if let Some(name) = &patch.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name.trim().to_string());
        }
        if let Some(description) = &patch.description {
            separated.push("description = ");
            separated.push_bind_unseparated(description.clone());
        }
        if let Some(color) = &patch.color {
            separated.push("color = ");
            separated.push_bind_unseparated(color.clone());
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);

        let result = builder.build().execute(&*self.db).await?;
        if result.rows_affected() == 0 {
            return Err(LibraryError::CategoryNotFound(id));
        }

        self.get_category(id).await
    }

    /// Delete a category.
    ///
    /// Documents referencing the category's name are left untouched; the
    /// dangling string references are an accepted property of the data
    /// model, not an oversight.
    pub async fn delete_category(&self, id: Uuid) -> LibraryResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(LibraryError::CategoryNotFound(id));
        }
        Ok(())
    }

    /// Best-effort duplicate cleanup: group categories by lowercase name,
    /// keep the oldest record in each group, delete the rest.
    ///
    /// Individual delete failures are logged and skipped; the pass reports
    /// how many records it actually removed.
    pub async fn dedupe_categories(&self) -> LibraryResult<usize> {
        let categories = sqlx::query_as::<Sqlite, Category>(
            "SELECT id, name, description, color, created_at FROM categories \
             ORDER BY created_at ASC",
        )
        .fetch_all(&*self.db)
        .await?;

        let mut seen: HashSet<String> = HashSet::new();
        let mut removed = 0;
        for category in categories {
            if seen.insert(category.name.to_lowercase()) {
                continue;
            }
            match sqlx::query("DELETE FROM categories WHERE id = ?")
                .bind(category.id)
                .execute(&*self.db)
                .await
            {
                Ok(_) => removed += 1,
                Err(err) => {
                    debug!(
                        "failed to remove duplicate category {} ({}): {}",
                        category.id, category.name, err
                    );
                }
            }
        }

        if removed > 0 {
            debug!("removed {} duplicate categories", removed);
        }
        Ok(removed)
    }
}

/// Case-insensitive substring match over title, description, and tags.
/// `needle` must already be lowercased.
fn matches_search(doc: &Document, needle: &str) -> bool {
    doc.title.to_lowercase().contains(needle)
        || doc.description.to_lowercase().contains(needle)
        || doc.tags.iter().any(|tag| tag.to_lowercase().contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_service() -> LibraryService {
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
        LibraryService::new(Arc::new(pool))
    }

    fn record(title: &str) -> NewDocumentRecord {
        NewDocumentRecord {
            title: title.into(),
            author: "Ada Lovelace".into(),
            description: "Notes on the analytical engine".into(),
            categories: vec!["Mathematics".into()],
            tags: vec!["engines".into(), "history".into()],
            file_name: Some("notes.pdf".into()),
            file_size: Some(1024),
            mime_type: Some("application/pdf".into()),
            pdf_url: "https://files.example.com/notes.pdf".into(),
            upload_provider: ProviderTag::ImagekitSmall,
            provider_file_id: Some("file_1".into()),
            uploaded_by: "admin".into(),
        }
    }

    #[tokio::test]
    async fn create_and_fetch_roundtrip_keeps_provider_tag() {
        let service = test_service().await;
        let created = service.create_document(record("Notes")).await.unwrap();

        let fetched = service.get_document(created.id).await.unwrap();
        assert_eq!(fetched.title, "Notes");
        assert_eq!(fetched.upload_provider, ProviderTag::ImagekitSmall);
        assert_eq!(fetched.view_count, 0);
        assert_eq!(fetched.download_count, 0);
        assert_eq!(fetched.categories.0, vec!["Mathematics".to_string()]);
    }

    #[tokio::test]
    async fn titles_are_validated_at_input() {
        let service = test_service().await;
        assert!(matches!(
            service.create_document(record("")).await,
            Err(LibraryError::InvalidTitle)
        ));
        assert!(matches!(
            service.create_document(record("nineteen characters")).await,
            Err(LibraryError::InvalidTitle)
        ));
        // 18 characters exactly is allowed.
        service.create_document(record("eighteen chars ok!")).await.unwrap();
    }

    #[tokio::test]
    async fn missing_author_is_rejected() {
        let service = test_service().await;
        let mut rec = record("Notes");
        rec.author = "  ".into();
        assert!(matches!(
            service.create_document(rec).await,
            Err(LibraryError::MissingAuthor)
        ));
    }

    #[tokio::test]
    async fn update_applies_patch_and_restamps() {
        let service = test_service().await;
        let created = service.create_document(record("Notes")).await.unwrap();

        let updated = service
            .update_document(
                created.id,
                DocumentPatch {
                    title: Some("Engine notes".into()),
                    tags: Some(vec!["difference-engine".into()]),
                    ..DocumentPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Engine notes");
        assert_eq!(updated.tags.0, vec!["difference-engine".to_string()]);
        assert_eq!(updated.author, "Ada Lovelace");
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let service = test_service().await;
        let first = service.create_document(record("First")).await.unwrap();
        let second = service.create_document(record("Second")).await.unwrap();

        let docs = service.list_documents(DocumentFilter::default()).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, second.id);
        assert_eq!(docs[1].id, first.id);
    }

    #[tokio::test]
    async fn category_filter_uses_containment() {
        let service = test_service().await;
        service.create_document(record("Math")).await.unwrap();
        let mut other = record("Poetry");
        other.categories = vec!["Literature".into(), "History".into()];
        service.create_document(other).await.unwrap();

        let docs = service
            .list_documents(DocumentFilter {
                category: Some("Literature".into()),
                ..DocumentFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "Poetry");
    }

    #[tokio::test]
    async fn text_search_covers_tags_case_insensitively() {
        let service = test_service().await;
        service.create_document(record("Notes")).await.unwrap();
        let mut other = record("Other");
        other.tags = vec!["compilers".into()];
        other.description = "Nothing relevant".into();
        service.create_document(other).await.unwrap();

        let docs = service
            .list_documents(DocumentFilter {
                search: Some("ENGINES".into()),
                ..DocumentFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "Notes");
    }

    #[tokio::test]
    async fn counters_only_go_up() {
        let service = test_service().await;
        let created = service.create_document(record("Notes")).await.unwrap();

        service.increment_view_count(created.id).await.unwrap();
        service.increment_view_count(created.id).await.unwrap();
        service.increment_download_count(created.id).await.unwrap();

        let fetched = service.get_document(created.id).await.unwrap();
        assert_eq!(fetched.view_count, 2);
        assert_eq!(fetched.download_count, 1);
    }

    #[tokio::test]
    async fn deleting_a_document_removes_its_record() {
        let service = test_service().await;
        let created = service.create_document(record("Notes")).await.unwrap();

        let deleted = service.delete_document(created.id).await.unwrap();
        assert_eq!(deleted.id, created.id);
        assert!(matches!(
            service.get_document(created.id).await,
            Err(LibraryError::DocumentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn categories_list_by_name() {
        let service = test_service().await;
        service
            .create_category(NewCategory {
                name: "Zoology".into(),
                description: None,
                color: None,
            })
            .await
            .unwrap();
        service
            .create_category(NewCategory {
                name: "Algebra".into(),
                description: Some("Abstract and linear".into()),
                color: Some("#3B82F6".into()),
            })
            .await
            .unwrap();

        let categories = service.list_categories().await.unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].name, "Algebra");
        assert_eq!(categories[1].name, "Zoology");
    }

    #[tokio::test]
    async fn dedupe_keeps_the_oldest_record() {
        let service = test_service().await;
        let keep = service
            .create_category(NewCategory {
                name: "History".into(),
                description: None,
                color: None,
            })
            .await
            .unwrap();
        service
            .create_category(NewCategory {
                name: "history".into(),
                description: None,
                color: None,
            })
            .await
            .unwrap();
        service
            .create_category(NewCategory {
                name: "HISTORY".into(),
                description: None,
                color: None,
            })
            .await
            .unwrap();

        let removed = service.dedupe_categories().await.unwrap();
        assert_eq!(removed, 2);

        let categories = service.list_categories().await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].id, keep.id);
    }

    #[tokio::test]
    async fn deleting_a_category_leaves_documents_dangling() {
        let service = test_service().await;
        let category = service
            .create_category(NewCategory {
                name: "Mathematics".into(),
                description: None,
                color: None,
            })
            .await
            .unwrap();
        let doc = service.create_document(record("Notes")).await.unwrap();

        service.delete_category(category.id).await.unwrap();

        // The document still carries the deleted category's name.
        let fetched = service.get_document(doc.id).await.unwrap();
        assert_eq!(fetched.categories.0, vec!["Mathematics".to_string()]);
    }
}
