//! Represents a browsing category documents can be filed under.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A document category.
///
/// Names should be unique, but uniqueness is a best-effort cleanup pass
/// rather than a constraint. Documents reference categories by name, so a
/// category can be deleted while documents still carry its name.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Unique identifier for this category (UUID for internal DB use).
    pub id: Uuid,

    pub name: String,

    pub description: Option<String>,

    /// Display color used by the front end (e.g. "#3B82F6").
    pub color: Option<String>,

    pub created_at: DateTime<Utc>,
}
