//! Core data models for the document library.
//!
//! These entities represent documents and their categories as stored in the
//! metadata database. They map cleanly to tables via `sqlx::FromRow` and
//! serialize naturally as JSON via `serde`.

pub mod category;
pub mod document;
pub mod provider;
