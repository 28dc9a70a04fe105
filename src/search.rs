//! Full-text search over vault documents.
//!
//! The storage engine sits behind the [`TextIndex`] trait: create/open,
//! transactional upsert/delete by key, key listing, and ranked query
//! execution. The
//! crate ships [`index::SqliteIndex`], backed by SQLite's FTS5 extension,
//! which supplies tokenizing, BM25 ranking and snippet highlighting.
//! [`query::QueryEngine`] turns raw hits into [`query::SearchResult`]s.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vault_core::search::index::SqliteIndex;
//! use vault_core::search::query::QueryEngine;
//! # use std::path::Path;
//!
//! # async fn run() -> Result<(), vault_core::VaultError> {
//! let index = SqliteIndex::open(Path::new("/data/search_index/index.db")).await?;
//! let engine = QueryEngine::new(Arc::new(index), 10, 100);
//!
//! for hit in engine.search("alpha AND beta", None).await? {
//!     println!("{} ({:.2}): {}", hit.path, hit.score, hit.content_preview);
//! }
//! # Ok(())
//! # }
//! ```

pub mod index;
pub mod query;

use crate::error::IndexError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One indexed vault file, keyed by its vault-relative path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub path: String,
    pub content: String,
    pub modified: DateTime<Utc>,
}

/// A single mutation inside an index commit.
#[derive(Debug, Clone)]
pub enum IndexOp {
    /// Inserts the document, replacing any document with the same path.
    Upsert(Document),
    /// Removes the document with this path, if present.
    Delete(String),
}

/// A raw query hit as produced by the index.
#[derive(Debug, Clone)]
pub struct Hit {
    pub document: Document,
    /// Relevance; higher is better.
    pub score: f64,
    /// Highlighted excerpt around the match, when the index produced one.
    pub highlight: Option<String>,
}

/// Contract of the storage engine behind the search core.
///
/// `commit` must be atomic: concurrent readers see the index either
/// before or after the whole batch, never part of it. Only one writer is
/// expected at a time; readers may run concurrently with it.
#[async_trait]
pub trait TextIndex: Send + Sync {
    async fn commit(&self, ops: Vec<IndexOp>) -> Result<(), IndexError>;

    /// Executes `query` in the index's own query grammar and returns at
    /// most `limit` hits ordered by descending score.
    async fn query(&self, query: &str, limit: usize) -> Result<Vec<Hit>, IndexError>;

    async fn get(&self, path: &str) -> Result<Option<Document>, IndexError>;

    async fn count(&self) -> Result<u64, IndexError>;

    /// Paths of every indexed document.
    async fn keys(&self) -> Result<Vec<String>, IndexError>;
}
