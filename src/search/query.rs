use crate::error::VaultError;
use crate::search::{Hit, TextIndex};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

const PREVIEW_CHARS: usize = 200;
const ELLIPSIS: &str = "...";

/// A ranked search hit as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Vault-relative path of the matching document.
    pub path: String,
    /// Highlighted excerpt, or the start of the document when the index
    /// produced no excerpt.
    pub content_preview: String,
    pub score: f64,
    pub modified: DateTime<Utc>,
}

/// Read-only query side of the engine. Never waits on indexing batches.
#[derive(Clone)]
pub struct QueryEngine {
    index: Arc<dyn TextIndex>,
    default_limit: usize,
    max_limit: usize,
}

impl QueryEngine {
    pub fn new(index: Arc<dyn TextIndex>, default_limit: usize, max_limit: usize) -> Self {
        Self {
            index,
            default_limit,
            max_limit,
        }
    }

    /// Runs `query` against document content and returns at most `limit`
    /// results (the configured default when `None`, capped at the
    /// configured maximum), ordered by descending score.
    ///
    /// The query uses the index's grammar (FTS5 for [`SqliteIndex`]):
    /// bare terms, `"phrases"`, `AND`/`OR`/`NOT`, and `prefix*`. Text the
    /// grammar rejects, such as `don't` or `e-mail`, is retried once with
    /// every word quoted as a literal.
    ///
    /// [`SqliteIndex`]: crate::search::index::SqliteIndex
    pub async fn search(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<SearchResult>, VaultError> {
        let limit = limit.unwrap_or(self.default_limit).min(self.max_limit);
        debug!(query, limit, "searching");

        let hits = match self.index.query(query, limit).await {
            Ok(hits) => hits,
            Err(e) if e.is_query_syntax() => {
                let literal = quote_terms(query);
                debug!(query, literal = %literal, error = %e, "retrying query as literal terms");
                self.index.query(&literal, limit).await.map_err(|e| {
                    error!(query, error = %e, "search failed");
                    e
                })?
            }
            Err(e) => {
                error!(query, error = %e, "search failed");
                return Err(e.into());
            }
        };

        debug!(query, results = hits.len(), "search finished");
        Ok(hits.into_iter().take(limit).map(render).collect())
    }
}

/// Rewrites `query` so each whitespace-separated word is an FTS5 string
/// literal. Embedded quotes are doubled.
fn quote_terms(query: &str) -> String {
    query
        .split_whitespace()
        .map(|word| format!("\"{}\"", word.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" ")
}

fn render(hit: Hit) -> SearchResult {
    let content_preview = match hit.highlight {
        Some(excerpt) => excerpt,
        None => fallback_preview(&hit.document.content),
    };

    SearchResult {
        path: hit.document.path,
        content_preview,
        score: hit.score,
        modified: hit.document.modified,
    }
}

fn fallback_preview(content: &str) -> String {
    let mut preview: String = content.chars().take(PREVIEW_CHARS).collect();
    preview.push_str(ELLIPSIS);
    preview
}
