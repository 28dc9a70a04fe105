use crate::error::IndexError;
use crate::search::{Document, Hit, IndexOp, TextIndex};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

const SNIPPET_TOKENS: u32 = 24;

/// [`TextIndex`] backed by an SQLite database with an FTS5 table.
///
/// The database runs in WAL mode so searches read a consistent snapshot
/// while a commit is in progress.
#[derive(Clone)]
pub struct SqliteIndex {
    pub(crate) pool: SqlitePool,
}

impl SqliteIndex {
    /// Opens the index database at `db_path`, creating it and its schema if
    /// needed. Failure here is fatal to the engine.
    pub async fn open(db_path: &Path) -> Result<Self, IndexError> {
        let open_err = |source| IndexError::Open {
            path: db_path.to_path_buf(),
            source,
        };

        if let Some(dir) = db_path.parent() {
            std::fs::create_dir_all(dir).map_err(|e| open_err(sqlx::Error::Io(e)))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(open_err)?;

        sqlx::migrate!().run(&pool).await?;

        info!(path = %db_path.display(), "opened text index");
        Ok(SqliteIndex { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn millis_to_datetime(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}

fn read_document(row: &SqliteRow) -> Result<Document, sqlx::Error> {
    Ok(Document {
        path: row.try_get("path")?,
        content: row.try_get("content")?,
        modified: millis_to_datetime(row.try_get("modified")?),
    })
}

#[async_trait]
impl TextIndex for SqliteIndex {
    async fn commit(&self, ops: Vec<IndexOp>) -> Result<(), IndexError> {
        let mut tx = self.pool.begin().await.map_err(IndexError::Write)?;
        let total = ops.len();

        for op in ops {
            match op {
                IndexOp::Upsert(doc) => {
                    sqlx::query(
                        "INSERT INTO documents (path, content, modified) VALUES (?, ?, ?)
                         ON CONFLICT(path) DO UPDATE SET
                            content = excluded.content,
                            modified = excluded.modified",
                    )
                    .bind(&doc.path)
                    .bind(&doc.content)
                    .bind(doc.modified.timestamp_millis())
                    .execute(&mut *tx)
                    .await
                    .map_err(IndexError::Write)?;
                }
                IndexOp::Delete(path) => {
                    sqlx::query("DELETE FROM documents WHERE path = ?")
                        .bind(&path)
                        .execute(&mut *tx)
                        .await
                        .map_err(IndexError::Write)?;
                }
            }
        }

        tx.commit().await.map_err(IndexError::Write)?;
        debug!(ops = total, "committed index batch");
        Ok(())
    }

    async fn query(&self, query: &str, limit: usize) -> Result<Vec<Hit>, IndexError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let sql = format!(
            r#"
            SELECT
                d.path,
                d.content,
                d.modified,
                bm25(contents) AS bm25_rank,
                snippet(contents, 0, '<b>', '</b>', '...', {SNIPPET_TOKENS}) AS excerpt
            FROM contents
            JOIN documents d ON d.id = contents.rowid
            WHERE contents MATCH ?
            ORDER BY bm25_rank
            LIMIT ?
            "#
        );

        let rows = sqlx::query(&sql)
            .bind(query)
            .bind(i64::try_from(limit).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await
            .map_err(IndexError::Query)?;

        let mut hits = Vec::with_capacity(rows.len());
        for row in rows {
            let document = read_document(&row).map_err(IndexError::Query)?;
            let rank: f64 = row.try_get("bm25_rank").map_err(IndexError::Query)?;
            let excerpt: Option<String> = row.try_get("excerpt").map_err(IndexError::Query)?;

            // bm25() is lower-is-better; flip it so callers sort descending.
            hits.push(Hit {
                document,
                score: -rank,
                highlight: excerpt.filter(|s| !s.trim().is_empty()),
            });
        }

        Ok(hits)
    }

    async fn get(&self, path: &str) -> Result<Option<Document>, IndexError> {
        let row = sqlx::query("SELECT path, content, modified FROM documents WHERE path = ?")
            .bind(path)
            .fetch_optional(&self.pool)
            .await
            .map_err(IndexError::Query)?;

        row.as_ref()
            .map(read_document)
            .transpose()
            .map_err(IndexError::Query)
    }

    async fn count(&self) -> Result<u64, IndexError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await
            .map_err(IndexError::Query)?;
        Ok(count.max(0) as u64)
    }

    async fn keys(&self) -> Result<Vec<String>, IndexError> {
        sqlx::query_scalar("SELECT path FROM documents ORDER BY path")
            .fetch_all(&self.pool)
            .await
            .map_err(IndexError::Query)
    }
}
