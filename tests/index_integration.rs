use chrono::{TimeZone, Utc};
use tempfile::TempDir;
use vault_core::error::VaultError;
use vault_core::search::index::SqliteIndex;
use vault_core::search::{Document, IndexOp, TextIndex};

fn doc(path: &str, content: &str) -> Document {
    Document {
        path: path.to_string(),
        content: content.to_string(),
        modified: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    }
}

#[tokio::test]
async fn create_index_and_upsert_document() -> Result<(), VaultError> {
    let tmpdir = TempDir::new()?;
    let index = SqliteIndex::open(&tmpdir.path().join("index.db")).await?;

    index
        .commit(vec![IndexOp::Upsert(doc("notes/a.md", "Hello world content"))])
        .await?;

    let stored = index.get("notes/a.md").await?;
    assert_eq!(stored, Some(doc("notes/a.md", "Hello world content")));
    assert_eq!(index.count().await?, 1);

    Ok(())
}

#[tokio::test]
async fn get_missing_document_returns_none() -> Result<(), VaultError> {
    let tmpdir = TempDir::new()?;
    let index = SqliteIndex::open(&tmpdir.path().join("index.db")).await?;

    assert!(index.get("nonexistent.md").await?.is_none());
    assert_eq!(index.count().await?, 0);

    Ok(())
}

#[tokio::test]
async fn upsert_replaces_instead_of_duplicating() -> Result<(), VaultError> {
    let tmpdir = TempDir::new()?;
    let index = SqliteIndex::open(&tmpdir.path().join("index.db")).await?;

    index
        .commit(vec![IndexOp::Upsert(doc("a.md", "original wording"))])
        .await?;
    index
        .commit(vec![IndexOp::Upsert(doc("a.md", "updated wording"))])
        .await?;

    assert_eq!(index.count().await?, 1);
    assert_eq!(index.get("a.md").await?.unwrap().content, "updated wording");

    // The full-text side follows the update too.
    assert!(index.query("original", 10).await?.is_empty());
    assert_eq!(index.query("updated", 10).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn delete_removes_document_and_its_terms() -> Result<(), VaultError> {
    let tmpdir = TempDir::new()?;
    let index = SqliteIndex::open(&tmpdir.path().join("index.db")).await?;

    index
        .commit(vec![
            IndexOp::Upsert(doc("keep.md", "shared keeper")),
            IndexOp::Upsert(doc("drop.md", "shared doomed")),
        ])
        .await?;
    index.commit(vec![IndexOp::Delete("drop.md".into())]).await?;

    assert!(index.get("drop.md").await?.is_none());
    assert!(index.query("doomed", 10).await?.is_empty());
    let hits = index.query("shared", 10).await?;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].document.path, "keep.md");
    assert_eq!(index.keys().await?, vec!["keep.md".to_string()]);

    // Deleting an unknown key is not an error.
    index.commit(vec![IndexOp::Delete("never.md".into())]).await?;

    Ok(())
}

#[tokio::test]
async fn documents_survive_reopen() -> Result<(), VaultError> {
    let tmpdir = TempDir::new()?;
    let db = tmpdir.path().join("nested").join("index.db");

    let index = SqliteIndex::open(&db).await?;
    index
        .commit(vec![IndexOp::Upsert(doc("a.md", "persistent text"))])
        .await?;
    index.close().await;

    let reopened = SqliteIndex::open(&db).await?;
    assert_eq!(reopened.count().await?, 1);
    assert_eq!(reopened.query("persistent", 10).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn open_fails_when_path_is_unusable() -> Result<(), VaultError> {
    let tmpdir = TempDir::new()?;
    let blocker = tmpdir.path().join("not-a-dir");
    std::fs::write(&blocker, "file in the way")?;

    let result = SqliteIndex::open(&blocker.join("index.db")).await;
    assert!(result.is_err());

    Ok(())
}
