//! # vault_core
//!
//! Keeps a full-text search index in sync with a vault: a directory tree
//! of markdown, plain-text and PDF documents.
//!
//! ## Features
//!
//! - **Change Watching**: OS notifications feed a deduplicated pending set
//! - **Debounced Indexing**: bursts of writes are coalesced into one batch per interval
//! - **Reconciliation**: a full-tree diff against cheap `mtime_size` fingerprints
//!   finds new, changed and deleted documents
//! - **Full-text Search**: SQLite FTS5 with BM25 ranking and highlighted previews
//! - **PDF Extraction**: page-by-page text extraction; unreadable PDFs index as empty
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vault_core::{Engine, EngineConfig};
//!
//! # async fn run() -> Result<(), vault_core::VaultError> {
//! let config = EngineConfig::new("/data/vault", "/data/search_index");
//!
//! // Opens the index, reconciles it with the vault and starts watching.
//! let mut engine = Engine::start(config).await?;
//!
//! for result in engine.search("alpha", Some(5)).await? {
//!     println!("{} {:.2}", result.path, result.score);
//! }
//!
//! // Manual reindex.
//! engine.reconcile().await?;
//!
//! engine.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **[`vault`]**: eligibility rules and vault walking
//! - **[`fingerprint`]**: staleness fingerprints and their persisted store
//! - **[`extract`]**: file to plain-text conversion
//! - **[`search`]**: the [`search::TextIndex`] contract, its SQLite implementation and the query engine
//! - **[`indexer`]**: the write path and the consistency reconciler
//! - **[`watcher`]**: change sources, the pending set and the debounce processor
//! - **[`engine`]**: the handle tying it all together
//!
//! ## Error Handling
//!
//! Operations return [`VaultResult<T>`]. Failures confined to one file or
//! one debounce tick are logged with `tracing` and reported rather than
//! returned; failures that leave the engine unable to serve (an index that
//! cannot be opened or written) are returned to the caller.

pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod fingerprint;
pub mod indexer;
pub mod search;
pub mod vault;
pub mod watcher;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{VaultError, VaultResult};
pub use search::query::SearchResult;
