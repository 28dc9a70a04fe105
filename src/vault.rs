//! Vault layout rules: which files are visible to the core and how they
//! are keyed.
//!
//! A file is eligible when its extension is in the whitelist and no
//! component of its path below the vault root starts with a dot. Keys are
//! vault-relative paths joined with `/` regardless of platform.

use crate::error::ExtractError;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// The vault root plus its extension whitelist.
#[derive(Debug, Clone)]
pub struct Vault {
    root: PathBuf,
    extensions: Vec<String>,
}

/// A regular file discovered by [`Vault::scan`].
#[derive(Debug, Clone)]
pub struct VaultFile {
    pub path: PathBuf,
    pub key: String,
    pub eligible: bool,
}

impl Vault {
    pub fn new(root: impl Into<PathBuf>, extensions: &[String]) -> Self {
        Self {
            root: root.into(),
            extensions: extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn has_eligible_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }

    /// Returns true if `path` (absolute, under the root) should be indexed.
    pub fn is_eligible(&self, path: &Path) -> bool {
        match path.strip_prefix(&self.root) {
            Ok(rel) => !is_hidden(rel) && self.has_eligible_extension(path),
            Err(_) => false,
        }
    }

    /// Computes the document key for an absolute path under the root.
    /// Paths that are not valid UTF-8 have no key.
    pub fn key_for(&self, path: &Path) -> Result<String, ExtractError> {
        let rel = path
            .strip_prefix(&self.root)
            .map_err(|_| ExtractError::OutsideVault {
                path: path.to_path_buf(),
            })?;

        let mut parts = Vec::new();
        for component in rel.components() {
            if let Component::Normal(part) = component {
                let part = part.to_str().ok_or_else(|| ExtractError::NonUtf8Path {
                    path: path.to_path_buf(),
                })?;
                parts.push(part);
            }
        }

        if parts.is_empty() {
            return Err(ExtractError::OutsideVault {
                path: path.to_path_buf(),
            });
        }
        Ok(parts.join("/"))
    }

    /// Resolves a document key back to an absolute path.
    pub fn path_for(&self, key: &str) -> PathBuf {
        key.split('/').fold(self.root.clone(), |acc, part| acc.join(part))
    }

    /// Walks the vault and returns every visible regular file keyed by its
    /// relative path. Dot-named files and directories are pruned; entries
    /// that cannot be read are logged and skipped.
    pub fn scan(&self) -> BTreeMap<String, VaultFile> {
        let mut files = BTreeMap::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden_entry(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable vault entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.into_path();
            match self.key_for(&path) {
                Ok(key) => {
                    let eligible = self.has_eligible_extension(&path);
                    files.insert(
                        key.clone(),
                        VaultFile {
                            path,
                            key,
                            eligible,
                        },
                    );
                }
                Err(e) => warn!(error = %e, "skipping vault entry"),
            }
        }

        files
    }
}

fn is_hidden_entry(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn is_hidden(rel: &Path) -> bool {
    rel.components().any(|c| match c {
        Component::Normal(part) => part.to_string_lossy().starts_with('.'),
        _ => false,
    })
}
