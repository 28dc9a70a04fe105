//! Cheap staleness detection for vault documents.
//!
//! A [`Fingerprint`] is `"<mtime>_<size>"` for a file; two equal
//! fingerprints are taken to mean "content unchanged". The
//! [`FingerprintStore`] persists the key -> fingerprint mapping as a flat
//! JSON object next to the text index, and must hold an entry for exactly
//! the documents present in the index.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, Metadata};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let mtime = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        Self(format!("{}_{}", mtime, metadata.len()))
    }

    pub fn of(path: &Path) -> std::io::Result<Self> {
        Ok(Self::from_metadata(&fs::metadata(path)?))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Fingerprint {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

pub type Fingerprints = BTreeMap<String, Fingerprint>;

#[derive(Debug, Clone)]
pub struct FingerprintStore {
    path: PathBuf,
}

impl FingerprintStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted mapping. A missing or unreadable store degrades
    /// to an empty mapping, which only costs a full reindex.
    pub fn load(&self) -> Fingerprints {
        match self.try_load() {
            Ok(map) => map,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "discarding fingerprint store");
                Fingerprints::new()
            }
        }
    }

    pub fn try_load(&self) -> Result<Fingerprints, StoreError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no fingerprint store yet");
                return Ok(Fingerprints::new());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&data)?)
    }

    /// Persists the mapping with a tempfile + rename so a crash never
    /// leaves a half-written store behind.
    pub fn save(&self, fingerprints: &Fingerprints) -> Result<(), StoreError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let tmp = NamedTempFile::new_in(dir)?;
        let mut writer = BufWriter::new(tmp);
        serde_json::to_writer(&mut writer, fingerprints)?;
        writer.flush()?;
        let tmp = writer.into_inner().map_err(|e| e.into_error())?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!(entries = fingerprints.len(), "saved fingerprint store");
        Ok(())
    }
}
