use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::schema::BaselineRecord;
use crate::storage_traits::{BaselineStore, StoreResult};

type Document = BTreeMap<String, Value>;

/// Baseline store backed by one pretty-printed JSON document.
///
/// Layout: `{ "<identity>": { <BaselineRecord fields> }, ... }`
///
/// Every `save` rewrites the whole document through a temp file in the same
/// directory followed by a rename, so readers see either the old or the new
/// document. A missing, unreadable-as-JSON or wrongly shaped document loads
/// as "no baseline" and is replaced on the next save.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> StoreResult<Document> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(Document::new());
        }

        serde_json::from_str::<Document>(&content).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    fn write_document(&self, doc: &Document) -> StoreResult<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        fs::create_dir_all(&dir).map_err(io_err)?;

        let content = serde_json::to_string_pretty(doc)?;

        // Atomic write: temp file in the target directory, then rename over.
        let mut tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
        tmp.write_all(content.as_bytes()).map_err(io_err)?;
        tmp.write_all(b"\n").map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;

        Ok(())
    }
}

impl BaselineStore for JsonFileStore {
    fn load(&self, identity: &str) -> StoreResult<Option<BaselineRecord>> {
        let doc = match self.read_document() {
            Ok(doc) => doc,
            Err(StoreError::Corrupt { path, reason }) => {
                warn!(path = ?path, %reason, "state file is corrupt, treating as empty baseline");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let Some(value) = doc.get(identity) else {
            debug!(identity, "no baseline stored");
            return Ok(None);
        };

        match serde_json::from_value::<BaselineRecord>(value.clone()) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(identity, error = %e, "baseline record is malformed, treating as empty");
                Ok(None)
            }
        }
    }

    fn save(&self, identity: &str, record: &BaselineRecord) -> StoreResult<()> {
        let mut doc = match self.read_document() {
            Ok(doc) => doc,
            Err(StoreError::Corrupt { path, reason }) => {
                warn!(path = ?path, %reason, "replacing corrupt state file");
                Document::new()
            }
            Err(e) => return Err(e),
        };

        doc.insert(identity.to_string(), serde_json::to_value(record)?);
        self.write_document(&doc)?;
        debug!(identity, path = ?self.path, "baseline saved");
        Ok(())
    }

    fn remove(&self, identity: &str) -> StoreResult<()> {
        let mut doc = match self.read_document() {
            Ok(doc) => doc,
            Err(StoreError::Corrupt { .. }) => return Ok(()),
            Err(e) => return Err(e),
        };
        if doc.remove(identity).is_some() {
            self.write_document(&doc)?;
        }
        Ok(())
    }
}
