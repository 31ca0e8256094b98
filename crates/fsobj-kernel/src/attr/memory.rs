//! In-memory attribute backend.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::AttrBackend;
use crate::runner::ToolFailure;

/// Attributes kept in a process-local map keyed by path.
///
/// Keys list in sorted order. Nothing touches the filesystem.
#[derive(Debug, Default)]
pub struct MemoryAttrs {
    entries: RwLock<HashMap<PathBuf, BTreeMap<String, String>>>,
}

impl MemoryAttrs {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(op: &str, path: &Path) -> ToolFailure {
    ToolFailure::native(
        op,
        path,
        &std::io::Error::other("attribute map lock poisoned"),
    )
}

impl AttrBackend for MemoryAttrs {
    fn list(&self, path: &Path) -> Result<Vec<String>, ToolFailure> {
        let entries = self.entries.read().map_err(|_| poisoned("attr-list", path))?;
        Ok(entries
            .get(path)
            .map(|attrs| attrs.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn get(&self, path: &Path, key: &str) -> Result<String, ToolFailure> {
        let entries = self.entries.read().map_err(|_| poisoned("attr-get", path))?;
        entries
            .get(path)
            .and_then(|attrs| attrs.get(key))
            .cloned()
            .ok_or_else(|| {
                ToolFailure::native(
                    "attr-get",
                    path,
                    &std::io::Error::new(std::io::ErrorKind::NotFound, format!("no attribute {key}")),
                )
            })
    }

    fn set(&self, path: &Path, key: &str, value: &str) -> Result<(), ToolFailure> {
        let mut entries = self.entries.write().map_err(|_| poisoned("attr-set", path))?;
        entries
            .entry(path.to_path_buf())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, path: &Path, key: &str) -> Result<(), ToolFailure> {
        let mut entries = self.entries.write().map_err(|_| poisoned("attr-remove", path))?;
        if let Some(attrs) = entries.get_mut(path) {
            attrs.remove(key);
        }
        Ok(())
    }
}
