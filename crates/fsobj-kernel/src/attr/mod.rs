//! Per-file key/value attributes.
//!
//! [`AttrBackend`] is the raw store: list, read, write, remove. [`AttrTable`]
//! layers the per-handle behavior on top of it: a memoized key list, `None`
//! for absent keys without a round trip, and prior-value capture on delete.
//!
//! Backends:
//! - [`AttrCommand`]: the `attr` tool, through a [`ProcessRunner`](crate::runner::ProcessRunner)
//! - [`XattrBackend`]: native extended attributes (unix)
//! - [`MemoryAttrs`]: in-process map, for tests and dry runs

mod command;
mod memory;
#[cfg(unix)]
mod native;

pub use command::AttrCommand;
pub use memory::MemoryAttrs;
#[cfg(unix)]
pub use native::XattrBackend;

use std::path::Path;

use crate::error::{FsoError, Result};
use crate::runner::ToolFailure;

/// Raw attribute storage for files.
pub trait AttrBackend: Send + Sync {
    /// Names of all attributes set on `path`.
    fn list(&self, path: &Path) -> std::result::Result<Vec<String>, ToolFailure>;

    /// Value of `key`. Only called for keys known to exist.
    fn get(&self, path: &Path, key: &str) -> std::result::Result<String, ToolFailure>;

    fn set(&self, path: &Path, key: &str, value: &str) -> std::result::Result<(), ToolFailure>;

    fn remove(&self, path: &Path, key: &str) -> std::result::Result<(), ToolFailure>;
}

/// Attribute view for one file.
///
/// The key list is loaded on first use and kept until a `set` or `delete`
/// through this table.
pub struct AttrTable<'a> {
    backend: &'a dyn AttrBackend,
    path: &'a Path,
    frozen: bool,
    keys: Option<Vec<String>>,
}

impl<'a> AttrTable<'a> {
    pub fn new(backend: &'a dyn AttrBackend, path: &'a Path) -> Self {
        Self {
            backend,
            path,
            frozen: false,
            keys: None,
        }
    }

    /// Reject `set` and `delete` with [`FsoError::Frozen`].
    pub fn frozen(mut self, frozen: bool) -> Self {
        self.frozen = frozen;
        self
    }

    pub fn path(&self) -> &Path {
        self.path
    }

    /// Attribute names, memoized.
    pub fn keys(&mut self) -> Result<&[String]> {
        if self.keys.is_none() {
            let keys = self
                .backend
                .list(self.path)
                .map_err(|source| FsoError::AttributeRead {
                    key: "(list)".to_string(),
                    source,
                })?;
            self.keys = Some(keys);
        }
        Ok(self.keys.as_deref().unwrap_or_default())
    }

    pub fn contains(&mut self, key: &str) -> Result<bool> {
        Ok(self.keys()?.iter().any(|k| k == key))
    }

    /// Value of `key`, or `None` if it is not set.
    pub fn get(&mut self, key: &str) -> Result<Option<String>> {
        if !self.contains(key)? {
            return Ok(None);
        }
        self.backend
            .get(self.path, key)
            .map(Some)
            .map_err(|source| FsoError::AttributeRead {
                key: key.to_string(),
                source,
            })
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.check_frozen("set attribute on")?;
        self.keys = None;
        tracing::debug!(path = %self.path.display(), key, "setting attribute");
        self.backend
            .set(self.path, key, value)
            .map_err(|source| FsoError::AttributeWrite {
                key: key.to_string(),
                source,
            })
    }

    /// Remove `key`, returning its prior value. Absent keys are `None`.
    pub fn delete(&mut self, key: &str) -> Result<Option<String>> {
        self.check_frozen("delete attribute on")?;
        let Some(prior) = self.get(key)? else {
            return Ok(None);
        };
        self.keys = None;
        tracing::debug!(path = %self.path.display(), key, "deleting attribute");
        self.backend
            .remove(self.path, key)
            .map_err(|source| FsoError::AttributeDelete {
                key: key.to_string(),
                source,
            })?;
        Ok(Some(prior))
    }

    fn check_frozen(&self, op: &'static str) -> Result<()> {
        if self.frozen {
            return Err(FsoError::Frozen {
                op,
                path: self.path.to_path_buf(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for AttrTable<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttrTable")
            .field("path", &self.path)
            .field("frozen", &self.frozen)
            .field("keys", &self.keys)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts list calls so memoization is observable.
    struct Counting {
        inner: MemoryAttrs,
        lists: AtomicUsize,
    }

    impl AttrBackend for Counting {
        fn list(&self, path: &Path) -> std::result::Result<Vec<String>, ToolFailure> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            self.inner.list(path)
        }
        fn get(&self, path: &Path, key: &str) -> std::result::Result<String, ToolFailure> {
            self.inner.get(path, key)
        }
        fn set(&self, path: &Path, key: &str, value: &str) -> std::result::Result<(), ToolFailure> {
            self.inner.set(path, key, value)
        }
        fn remove(&self, path: &Path, key: &str) -> std::result::Result<(), ToolFailure> {
            self.inner.remove(path, key)
        }
    }

    struct Broken;

    impl AttrBackend for Broken {
        fn list(&self, _: &Path) -> std::result::Result<Vec<String>, ToolFailure> {
            Err(ToolFailure::exited("attr-list", "/usr/bin/attr", 1, "Operation not supported"))
        }
        fn get(&self, _: &Path, _: &str) -> std::result::Result<String, ToolFailure> {
            unreachable!()
        }
        fn set(&self, _: &Path, _: &str, _: &str) -> std::result::Result<(), ToolFailure> {
            Err(ToolFailure::exited("attr-set", "/usr/bin/attr", 1, "Operation not supported"))
        }
        fn remove(&self, _: &Path, _: &str) -> std::result::Result<(), ToolFailure> {
            unreachable!()
        }
    }

    #[test]
    fn set_get_delete() {
        let backend = MemoryAttrs::new();
        let path = Path::new("/f");
        let mut table = AttrTable::new(&backend, path);

        assert_eq!(table.get("color").unwrap(), None);
        table.set("color", "blue").unwrap();
        assert_eq!(table.get("color").unwrap().as_deref(), Some("blue"));
        assert_eq!(table.delete("color").unwrap().as_deref(), Some("blue"));
        assert_eq!(table.get("color").unwrap(), None);
        assert_eq!(table.delete("color").unwrap(), None);
    }

    #[test]
    fn key_list_is_memoized_until_write() {
        let backend = Counting {
            inner: MemoryAttrs::new(),
            lists: AtomicUsize::new(0),
        };
        let path = Path::new("/f");
        let mut table = AttrTable::new(&backend, path);

        table.keys().unwrap();
        table.get("a").unwrap();
        table.contains("b").unwrap();
        assert_eq!(backend.lists.load(Ordering::SeqCst), 1);

        table.set("a", "1").unwrap();
        assert_eq!(table.keys().unwrap(), ["a".to_string()]);
        assert_eq!(backend.lists.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failures_map_to_attribute_errors() {
        let path = Path::new("/f");
        let mut table = AttrTable::new(&Broken, path);

        let err = table.get("k").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AttributeRead);
        assert!(err.is_external_tool());

        let err = table.set("k", "v").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AttributeWrite);
    }

    /// Lists `k` but cannot read or remove it.
    struct Unreadable;

    impl AttrBackend for Unreadable {
        fn list(&self, _: &Path) -> std::result::Result<Vec<String>, ToolFailure> {
            Ok(vec!["k".to_string()])
        }
        fn get(&self, _: &Path, _: &str) -> std::result::Result<String, ToolFailure> {
            Err(ToolFailure::exited("attr-get", "/usr/bin/attr", 1, "Permission denied"))
        }
        fn set(&self, _: &Path, _: &str, _: &str) -> std::result::Result<(), ToolFailure> {
            Ok(())
        }
        fn remove(&self, _: &Path, _: &str) -> std::result::Result<(), ToolFailure> {
            Err(ToolFailure::exited("attr-remove", "/usr/bin/attr", 1, "Permission denied"))
        }
    }

    /// Reads work, removal fails.
    struct Sticky(MemoryAttrs);

    impl AttrBackend for Sticky {
        fn list(&self, path: &Path) -> std::result::Result<Vec<String>, ToolFailure> {
            self.0.list(path)
        }
        fn get(&self, path: &Path, key: &str) -> std::result::Result<String, ToolFailure> {
            self.0.get(path, key)
        }
        fn set(&self, path: &Path, key: &str, value: &str) -> std::result::Result<(), ToolFailure> {
            self.0.set(path, key, value)
        }
        fn remove(&self, _: &Path, _: &str) -> std::result::Result<(), ToolFailure> {
            Err(ToolFailure::exited("attr-remove", "/usr/bin/attr", 1, "Permission denied"))
        }
    }

    #[test]
    fn read_of_listed_key_can_fail() {
        let path = Path::new("/f");
        let mut table = AttrTable::new(&Unreadable, path);

        assert!(table.contains("k").unwrap());
        let err = table.get("k").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AttributeRead);
        assert!(err.to_string().contains("Permission denied"), "{err}");
        // Absent keys never reach the backend read.
        assert_eq!(table.get("other").unwrap(), None);
    }

    #[test]
    fn delete_reports_read_then_remove_failures() {
        let path = Path::new("/f");
        let mut table = AttrTable::new(&Unreadable, path);
        assert_eq!(table.delete("k").unwrap_err().kind(), ErrorKind::AttributeRead);

        let backend = Sticky(MemoryAttrs::new());
        backend.set(path, "k", "v").unwrap();
        let mut table = AttrTable::new(&backend, path);
        let err = table.delete("k").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AttributeDelete);
        assert!(err.is_external_tool());

        // The key list is reloaded and still shows the key that survived.
        assert_eq!(table.keys().unwrap(), ["k".to_string()]);
        assert_eq!(table.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn frozen_table_rejects_writes() {
        let backend = MemoryAttrs::new();
        let path = Path::new("/f");
        backend.set(path, "k", "v").unwrap();

        let mut table = AttrTable::new(&backend, path).frozen(true);
        assert_eq!(table.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(table.set("k", "w").unwrap_err().kind(), ErrorKind::Frozen);
        assert_eq!(table.delete("k").unwrap_err().kind(), ErrorKind::Frozen);
    }
}
