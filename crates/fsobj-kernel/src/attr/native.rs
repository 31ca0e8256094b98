//! Native extended attribute backend.

use std::path::Path;

use super::AttrBackend;
use crate::runner::ToolFailure;

const NAMESPACE: &str = "user.";

/// Extended attributes via the `xattr` crate, in the `user.` namespace.
///
/// Keys are exposed without the namespace prefix, matching what the `attr`
/// tool reports. Attributes outside `user.` are not listed.
#[derive(Debug, Clone, Copy, Default)]
pub struct XattrBackend;

impl XattrBackend {
    pub fn new() -> Self {
        Self
    }
}

fn qualified(key: &str) -> String {
    format!("{NAMESPACE}{key}")
}

impl AttrBackend for XattrBackend {
    fn list(&self, path: &Path) -> Result<Vec<String>, ToolFailure> {
        let names = xattr::list(path).map_err(|e| ToolFailure::native("attr-list", path, &e))?;
        Ok(names
            .filter_map(|name| {
                name.to_str()
                    .and_then(|n| n.strip_prefix(NAMESPACE))
                    .map(str::to_string)
            })
            .collect())
    }

    fn get(&self, path: &Path, key: &str) -> Result<String, ToolFailure> {
        match xattr::get(path, qualified(key)) {
            Ok(Some(bytes)) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Ok(None) => Err(ToolFailure::native(
                "attr-get",
                path,
                &std::io::Error::new(std::io::ErrorKind::NotFound, format!("no attribute {key}")),
            )),
            Err(e) => Err(ToolFailure::native("attr-get", path, &e)),
        }
    }

    fn set(&self, path: &Path, key: &str, value: &str) -> Result<(), ToolFailure> {
        xattr::set(path, qualified(key), value.as_bytes())
            .map_err(|e| ToolFailure::native("attr-set", path, &e))
    }

    fn remove(&self, path: &Path, key: &str) -> Result<(), ToolFailure> {
        xattr::remove(path, qualified(key)).map_err(|e| ToolFailure::native("attr-remove", path, &e))
    }
}
