//! Turning a path into the right kind of handle.

use std::path::Path;

use crate::error::Result;
use crate::handle::Handle;
use crate::kind::{self, Kind};
use crate::mime::MimeDetector;
use crate::registry::TypeRegistry;

/// Classifies canonical paths into handles.
///
/// Untyped resolution only probes the filesystem. Typed resolution also runs
/// MIME detection on regular files and tags registered subtypes.
#[derive(Clone, Copy)]
pub struct TypeResolver<'a> {
    mime: &'a dyn MimeDetector,
    registry: &'a TypeRegistry,
}

impl<'a> TypeResolver<'a> {
    pub fn new(mime: &'a dyn MimeDetector, registry: &'a TypeRegistry) -> Self {
        Self { mime, registry }
    }

    /// Handle for `path` if anything is there, dangling symlinks included.
    pub fn untyped(&self, path: &Path) -> Option<Handle> {
        if kind::probe(path).is_present() {
            Some(Handle::new(path))
        } else {
            None
        }
    }

    /// Like [`TypeResolver::untyped`], with files tagged by content type.
    pub fn typed(&self, path: &Path) -> Result<Option<Handle>> {
        match kind::probe(path) {
            Kind::Missing => Ok(None),
            Kind::File => {
                let mime = self.mime.detect(path)?;
                let file_type = self.registry.get(&mime);
                tracing::trace!(path = %path.display(), %mime, ?file_type, "typed resolution");
                Ok(Some(Handle::new(path).with_file_type(file_type)))
            }
            Kind::Symlink | Kind::Directory | Kind::TypedFile(_) => Ok(Some(Handle::new(path))),
        }
    }
}

impl std::fmt::Debug for TypeResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeResolver")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mime::MockMimeDetector;
    use crate::registry::{builtin, FileType};
    use crate::runner::ToolFailure;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn untyped_never_detects_mime() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.json"), "{}").unwrap();

        let mut mime = MockMimeDetector::new();
        mime.expect_detect().never();
        let resolver = TypeResolver::new(&mime, builtin());

        let h = resolver.untyped(&temp.path().join("a.json")).unwrap();
        assert_eq!(h.file_type(), None);
        assert!(resolver.untyped(&temp.path().join("missing")).is_none());
    }

    #[test]
    fn typed_tags_registered_mime() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.json"), "{}").unwrap();
        fs::write(temp.path().join("b.txt"), "plain").unwrap();

        let mut mime = MockMimeDetector::new();
        mime.expect_detect().returning(|path| {
            Ok(if path.extension().is_some_and(|e| e == "json") {
                "application/json".to_string()
            } else {
                "text/plain".to_string()
            })
        });
        let resolver = TypeResolver::new(&mime, builtin());

        let json = resolver.typed(&temp.path().join("a.json")).unwrap().unwrap();
        assert_eq!(json.file_type(), Some(FileType::Json));
        assert_eq!(json.kind(), Kind::TypedFile(FileType::Json));

        let text = resolver.typed(&temp.path().join("b.txt")).unwrap().unwrap();
        assert_eq!(text.file_type(), None);
        assert_eq!(text.kind(), Kind::File);

        assert!(resolver.typed(&temp.path().join("nope")).unwrap().is_none());
    }

    #[test]
    fn directories_skip_detection() {
        let temp = TempDir::new().unwrap();
        let mut mime = MockMimeDetector::new();
        mime.expect_detect().never();
        let resolver = TypeResolver::new(&mime, builtin());
        let dir = resolver.typed(temp.path()).unwrap().unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn detection_failure_propagates() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a"), "x").unwrap();
        let mut mime = MockMimeDetector::new();
        mime.expect_detect()
            .returning(|_| Err(ToolFailure::exited("mime", "/usr/bin/file", 1, "boom")));
        let resolver = TypeResolver::new(&mime, builtin());
        let err = resolver.typed(&temp.path().join("a")).unwrap_err();
        assert!(err.is_external_tool());
    }
}
