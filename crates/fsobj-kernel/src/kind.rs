//! One-shot filesystem classification.

use std::fs;
use std::path::Path;

use crate::registry::FileType;

/// What a path currently is on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Missing,
    /// A symlink whose target does not exist. Working symlinks classify as
    /// whatever they point to.
    Symlink,
    Directory,
    /// Regular file, or a special file (socket, pipe, device).
    File,
    TypedFile(FileType),
}

impl Kind {
    /// True if something usable is there. A dangling symlink does not exist.
    pub fn exists(self) -> bool {
        !matches!(self, Kind::Missing | Kind::Symlink)
    }

    /// True if anything is at the path, dangling symlinks included.
    pub fn is_present(self) -> bool {
        !matches!(self, Kind::Missing)
    }

    pub fn is_dir(self) -> bool {
        matches!(self, Kind::Directory)
    }

    pub fn is_file(self) -> bool {
        matches!(self, Kind::File | Kind::TypedFile(_))
    }

    pub fn file_type(self) -> Option<FileType> {
        match self {
            Kind::TypedFile(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Missing => "missing",
            Kind::Symlink => "symlink",
            Kind::Directory => "directory",
            Kind::File => "file",
            Kind::TypedFile(_) => "typed_file",
        }
    }
}

/// Classify `path` without MIME detection.
///
/// Follows symlinks; a link whose target is gone is [`Kind::Symlink`].
pub fn probe(path: &Path) -> Kind {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Kind::Directory,
        Ok(_) => Kind::File,
        Err(_) => match fs::symlink_metadata(path) {
            Ok(meta) if meta.file_type().is_symlink() => Kind::Symlink,
            _ => Kind::Missing,
        },
    }
}

/// True if `path` itself is a symlink, working or not.
pub fn is_link(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}
