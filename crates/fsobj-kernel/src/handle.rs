//! Filesystem object handles.
//!
//! A [`Handle`] names a location, not an open file. Its identity is its
//! canonical absolute path; every kind-sensitive query goes back to the
//! filesystem, so a handle stays valid while the entry behind it appears,
//! changes type or disappears.

use std::fs;
use std::hash::{Hash, Hasher};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use md5::{Digest, Md5};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::attr::AttrTable;
use crate::context::FsContext;
use crate::error::{FsoError, Result};
use crate::json::JsonDoc;
use crate::kind::{self, Kind};
use crate::path;
use crate::paths;
use crate::registry::FileType;
use crate::runner::{Invocation, ToolOutput};

/// A typed reference to a path on disk.
///
/// Equality and hashing use only the path. The subtype tag, frozen flag and
/// side tables ride along without affecting identity.
#[derive(Debug, Clone)]
pub struct Handle {
    path: PathBuf,
    file_type: Option<FileType>,
    frozen: bool,
    misc: Option<Map<String, Value>>,
    found: Option<Vec<String>>,
}

impl Handle {
    /// Handle for `path`. Relative paths resolve against the process working
    /// directory; use [`FsContext::handle`] to resolve against a context.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if path.is_absolute() {
            return Self::from_canonical(path::normalize(path));
        }
        let base = std::env::current_dir().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "working directory unavailable, resolving from /");
            PathBuf::from("/")
        });
        Self::at(path, &base)
    }

    /// Handle for `path` resolved against `base`.
    pub fn at(path: impl AsRef<Path>, base: &Path) -> Self {
        Self::from_canonical(path::absolutize(path.as_ref(), base))
    }

    pub(crate) fn from_canonical(path: PathBuf) -> Self {
        Self {
            path,
            file_type: None,
            frozen: false,
            misc: None,
            found: None,
        }
    }

    /// Attach a subtype tag from typed resolution.
    pub fn with_file_type(mut self, file_type: Option<FileType>) -> Self {
        self.file_type = file_type;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_path(self) -> PathBuf {
        self.path
    }

    pub fn file_type(&self) -> Option<FileType> {
        self.file_type
    }

    // --- identity -----------------------------------------------------------

    /// Base name. The root is `/`.
    pub fn name(&self) -> String {
        path::base_name(&self.path)
    }

    /// Extension without the dot, `None` if there is none.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .filter(|e| !e.is_empty())
    }

    /// Parent directory, `None` at the root.
    pub fn parent(&self) -> Option<Handle> {
        self.path
            .parent()
            .map(|p| Handle::from_canonical(p.to_path_buf()))
    }

    pub fn is_root(&self) -> bool {
        self.path.parent().is_none()
    }

    pub fn is_home(&self) -> bool {
        self.path == path::normalize(&paths::home_dir())
    }

    /// Path relative to `base`, with `./` for direct children of `base`.
    pub fn relative_to(&self, base: impl AsRef<Path>) -> String {
        let base = Handle::new(base);
        path::render_relative(&self.path, &base.path)
    }

    /// Path rendered the way `ctx` displays paths.
    pub fn display_in(&self, ctx: &FsContext) -> String {
        ctx.display(self)
    }

    /// True if `other` is this path or lies beneath it.
    pub fn contains(&self, other: &Handle) -> bool {
        path::contains(&self.path, &other.path)
    }

    /// True if this path is `other` or lies beneath it.
    pub fn within(&self, other: &Handle) -> bool {
        other.contains(self)
    }

    /// Resolve `rel` against this handle if it is a directory, else against
    /// its parent.
    pub fn relative(&self, rel: impl AsRef<Path>) -> Handle {
        Handle::at(rel, self.base_dir())
    }

    /// True if `rel`, resolved as by [`Handle::relative`], exists.
    pub fn exists_rel(&self, rel: impl AsRef<Path>) -> bool {
        self.relative(rel).exists()
    }

    fn base_dir(&self) -> &Path {
        if self.is_dir() {
            &self.path
        } else {
            self.path.parent().unwrap_or(&self.path)
        }
    }

    /// Compare against a dynamically typed value. Strings are paths; any
    /// other JSON value is an [`FsoError::InvalidComparand`].
    pub fn equals_value(&self, other: &Value) -> Result<bool> {
        match other {
            Value::String(s) => Ok(*self == **s),
            Value::Null => Err(FsoError::InvalidComparand("null".into())),
            Value::Bool(_) => Err(FsoError::InvalidComparand("boolean".into())),
            Value::Number(_) => Err(FsoError::InvalidComparand("number".into())),
            Value::Array(_) => Err(FsoError::InvalidComparand("array".into())),
            Value::Object(_) => Err(FsoError::InvalidComparand("object".into())),
        }
    }

    // --- kind ---------------------------------------------------------------

    /// Probe the filesystem. A subtype tag refines `File` to `TypedFile`.
    pub fn kind(&self) -> Kind {
        match (kind::probe(&self.path), self.file_type) {
            (Kind::File, Some(t)) => Kind::TypedFile(t),
            (k, _) => k,
        }
    }

    /// True if the path exists. Dangling symlinks do not.
    pub fn exists(&self) -> bool {
        self.kind().exists()
    }

    pub fn is_file(&self) -> bool {
        self.kind().is_file()
    }

    pub fn is_dir(&self) -> bool {
        self.kind().is_dir()
    }

    /// True if the path itself is a symlink, working or not.
    pub fn is_symlink(&self) -> bool {
        kind::is_link(&self.path)
    }

    /// Where the symlink points, `None` if this is not a symlink. Relative
    /// link targets resolve against the link's directory.
    pub fn symlink_target(&self) -> Result<Option<Handle>> {
        if !self.is_symlink() {
            return Ok(None);
        }
        let target = fs::read_link(&self.path)
            .map_err(|e| FsoError::from_io("read link", &self.path, e))?;
        let base = self.path.parent().unwrap_or(Path::new("/"));
        Ok(Some(Handle::at(target, base)))
    }

    pub fn is_working_symlink(&self) -> bool {
        self.is_symlink() && fs::metadata(&self.path).is_ok()
    }

    pub fn is_broken_symlink(&self) -> bool {
        self.is_symlink() && fs::metadata(&self.path).is_err()
    }

    // --- metadata -----------------------------------------------------------

    /// Size in bytes, following symlinks.
    pub fn size(&self) -> Result<u64> {
        fs::metadata(&self.path)
            .map(|m| m.len())
            .map_err(|e| FsoError::from_io("stat", &self.path, e))
    }

    #[cfg(unix)]
    pub fn inode(&self) -> Result<u64> {
        use std::os::unix::fs::MetadataExt;
        fs::metadata(&self.path)
            .map(|m| m.ino())
            .map_err(|e| FsoError::from_io("stat", &self.path, e))
    }

    /// `None` if missing. Directories are never executable here.
    pub fn is_executable(&self) -> Option<bool> {
        let meta = fs::metadata(&self.path).ok()?;
        if meta.is_dir() {
            return Some(false);
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            Some(meta.permissions().mode() & 0o111 != 0)
        }
        #[cfg(not(unix))]
        {
            Some(false)
        }
    }

    /// MIME type by content.
    pub fn mime(&self, ctx: &FsContext) -> Result<String> {
        if !self.exists() {
            return Err(FsoError::NotFound(self.path.clone()));
        }
        Ok(ctx.mime().detect(&self.path)?)
    }

    pub fn is_text(&self, ctx: &FsContext) -> Result<bool> {
        Ok(self.mime(ctx)?.starts_with("text/"))
    }

    /// Re-resolve with MIME detection. `None` if the path is gone.
    pub fn resolve_type(&self, ctx: &FsContext) -> Result<Option<Handle>> {
        ctx.resolver().typed(&self.path)
    }

    // --- side tables ----------------------------------------------------------

    /// Caller annotations, created on first access.
    pub fn misc(&mut self) -> &mut Map<String, Value> {
        self.misc.get_or_insert_with(Map::new)
    }

    /// Annotations if any were ever made.
    pub fn misc_ref(&self) -> Option<&Map<String, Value>> {
        self.misc.as_ref()
    }

    /// Lines attached by content search.
    pub fn found(&self) -> &[String] {
        self.found.as_deref().unwrap_or_default()
    }

    pub(crate) fn push_found(&mut self, line: String) {
        self.found.get_or_insert_with(Vec::new).push(line);
    }

    // --- mutation -------------------------------------------------------------

    /// Refuse all further mutations through this handle.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn frozen(mut self) -> Self {
        self.frozen = true;
        self
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub(crate) fn check_frozen(&self, op: &'static str) -> Result<()> {
        if self.frozen {
            return Err(FsoError::Frozen {
                op,
                path: self.path.clone(),
            });
        }
        Ok(())
    }

    /// Remove the entry, recursively for directories. Missing is success.
    pub fn delete(&self) -> Result<()> {
        self.check_frozen("delete")?;
        let meta = match fs::symlink_metadata(&self.path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(FsoError::io("stat", &self.path, e)),
        };
        tracing::debug!(path = %self.path.display(), "deleting");
        let result = if meta.is_dir() {
            fs::remove_dir_all(&self.path)
        } else {
            fs::remove_file(&self.path)
        };
        match result {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FsoError::io("delete", &self.path, e)),
        }
    }

    /// Move onto `target`. An existing directory receives the entry under
    /// its current name; anything else is the exact destination.
    pub fn move_to(&mut self, target: &Handle) -> Result<()> {
        self.check_frozen("move")?;
        let dest = if target.is_dir() {
            target.path.join(self.name())
        } else {
            target.path.clone()
        };
        tracing::debug!(from = %self.path.display(), to = %dest.display(), "moving");

        match fs::rename(&self.path, &dest) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                tracing::debug!("rename crosses devices, copying");
                copy_recursive(&self.path, &dest)?;
                Handle::from_canonical(self.path.clone()).delete()?;
            }
            Err(e) => return Err(FsoError::from_io("move", &self.path, e)),
        }
        self.path = dest;
        Ok(())
    }

    /// Create a symlink at `link` pointing to this handle.
    #[cfg(unix)]
    pub fn symlink(&self, link: &Handle) -> Result<Handle> {
        std::os::unix::fs::symlink(&self.path, &link.path)
            .map_err(|e| FsoError::io("symlink", &link.path, e))?;
        Ok(Handle::from_canonical(link.path.clone()))
    }

    /// Create an empty file, or bump the modification time if present.
    pub fn touch(&self) -> Result<()> {
        self.check_frozen("touch")?;
        let opened = if self.is_dir() {
            fs::File::open(&self.path)
        } else {
            fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
        };
        let file = opened.map_err(|e| FsoError::from_io("touch", &self.path, e))?;
        file.set_modified(SystemTime::now())
            .map_err(|e| FsoError::io("touch", &self.path, e))
    }

    pub fn read(&self) -> Result<String> {
        fs::read_to_string(&self.path).map_err(|e| FsoError::from_io("read", &self.path, e))
    }

    /// Replace the file's content.
    pub fn write(&self, content: impl AsRef<[u8]>) -> Result<()> {
        self.check_frozen("write")?;
        fs::write(&self.path, content).map_err(|e| FsoError::from_io("write", &self.path, e))
    }

    /// Attribute table for this file. Frozen handles get a read-only table.
    pub fn attrs<'a>(&'a self, ctx: &'a FsContext) -> AttrTable<'a> {
        AttrTable::new(ctx.attrs(), &self.path).frozen(self.frozen)
    }

    /// JSON document stored in this file, `{}` if the file does not exist.
    pub fn json(&self) -> Result<JsonDoc> {
        JsonDoc::load(self.clone())
    }

    // --- content tools --------------------------------------------------------

    /// Hex MD5 digest of the content.
    pub fn md5sum(&self) -> Result<String> {
        let mut file =
            fs::File::open(&self.path).map_err(|e| FsoError::from_io("open", &self.path, e))?;
        let mut hasher = Md5::new();
        io::copy(&mut file, &mut hasher).map_err(|e| FsoError::io("read", &self.path, e))?;
        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Up to `n` random lines.
    pub fn sample(&self, ctx: &FsContext, n: usize) -> Result<Vec<String>> {
        let inv = Invocation::new("sample", &ctx.tools().shuf)
            .arg("-n")
            .arg(n.to_string())
            .arg(&self.path);
        let out = ctx.runner().run(&inv)?.require_success(&inv)?;
        Ok(out.stdout.lines().map(str::to_string).collect())
    }

    /// Run this file as a program from the context's working directory.
    /// A nonzero exit is returned, not raised; only a failed spawn is an error.
    pub fn execute<I, S>(&self, ctx: &FsContext, args: I) -> Result<ToolOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<std::ffi::OsString>,
    {
        let inv = Invocation::new("execute", &self.path)
            .args(args)
            .current_dir(ctx.cwd());
        Ok(ctx.runner().run(&inv)?)
    }

    /// Archive into `target` with `zip`, run from the parent directory so
    /// entries are stored under this handle's name. Only `target` is
    /// written, so a frozen handle can still be archived.
    pub fn zip(&self, ctx: &FsContext, target: &Handle) -> Result<Handle> {
        let parent = self.path.parent().unwrap_or(Path::new("/"));
        let mut inv = Invocation::new("zip", &ctx.tools().zip);
        if self.is_dir() {
            inv = inv.arg("-r");
        }
        let entry = if self.is_root() { ".".to_string() } else { self.name() };
        let inv = inv.arg(&target.path).arg(entry).current_dir(parent);
        ctx.runner().run(&inv)?.require_success(&inv)?;
        Ok(Handle::from_canonical(target.path.clone()).with_file_type(Some(FileType::Zip)))
    }
}

fn copy_recursive(from: &Path, to: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(from).map_err(|e| FsoError::from_io("stat", from, e))?;
    if meta.is_dir() {
        fs::create_dir_all(to).map_err(|e| FsoError::io("create directory", to, e))?;
        let entries = fs::read_dir(from).map_err(|e| FsoError::io("read directory", from, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| FsoError::io("read directory", from, e))?;
            copy_recursive(&entry.path(), &to.join(entry.file_name()))?;
        }
        Ok(())
    } else if meta.file_type().is_symlink() {
        let target = fs::read_link(from).map_err(|e| FsoError::io("read link", from, e))?;
        #[cfg(unix)]
        std::os::unix::fs::symlink(&target, to).map_err(|e| FsoError::io("symlink", to, e))?;
        #[cfg(not(unix))]
        let _ = target;
        Ok(())
    } else {
        fs::copy(from, to)
            .map(drop)
            .map_err(|e| FsoError::io("copy", from, e))
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for Handle {}

impl Hash for Handle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl PartialEq<Path> for Handle {
    fn eq(&self, other: &Path) -> bool {
        self.path == Handle::new(other).path
    }
}

impl PartialEq<PathBuf> for Handle {
    fn eq(&self, other: &PathBuf) -> bool {
        *self == **other
    }
}

impl PartialEq<&Path> for Handle {
    fn eq(&self, other: &&Path) -> bool {
        *self == **other
    }
}

impl PartialEq<str> for Handle {
    fn eq(&self, other: &str) -> bool {
        *self == *Path::new(other)
    }
}

impl PartialEq<&str> for Handle {
    fn eq(&self, other: &&str) -> bool {
        *self == **other
    }
}

impl PartialEq<String> for Handle {
    fn eq(&self, other: &String) -> bool {
        *self == **other
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl AsRef<Path> for Handle {
    fn as_ref(&self) -> &Path {
        &self.path
    }
}

impl Serialize for Handle {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(&self.path.display())
    }
}
