//! Directory operations on handles.
//!
//! Listings are never cached. Each call reads the directory again and
//! classifies entries without MIME detection.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use fsobj_glob::GlobPath;
use serde_json::{Map, Value};

use crate::context::FsContext;
use crate::cwd;
use crate::error::{FsoError, Result};
use crate::handle::Handle;
use crate::runner::Invocation;
use crate::search::{self, SearchResult};

/// Entries of one directory, in the order the filesystem reported them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Children(Vec<Handle>);

impl Children {
    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(Handle::name).collect()
    }

    /// Entries keyed by base name.
    pub fn by_name(&self) -> BTreeMap<String, &Handle> {
        self.0.iter().map(|h| (h.name(), h)).collect()
    }

    pub fn files(self) -> Children {
        self.filter(Handle::is_file)
    }

    pub fn dirs(self) -> Children {
        self.filter(Handle::is_dir)
    }

    pub fn symlinks(self) -> Children {
        self.filter(Handle::is_symlink)
    }

    /// Files with an execute bit. Directories never qualify.
    pub fn executables(self) -> Children {
        self.filter(|h| h.is_executable() == Some(true))
    }

    pub fn filter(self, keep: impl Fn(&Handle) -> bool) -> Children {
        Children(self.0.into_iter().filter(|h| keep(h)).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Handle> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<Handle> {
        self.0
    }
}

impl std::ops::Deref for Children {
    type Target = [Handle];

    fn deref(&self) -> &[Handle] {
        &self.0
    }
}

impl IntoIterator for Children {
    type Item = Handle;
    type IntoIter = std::vec::IntoIter<Handle>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Children {
    type Item = &'a Handle;
    type IntoIter = std::slice::Iter<'a, Handle>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// How [`MkdirMode`] treats an existing directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MkdirMode {
    /// Fail if anything exists at the path.
    #[default]
    Create,
    /// Accept an existing directory; fail only on a non-directory.
    Ensure,
}

/// Which per-file properties [`Handle::to_json`] includes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeOptions {
    pub size: bool,
    pub mime: bool,
    pub md5: bool,
}

impl Handle {
    /// Immediate entries, excluding `.` and `..`. A failure reading any
    /// entry fails the whole listing.
    pub fn children(&self) -> Result<Children> {
        let entries = match fs::read_dir(self.path()) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FsoError::NotFound(self.path().to_path_buf()));
            }
            Err(e) if self.is_file() => {
                tracing::trace!(error = %e, "read_dir on a file");
                return Err(FsoError::NotADirectory(self.path().to_path_buf()));
            }
            Err(e) => return Err(FsoError::io("read directory", self.path(), e)),
        };

        collect_children(self.path(), entries.map(|entry| entry.map(|e| e.path())))
    }

    /// Visit entries pre-order, descending into subdirectories when `recurse`
    /// is set. Symlinked directories are followed; loops are not detected.
    pub fn traverse<F>(&self, recurse: bool, mut visit: F) -> Result<()>
    where
        F: FnMut(&Handle) -> Result<()>,
    {
        self.traverse_dyn(recurse, &mut visit)
    }

    fn traverse_dyn(
        &self,
        recurse: bool,
        visit: &mut dyn FnMut(&Handle) -> Result<()>,
    ) -> Result<()> {
        for child in self.children()? {
            visit(&child)?;
            if recurse && child.is_dir() {
                child.traverse_dyn(recurse, visit)?;
            }
        }
        Ok(())
    }

    /// The sequence [`Handle::traverse`] visits.
    pub fn walk(&self, recurse: bool) -> Result<Vec<Handle>> {
        let mut out = Vec::new();
        self.traverse(recurse, |h| {
            out.push(h.clone());
            Ok(())
        })?;
        Ok(out)
    }

    /// Expand a glob pattern relative to this directory.
    pub fn glob(&self, pattern: &str) -> Result<Vec<Handle>> {
        let glob = GlobPath::new(pattern)?;
        Ok(glob
            .expand(self.path())
            .into_iter()
            .map(Handle::new)
            .collect())
    }

    /// Expand several patterns, dropping repeats.
    pub fn glob_all<S: AsRef<str>>(&self, patterns: &[S]) -> Result<Vec<Handle>> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for pattern in patterns {
            for handle in self.glob(pattern.as_ref())? {
                if seen.insert(handle.path().to_path_buf()) {
                    out.push(handle);
                }
            }
        }
        Ok(out)
    }

    /// Typed handle for `rel` relative to this directory (or its parent for
    /// a file), `None` if nothing is there.
    pub fn existing(&self, ctx: &FsContext, rel: impl AsRef<Path>) -> Result<Option<Handle>> {
        ctx.resolver().typed(self.relative(rel).path())
    }

    /// The subset of `rels` that exist.
    pub fn existing_all<P: AsRef<Path>>(&self, ctx: &FsContext, rels: &[P]) -> Result<Vec<Handle>> {
        let mut out = Vec::new();
        for rel in rels {
            if let Some(found) = self.existing(ctx, rel)? {
                out.push(found);
            }
        }
        Ok(out)
    }

    /// Child `name`, typed if it exists.
    pub fn file(&self, ctx: &FsContext, name: &str) -> Result<Handle> {
        let path = self.path().join(name);
        Ok(match ctx.resolver().typed(&path)? {
            Some(found) => found,
            None => Handle::new(path),
        })
    }

    /// Create directory `rel` (with parents) relative to this handle.
    pub fn mkdir(&self, rel: impl AsRef<Path>, mode: MkdirMode) -> Result<Handle> {
        self.check_frozen("create directory in")?;
        let target = self.relative(rel);
        if target.exists() {
            return match (mode, target.is_dir()) {
                (MkdirMode::Ensure, true) => Ok(target),
                (MkdirMode::Ensure, false) => Err(FsoError::NotADirectory(target.into_path())),
                (MkdirMode::Create, _) => Err(FsoError::AlreadyExists(target.into_path())),
            };
        }
        target.ensure()?;
        Ok(target)
    }

    /// Create this directory and its parents if missing.
    pub fn ensure(&self) -> Result<()> {
        self.check_frozen("create directory")?;
        if self.is_dir() {
            return Ok(());
        }
        if self.exists() {
            return Err(FsoError::NotADirectory(self.path().to_path_buf()));
        }
        tracing::debug!(path = %self.path().display(), "creating directory");
        fs::create_dir_all(self.path()).map_err(|e| FsoError::io("create directory", self.path(), e))
    }

    /// True if `diff --recursive --brief` finds no differences.
    pub fn same_tree(&self, ctx: &FsContext, other: &Handle) -> Result<bool> {
        let inv = Invocation::new("compare", &ctx.tools().diff)
            .args(["--recursive", "--brief"])
            .arg(self.path())
            .arg(other.path());
        let out = ctx.runner().run(&inv)?;
        match out.code {
            0 => Ok(true),
            1 => Ok(false),
            code => Err(inv.failed(code, out.stderr.trim()).into()),
        }
    }

    /// Run `f` with a fresh temporary directory inside this one. The
    /// directory and its contents are removed afterwards.
    pub fn with_tmp<T>(&self, f: impl FnOnce(&Handle) -> Result<T>) -> Result<T> {
        let tmp = tempfile::Builder::new()
            .prefix(".fsobj-")
            .tempdir_in(self.path())
            .map_err(|e| FsoError::from_io("create temporary directory", self.path(), e))?;
        let handle = Handle::new(tmp.path());
        let result = f(&handle);
        if let Err(e) = tmp.close() {
            tracing::warn!(path = %handle.path().display(), error = %e, "temporary directory not removed");
        }
        result
    }

    /// Run `f` with the process working directory set to this directory.
    pub fn chdir<T>(&self, f: impl FnOnce(&Handle) -> Result<T>) -> Result<T> {
        cwd::with_cwd(self.path(), || f(self))
    }

    /// Lines under this directory containing every term.
    pub fn search<S: AsRef<str>>(&self, ctx: &FsContext, terms: &[S]) -> Result<SearchResult> {
        let terms: Vec<String> = terms.iter().map(|t| t.as_ref().to_string()).collect();
        search::search(ctx.search(), self.path(), &terms)
    }

    /// JSON description. Directories list their children by name; symlinked
    /// children render as their target's name; files carry the properties
    /// selected in `opts`. Caller annotations appear under `misc`.
    pub fn to_json(&self, ctx: &FsContext, opts: TreeOptions) -> Result<Value> {
        let mut out = Map::new();
        if let Some(misc) = self.misc_ref() {
            out.insert("misc".into(), Value::Object(misc.clone()));
        }

        if self.is_dir() {
            let mut kids = Map::new();
            for child in self.children()? {
                let value = match child.symlink_target()? {
                    Some(target) => Value::String(target.name()),
                    None => child.to_json(ctx, opts)?,
                };
                kids.insert(child.name(), value);
            }
            out.insert("children".into(), Value::Object(kids));
            return Ok(Value::Object(out));
        }

        if let Some(target) = self.symlink_target()? {
            out.insert("symlink".into(), Value::String(target.path().display().to_string()));
            return Ok(Value::Object(out));
        }
        if opts.size {
            out.insert("size".into(), self.size()?.into());
        }
        if opts.mime {
            out.insert("mime_type".into(), self.mime(ctx)?.into());
        }
        if opts.md5 {
            out.insert("md5sum".into(), self.md5sum()?.into());
        }
        Ok(Value::Object(out))
    }
}

fn collect_children<I>(dir: &Path, entries: I) -> Result<Children>
where
    I: IntoIterator<Item = std::io::Result<std::path::PathBuf>>,
{
    let mut children = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| FsoError::io("read directory entry", dir, e))?;
        tracing::trace!(entry = %path.display(), "listed");
        children.push(Handle::new(path));
    }
    Ok(Children(children))
}
