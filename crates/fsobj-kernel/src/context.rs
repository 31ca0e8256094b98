//! Working context for handle operations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::attr::{AttrBackend, AttrCommand};
use crate::config::{AttrBackendKind, FsoConfig, PathStyle, SearchBackendKind, ToolPaths};
use crate::error::{FsoError, Result};
use crate::handle::Handle;
use crate::mime::{FileCommand, MimeDetector};
use crate::path;
use crate::paths;
use crate::registry::{self, TypeRegistry};
use crate::resolve::TypeResolver;
use crate::runner::{ProcessRunner, SystemRunner};
use crate::search::{GrepCommand, LineSource, NativeGrep};

/// Explicit working directory plus the external collaborators.
///
/// Relative paths resolve against `cwd`, never against the process working
/// directory. Collaborators are shared, so cloning a context is cheap.
#[derive(Clone)]
pub struct FsContext {
    cwd: PathBuf,
    style: PathStyle,
    tools: ToolPaths,
    runner: Arc<dyn ProcessRunner>,
    mime: Arc<dyn MimeDetector>,
    attrs: Arc<dyn AttrBackend>,
    search: Arc<dyn LineSource>,
    registry: Option<Arc<TypeRegistry>>,
}

impl FsContext {
    /// Context rooted at `cwd` with the default configuration.
    pub fn new(cwd: impl AsRef<Path>) -> Self {
        Self::from_config(&FsoConfig::default(), cwd)
    }

    /// Context for the process working directory.
    pub fn current(config: &FsoConfig) -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| FsoError::io("get working directory", ".", e))?;
        Ok(Self::from_config(config, cwd))
    }

    /// Wire collaborators from `config`. Relative `cwd` is taken from `/`.
    pub fn from_config(config: &FsoConfig, cwd: impl AsRef<Path>) -> Self {
        let runner: Arc<dyn ProcessRunner> = Arc::new(SystemRunner);
        let tools = config.tools.clone();

        let attrs: Arc<dyn AttrBackend> = match config.attr_backend {
            AttrBackendKind::Command => Arc::new(AttrCommand::new(&tools.attr, runner.clone())),
            #[cfg(unix)]
            AttrBackendKind::Xattr => Arc::new(crate::attr::XattrBackend::new()),
            #[cfg(not(unix))]
            AttrBackendKind::Xattr => {
                tracing::warn!("xattr backend unavailable on this platform, using attr tool");
                Arc::new(AttrCommand::new(&tools.attr, runner.clone()))
            }
        };
        let search: Arc<dyn LineSource> = match config.search_backend {
            SearchBackendKind::Grep => Arc::new(GrepCommand::new(&tools.grep, runner.clone())),
            SearchBackendKind::Native => Arc::new(NativeGrep::new()),
        };

        Self {
            cwd: path::absolutize(cwd.as_ref(), Path::new("/")),
            style: config.path_style,
            mime: Arc::new(FileCommand::new(&tools.file, runner.clone())),
            tools,
            runner,
            attrs,
            search,
            registry: None,
        }
    }

    /// Use `runner` for tool invocations made directly by handles (zip,
    /// sample, diff). Command-backed collaborators keep their own runner.
    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_mime(mut self, mime: Arc<dyn MimeDetector>) -> Self {
        self.mime = mime;
        self
    }

    pub fn with_attrs(mut self, attrs: Arc<dyn AttrBackend>) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn with_search(mut self, search: Arc<dyn LineSource>) -> Self {
        self.search = search;
        self
    }

    /// Replace the process-wide MIME registry for this context.
    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = Some(Arc::new(registry));
        self
    }

    pub fn with_style(mut self, style: PathStyle) -> Self {
        self.style = style;
        self
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Change the working directory. Relative paths resolve against the
    /// current one. The process working directory is not touched.
    pub fn set_cwd(&mut self, dir: impl AsRef<Path>) {
        self.cwd = self.resolve_path(dir);
    }

    pub fn style(&self) -> PathStyle {
        self.style
    }

    pub fn tools(&self) -> &ToolPaths {
        &self.tools
    }

    pub fn runner(&self) -> &dyn ProcessRunner {
        &*self.runner
    }

    pub fn mime(&self) -> &dyn MimeDetector {
        &*self.mime
    }

    pub fn attrs(&self) -> &dyn AttrBackend {
        &*self.attrs
    }

    pub fn search(&self) -> &dyn LineSource {
        &*self.search
    }

    pub fn registry(&self) -> &TypeRegistry {
        self.registry.as_deref().unwrap_or_else(|| registry::builtin())
    }

    pub fn resolver(&self) -> TypeResolver<'_> {
        TypeResolver::new(self.mime(), self.registry())
    }

    /// Canonical absolute form of `path` relative to the context.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        path::absolutize(path.as_ref(), &self.cwd)
    }

    /// Handle for `path`, whether or not it exists. No I/O.
    pub fn handle(&self, path: impl AsRef<Path>) -> Handle {
        Handle::at(path, &self.cwd)
    }

    /// Untyped handle if anything is at `path`.
    pub fn classify(&self, path: impl AsRef<Path>) -> Option<Handle> {
        self.resolver().untyped(&self.resolve_path(path))
    }

    /// Typed handle if anything is at `path`; files are tagged by MIME type.
    pub fn existing(&self, path: impl AsRef<Path>) -> Result<Option<Handle>> {
        self.resolver().typed(&self.resolve_path(path))
    }

    /// Like [`FsContext::existing`], with absence as [`FsoError::NotFound`].
    pub fn require(&self, path: impl AsRef<Path>) -> Result<Handle> {
        let resolved = self.resolve_path(path);
        self.resolver()
            .typed(&resolved)?
            .ok_or(FsoError::NotFound(resolved))
    }

    /// The working directory as a handle.
    pub fn pwd(&self) -> Handle {
        Handle::at(".", &self.cwd)
    }

    pub fn root(&self) -> Handle {
        Handle::new("/")
    }

    pub fn home(&self) -> Handle {
        Handle::new(paths::home_dir())
    }

    /// The system temporary directory.
    pub fn tmp(&self) -> Handle {
        Handle::new(paths::tmp_dir())
    }

    /// Run `f` with a fresh directory inside [`FsContext::tmp`], removed
    /// afterwards.
    pub fn with_tmp<T>(&self, f: impl FnOnce(&Handle) -> Result<T>) -> Result<T> {
        self.tmp().with_tmp(f)
    }

    /// Touch `path` relative to the working directory and return its handle.
    pub fn touch(&self, path: impl AsRef<Path>) -> Result<Handle> {
        let handle = self.handle(path);
        handle.touch()?;
        Ok(handle)
    }

    /// Render a handle's path in this context's [`PathStyle`].
    pub fn display(&self, handle: &Handle) -> String {
        match self.style {
            PathStyle::Relative => path::render_relative(handle.path(), &self.cwd),
            PathStyle::Absolute => handle.path().display().to_string(),
        }
    }
}

impl std::fmt::Debug for FsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsContext")
            .field("cwd", &self.cwd)
            .field("style", &self.style)
            .field("tools", &self.tools)
            .finish_non_exhaustive()
    }
}
