//! Upward search through parent directories.

use std::fmt;

use crate::context::FsContext;
use crate::error::{FsoError, Result};
use crate::handle::Handle;
use crate::paths;

/// Where an ancestor walk stops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AncestorTarget {
    /// Walk all the way to `/`.
    Root,
    /// The first directory with this base name.
    Named(String),
    /// This exact directory.
    Handle(Handle),
    /// The first directory containing this relative path.
    ExistingChild(String),
}

impl AncestorTarget {
    /// The user's home directory.
    pub fn home() -> Self {
        AncestorTarget::Handle(Handle::new(paths::home_dir()))
    }

    /// The context's working directory.
    pub fn pwd(ctx: &FsContext) -> Self {
        AncestorTarget::Handle(ctx.pwd())
    }

    /// The system temporary directory.
    pub fn tmp(ctx: &FsContext) -> Self {
        AncestorTarget::Handle(ctx.tmp())
    }

    /// Well-known directory by name: `root`, `home`, `pwd` or `tmp`.
    pub fn from_symbol(symbol: &str, ctx: &FsContext) -> Option<Self> {
        match symbol {
            "root" => Some(AncestorTarget::Root),
            "home" => Some(AncestorTarget::Handle(ctx.home())),
            "pwd" => Some(Self::pwd(ctx)),
            "tmp" => Some(Self::tmp(ctx)),
            _ => None,
        }
    }

    fn matches(&self, dir: &Handle) -> bool {
        match self {
            AncestorTarget::Root => false,
            AncestorTarget::Named(name) => dir.name() == *name,
            AncestorTarget::Handle(target) => target == dir,
            AncestorTarget::ExistingChild(rel) => Handle::at(rel, dir.path()).exists(),
        }
    }

    fn accepts_root(&self) -> bool {
        match self {
            AncestorTarget::Root => true,
            AncestorTarget::Handle(target) => target.is_root(),
            AncestorTarget::Named(_) | AncestorTarget::ExistingChild(_) => false,
        }
    }
}

impl fmt::Display for AncestorTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AncestorTarget::Root => f.write_str(":root"),
            AncestorTarget::Named(name) => f.write_str(name),
            AncestorTarget::Handle(handle) => write!(f, "{handle}"),
            AncestorTarget::ExistingChild(rel) => write!(f, "directory containing {rel}"),
        }
    }
}

impl Handle {
    /// Parent directories up to and including the first one matching
    /// `target`, nearest first.
    ///
    /// The walk starts at this handle if it is a directory, otherwise at its
    /// parent (which is then always included). A starting directory that
    /// already matches yields an empty list. Reaching `/` without a match is
    /// [`FsoError::AncestorNotFound`] unless the target is `/` itself.
    pub fn ancestors_until(&self, target: &AncestorTarget) -> Result<Vec<Handle>> {
        let mut chain = Vec::new();
        let mut current = if self.is_dir() {
            self.clone()
        } else {
            match self.parent() {
                Some(parent) => {
                    chain.push(parent.clone());
                    parent
                }
                None => self.clone(),
            }
        };

        // A marker file is honored even at `/`; names and handles are not.
        let marker = matches!(target, AncestorTarget::ExistingChild(_));
        loop {
            if marker && target.matches(&current) {
                return Ok(chain);
            }
            if current.is_root() {
                return if target.accepts_root() {
                    Ok(chain)
                } else {
                    Err(FsoError::AncestorNotFound(target.to_string()))
                };
            }
            if !marker && target.matches(&current) {
                return Ok(chain);
            }
            let Some(parent) = current.parent() else {
                return Ok(chain);
            };
            tracing::trace!(dir = %parent.path().display(), "ascending");
            chain.push(parent.clone());
            current = parent;
        }
    }

    /// Every parent directory up to `/`, nearest first.
    pub fn ancestors(&self) -> Result<Vec<Handle>> {
        self.ancestors_until(&AncestorTarget::Root)
    }

    /// The matching ancestor: the last element of [`Handle::ancestors_until`].
    pub fn ancestor(&self, target: &AncestorTarget) -> Result<Option<Handle>> {
        Ok(self.ancestors_until(target)?.pop())
    }
}
