//! Error types for fsobj-kernel.
//!
//! Every failure surfaces as an [`FsoError`]. Callers that need to branch on
//! the failure use [`FsoError::kind`], which is stable across releases; the
//! `Display` text is for humans and carries the detail (usually a path).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::runner::ToolFailure;

/// Crate result alias.
pub type Result<T> = std::result::Result<T, FsoError>;

/// Machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    InvalidComparand,
    AncestorNotFound,
    Frozen,
    AlreadyExists,
    NotADirectory,
    ExternalTool,
    AttributeRead,
    AttributeWrite,
    AttributeDelete,
    Pattern,
    Matcher,
    Io,
    Json,
    Config,
}

impl ErrorKind {
    /// Stable snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidComparand => "invalid_comparand",
            ErrorKind::AncestorNotFound => "ancestor_not_found",
            ErrorKind::Frozen => "frozen",
            ErrorKind::AlreadyExists => "already_exists",
            ErrorKind::NotADirectory => "not_a_directory",
            ErrorKind::ExternalTool => "external_tool",
            ErrorKind::AttributeRead => "attribute_read",
            ErrorKind::AttributeWrite => "attribute_write",
            ErrorKind::AttributeDelete => "attribute_delete",
            ErrorKind::Pattern => "pattern",
            ErrorKind::Matcher => "matcher",
            ErrorKind::Io => "io",
            ErrorKind::Json => "json",
            ErrorKind::Config => "config",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from handle, traversal, attribute and search operations.
#[derive(Debug, Error)]
pub enum FsoError {
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("invalid comparand: {0}")]
    InvalidComparand(String),

    #[error("did not find target ancestor: {0}")]
    AncestorNotFound(String),

    #[error("cannot {op} frozen handle: {}", .path.display())]
    Frozen { op: &'static str, path: PathBuf },

    #[error("directory already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("file exists but is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error(transparent)]
    Tool(#[from] ToolFailure),

    #[error("unable to read attribute {key}: {source}")]
    AttributeRead {
        key: String,
        #[source]
        source: ToolFailure,
    },

    #[error("unable to set attribute {key}: {source}")]
    AttributeWrite {
        key: String,
        #[source]
        source: ToolFailure,
    },

    #[error("unable to delete attribute {key}: {source}")]
    AttributeDelete {
        key: String,
        #[source]
        source: ToolFailure,
    },

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] fsobj_glob::PatternError),

    #[error("search matcher: {0}")]
    Matcher(#[from] grep_regex::Error),

    #[error("{op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config: {0}")]
    Config(String),
}

impl FsoError {
    /// Build an [`FsoError::Io`] for an operation on `path`.
    pub fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        FsoError::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// Like [`FsoError::io`], but a missing path becomes [`FsoError::NotFound`].
    pub fn from_io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            FsoError::NotFound(path.into())
        } else {
            FsoError::io(op, path, source)
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FsoError::NotFound(_) => ErrorKind::NotFound,
            FsoError::InvalidComparand(_) => ErrorKind::InvalidComparand,
            FsoError::AncestorNotFound(_) => ErrorKind::AncestorNotFound,
            FsoError::Frozen { .. } => ErrorKind::Frozen,
            FsoError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            FsoError::NotADirectory(_) => ErrorKind::NotADirectory,
            FsoError::Tool(_) => ErrorKind::ExternalTool,
            FsoError::AttributeRead { .. } => ErrorKind::AttributeRead,
            FsoError::AttributeWrite { .. } => ErrorKind::AttributeWrite,
            FsoError::AttributeDelete { .. } => ErrorKind::AttributeDelete,
            FsoError::Pattern(_) => ErrorKind::Pattern,
            FsoError::Matcher(_) => ErrorKind::Matcher,
            FsoError::Io { .. } => ErrorKind::Io,
            FsoError::Json(_) => ErrorKind::Json,
            FsoError::Config(_) => ErrorKind::Config,
        }
    }

    /// True for failures of an external collaborator, including the
    /// attribute-store variants.
    pub fn is_external_tool(&self) -> bool {
        self.tool_failure().is_some()
    }

    /// The underlying tool failure, if any.
    pub fn tool_failure(&self) -> Option<&ToolFailure> {
        match self {
            FsoError::Tool(failure)
            | FsoError::AttributeRead { source: failure, .. }
            | FsoError::AttributeWrite { source: failure, .. }
            | FsoError::AttributeDelete { source: failure, .. } => Some(failure),
            _ => None,
        }
    }
}
