//! fsobj-kernel: typed handles over filesystem paths.
//!
//! This crate provides:
//!
//! - **Handle**: A canonical absolute path with identity, kind queries and
//!   file operations
//! - **FsContext**: An explicit working directory plus the external tools a
//!   handle may need (MIME detection, attributes, search, zip, diff, shuf)
//! - **TypeResolver**: Classification of paths, with MIME-driven subtypes
//! - **Traversal**: Children, recursive walks, globbing and ancestor search
//! - **AttrTable**: Per-file key/value attributes
//! - **Search**: Recursive multi-term content search
//!
//! ```no_run
//! use fsobj_kernel::{AncestorTarget, FsContext};
//!
//! # fn main() -> fsobj_kernel::Result<()> {
//! let ctx = FsContext::new("/srv/app/src");
//! let root = ctx
//!     .pwd()
//!     .ancestor(&AncestorTarget::ExistingChild("Cargo.toml".into()))?;
//! for hit in ctx.pwd().search(&ctx, &["TODO", "unsafe"])? {
//!     println!("{}: {:?}", hit.handle().display_in(&ctx), hit.lines());
//! }
//! # let _ = root;
//! # Ok(())
//! # }
//! ```

pub mod ancestors;
pub mod attr;
pub mod config;
pub mod context;
pub mod cwd;
pub mod dir;
pub mod error;
pub mod handle;
pub mod json;
pub mod kind;
pub mod mime;
pub mod path;
pub mod paths;
pub mod registry;
pub mod resolve;
pub mod runner;
pub mod search;

pub use ancestors::AncestorTarget;
pub use attr::{AttrBackend, AttrCommand, AttrTable, MemoryAttrs};
#[cfg(unix)]
pub use attr::XattrBackend;
pub use config::{AttrBackendKind, FsoConfig, PathStyle, SearchBackendKind, ToolPaths};
pub use context::FsContext;
pub use cwd::{with_cwd, CwdGuard};
pub use dir::{Children, MkdirMode, TreeOptions};
pub use error::{ErrorKind, FsoError, Result};
pub use handle::Handle;
pub use json::JsonDoc;
pub use kind::Kind;
pub use mime::{FileCommand, MimeDetector};
pub use registry::{FileType, TypeRegistry};
pub use resolve::TypeResolver;
pub use runner::{Invocation, ProcessRunner, SystemRunner, ToolFailure, ToolOutput};
pub use search::{GrepCommand, LineSource, NativeGrep, RawHit, SearchMatch, SearchResult};
