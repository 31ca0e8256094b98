//! fsobj-glob: Shell-style glob matching and directory-relative expansion.
//!
//! Provides:
//! - **glob_match**: Single-name glob matching (`*`, `?`, `[...]`, `{a,b}`)
//! - **GlobPath**: Path-aware patterns with `**` (globstar) support
//! - **GlobPath::expand**: Evaluate a pattern against the real filesystem,
//!   relative to an explicit base directory
//!
//! Expansion never touches the process working directory. Callers pass the
//! directory the pattern is relative to, and get back paths joined onto it.

pub mod glob;
mod glob_path;

pub use glob::{contains_glob, expand_braces, glob_match};
pub use glob_path::{GlobPath, PathSegment, PatternError};
