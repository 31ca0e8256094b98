//! Path-aware glob patterns with `**` support.

use std::fs;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::glob::{braces_balanced, contains_glob, expand_braces, glob_match, has_unclosed_class};

/// Errors from parsing a glob pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("empty glob pattern")]
    Empty,
    #[error("unclosed character class in pattern: {0}")]
    UnclosedClass(String),
    #[error("unbalanced braces in pattern: {0}")]
    UnbalancedBraces(String),
}

/// One `/`-separated piece of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Matched by name, no metacharacters.
    Literal(String),
    /// Matched with [`glob_match`] against each directory entry.
    Pattern(String),
    /// `**`: zero or more directories.
    Globstar,
}

/// A parsed glob pattern.
///
/// Brace alternatives are expanded up front, so `{src,tests}/*.rs` becomes
/// two segment lists evaluated independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobPath {
    source: String,
    absolute: bool,
    alternatives: Vec<Vec<PathSegment>>,
}

impl GlobPath {
    /// Parse a pattern.
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }
        if !braces_balanced(pattern) {
            return Err(PatternError::UnbalancedBraces(pattern.to_string()));
        }
        if has_unclosed_class(pattern) {
            return Err(PatternError::UnclosedClass(pattern.to_string()));
        }

        let alternatives = expand_braces(pattern)
            .iter()
            .map(|alt| parse_segments(alt))
            .collect();

        Ok(Self {
            source: pattern.to_string(),
            absolute: pattern.starts_with('/'),
            alternatives,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True if the pattern starts at the filesystem root.
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// Segment lists, one per brace alternative.
    pub fn alternatives(&self) -> &[Vec<PathSegment>] {
        &self.alternatives
    }

    /// Match a relative path (no filesystem access).
    pub fn matches(&self, path: &Path) -> bool {
        let names: Vec<String> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        self.alternatives
            .iter()
            .any(|segments| match_segments(segments, &names))
    }

    /// Evaluate the pattern against the filesystem.
    ///
    /// Relative patterns are evaluated inside `base`; absolute patterns
    /// ignore it. Results are `base` (or `/`) joined with the matched
    /// relative path, sorted by name within each directory, duplicates
    /// removed. Hidden entries only match segments that start with `.`.
    /// Unreadable directories contribute nothing.
    pub fn expand(&self, base: &Path) -> Vec<PathBuf> {
        let root = if self.absolute { Path::new("/") } else { base };
        let mut out = Vec::new();
        for segments in &self.alternatives {
            expand_into(root, segments, &mut out);
        }

        let mut seen = std::collections::HashSet::new();
        out.retain(|p| seen.insert(p.clone()));
        out
    }
}

fn parse_segments(pattern: &str) -> Vec<PathSegment> {
    let mut segments: Vec<PathSegment> = pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| {
            if s == "**" {
                PathSegment::Globstar
            } else if contains_glob(s) || s.contains('\\') {
                PathSegment::Pattern(s.to_string())
            } else {
                PathSegment::Literal(s.to_string())
            }
        })
        .collect();

    // A trailing `**` lists the directory, like `*`.
    if let Some(last) = segments.last_mut() {
        if *last == PathSegment::Globstar {
            *last = PathSegment::Pattern("*".to_string());
        }
    }
    segments
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn match_segments(segments: &[PathSegment], names: &[String]) -> bool {
    match segments.split_first() {
        None => names.is_empty(),
        Some((PathSegment::Globstar, rest)) => {
            (0..=names.len()).any(|skip| {
                names[..skip].iter().all(|n| !is_hidden(n)) && match_segments(rest, &names[skip..])
            })
        }
        Some((segment, rest)) => match names.split_first() {
            None => false,
            Some((name, names_rest)) => {
                segment_matches(segment, name) && match_segments(rest, names_rest)
            }
        },
    }
}

fn segment_matches(segment: &PathSegment, name: &str) -> bool {
    match segment {
        PathSegment::Literal(lit) => lit == name,
        PathSegment::Pattern(pat) => {
            (!is_hidden(name) || pat.starts_with('.')) && glob_match(pat, name)
        }
        PathSegment::Globstar => !is_hidden(name),
    }
}

/// Directory entries sorted by name, or empty if unreadable.
fn sorted_entries(dir: &Path) -> Vec<(String, PathBuf)> {
    let Ok(read) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut entries: Vec<(String, PathBuf)> = read
        .filter_map(|e| e.ok())
        .map(|e| (e.file_name().to_string_lossy().into_owned(), e.path()))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries
}

fn expand_into(dir: &Path, segments: &[PathSegment], out: &mut Vec<PathBuf>) {
    let Some((segment, rest)) = segments.split_first() else {
        out.push(dir.to_path_buf());
        return;
    };

    match segment {
        PathSegment::Literal(name) => {
            let next = dir.join(name);
            if rest.is_empty() {
                if fs::symlink_metadata(&next).is_ok() {
                    out.push(next);
                }
            } else if next.is_dir() {
                expand_into(&next, rest, out);
            }
        }
        PathSegment::Pattern(_) => {
            for (name, path) in sorted_entries(dir) {
                if !segment_matches(segment, &name) {
                    continue;
                }
                if rest.is_empty() {
                    out.push(path);
                } else if path.is_dir() {
                    expand_into(&path, rest, out);
                }
            }
        }
        PathSegment::Globstar => {
            expand_into(dir, rest, out);
            for (name, path) in sorted_entries(dir) {
                if is_hidden(&name) {
                    continue;
                }
                // Symlinked directories are not descended into by `**`.
                let is_real_dir = fs::symlink_metadata(&path)
                    .map(|m| m.file_type().is_dir())
                    .unwrap_or(false);
                if is_real_dir {
                    expand_into(&path, segments, out);
                }
            }
        }
    }
}
