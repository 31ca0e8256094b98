//! Recursive content search with AND semantics.
//!
//! A [`LineSource`] finds every line under a directory that contains *any*
//! of the terms. [`search`] then keeps only lines containing *all* of them
//! and groups them by file, in the order files were first reported.

mod grep;
mod native;

pub use grep::GrepCommand;
pub use native::NativeGrep;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::handle::Handle;

/// One line reported by a [`LineSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHit {
    pub path: PathBuf,
    pub line: String,
}

impl RawHit {
    pub fn new(path: impl Into<PathBuf>, line: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            line: line.into(),
        }
    }
}

/// Produces lines containing at least one of a set of literal terms.
#[cfg_attr(test, mockall::automock)]
pub trait LineSource: Send + Sync {
    /// Search `dir` recursively. Terms are literal strings, never patterns.
    fn find(&self, dir: &Path, terms: &[String]) -> Result<Vec<RawHit>>;
}

/// A file with at least one line matching every term.
#[derive(Debug, Clone)]
pub struct SearchMatch {
    handle: Handle,
}

impl SearchMatch {
    /// The file. Its [`Handle::found`] table holds the matched lines.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn lines(&self) -> &[String] {
        self.handle.found()
    }

    pub fn into_handle(self) -> Handle {
        self.handle
    }
}

/// Search results, one entry per file in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    matches: Vec<SearchMatch>,
}

impl SearchResult {
    pub fn matches(&self) -> &[SearchMatch] {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// The matching files.
    pub fn handles(&self) -> impl Iterator<Item = &Handle> {
        self.matches.iter().map(SearchMatch::handle)
    }

    pub fn into_handles(self) -> Vec<Handle> {
        self.matches.into_iter().map(SearchMatch::into_handle).collect()
    }
}

impl IntoIterator for SearchResult {
    type Item = SearchMatch;
    type IntoIter = std::vec::IntoIter<SearchMatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.into_iter()
    }
}

/// Keep hits whose line contains every term, grouped by file.
pub fn aggregate(hits: Vec<RawHit>, terms: &[String]) -> SearchResult {
    let mut matches: Vec<SearchMatch> = Vec::new();
    let mut index: HashMap<PathBuf, usize> = HashMap::new();

    for hit in hits {
        let line = hit.line.trim_end_matches(['\n', '\r']);
        if !terms.iter().all(|t| line.contains(t.as_str())) {
            continue;
        }
        let slot = *index.entry(hit.path).or_insert_with_key(|path| {
            matches.push(SearchMatch {
                handle: Handle::new(path),
            });
            matches.len() - 1
        });
        matches[slot].handle.push_found(line.to_string());
    }

    SearchResult { matches }
}

/// Search `dir` for lines containing all of `terms`.
///
/// An empty term list matches nothing and runs no search.
pub fn search(source: &dyn LineSource, dir: &Path, terms: &[String]) -> Result<SearchResult> {
    if terms.is_empty() {
        return Ok(SearchResult::default());
    }
    tracing::debug!(dir = %dir.display(), ?terms, "content search");
    let hits = source.find(dir, terms)?;
    Ok(aggregate(hits, terms))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(t: &[&str]) -> Vec<String> {
        t.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn keeps_only_lines_with_every_term() {
        let hits = vec![
            RawHit::new("/d/a.txt", "foo bar baz\n"),
            RawHit::new("/d/b.txt", "foo only\n"),
        ];
        let result = aggregate(hits, &terms(&["foo", "bar"]));
        assert_eq!(result.len(), 1);
        assert_eq!(result.matches()[0].handle(), &Handle::new("/d/a.txt"));
        assert_eq!(result.matches()[0].lines(), ["foo bar baz".to_string()]);
    }

    #[test]
    fn groups_by_file_in_first_seen_order() {
        let hits = vec![
            RawHit::new("/d/z.txt", "needle 1"),
            RawHit::new("/d/a.txt", "needle 2"),
            RawHit::new("/d/z.txt", "needle 3"),
        ];
        let result = aggregate(hits, &terms(&["needle"]));
        let names: Vec<String> = result.handles().map(Handle::name).collect();
        assert_eq!(names, ["z.txt", "a.txt"]);
        assert_eq!(result.matches()[0].lines(), ["needle 1", "needle 3"]);
    }

    #[test]
    fn empty_terms_skip_the_source() {
        let mut source = MockLineSource::new();
        source.expect_find().never();
        let result = search(&source, Path::new("/d"), &[]).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn search_delegates_then_filters() {
        let mut source = MockLineSource::new();
        source
            .expect_find()
            .withf(|dir, terms| dir == Path::new("/d") && terms.len() == 2)
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    RawHit::new("/d/x", "alpha beta"),
                    RawHit::new("/d/y", "alpha"),
                ])
            });
        let result = search(&source, Path::new("/d"), &terms(&["alpha", "beta"])).unwrap();
        let handles = result.into_handles();
        assert_eq!(handles.len(), 1);
        assert_eq!(handles[0].found(), ["alpha beta"]);
    }
}
