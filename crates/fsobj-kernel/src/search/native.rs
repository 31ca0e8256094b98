//! In-process line source built on `ignore` and `grep-searcher`.

use std::path::Path;

use grep_regex::RegexMatcher;
use grep_searcher::sinks::Lossy;
use grep_searcher::{BinaryDetection, SearcherBuilder};
use ignore::WalkBuilder;

use super::{LineSource, RawHit};
use crate::error::Result;

/// Walks the directory and searches each regular file, skipping binary
/// content the way `grep -I` does.
///
/// Nothing is filtered: hidden files and ignore files are not honored.
/// Symlinks below `dir` are not followed. Files that cannot be read are
/// logged and skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeGrep;

impl NativeGrep {
    pub fn new() -> Self {
        Self
    }
}

/// Alternation of the escaped terms.
fn any_term_pattern(terms: &[String]) -> String {
    terms
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|")
}

impl LineSource for NativeGrep {
    fn find(&self, dir: &Path, terms: &[String]) -> Result<Vec<RawHit>> {
        let matcher = RegexMatcher::new(&any_term_pattern(terms))?;
        let mut searcher = SearcherBuilder::new()
            .binary_detection(BinaryDetection::quit(b'\x00'))
            .build();
        let walker = WalkBuilder::new(dir)
            .standard_filters(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut hits = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }
            let path = entry.path();
            tracing::trace!(path = %path.display(), "searching");
            let result = searcher.search_path(
                &matcher,
                path,
                Lossy(|_lnum, line| {
                    hits.push(RawHit::new(path, line));
                    Ok(true)
                }),
            );
            if let Err(e) = result {
                tracing::warn!(path = %path.display(), error = %e, "search failed");
            }
        }
        Ok(hits)
    }
}
