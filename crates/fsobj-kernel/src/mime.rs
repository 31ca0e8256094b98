//! MIME type detection.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::runner::{Invocation, ProcessRunner, ToolFailure};

/// Detects the MIME type of a file by content.
#[cfg_attr(test, mockall::automock)]
pub trait MimeDetector: Send + Sync {
    fn detect(&self, path: &Path) -> Result<String, ToolFailure>;
}

/// [`MimeDetector`] backed by `file --mime-type --brief`.
#[derive(Clone)]
pub struct FileCommand {
    program: PathBuf,
    runner: Arc<dyn ProcessRunner>,
}

impl FileCommand {
    pub fn new(program: impl Into<PathBuf>, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }

    fn invocation(&self, path: &Path) -> Invocation {
        Invocation::new("mime", &self.program)
            .args(["--mime-type", "--brief", "--"])
            .arg(path)
    }
}

impl std::fmt::Debug for FileCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCommand")
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}

impl MimeDetector for FileCommand {
    fn detect(&self, path: &Path) -> Result<String, ToolFailure> {
        let inv = self.invocation(path);
        let out = self.runner.run(&inv)?.require_success(&inv)?;
        Ok(collapse_whitespace(&out.stdout))
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
