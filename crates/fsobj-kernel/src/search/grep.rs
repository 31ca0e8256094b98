//! Line source driving the external `grep`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{LineSource, RawHit};
use crate::error::Result;
use crate::runner::{Invocation, ProcessRunner};

/// `grep -r -F -I -Z -e TERM... -- DIR`.
///
/// `-Z` ends each file name with a NUL, so names containing `:` parse
/// correctly. Exit status 1 means no lines matched. Status 2 with output
/// means some files were unreadable; the lines that were printed still count.
#[derive(Clone)]
pub struct GrepCommand {
    program: PathBuf,
    runner: Arc<dyn ProcessRunner>,
}

impl GrepCommand {
    pub fn new(program: impl Into<PathBuf>, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }

    fn invocation(&self, dir: &Path, terms: &[String]) -> Invocation {
        let mut inv = Invocation::new("search", &self.program).args(["-r", "-F", "-I", "-Z"]);
        for term in terms {
            inv = inv.arg("-e").arg(term);
        }
        inv.arg("--").arg(dir)
    }
}

impl std::fmt::Debug for GrepCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrepCommand")
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}

impl LineSource for GrepCommand {
    fn find(&self, dir: &Path, terms: &[String]) -> Result<Vec<RawHit>> {
        let inv = self.invocation(dir, terms);
        let out = self.runner.run(&inv)?;
        match out.code {
            0 => {}
            1 => return Ok(Vec::new()),
            2 if !out.stdout.is_empty() => {
                tracing::warn!(
                    dir = %dir.display(),
                    stderr = out.stderr.trim(),
                    "grep skipped unreadable files"
                );
            }
            code => return Err(inv.failed(code, out.stderr.trim()).into()),
        }
        Ok(parse_output(&out.stdout))
    }
}

fn parse_output(stdout: &str) -> Vec<RawHit> {
    stdout
        .lines()
        .filter_map(|record| match record.split_once('\0') {
            Some((path, line)) => Some(RawHit::new(path, line)),
            None => {
                tracing::warn!(record, "unparseable grep output");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::runner::{MockProcessRunner, ToolOutput};

    fn terms(t: &[&str]) -> Vec<String> {
        t.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn builds_fixed_string_argv() {
        let grep = GrepCommand::new("/usr/bin/grep", Arc::new(MockProcessRunner::new()));
        let inv = grep.invocation(Path::new("/d"), &terms(&["a.b", "-x"]));
        let argv: Vec<String> = (0..inv.argv().len()).filter_map(|i| inv.arg_str(i)).collect();
        assert_eq!(argv, ["-r", "-F", "-I", "-Z", "-e", "a.b", "-e", "-x", "--", "/d"]);
    }

    #[test]
    fn parses_nul_separated_records() {
        let hits = parse_output("/d/a:b.txt\0x: y\n/d/c.txt\0z\n");
        assert_eq!(
            hits,
            [RawHit::new("/d/a:b.txt", "x: y"), RawHit::new("/d/c.txt", "z")]
        );
    }

    #[test]
    fn exit_one_is_no_matches() {
        let mut runner = MockProcessRunner::new();
        runner.expect_run().returning(|_| Ok(ToolOutput::failure(1, "")));
        let grep = GrepCommand::new("/usr/bin/grep", Arc::new(runner));
        assert!(grep.find(Path::new("/d"), &terms(&["x"])).unwrap().is_empty());
    }

    #[test]
    fn exit_two_keeps_printed_hits() {
        let mut runner = MockProcessRunner::new();
        runner.expect_run().returning(|_| {
            Ok(ToolOutput {
                code: 2,
                stdout: "/d/a.txt\0hit\n".to_string(),
                stderr: "grep: /d/locked: Permission denied\n".to_string(),
            })
        });
        let grep = GrepCommand::new("/usr/bin/grep", Arc::new(runner));
        let hits = grep.find(Path::new("/d"), &terms(&["hit"])).unwrap();
        assert_eq!(hits, [RawHit::new("/d/a.txt", "hit")]);
    }

    #[test]
    fn exit_two_is_failure() {
        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .returning(|_| Ok(ToolOutput::failure(2, "grep: /d: No such file or directory")));
        let grep = GrepCommand::new("/usr/bin/grep", Arc::new(runner));
        let err = grep.find(Path::new("/d"), &terms(&["x"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExternalTool);
    }
}
