//! Attribute backend driving the `attr` tool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::AttrBackend;
use crate::runner::{Invocation, ProcessRunner, ToolFailure};

/// `attr -q -l` / `-q -g` / `-s -V` / `-r` through a [`ProcessRunner`].
#[derive(Clone)]
pub struct AttrCommand {
    program: PathBuf,
    runner: Arc<dyn ProcessRunner>,
}

impl AttrCommand {
    pub fn new(program: impl Into<PathBuf>, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            program: program.into(),
            runner,
        }
    }

    fn run(&self, inv: Invocation) -> Result<String, ToolFailure> {
        let out = self.runner.run(&inv)?.require_success(&inv)?;
        Ok(out.stdout)
    }
}

impl std::fmt::Debug for AttrCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttrCommand")
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}

impl AttrBackend for AttrCommand {
    fn list(&self, path: &Path) -> Result<Vec<String>, ToolFailure> {
        let stdout = self.run(
            Invocation::new("attr-list", &self.program)
                .args(["-q", "-l"])
                .arg(path),
        )?;
        Ok(stdout
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn get(&self, path: &Path, key: &str) -> Result<String, ToolFailure> {
        self.run(
            Invocation::new("attr-get", &self.program)
                .args(["-q", "-g", key])
                .arg(path),
        )
    }

    fn set(&self, path: &Path, key: &str, value: &str) -> Result<(), ToolFailure> {
        self.run(
            Invocation::new("attr-set", &self.program)
                .args(["-s", key, "-V", value])
                .arg(path),
        )
        .map(drop)
    }

    fn remove(&self, path: &Path, key: &str) -> Result<(), ToolFailure> {
        self.run(
            Invocation::new("attr-remove", &self.program)
                .args(["-r", key])
                .arg(path),
        )
        .map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{MockProcessRunner, ToolOutput};

    fn argv(inv: &Invocation) -> Vec<String> {
        (0..inv.argv().len()).filter_map(|i| inv.arg_str(i)).collect()
    }

    #[test]
    fn list_splits_lines() {
        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .withf(|inv| argv(inv) == ["-q", "-l", "/data/f.txt"])
            .returning(|_| Ok(ToolOutput::success("color\nowner\n")));

        let attrs = AttrCommand::new("/usr/bin/attr", Arc::new(runner));
        assert_eq!(attrs.list(Path::new("/data/f.txt")).unwrap(), ["color", "owner"]);
    }

    #[test]
    fn get_returns_raw_stdout() {
        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .withf(|inv| argv(inv) == ["-q", "-g", "color", "/data/f.txt"])
            .returning(|_| Ok(ToolOutput::success("dark blue")));

        let attrs = AttrCommand::new("/usr/bin/attr", Arc::new(runner));
        assert_eq!(attrs.get(Path::new("/data/f.txt"), "color").unwrap(), "dark blue");
    }

    #[test]
    fn set_and_remove_argv() {
        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .withf(|inv| inv.op() == "attr-set" && argv(inv) == ["-s", "k", "-V", "v w", "/f"])
            .times(1)
            .returning(|_| Ok(ToolOutput::success("")));
        runner
            .expect_run()
            .withf(|inv| inv.op() == "attr-remove" && argv(inv) == ["-r", "k", "/f"])
            .times(1)
            .returning(|_| Ok(ToolOutput::success("")));

        let attrs = AttrCommand::new("/usr/bin/attr", Arc::new(runner));
        attrs.set(Path::new("/f"), "k", "v w").unwrap();
        attrs.remove(Path::new("/f"), "k").unwrap();
    }

    #[test]
    fn nonzero_exit_is_failure() {
        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .returning(|_| Ok(ToolOutput::failure(1, "attr_set: Operation not supported\n")));

        let attrs = AttrCommand::new("/usr/bin/attr", Arc::new(runner));
        let err = attrs.set(Path::new("/f"), "k", "v").unwrap_err();
        assert_eq!(err.op(), "attr-set");
        assert_eq!(err.stderr(), "attr_set: Operation not supported");
    }
}
