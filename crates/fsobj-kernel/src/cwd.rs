//! Scoped process working-directory changes.
//!
//! Nothing else in the kernel touches the process working directory. This is
//! for callers that must run code which itself resolves relative paths
//! against it.

use std::path::{Path, PathBuf};

use crate::error::{FsoError, Result};

/// Changes the process working directory and restores the previous one on
/// drop, including during unwinding.
#[derive(Debug)]
#[must_use = "the previous directory is restored when the guard drops"]
pub struct CwdGuard {
    previous: PathBuf,
}

impl CwdGuard {
    pub fn enter(dir: &Path) -> Result<Self> {
        let previous = std::env::current_dir()
            .map_err(|e| FsoError::io("get working directory", ".", e))?;
        std::env::set_current_dir(dir).map_err(|e| FsoError::from_io("chdir", dir, e))?;
        tracing::debug!(from = %previous.display(), to = %dir.display(), "entered directory");
        Ok(Self { previous })
    }

    /// The directory restored on drop.
    pub fn previous(&self) -> &Path {
        &self.previous
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        if let Err(e) = std::env::set_current_dir(&self.previous) {
            tracing::warn!(
                dir = %self.previous.display(),
                error = %e,
                "could not restore working directory"
            );
        }
    }
}

/// Run `f` with the process working directory set to `dir`.
pub fn with_cwd<T>(dir: &Path, f: impl FnOnce() -> Result<T>) -> Result<T> {
    let _guard = CwdGuard::enter(dir)?;
    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn restores_after_success_and_error() {
        let before = std::env::current_dir().unwrap();
        let temp = TempDir::new().unwrap();
        let target = temp.path().canonicalize().unwrap();

        let seen = with_cwd(&target, || Ok(std::env::current_dir().unwrap())).unwrap();
        assert_eq!(seen, target);
        assert_eq!(std::env::current_dir().unwrap(), before);

        let err = with_cwd(&target, || -> Result<()> {
            Err(FsoError::Config("boom".into()))
        });
        assert!(err.is_err());
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    #[serial]
    fn restores_after_panic() {
        let before = std::env::current_dir().unwrap();
        let temp = TempDir::new().unwrap();
        let target = temp.path().to_path_buf();

        let outcome = std::panic::catch_unwind(|| {
            let _ = with_cwd(&target, || -> Result<()> { panic!("inside scope") });
        });
        assert!(outcome.is_err());
        assert_eq!(std::env::current_dir().unwrap(), before);
    }

    #[test]
    #[serial]
    fn missing_directory_is_not_found() {
        let before = std::env::current_dir().unwrap();
        let err = CwdGuard::enter(Path::new("/nonexistent/fsobj/dir")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
        assert_eq!(std::env::current_dir().unwrap(), before);
    }
}
