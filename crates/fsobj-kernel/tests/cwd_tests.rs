//! Scoped working-directory changes through handles.

use std::env;
use std::fs;

use fsobj_kernel::{ErrorKind, FsoError, Handle};
use serial_test::serial;
use tempfile::TempDir;

#[test]
#[serial]
fn test_chdir_runs_inside_and_restores() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("inside.txt"), "here").unwrap();
    let before = env::current_dir().unwrap();

    let dir = Handle::new(temp.path());
    let content = dir
        .chdir(|_| {
            // Relative paths now resolve inside the directory.
            Ok(Handle::new("inside.txt").read()?)
        })
        .unwrap();
    assert_eq!(content, "here");
    assert_eq!(env::current_dir().unwrap(), before);
}

#[test]
#[serial]
fn test_chdir_restores_after_error() {
    let temp = TempDir::new().unwrap();
    let before = env::current_dir().unwrap();

    let err = Handle::new(temp.path())
        .chdir(|_| -> fsobj_kernel::Result<()> { Err(FsoError::Config("bail".into())) })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert_eq!(env::current_dir().unwrap(), before);
}

#[test]
#[serial]
fn test_chdir_into_missing_directory() {
    let before = env::current_dir().unwrap();
    let err = Handle::new("/nonexistent-fsobj-chdir")
        .chdir(|_| Ok(()))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(env::current_dir().unwrap(), before);
}
