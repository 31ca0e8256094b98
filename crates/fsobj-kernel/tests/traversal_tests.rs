//! Traversal, mutation and ancestor search against real directory trees.

use std::fs;
use std::path::Path;

use fsobj_kernel::{AncestorTarget, ErrorKind, FsContext, Handle, MkdirMode};
use tempfile::TempDir;

/// ```text
/// root/
///   Cargo.toml
///   docs/guide.md
///   src/lib.rs
///   src/bin/tool.rs
///   .hidden
/// ```
fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    fs::create_dir_all(root.join("docs")).unwrap();
    fs::create_dir_all(root.join("src/bin")).unwrap();
    fs::write(root.join("Cargo.toml"), "[package]\n").unwrap();
    fs::write(root.join("docs/guide.md"), "# Guide\n").unwrap();
    fs::write(root.join("src/lib.rs"), "pub fn lib() {}\n").unwrap();
    fs::write(root.join("src/bin/tool.rs"), "fn main() {}\n").unwrap();
    fs::write(root.join(".hidden"), "").unwrap();
    temp
}

fn rel(root: &Path, handles: &[Handle]) -> Vec<String> {
    let mut out: Vec<String> = handles
        .iter()
        .map(|h| h.path().strip_prefix(root).unwrap().display().to_string())
        .collect();
    out.sort();
    out
}

// ============================================================================
// Listing and walking
// ============================================================================

#[test]
fn test_children_include_hidden_but_not_dot_entries() {
    let temp = project();
    let kids = Handle::new(temp.path()).children().unwrap();
    let mut names = kids.names();
    names.sort();
    assert_eq!(names, [".hidden", "Cargo.toml", "docs", "src"]);
}

#[test]
fn test_walk_is_preorder() {
    let temp = project();
    let all = Handle::new(temp.path()).walk(true).unwrap();
    assert_eq!(
        rel(temp.path(), &all),
        [".hidden", "Cargo.toml", "docs", "docs/guide.md", "src", "src/bin", "src/bin/tool.rs", "src/lib.rs"]
    );

    // Each directory precedes everything beneath it.
    for (i, h) in all.iter().enumerate() {
        if let Some(parent) = h.parent() {
            if parent != temp.path() {
                let pos = all.iter().position(|x| *x == parent).unwrap();
                assert!(pos < i, "{parent} visited after {h}");
            }
        }
    }
}

#[test]
fn test_walk_without_recursion_matches_children() {
    let temp = project();
    let dir = Handle::new(temp.path());
    let shallow = dir.walk(false).unwrap();
    assert_eq!(rel(temp.path(), &shallow), rel(temp.path(), &dir.children().unwrap()));
}

#[test]
fn test_traverse_stops_on_visitor_error() {
    let temp = project();
    let mut seen = 0;
    let err = Handle::new(temp.path())
        .traverse(true, |_| {
            seen += 1;
            Err(fsobj_kernel::FsoError::Config("stop".into()))
        })
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert_eq!(seen, 1);
}

#[test]
fn test_glob_ignores_context_cwd() {
    let temp = project();
    let elsewhere = TempDir::new().unwrap();
    let ctx = FsContext::new(elsewhere.path());
    let src = ctx.handle(temp.path().join("src"));

    let found = src.glob("**/*.rs").unwrap();
    assert_eq!(rel(temp.path(), &found), ["src/bin/tool.rs", "src/lib.rs"]);
}

#[test]
fn test_existing_all_keeps_present_paths() {
    let temp = project();
    let ctx = FsContext::new(temp.path());
    let dir = ctx.pwd();
    // Directories resolve without MIME detection.
    let found = dir.existing_all(&ctx, &["docs", "missing", "src/bin"]).unwrap();
    assert_eq!(rel(temp.path(), &found), ["docs", "src/bin"]);
}

// ============================================================================
// Mutation
// ============================================================================

#[test]
fn test_move_file_into_directory() {
    let temp = project();
    let ctx = FsContext::new(temp.path());
    let mut guide = ctx.handle("docs/guide.md");
    guide.move_to(&ctx.handle("src")).unwrap();
    assert_eq!(guide, temp.path().join("src/guide.md"));
    assert!(!temp.path().join("docs/guide.md").exists());
}

#[test]
fn test_move_directory_onto_new_name() {
    let temp = project();
    let ctx = FsContext::new(temp.path());
    let mut docs = ctx.handle("docs");
    docs.move_to(&ctx.handle("manual")).unwrap();
    assert_eq!(docs, temp.path().join("manual"));
    assert!(ctx.handle("manual/guide.md").is_file());
}

#[test]
fn test_delete_tree_then_delete_again() {
    let temp = project();
    let ctx = FsContext::new(temp.path());
    let src = ctx.handle("src");
    src.delete().unwrap();
    assert!(!src.exists());
    src.delete().unwrap();
}

#[test]
fn test_mkdir_resolves_against_directory() {
    let temp = project();
    let ctx = FsContext::new(temp.path());
    let made = ctx.handle("docs").mkdir("api/v1", MkdirMode::Create).unwrap();
    assert_eq!(made, temp.path().join("docs/api/v1"));
    assert!(made.is_dir());
    ctx.handle("docs/api").ensure().unwrap();
}

// ============================================================================
// Ancestor search
// ============================================================================

#[test]
fn test_ancestor_by_marker_file() {
    let temp = project();
    let tool = Handle::new(temp.path().join("src/bin/tool.rs"));
    let target = AncestorTarget::ExistingChild("Cargo.toml".into());

    let chain = tool.ancestors_until(&target).unwrap();
    assert_eq!(rel(temp.path(), &chain), ["", "src", "src/bin"]);
    assert_eq!(tool.ancestor(&target).unwrap().unwrap(), temp.path());
}

#[test]
fn test_marker_present_at_start_returns_empty() {
    let temp = project();
    let target = AncestorTarget::ExistingChild("Cargo.toml".into());
    assert!(Handle::new(temp.path()).ancestors_until(&target).unwrap().is_empty());
    assert!(Handle::new(temp.path()).ancestor(&target).unwrap().is_none());
}

#[test]
fn test_full_chain_ends_at_root() {
    let temp = project();
    let chain = Handle::new(temp.path().join("src/bin")).ancestors().unwrap();
    assert!(chain.last().unwrap().is_root());
    assert_eq!(chain[0], temp.path().join("src"));
    assert_eq!(chain.len(), temp.path().join("src/bin").components().count() - 1);
}

#[test]
fn test_named_target_absent_fails() {
    let temp = project();
    let err = Handle::new(temp.path().join("src"))
        .ancestors_until(&AncestorTarget::Named("fsobj-no-such-dir".into()))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AncestorNotFound);
}
