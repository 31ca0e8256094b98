//! Path identity: lexical canonicalization and relative rendering.
//!
//! Canonical paths are absolute with `.` and `..` resolved textually. Symlinks
//! are never followed here, so `/a/link/..` is `/a` even if `link` points
//! elsewhere. A handle's identity is exactly this form.

use std::path::{Component, Path, PathBuf};

/// Resolve `.` and `..` lexically. `..` at the root stays at the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(prefix) => out.push(prefix.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(name) => out.push(name),
        }
    }
    out
}

/// Join a possibly relative `path` onto `base` and normalize.
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    }
}

/// Lexical path from `base` to `path`. Both must be canonical.
///
/// Returns `.` when they are equal.
pub fn relative_path(path: &Path, base: &Path) -> PathBuf {
    let target: Vec<Component<'_>> = path.components().collect();
    let from: Vec<Component<'_>> = base.components().collect();

    let common = target
        .iter()
        .zip(from.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..from.len() {
        out.push("..");
    }
    for component in &target[common..] {
        out.push(component.as_os_str());
    }

    if out.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        out
    }
}

/// Render `path` relative to `base`, with an explicit `./` for entries that
/// sit directly inside `base`.
///
/// ```
/// use std::path::Path;
/// use fsobj_kernel::path::render_relative;
///
/// assert_eq!(render_relative(Path::new("/w/notes.txt"), Path::new("/w")), "./notes.txt");
/// assert_eq!(render_relative(Path::new("/w/a/b.txt"), Path::new("/w")), "a/b.txt");
/// assert_eq!(render_relative(Path::new("/x/y"), Path::new("/w")), "../x/y");
/// ```
pub fn render_relative(path: &Path, base: &Path) -> String {
    let rel = relative_path(path, base).to_string_lossy().into_owned();
    if path.parent() == Some(base) {
        format!("./{rel}")
    } else {
        rel
    }
}

/// Component-wise containment: `outer` contains itself and everything below.
///
/// `/foo` does not contain `/foobar`.
pub fn contains(outer: &Path, inner: &Path) -> bool {
    inner.starts_with(outer)
}

/// Base name for display; the root has no file name and renders as `/`.
pub fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "/".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/a/b/c", "/a/b/c")]
    #[case("/a/./b/", "/a/b")]
    #[case("/a/b/../c", "/a/c")]
    #[case("/../..", "/")]
    #[case("/a//b", "/a/b")]
    #[case("/", "/")]
    fn normalizes_lexically(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize(Path::new(input)), PathBuf::from(expected));
    }

    #[test]
    fn absolutize_joins_relative_onto_base() {
        assert_eq!(
            absolutize(Path::new("x/../y"), Path::new("/base")),
            PathBuf::from("/base/y")
        );
        assert_eq!(
            absolutize(Path::new("/abs"), Path::new("/base")),
            PathBuf::from("/abs")
        );
        assert_eq!(absolutize(Path::new(""), Path::new("/base")), PathBuf::from("/base"));
    }

    #[rstest]
    #[case("/w/a.txt", "/w", "./a.txt")]
    #[case("/w", "/w", ".")]
    #[case("/w/sub/a.txt", "/w", "sub/a.txt")]
    #[case("/w", "/w/sub", "..")]
    #[case("/other/a.txt", "/w/sub", "../../other/a.txt")]
    #[case("/a.txt", "/", "./a.txt")]
    fn renders_relative(#[case] path: &str, #[case] base: &str, #[case] expected: &str) {
        assert_eq!(render_relative(Path::new(path), Path::new(base)), expected);
    }

    #[test]
    fn containment_respects_component_boundaries() {
        assert!(contains(Path::new("/foo"), Path::new("/foo/bar")));
        assert!(contains(Path::new("/foo"), Path::new("/foo")));
        assert!(contains(Path::new("/"), Path::new("/anything")));
        assert!(!contains(Path::new("/foo"), Path::new("/foobar")));
        assert!(!contains(Path::new("/foo/bar"), Path::new("/foo")));
    }

    #[test]
    fn base_name_of_root() {
        assert_eq!(base_name(Path::new("/")), "/");
        assert_eq!(base_name(Path::new("/a/b.txt")), "b.txt");
    }
}
