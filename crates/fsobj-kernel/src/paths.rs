//! XDG Base Directory paths for fsobj.
//!
//! | Purpose | XDG Variable | Default | fsobj Path |
//! |---------|--------------|---------|------------|
//! | Config | `$XDG_CONFIG_HOME` | `~/.config` | `$XDG_CONFIG_HOME/fsobj/config.toml` |
//!
//! `$FSOBJ_CONFIG` overrides the config file location outright.

use std::path::PathBuf;

use directories::BaseDirs;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "FSOBJ_CONFIG";

/// Get the config directory.
///
/// Uses `$XDG_CONFIG_HOME/fsobj` or falls back to `~/.config/fsobj`.
pub fn config_dir() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| home_fallback().join(".config"))
        .join("fsobj")
}

/// The config file to load: `$FSOBJ_CONFIG` if set, else `config_dir()/config.toml`.
pub fn config_file() -> PathBuf {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => config_dir().join("config.toml"),
    }
}

/// The user's home directory, or `/` if it cannot be determined.
pub fn home_dir() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .unwrap_or_else(home_fallback)
}

/// The system temporary directory (`$TMPDIR`, else `/tmp`).
pub fn tmp_dir() -> PathBuf {
    std::env::temp_dir()
}

fn home_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_dir_is_under_fsobj() {
        assert!(config_dir().ends_with("fsobj"));
    }

    #[test]
    fn home_is_absolute() {
        assert!(home_dir().is_absolute());
    }

    #[test]
    fn tmp_is_absolute() {
        assert!(tmp_dir().is_absolute());
    }
}
