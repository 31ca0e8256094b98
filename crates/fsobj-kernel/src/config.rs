//! Configuration loading.
//!
//! Config lives in a TOML file (see [`crate::paths::config_file`]). Every
//! field has a default, so a missing file or an empty table is valid:
//!
//! ```toml
//! path_style = "relative"
//! attr_backend = "command"
//! search_backend = "grep"
//!
//! [tools]
//! file = "/usr/bin/file"
//! grep = "/bin/grep"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FsoError, Result};
use crate::paths;

/// How handles render their paths for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStyle {
    /// Relative to the context's working directory.
    #[default]
    Relative,
    Absolute,
}

/// Which attribute store implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrBackendKind {
    /// The external `attr` tool.
    #[default]
    Command,
    /// Native extended attributes in the `user.` namespace.
    Xattr,
}

/// Which content search implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchBackendKind {
    /// The external `grep` tool.
    #[default]
    Grep,
    /// In-process walk and search.
    Native,
}

/// Locations of external tools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub file: PathBuf,
    pub zip: PathBuf,
    pub diff: PathBuf,
    pub shuf: PathBuf,
    pub grep: PathBuf,
    pub attr: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            file: PathBuf::from("/usr/bin/file"),
            zip: PathBuf::from("/usr/bin/zip"),
            diff: PathBuf::from("/usr/bin/diff"),
            shuf: PathBuf::from("/usr/bin/shuf"),
            grep: PathBuf::from("/usr/bin/grep"),
            attr: PathBuf::from("/usr/bin/attr"),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsoConfig {
    pub tools: ToolPaths,
    pub path_style: PathStyle,
    pub attr_backend: AttrBackendKind,
    pub search_backend: SearchBackendKind,
}

impl FsoConfig {
    /// Load from the standard location, falling back to defaults if the
    /// file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_file())
    }

    /// Load from `path`. A missing file yields defaults; a malformed one is
    /// a [`FsoError::Config`].
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::from_toml_str(&text)
                    .map_err(|e| FsoError::Config(format!("{}: {e}", path.display())))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(FsoError::io("read config", path, e)),
        }
    }

    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn empty_document_is_default() {
        let config = FsoConfig::from_toml_str("").unwrap();
        assert_eq!(config, FsoConfig::default());
        assert_eq!(config.tools.grep, PathBuf::from("/usr/bin/grep"));
    }

    #[test]
    fn partial_tools_table_keeps_other_defaults() {
        let config = FsoConfig::from_toml_str(
            r#"
            path_style = "absolute"
            search_backend = "native"

            [tools]
            grep = "/bin/grep"
            "#,
        )
        .unwrap();
        assert_eq!(config.path_style, PathStyle::Absolute);
        assert_eq!(config.search_backend, SearchBackendKind::Native);
        assert_eq!(config.attr_backend, AttrBackendKind::Command);
        assert_eq!(config.tools.grep, PathBuf::from("/bin/grep"));
        assert_eq!(config.tools.zip, PathBuf::from("/usr/bin/zip"));
    }

    #[test]
    fn missing_file_is_default() {
        let temp = TempDir::new().unwrap();
        let config = FsoConfig::load_from(&temp.path().join("absent.toml")).unwrap();
        assert_eq!(config, FsoConfig::default());
    }

    #[test]
    fn malformed_file_is_config_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "path_style = \"sideways\"").unwrap();
        let err = FsoConfig::load_from(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("config.toml"));
    }
}
