//! MIME type registry mapping content types to file subtypes.

use std::collections::HashMap;
use std::sync::LazyLock;

/// A content-specific file subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Zip,
    Json,
    Xml,
    Html,
}

impl FileType {
    pub fn as_str(self) -> &'static str {
        match self {
            FileType::Zip => "zip",
            FileType::Json => "json",
            FileType::Xml => "xml",
            FileType::Html => "html",
        }
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry of MIME type to [`FileType`].
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    types: HashMap<String, FileType>,
}

impl TypeRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the standard mappings.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register("application/zip", FileType::Zip);
        registry.register("application/json", FileType::Json);
        registry.register("text/xml", FileType::Xml);
        registry.register("image/svg+xml", FileType::Xml);
        registry.register("text/html", FileType::Html);
        registry
    }

    /// Register a MIME type. A later registration replaces an earlier one.
    pub fn register(&mut self, mime: impl Into<String>, file_type: FileType) {
        self.types.insert(mime.into(), file_type);
    }

    /// Look up a MIME type.
    pub fn get(&self, mime: &str) -> Option<FileType> {
        self.types.get(mime).copied()
    }

    /// All registered MIME types, sorted.
    pub fn mime_types(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.types.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

static BUILTIN: LazyLock<TypeRegistry> = LazyLock::new(TypeRegistry::standard);

/// The process-wide standard registry.
pub fn builtin() -> &'static TypeRegistry {
    &BUILTIN
}
