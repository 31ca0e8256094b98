//! JSON documents backed by a file.

use serde_json::{Map, Value};

use crate::error::Result;
use crate::handle::Handle;

/// A JSON value loaded from a file, written back with [`JsonDoc::save`].
///
/// A missing file loads as an empty object.
#[derive(Debug, Clone)]
pub struct JsonDoc {
    file: Handle,
    value: Value,
}

impl JsonDoc {
    pub fn load(file: Handle) -> Result<Self> {
        let value = if file.exists() {
            serde_json::from_str(&file.read()?)?
        } else {
            Value::Object(Map::new())
        };
        Ok(Self { file, value })
    }

    pub fn file(&self) -> &Handle {
        &self.file
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    /// Write the document. Fails if the backing handle is frozen.
    pub fn save(&self) -> Result<()> {
        let text = serde_json::to_string(&self.value)?;
        self.file.write(text)
    }
}
