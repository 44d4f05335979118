use serde::{Deserialize, Serialize};

use crate::core::Document;
use crate::error::ValueError;

const DEFAULT_SCHEMA: &str = "manos-note";
const DEFAULT_VERSION: u32 = 1;

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_version() -> u32 {
    DEFAULT_VERSION
}

/// Versioned JSON envelope handed to the host on every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteValue {
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_version")]
    pub version: u32,
    pub document: Document,
}

impl NoteValue {
    pub fn from_document(document: Document) -> Self {
        Self {
            schema: default_schema(),
            version: default_version(),
            document,
        }
    }

    pub fn into_document(self) -> Document {
        let mut document = self.document;
        document.ensure_ids();
        document
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ValueError> {
        let value: NoteValue = serde_json::from_str(s)?;
        if value.schema != DEFAULT_SCHEMA {
            return Err(ValueError::UnsupportedSchema {
                found: value.schema,
            });
        }
        if value.version > DEFAULT_VERSION {
            return Err(ValueError::UnsupportedVersion {
                found: value.version,
                supported: DEFAULT_VERSION,
            });
        }
        Ok(value)
    }
}
