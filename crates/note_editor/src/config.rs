use serde::{Deserialize, Serialize};

use crate::core::MAX_INDENT_LEVEL;
use crate::error::ConfigError;

/// Host-supplied editor settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub placeholder: String,
    /// Catalog searched by the `#` trigger. An empty catalog disables it.
    pub available_tags: Vec<String>,
    pub max_undo: usize,
    pub max_normalize_iterations: usize,
    pub max_indent_level: u8,
    pub triggers_in_code: bool,
}

impl EditorConfig {
    pub fn with_defaults(mut self) -> Self {
        if self.max_undo == 0 {
            self.max_undo = 200;
        }
        if self.max_normalize_iterations == 0 {
            self.max_normalize_iterations = 100;
        }
        if self.max_indent_level == 0 || self.max_indent_level > MAX_INDENT_LEVEL {
            self.max_indent_level = MAX_INDENT_LEVEL;
        }
        self
    }

    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let config: EditorConfig = serde_json::from_str(input)?;
        Ok(config.with_defaults())
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.available_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_values_fall_back_to_defaults() {
        let config = EditorConfig::default().with_defaults();
        assert_eq!(config.max_undo, 200);
        assert_eq!(config.max_normalize_iterations, 100);
        assert_eq!(config.max_indent_level, 5);
    }

    #[test]
    fn json_config_is_capped() {
        let config =
            EditorConfig::from_json_str(r#"{"available_tags":["a"],"max_indent_level":9}"#)
                .unwrap();
        assert_eq!(config.available_tags, vec!["a".to_string()]);
        assert_eq!(config.max_indent_level, 5);
        assert!(EditorConfig::from_json_str("{").is_err());
    }
}
