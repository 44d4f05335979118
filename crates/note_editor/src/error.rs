use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error("normalization did not converge after {0} iterations")]
    NormalizeDidNotConverge(usize),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid editor config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ValueError {
    #[error("failed to decode note value: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported schema {found:?}")]
    UnsupportedSchema { found: String },

    #[error("unsupported version {found} (newest known is {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
}
