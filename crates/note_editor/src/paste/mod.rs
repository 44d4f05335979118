//! Clipboard input: sanitize external content and map it onto editor blocks.

pub mod blocks;
pub mod html;
pub mod plain;
pub mod sanitize;

use tracing::debug;

use crate::core::Block;

pub use html::HtmlError;

/// The flavors offered by a clipboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PasteData {
    pub html: Option<String>,
    pub text: Option<String>,
}

impl PasteData {
    pub fn html(html: impl Into<String>) -> Self {
        Self {
            html: Some(html.into()),
            text: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            html: None,
            text: Some(text.into()),
        }
    }

    pub fn both(html: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            html: Some(html.into()),
            text: Some(text.into()),
        }
    }
}

/// Parses, sanitizes and normalizes markup into blocks.
pub fn blocks_from_markup(markup: &str) -> Result<Vec<Block>, HtmlError> {
    let nodes = html::parse_fragment(markup)?;
    Ok(blocks::blocks_from_nodes(&sanitize::sanitize(nodes)))
}

/// Blocks for a paste, preferring markup and falling back to plain text.
pub fn prepare(data: &PasteData) -> Vec<Block> {
    if let Some(markup) = data.html.as_deref().filter(|m| !m.trim().is_empty()) {
        match blocks_from_markup(markup) {
            Ok(blocks) if !blocks.is_empty() => return blocks,
            Ok(_) => {}
            Err(err) => {
                debug!(%err, "pasted markup is malformed; falling back to plain text");
                if data.text.is_none() {
                    let nodes = sanitize::sanitize(html::parse_fragment_lenient(markup));
                    return plain::blocks_from_text(&html::visible_text(&nodes));
                }
            }
        }
    }
    data.text
        .as_deref()
        .map(plain::blocks_from_text)
        .unwrap_or_default()
}
