use std::ops::Range;

use crate::core::{BlockId, Document, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerChar {
    /// `/` opens the block command menu.
    Slash,
    /// `#` opens the tag menu.
    Hash,
}

impl TriggerChar {
    pub fn as_char(self) -> char {
        match self {
            TriggerChar::Slash => '/',
            TriggerChar::Hash => '#',
        }
    }

    fn accepts(self, ch: char) -> bool {
        match self {
            TriggerChar::Slash => ch.is_alphanumeric() || ch == '_',
            TriggerChar::Hash => ch.is_ascii_alphanumeric() || ch == '_',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerMatch {
    pub trigger: TriggerChar,
    pub filter: String,
    /// Byte offset of the trigger character within the scanned text.
    pub start: usize,
}

/// Looks for an unclosed trigger at the very end of `text_before`.
pub fn scan(text_before: &str, tags_enabled: bool) -> Option<TriggerMatch> {
    if tags_enabled {
        if let Some(found) = scan_for(text_before, TriggerChar::Hash) {
            return Some(found);
        }
    }
    scan_for(text_before, TriggerChar::Slash)
}

fn scan_for(text: &str, trigger: TriggerChar) -> Option<TriggerMatch> {
    let head = text.trim_end_matches(|ch| trigger.accepts(ch));
    let filter = &text[head.len()..];
    let before_trigger = head.strip_suffix(trigger.as_char())?;
    Some(TriggerMatch {
        trigger,
        filter: filter.to_string(),
        start: before_trigger.len(),
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectOptions {
    pub tags_enabled: bool,
    pub triggers_in_code: bool,
}

/// An open trigger located in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerContext {
    pub trigger: TriggerChar,
    pub filter: String,
    pub anchor: BlockId,
    /// Caret-unit range of the trigger text (trigger char plus filter).
    pub range: Range<usize>,
}

impl TriggerContext {
    pub fn trigger_text(&self) -> String {
        format!("{}{}", self.trigger.as_char(), self.filter)
    }

    /// Whether the trigger text is still in place in its anchor block.
    pub fn is_attached(&self, doc: &Document) -> bool {
        let Some(block) = doc.block(self.anchor) else {
            return false;
        };
        block.kind.is_text_bearing()
            && block.content.text_in_range(self.range.clone()) == Some(self.trigger_text().as_str())
    }
}

pub fn detect(doc: &Document, caret: &Point, options: DetectOptions) -> Option<TriggerContext> {
    let block = doc.block(caret.block)?;
    if block.kind.is_void() || (block.kind.is_code() && !options.triggers_in_code) {
        return None;
    }
    let offset = block.content.clamp(caret.offset);
    let text_before = block.content.text_before_in_span(offset)?;
    let found = scan(text_before, options.tags_enabled)?;
    let span_start = offset - text_before.len();

    Some(TriggerContext {
        trigger: found.trigger,
        filter: found.filter,
        anchor: block.id,
        range: span_start + found.start..offset,
    })
}
