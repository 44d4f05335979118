use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Caret units occupied by an atomic tag span.
pub const TAG_WIDTH: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "span", rename_all = "snake_case")]
pub enum Inline {
    Text { text: String },
    Tag { name: String },
    Link { href: String, text: String },
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Text { text: text.into() }
    }

    pub fn tag(name: impl Into<String>) -> Self {
        Inline::Tag { name: name.into() }
    }

    pub fn link(href: impl Into<String>, text: impl Into<String>) -> Self {
        Inline::Link {
            href: href.into(),
            text: text.into(),
        }
    }

    /// Width in caret units: bytes for text, [`TAG_WIDTH`] for tags.
    pub fn width(&self) -> usize {
        match self {
            Inline::Text { text } | Inline::Link { text, .. } => text.len(),
            Inline::Tag { .. } => TAG_WIDTH,
        }
    }

    pub fn is_atomic(&self) -> bool {
        matches!(self, Inline::Tag { .. })
    }

    pub fn plain_text(&self) -> String {
        match self {
            Inline::Text { text } | Inline::Link { text, .. } => text.clone(),
            Inline::Tag { name } => format!("#{name}"),
        }
    }

    fn editable_text(&self) -> Option<&str> {
        match self {
            Inline::Text { text } | Inline::Link { text, .. } => Some(text),
            Inline::Tag { .. } => None,
        }
    }
}

/// Ordered inline content of a block.
///
/// Offsets are caret units: every byte of a text or link span is one unit and
/// a tag span is [`TAG_WIDTH`] units. Offsets inside a text span always fall on
/// a char boundary once passed through [`InlineRun::clamp`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InlineRun {
    pub spans: Vec<Inline>,
}

impl InlineRun {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self::new();
        }
        Self {
            spans: vec![Inline::Text { text }],
        }
    }

    pub fn from_spans(spans: Vec<Inline>) -> Self {
        Self { spans }
    }

    pub fn len(&self) -> usize {
        self.spans.iter().map(Inline::width).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.iter().all(|span| span.width() == 0)
    }

    pub fn is_blank(&self) -> bool {
        self.spans.iter().all(|span| match span {
            Inline::Text { text } | Inline::Link { text, .. } => text.trim().is_empty(),
            Inline::Tag { .. } => false,
        })
    }

    pub fn plain_text(&self) -> String {
        self.spans.iter().map(Inline::plain_text).collect()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.spans.iter().filter_map(|span| match span {
            Inline::Tag { name } => Some(name.as_str()),
            _ => None,
        })
    }

    fn positioned(&self) -> impl Iterator<Item = (usize, usize, &Inline)> {
        let mut start = 0;
        self.spans.iter().enumerate().map(move |(ix, span)| {
            let span_start = start;
            start += span.width();
            (ix, span_start, span)
        })
    }

    /// Clamps `offset` into the run and back onto a char boundary.
    pub fn clamp(&self, offset: usize) -> usize {
        let offset = offset.min(self.len());
        for (_, start, span) in self.positioned() {
            let end = start + span.width();
            if offset > start && offset < end {
                if let Some(text) = span.editable_text() {
                    return start + floor_char_boundary(text, offset - start);
                }
            }
        }
        offset
    }

    /// The caret position one unit (char or tag) before `offset`.
    pub fn prev_boundary(&self, offset: usize) -> usize {
        let offset = self.clamp(offset);
        for (_, start, span) in self.positioned() {
            let end = start + span.width();
            if offset > start && offset <= end {
                return match span.editable_text() {
                    Some(text) => text[..offset - start]
                        .char_indices()
                        .next_back()
                        .map(|(ix, _)| start + ix)
                        .unwrap_or(start),
                    None => start,
                };
            }
        }
        0
    }

    pub fn next_boundary(&self, offset: usize) -> usize {
        let offset = self.clamp(offset);
        for (_, start, span) in self.positioned() {
            let end = start + span.width();
            if offset >= start && offset < end {
                return match span.editable_text() {
                    Some(text) => text[offset - start..]
                        .chars()
                        .next()
                        .map(|ch| offset + ch.len_utf8())
                        .unwrap_or(end),
                    None => end,
                };
            }
        }
        offset
    }

    /// Inserts plain text at `offset`, returning the offset just after it.
    ///
    /// Text joins a text span touching the offset, or the inside of a link;
    /// next to tags and at link edges a new text span is created.
    pub fn insert_text(&mut self, offset: usize, text: &str) -> usize {
        let offset = self.clamp(offset);
        if text.is_empty() {
            return offset;
        }

        let mut target: Option<(usize, usize)> = None;
        for (ix, start, span) in self.positioned() {
            let end = start + span.width();
            let hit = match span {
                Inline::Text { .. } => start <= offset && offset <= end,
                Inline::Link { .. } => start < offset && offset < end,
                Inline::Tag { .. } => false,
            };
            if hit {
                target = Some((ix, start));
                break;
            }
        }

        match target {
            Some((ix, start)) => match &mut self.spans[ix] {
                Inline::Text { text: existing } | Inline::Link { text: existing, .. } => {
                    existing.insert_str(offset - start, text);
                }
                Inline::Tag { .. } => {}
            },
            None => {
                let ix = self
                    .positioned()
                    .find(|(_, start, _)| *start >= offset)
                    .map(|(ix, _, _)| ix)
                    .unwrap_or(self.spans.len());
                self.spans.insert(ix, Inline::text(text));
            }
        }
        offset + text.len()
    }

    pub fn insert_inline(&mut self, offset: usize, inline: Inline) -> usize {
        let offset = self.clamp(offset);
        let width = inline.width();
        let tail = self.split_off(offset);
        self.spans.push(inline);
        self.append(tail);
        offset + width
    }

    /// Removes the units in `range`; tags are removed only when fully covered.
    pub fn remove_range(&mut self, range: Range<usize>) {
        let start_cut = self.clamp(range.start);
        let end_cut = self.clamp(range.end.max(range.start));
        if start_cut >= end_cut {
            return;
        }

        let mut start = 0;
        for span in &mut self.spans {
            let width = span.width();
            let end = start + width;
            let lo = start_cut.max(start);
            let hi = end_cut.min(end);
            if lo < hi {
                match span {
                    Inline::Text { text } | Inline::Link { text, .. } => {
                        text.replace_range(lo - start..hi - start, "");
                    }
                    Inline::Tag { name } => {
                        if lo == start && hi == end {
                            name.clear();
                        }
                    }
                }
            }
            start = end;
        }

        self.spans.retain(|span| match span {
            Inline::Tag { name } => !name.is_empty(),
            other => other.width() > 0,
        });
    }

    /// Splits the run at `offset`, keeping the head and returning the tail.
    pub fn split_off(&mut self, offset: usize) -> InlineRun {
        let offset = self.clamp(offset);
        let mut split_ix = self.spans.len();
        let mut head_rest: Option<Inline> = None;

        let mut start = 0;
        for (ix, span) in self.spans.iter_mut().enumerate() {
            let end = start + span.width();
            if offset <= start {
                split_ix = ix;
                break;
            }
            if offset < end {
                let local = offset - start;
                head_rest = match span {
                    Inline::Text { text } => Some(Inline::Text {
                        text: text.split_off(local),
                    }),
                    Inline::Link { href, text } => Some(Inline::Link {
                        href: href.clone(),
                        text: text.split_off(local),
                    }),
                    Inline::Tag { .. } => None,
                };
                split_ix = ix + 1;
                break;
            }
            start = end;
        }

        let mut tail: Vec<Inline> = head_rest.into_iter().collect();
        tail.extend(self.spans.drain(split_ix..));
        self.spans.retain(|span| span.width() > 0);
        InlineRun { spans: tail }
    }

    pub fn append(&mut self, other: InlineRun) {
        self.spans.extend(other.spans);
    }

    /// Text before `offset` inside the text span holding the caret.
    ///
    /// `None` when the caret does not sit inside or at the edge of a plain
    /// text span (for example right after a tag with nothing following it).
    pub fn text_before_in_span(&self, offset: usize) -> Option<&str> {
        let mut at_start: Option<&str> = None;
        for (_, start, span) in self.positioned() {
            let end = start + span.width();
            if let Inline::Text { text } = span {
                if offset > start && offset <= end {
                    let local = floor_char_boundary(text, offset - start);
                    return Some(&text[..local]);
                }
                if offset == start && at_start.is_none() {
                    at_start = Some("");
                }
            }
        }
        at_start
    }

    /// The text of `range` when it lies inside a single plain text span.
    pub fn text_in_range(&self, range: Range<usize>) -> Option<&str> {
        for (_, start, span) in self.positioned() {
            let end = start + span.width();
            if let Inline::Text { text } = span {
                if range.start >= start && range.end <= end && range.start <= range.end {
                    return text.get(range.start - start..range.end - start);
                }
            }
        }
        None
    }

    pub fn flatten_to_text(&mut self) -> bool {
        let is_flat = match self.spans.as_slice() {
            [] => true,
            [Inline::Text { .. }] => true,
            _ => false,
        };
        if is_flat {
            return false;
        }
        *self = InlineRun::from_text(self.plain_text());
        true
    }

    /// Drops empty spans, merges adjacent text and keeps every tag followed
    /// by editable text. Returns whether anything changed.
    pub fn normalize(&mut self) -> bool {
        let before = self.spans.len();
        let mut changed = false;
        let mut out: Vec<Inline> = Vec::with_capacity(self.spans.len());

        for span in self.spans.drain(..) {
            match span {
                Inline::Tag { ref name } if name.is_empty() => changed = true,
                Inline::Text { ref text } if text.is_empty() => changed = true,
                Inline::Link { ref text, .. } if text.is_empty() => changed = true,
                Inline::Text { text } => {
                    if let Some(Inline::Text { text: prev }) = out.last_mut() {
                        prev.push_str(&text);
                        changed = true;
                    } else {
                        out.push(Inline::Text { text });
                    }
                }
                other => {
                    if let Some(Inline::Tag { .. }) = out.last() {
                        out.push(Inline::text(" "));
                        changed = true;
                    }
                    out.push(other);
                }
            }
        }

        if let Some(Inline::Tag { .. }) = out.last() {
            out.push(Inline::text(" "));
            changed = true;
        }

        self.spans = out;
        changed || self.spans.len() != before
    }
}

fn floor_char_boundary(text: &str, mut ix: usize) -> usize {
    ix = ix.min(text.len());
    while ix > 0 && !text.is_char_boundary(ix) {
        ix -= 1;
    }
    ix
}
