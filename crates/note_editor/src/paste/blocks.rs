//! Maps sanitized markup onto the editor's block vocabulary.

use crate::core::{Block, BlockKind, MAX_INDENT_LEVEL};
use crate::inline::{Inline, InlineRun};

use super::html::{HtmlElement, HtmlNode};
use super::sanitize::is_executable_url;

/// Indent inferred from leading whitespace never exceeds this.
pub const MAX_INFERRED_INDENT: u8 = 3;

const BULLET_GLYPHS: &[char] = &['•', '-', '*', '◦', '▪', '▸', '►'];

/// Elements that separate lines when flattened into a single run.
const BLOCK_LIKE: &[&str] = &[
    "p", "div", "section", "article", "header", "footer", "main", "aside", "nav", "figure",
    "figcaption", "address", "center", "blockquote", "pre", "li", "dl", "dt", "dd", "table",
    "tr", "h1", "h2", "h3", "h4", "h5", "h6", "details", "summary",
];

pub fn blocks_from_nodes(nodes: &[HtmlNode]) -> Vec<Block> {
    let mut builder = BlockBuilder::default();
    builder.walk(nodes);
    builder.finish()
}

fn is_html_space(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n' | '\r' | '\u{c}')
}

/// Collects inline content, collapsing markup whitespace the way a browser renders it.
#[derive(Default)]
struct InlineCollector {
    spans: Vec<Inline>,
    pending_space: bool,
    /// Spaces and tabs seen at the start of the current line.
    lead: String,
}

impl InlineCollector {
    fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    fn ends_with_break(&self) -> bool {
        matches!(self.spans.last(), Some(Inline::Text { text }) if text.ends_with('\n'))
    }

    fn at_line_start(&self) -> bool {
        self.is_empty() || self.ends_with_break()
    }

    fn push_str(&mut self, s: &str) {
        match self.spans.last_mut() {
            Some(Inline::Text { text }) => text.push_str(s),
            _ => self.spans.push(Inline::text(s)),
        }
    }

    fn flush_space(&mut self) {
        if std::mem::take(&mut self.pending_space) {
            self.push_str(" ");
        }
    }

    fn text(&mut self, raw: &str) {
        let mut buf = String::new();
        for ch in raw.chars() {
            if is_html_space(ch) {
                if !buf.is_empty() {
                    self.flush_space();
                    self.push_str(&buf);
                    buf.clear();
                }
                if !self.at_line_start() {
                    self.pending_space = true;
                } else if matches!(ch, ' ' | '\t') {
                    self.lead.push(ch);
                } else {
                    self.lead.clear();
                }
            } else {
                if buf.is_empty() && self.at_line_start() {
                    buf.push_str(&std::mem::take(&mut self.lead));
                }
                buf.push(ch);
            }
        }
        if !buf.is_empty() {
            self.flush_space();
            self.push_str(&buf);
        }
    }

    fn line_break(&mut self) {
        self.pending_space = false;
        self.lead.clear();
        self.push_str("\n");
    }

    fn inline(&mut self, inline: Inline) {
        self.flush_space();
        self.lead.clear();
        self.spans.push(inline);
    }

    fn link(&mut self, element: &HtmlElement) {
        let text = inline_run(&element.children).plain_text();
        match element.attr("href") {
            Some(href) if !href.trim().is_empty() && !is_executable_url(href) => {
                if !text.is_empty() {
                    self.inline(Inline::link(href.trim(), text));
                }
            }
            _ => self.text(&text),
        }
    }

    fn tag(&mut self, element: &HtmlElement) {
        let from_attr = element.attr("data-tag").map(str::trim).unwrap_or_default();
        let name = if from_attr.is_empty() {
            inline_run(&element.children).plain_text()
        } else {
            from_attr.to_string()
        };
        let name = name.trim().trim_start_matches('#');
        if !name.is_empty() {
            self.inline(Inline::tag(name));
        }
    }

    fn finish(self) -> InlineRun {
        strip_line_leads(self.finish_keeping_indent())
    }

    /// Like `finish`, but keeps each line's leading spaces for list marker detection.
    fn finish_keeping_indent(self) -> InlineRun {
        let mut run = InlineRun::from_spans(self.spans);
        if let Some(Inline::Text { text }) = run.spans.last_mut() {
            let trimmed = text.trim_end_matches(is_html_space).len();
            text.truncate(trimmed);
        }
        run.normalize();
        run
    }
}

fn collect_inline(nodes: &[HtmlNode], out: &mut InlineCollector) {
    for node in nodes {
        match node {
            HtmlNode::Text(text) => out.text(text),
            HtmlNode::Element(element) => match element.name.as_str() {
                "br" => out.line_break(),
                "ul" | "ol" | "img" | "hr" => {}
                "a" => out.link(element),
                "span" if element.has_attr("data-tag") => out.tag(element),
                name if BLOCK_LIKE.contains(&name) => {
                    if !out.is_empty() && !out.ends_with_break() {
                        out.line_break();
                    }
                    collect_inline(&element.children, out);
                }
                _ => collect_inline(&element.children, out),
            },
        }
    }
}

fn inline_run(nodes: &[HtmlNode]) -> InlineRun {
    let mut collector = InlineCollector::default();
    collect_inline(nodes, &mut collector);
    collector.finish()
}

fn raw_text(nodes: &[HtmlNode], out: &mut String) {
    for node in nodes {
        match node {
            HtmlNode::Text(text) => out.push_str(text),
            HtmlNode::Element(element) if element.name == "br" => out.push('\n'),
            HtmlNode::Element(element) => raw_text(&element.children, out),
        }
    }
}

fn parse_indent(element: &HtmlElement, name: &str) -> Option<u8> {
    element
        .attr(name)
        .and_then(|value| value.trim().parse::<u8>().ok())
        .map(|value| value.min(MAX_INDENT_LEVEL))
}

fn heading_level(name: &str) -> Option<u8> {
    let level = name.strip_prefix('h')?.parse::<u8>().ok()?;
    (1..=6).contains(&level).then(|| level.min(3))
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    pending: InlineCollector,
}

impl BlockBuilder {
    fn walk(&mut self, nodes: &[HtmlNode]) {
        for node in nodes {
            match node {
                HtmlNode::Text(text) => self.pending.text(text),
                HtmlNode::Element(element) => self.element(element),
            }
        }
    }

    fn flush(&mut self) {
        let run = std::mem::take(&mut self.pending).finish_keeping_indent();
        if !run.is_empty() {
            self.blocks.extend(paragraph_blocks(run));
        }
    }

    fn push(&mut self, block: Block) {
        self.flush();
        self.blocks.push(block);
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush();
        self.blocks
    }

    fn element(&mut self, element: &HtmlElement) {
        let name = element.name.as_str();
        if let Some(level) = heading_level(name) {
            self.push(Block::new(BlockKind::heading(level), inline_run(&element.children)));
            return;
        }

        match name {
            "br" => self.pending.line_break(),
            "a" => self.pending.link(element),
            "span" if element.has_attr("data-tag") => self.pending.tag(element),
            "hr" => self.push(Block::divider()),
            "img" => {
                self.flush();
                if let Some(src) = element.attr("src").filter(|src| !src.is_empty()) {
                    let alt = element.attr("alt").unwrap_or_default().to_string();
                    self.blocks.push(Block::empty(BlockKind::Image {
                        src: src.to_string(),
                        alt,
                    }));
                }
            }
            "ul" | "ol" => {
                self.flush();
                self.list(element, 0);
            }
            "li" => {
                self.flush();
                self.list_item(element, BlockKind::BulletedItem, 0);
            }
            "pre" => {
                let mut text = String::new();
                raw_text(&element.children, &mut text);
                let text = text.strip_prefix('\n').unwrap_or(&text);
                self.push(Block::new(BlockKind::Code, InlineRun::from_text(text.trim_end_matches('\n'))));
            }
            "blockquote" => {
                let inner = blocks_from_nodes(&element.children);
                let mut content = InlineRun::new();
                for block in inner.iter().filter(|b| b.kind.is_text_bearing()) {
                    if !content.is_empty() {
                        content.append(InlineRun::from_text("\n"));
                    }
                    content.append(block.content.clone());
                }
                content.normalize();
                self.flush();
                if !content.is_empty() {
                    self.blocks.push(Block::new(BlockKind::Quote, content));
                }
            }
            "details" => self.toggle(element),
            _ if element.attr("data-block") == Some("toggle") => self.toggle(element),
            _ if element.attr("data-block") == Some("todo") => {
                let checked = element.attr("data-checked") == Some("true");
                let mut block = Block::new(BlockKind::Todo { checked }, inline_run(&element.children));
                block.indent = parse_indent(element, "data-indent").unwrap_or(0);
                self.push(block);
            }
            _ if element.attr("data-block") == Some("callout") => {
                self.push(Block::new(BlockKind::Callout, inline_run(&element.children)));
            }
            "td" | "th" => {
                self.walk(&element.children);
                self.pending.text(" ");
            }
            name if BLOCK_LIKE.contains(&name) => {
                self.flush();
                let before = self.blocks.len();
                self.walk(&element.children);
                self.flush();
                if let Some(padding) = parse_indent(element, "data-padding") {
                    for block in &mut self.blocks[before..] {
                        if block.kind == BlockKind::Paragraph {
                            block.padding = padding;
                        }
                    }
                }
            }
            _ => self.walk(&element.children),
        }
    }

    fn toggle(&mut self, element: &HtmlElement) {
        let mut title = InlineRun::new();
        let mut body_nodes = Vec::new();
        let mut found_summary = false;
        for child in &element.children {
            match child {
                HtmlNode::Element(summary) if summary.name == "summary" && !found_summary => {
                    found_summary = true;
                    title = inline_run(&summary.children);
                }
                other => body_nodes.push(other.clone()),
            }
        }
        let mut block = Block::new(
            BlockKind::Toggle {
                open: element.has_attr("open"),
            },
            title,
        );
        block.children = blocks_from_nodes(&body_nodes);
        self.push(block);
    }

    fn list(&mut self, list: &HtmlElement, depth: u8) {
        let kind = if list.name == "ol" {
            BlockKind::NumberedItem
        } else {
            BlockKind::BulletedItem
        };
        for child in &list.children {
            match child {
                HtmlNode::Element(item) if item.name == "li" => {
                    self.list_item(item, kind.clone(), depth);
                }
                HtmlNode::Element(nested) if nested.name == "ul" || nested.name == "ol" => {
                    self.list(nested, depth.saturating_add(1));
                }
                HtmlNode::Element(other) => {
                    let content = inline_run(std::slice::from_ref(child));
                    if !content.is_empty() {
                        let indent = parse_indent(other, "data-indent").unwrap_or(depth);
                        self.blocks
                            .push(Block::new(kind.clone(), content).with_indent(indent.min(MAX_INDENT_LEVEL)));
                    }
                }
                HtmlNode::Text(text) if !text.trim().is_empty() => {
                    self.blocks.push(
                        Block::new(kind.clone(), InlineRun::from_text(text.trim()))
                            .with_indent(depth.min(MAX_INDENT_LEVEL)),
                    );
                }
                HtmlNode::Text(_) => {}
            }
        }
    }

    fn list_item(&mut self, item: &HtmlElement, kind: BlockKind, depth: u8) {
        let content = inline_run(&item.children);
        let nested: Vec<&HtmlElement> = item
            .children
            .iter()
            .filter_map(|child| match child {
                HtmlNode::Element(el) if el.name == "ul" || el.name == "ol" => Some(el),
                _ => None,
            })
            .collect();

        let kind = match item.attr("data-block") {
            Some("todo") => BlockKind::Todo {
                checked: item.attr("data-checked") == Some("true"),
            },
            _ => kind,
        };
        let indent = parse_indent(item, "data-indent").unwrap_or(depth.min(MAX_INDENT_LEVEL));
        if !content.is_empty() || nested.is_empty() {
            self.blocks.push(Block::new(kind, content).with_indent(indent));
        }
        for list in nested {
            self.list(list, depth.saturating_add(1));
        }
    }
}

/// A bullet or number marker at the start of a pasted line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListMarker {
    pub kind: BlockKind,
    pub indent: u8,
    /// Bytes covered by leading whitespace, the marker and the gap after it.
    pub len: usize,
}

fn is_marker_gap(ch: char) -> bool {
    matches!(ch, ' ' | '\u{a0}' | '\t')
}

/// Recognizes `• item`, `- item`, `1. item` and `1) item`, with indent
/// inferred from the leading whitespace (two columns per level).
pub fn list_marker(text: &str) -> Option<ListMarker> {
    let mut width = 0usize;
    let mut consumed = 0usize;
    for ch in text.chars() {
        match ch {
            ' ' | '\u{a0}' => width += 1,
            '\t' => width += 4,
            _ => break,
        }
        consumed += ch.len_utf8();
    }

    let rest = &text[consumed..];
    let (kind, marker_len) = match rest.chars().next()? {
        glyph if BULLET_GLYPHS.contains(&glyph) => (BlockKind::BulletedItem, glyph.len_utf8()),
        digit if digit.is_ascii_digit() => {
            let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
            if digits > 3 || !matches!(rest.as_bytes().get(digits), Some(b'.' | b')')) {
                return None;
            }
            (BlockKind::NumberedItem, digits + 1)
        }
        _ => return None,
    };

    let after = &rest[marker_len..];
    let gap: usize = after
        .chars()
        .take_while(|ch| is_marker_gap(*ch))
        .map(char::len_utf8)
        .sum();
    if gap == 0 {
        return None;
    }

    let indent = u8::try_from(width / 2).unwrap_or(u8::MAX).min(MAX_INFERRED_INDENT);
    Some(ListMarker {
        kind,
        indent,
        len: consumed + marker_len + gap,
    })
}

fn leading_text(run: &InlineRun) -> &str {
    match run.spans.first() {
        Some(Inline::Text { text }) => text,
        _ => "",
    }
}

fn split_lines(run: InlineRun) -> Vec<InlineRun> {
    let mut lines = vec![InlineRun::new()];
    for span in run.spans {
        match span {
            Inline::Text { text } => {
                let mut parts = text.split('\n');
                if let Some(first) = parts.next() {
                    if let Some(line) = lines.last_mut() {
                        if !first.is_empty() {
                            line.spans.push(Inline::text(first));
                        }
                    }
                }
                for part in parts {
                    lines.push(InlineRun::from_text(part));
                }
            }
            other => {
                if let Some(line) = lines.last_mut() {
                    line.spans.push(other);
                }
            }
        }
    }
    lines
}

fn list_item_from(mut run: InlineRun, marker: ListMarker) -> Block {
    run.remove_range(0..marker.len);
    Block::new(marker.kind, strip_line_leads(run)).with_indent(marker.indent)
}

fn strip_line_leads(run: InlineRun) -> InlineRun {
    let mut at_line_start = true;
    let spans = run
        .spans
        .into_iter()
        .map(|span| match span {
            Inline::Text { text } => {
                let mut kept = String::with_capacity(text.len());
                for ch in text.chars() {
                    if at_line_start && matches!(ch, ' ' | '\t') {
                        continue;
                    }
                    at_line_start = ch == '\n';
                    kept.push(ch);
                }
                Inline::text(kept)
            }
            other => {
                at_line_start = false;
                other
            }
        })
        .collect();
    let mut run = InlineRun::from_spans(spans);
    run.normalize();
    run
}

/// A collected paragraph, or list items when its lines carry list markers.
fn paragraph_blocks(run: InlineRun) -> Vec<Block> {
    let lines = split_lines(run.clone());
    if lines.len() > 1 && lines.iter().all(|line| list_marker(leading_text(line)).is_some()) {
        return lines
            .into_iter()
            .filter_map(|line| {
                let marker = list_marker(leading_text(&line))?;
                Some(list_item_from(line, marker))
            })
            .collect();
    }
    match list_marker(leading_text(&run)) {
        Some(marker) => vec![list_item_from(run, marker)],
        None => vec![Block::new(BlockKind::Paragraph, strip_line_leads(run))],
    }
}
