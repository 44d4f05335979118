//! Document output for hosts: markup, plain text, and seeding from stored content.

use tracing::debug;

use crate::core::{Block, BlockKind, Document};
use crate::inline::{Inline, InlineRun};
use crate::paste::{self, plain};
use crate::serde_value::NoteValue;

impl Document {
    /// Markup in the vocabulary the paste pipeline reads back.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_blocks(&self.blocks, &mut out);
        out
    }

    pub fn to_plain_text(&self) -> String {
        fn walk(blocks: &[Block], out: &mut Vec<String>) {
            for block in blocks {
                if block.kind.is_text_bearing() {
                    out.push(block.plain_text());
                }
                walk(&block.children, out);
            }
        }
        let mut lines = Vec::new();
        walk(&self.blocks, &mut lines);
        lines.join("\n")
    }

    /// Seeds a document from a stored note value, markup, or plain text.
    pub fn from_initial_content(content: &str) -> Document {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Document::new();
        }
        if trimmed.starts_with('{') {
            match NoteValue::from_json_str(trimmed) {
                Ok(value) => return value.into_document(),
                Err(err) => debug!(%err, "initial content is not a note value"),
            }
        }
        if trimmed.starts_with('<') {
            match paste::blocks_from_markup(trimmed) {
                Ok(blocks) if !blocks.is_empty() => return Document::from_blocks(blocks),
                Ok(_) => {}
                Err(err) => debug!(%err, "initial content is not valid markup"),
            }
        }
        let blocks = plain::blocks_from_text(content);
        if blocks.is_empty() {
            return Document::new();
        }
        Document::from_blocks(blocks)
    }
}

fn escape_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_into(text, &mut out);
    out
}

fn write_text(text: &str, out: &mut String) {
    let mut lines = text.split('\n');
    if let Some(first) = lines.next() {
        escape_into(first, out);
    }
    for line in lines {
        out.push_str("<br>");
        escape_into(line, out);
    }
}

fn write_inline(run: &InlineRun, out: &mut String) {
    for span in &run.spans {
        match span {
            Inline::Text { text } => write_text(text, out),
            Inline::Tag { name } => {
                let name = escape(name);
                out.push_str(&format!("<span data-tag=\"{name}\">#{name}</span>"));
            }
            Inline::Link { href, text } => {
                out.push_str(&format!(
                    "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">",
                    escape(href)
                ));
                write_text(text, out);
                out.push_str("</a>");
            }
        }
    }
}

fn write_blocks(blocks: &[Block], out: &mut String) {
    let mut ix = 0;
    while ix < blocks.len() {
        let list_tag = match blocks[ix].kind {
            BlockKind::BulletedItem => Some("ul"),
            BlockKind::NumberedItem => Some("ol"),
            _ => None,
        };
        let Some(list_tag) = list_tag else {
            write_block(&blocks[ix], out);
            ix += 1;
            continue;
        };

        let kind = blocks[ix].kind.clone();
        out.push_str(&format!("<{list_tag}>"));
        while ix < blocks.len() && blocks[ix].kind == kind {
            let item = &blocks[ix];
            if item.indent > 0 {
                out.push_str(&format!("<li data-indent=\"{}\">", item.indent));
            } else {
                out.push_str("<li>");
            }
            write_inline(&item.content, out);
            out.push_str("</li>");
            ix += 1;
        }
        out.push_str(&format!("</{list_tag}>"));
    }
}

fn write_block(block: &Block, out: &mut String) {
    match &block.kind {
        BlockKind::Paragraph => {
            if block.padding > 0 {
                out.push_str(&format!("<p data-padding=\"{}\">", block.padding));
            } else {
                out.push_str("<p>");
            }
            write_inline(&block.content, out);
            out.push_str("</p>");
        }
        BlockKind::Heading { level } => {
            out.push_str(&format!("<h{level}>"));
            write_inline(&block.content, out);
            out.push_str(&format!("</h{level}>"));
        }
        BlockKind::Todo { checked } => {
            out.push_str(&format!(
                "<div data-block=\"todo\" data-checked=\"{checked}\" data-indent=\"{}\">",
                block.indent
            ));
            write_inline(&block.content, out);
            out.push_str("</div>");
        }
        BlockKind::Quote => {
            out.push_str("<blockquote>");
            write_inline(&block.content, out);
            out.push_str("</blockquote>");
        }
        BlockKind::Code => {
            out.push_str("<pre><code>");
            escape_into(&block.plain_text(), out);
            out.push_str("</code></pre>");
        }
        BlockKind::Divider => out.push_str("<hr>"),
        BlockKind::Callout => {
            out.push_str("<div data-block=\"callout\">");
            write_inline(&block.content, out);
            out.push_str("</div>");
        }
        BlockKind::Toggle { open } => {
            out.push_str(if *open {
                "<details data-block=\"toggle\" open>"
            } else {
                "<details data-block=\"toggle\">"
            });
            out.push_str("<summary>");
            write_inline(&block.content, out);
            out.push_str("</summary>");
            write_blocks(&block.children, out);
            out.push_str("</details>");
        }
        BlockKind::Image { src, alt } => {
            out.push_str(&format!("<img src=\"{}\" alt=\"{}\">", escape(src), escape(alt)));
        }
        BlockKind::BulletedItem | BlockKind::NumberedItem => {
            write_blocks(std::slice::from_ref(block), out);
        }
    }
}
