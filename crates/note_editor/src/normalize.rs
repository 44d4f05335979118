use tracing::warn;

use crate::config::EditorConfig;
use crate::core::{Block, BlockKind, Document, MAX_HEADING_LEVEL, Point, Selection};
use crate::error::EditorError;

/// One structural repair applied to a document until nothing changes.
pub trait NormalizePass: Send + Sync {
    fn id(&self) -> &'static str;
    /// Repairs `doc` in place and reports whether anything changed.
    fn run(&self, doc: &mut Document, config: &EditorConfig) -> bool;
}

pub struct Normalizer {
    passes: Vec<Box<dyn NormalizePass>>,
}

impl Normalizer {
    pub fn standard() -> Self {
        Self {
            passes: vec![
                Box::new(EnsureNonEmptyDocument),
                Box::new(HoistNonToggleChildren),
                Box::new(NormalizeToggleStructure),
                Box::new(NormalizeBlockAttrs),
                Box::new(NormalizeInlineRuns),
                Box::new(AssignBlockIds),
            ],
        }
    }

    pub fn passes(&self) -> &[Box<dyn NormalizePass>] {
        &self.passes
    }

    pub fn with_pass(mut self, pass: Box<dyn NormalizePass>) -> Self {
        self.passes.push(pass);
        self
    }

    /// Runs every pass until a full round changes nothing.
    ///
    /// Returns the number of rounds that changed the document.
    pub fn normalize(&self, doc: &mut Document, config: &EditorConfig) -> Result<usize, EditorError> {
        let max_iterations = config.max_normalize_iterations.max(1);
        for round in 0..max_iterations {
            let mut changed = false;
            for pass in &self.passes {
                changed |= pass.run(doc, config);
            }
            if !changed {
                return Ok(round);
            }
        }
        warn!(max_iterations, "document normalization did not converge");
        Err(EditorError::NormalizeDidNotConverge(max_iterations))
    }

    /// Moves both ends of `selection` onto existing text-bearing blocks.
    pub fn normalize_selection(&self, doc: &Document, selection: &Selection) -> Selection {
        let fallback = doc
            .first_editable()
            .or_else(|| doc.blocks.first().map(|b| b.id))
            .map(|id| Point::new(id, 0))
            .unwrap_or_else(|| selection.focus.clone());

        let anchor = normalize_point(doc, &selection.anchor)
            .or_else(|| normalize_point(doc, &selection.focus))
            .unwrap_or_else(|| fallback.clone());
        let focus = normalize_point(doc, &selection.focus).unwrap_or_else(|| anchor.clone());

        Selection { anchor, focus }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::standard()
    }
}

fn normalize_point(doc: &Document, point: &Point) -> Option<Point> {
    let block = doc.block(point.block)?;
    if block.kind.is_text_bearing() {
        return Some(Point::new(block.id, block.content.clamp(point.offset)));
    }
    if let Some(next) = doc.editable_after(block.id) {
        return Some(Point::new(next, 0));
    }
    let prev = doc.editable_before(block.id)?;
    let len = doc.block(prev).map(Block::text_len).unwrap_or(0);
    Some(Point::new(prev, len))
}

struct EnsureNonEmptyDocument;

impl NormalizePass for EnsureNonEmptyDocument {
    fn id(&self) -> &'static str {
        "core.ensure_non_empty_document"
    }

    fn run(&self, doc: &mut Document, _config: &EditorConfig) -> bool {
        if doc.first_editable().is_some() {
            return false;
        }
        doc.blocks.push(Block::paragraph(""));
        true
    }
}

struct HoistNonToggleChildren;

impl NormalizePass for HoistNonToggleChildren {
    fn id(&self) -> &'static str {
        "core.hoist_non_toggle_children"
    }

    fn run(&self, doc: &mut Document, _config: &EditorConfig) -> bool {
        fn walk(blocks: &mut Vec<Block>) -> bool {
            let mut changed = false;
            let mut ix = 0;
            while ix < blocks.len() {
                if !blocks[ix].kind.is_toggle() && !blocks[ix].children.is_empty() {
                    let hoisted = std::mem::take(&mut blocks[ix].children);
                    let at = ix + 1;
                    blocks.splice(at..at, hoisted);
                    changed = true;
                }
                changed |= walk(&mut blocks[ix].children);
                ix += 1;
            }
            changed
        }
        walk(&mut doc.blocks)
    }
}

struct NormalizeToggleStructure;

impl NormalizePass for NormalizeToggleStructure {
    fn id(&self) -> &'static str {
        "toggle.normalize_structure"
    }

    fn run(&self, doc: &mut Document, _config: &EditorConfig) -> bool {
        doc.visit_mut(&mut |block| {
            if block.kind.is_toggle() && block.children.is_empty() {
                block.children.push(Block::paragraph(""));
                return true;
            }
            false
        })
    }
}

struct NormalizeBlockAttrs;

impl NormalizePass for NormalizeBlockAttrs {
    fn id(&self) -> &'static str {
        "core.normalize_block_attrs"
    }

    fn run(&self, doc: &mut Document, config: &EditorConfig) -> bool {
        let max_indent = config.max_indent_level;
        doc.visit_mut(&mut |block| {
            let mut changed = false;

            if let BlockKind::Heading { level } = &mut block.kind {
                let clamped = (*level).clamp(1, MAX_HEADING_LEVEL);
                if clamped != *level {
                    *level = clamped;
                    changed = true;
                }
            }

            let indent = if block.kind.supports_indent() {
                block.indent.min(max_indent)
            } else {
                0
            };
            if indent != block.indent {
                block.indent = indent;
                changed = true;
            }
            if block.padding > max_indent {
                block.padding = max_indent;
                changed = true;
            }

            if block.kind.is_void() && !block.content.spans.is_empty() {
                block.content.spans.clear();
                changed = true;
            }
            if block.kind.is_code() {
                changed |= block.content.flatten_to_text();
            }

            changed
        })
    }
}

struct NormalizeInlineRuns;

impl NormalizePass for NormalizeInlineRuns {
    fn id(&self) -> &'static str {
        "core.normalize_inline_runs"
    }

    fn run(&self, doc: &mut Document, _config: &EditorConfig) -> bool {
        doc.visit_mut(&mut |block| block.content.normalize())
    }
}

struct AssignBlockIds;

impl NormalizePass for AssignBlockIds {
    fn id(&self) -> &'static str {
        "core.assign_block_ids"
    }

    fn run(&self, doc: &mut Document, _config: &EditorConfig) -> bool {
        doc.ensure_ids()
    }
}
