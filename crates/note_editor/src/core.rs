use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::inline::InlineRun;

/// Deepest indent a to-do or list item can reach.
pub const MAX_INDENT_LEVEL: u8 = 5;
pub const MAX_HEADING_LEVEL: u8 = 3;

/// Index path from the document root down to a block (toggle bodies nest).
pub type Path = Vec<usize>;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BlockId(pub u64);

impl BlockId {
    pub const UNASSIGNED: BlockId = BlockId(0);

    pub fn is_assigned(self) -> bool {
        self != Self::UNASSIGNED
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph,
    Heading {
        level: u8,
    },
    BulletedItem,
    NumberedItem,
    Todo {
        #[serde(default)]
        checked: bool,
    },
    Quote,
    Code,
    Divider,
    Callout,
    Toggle {
        #[serde(default)]
        open: bool,
    },
    Image {
        src: String,
        #[serde(default)]
        alt: String,
    },
}

impl BlockKind {
    pub fn heading(level: u8) -> Self {
        BlockKind::Heading {
            level: level.clamp(1, MAX_HEADING_LEVEL),
        }
    }

    pub fn todo() -> Self {
        BlockKind::Todo { checked: false }
    }

    pub fn toggle() -> Self {
        BlockKind::Toggle { open: true }
    }

    /// Void blocks carry no editable text; the caret never rests in them.
    pub fn is_void(&self) -> bool {
        matches!(self, BlockKind::Divider | BlockKind::Image { .. })
    }

    pub fn is_text_bearing(&self) -> bool {
        !self.is_void()
    }

    pub fn supports_indent(&self) -> bool {
        matches!(
            self,
            BlockKind::BulletedItem | BlockKind::NumberedItem | BlockKind::Todo { .. }
        )
    }

    pub fn is_toggle(&self) -> bool {
        matches!(self, BlockKind::Toggle { .. })
    }

    pub fn is_todo(&self) -> bool {
        matches!(self, BlockKind::Todo { .. })
    }

    pub fn is_code(&self) -> bool {
        matches!(self, BlockKind::Code)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BlockKind::Paragraph => "paragraph",
            BlockKind::Heading { level: 1 } => "heading1",
            BlockKind::Heading { level: 2 } => "heading2",
            BlockKind::Heading { .. } => "heading3",
            BlockKind::BulletedItem => "bulleted-item",
            BlockKind::NumberedItem => "numbered-item",
            BlockKind::Todo { .. } => "to-do",
            BlockKind::Quote => "quote",
            BlockKind::Code => "code",
            BlockKind::Divider => "divider",
            BlockKind::Callout => "callout",
            BlockKind::Toggle { .. } => "toggle",
            BlockKind::Image { .. } => "image",
        }
    }

    /// Hint shown by a host inside an empty block of this kind.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self {
            BlockKind::Paragraph => Some("Type '/' for commands"),
            BlockKind::Heading { level: 1 } => Some("Heading 1"),
            BlockKind::Heading { level: 2 } => Some("Heading 2"),
            BlockKind::Heading { .. } => Some("Heading 3"),
            BlockKind::BulletedItem | BlockKind::NumberedItem => Some("List"),
            BlockKind::Todo { .. } => Some("To-do"),
            BlockKind::Quote => Some("Empty quote"),
            BlockKind::Callout => Some("Type something…"),
            BlockKind::Toggle { .. } => Some("Toggle"),
            BlockKind::Code | BlockKind::Divider | BlockKind::Image { .. } => None,
        }
    }
}

fn is_zero(value: &u8) -> bool {
    *value == 0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub id: BlockId,
    #[serde(flatten)]
    pub kind: BlockKind,
    /// Structural indent of to-do and list items.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub indent: u8,
    /// Visual-only left padding.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub padding: u8,
    /// Inline content; the title for toggles.
    #[serde(default, skip_serializing_if = "InlineRun::is_empty")]
    pub content: InlineRun,
    /// Toggle body. Empty for every other kind.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Block>,
}

impl Block {
    pub fn new(kind: BlockKind, content: InlineRun) -> Self {
        Self {
            id: BlockId::UNASSIGNED,
            kind,
            indent: 0,
            padding: 0,
            content,
            children: Vec::new(),
        }
    }

    pub fn empty(kind: BlockKind) -> Self {
        Self::new(kind, InlineRun::new())
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(BlockKind::Paragraph, InlineRun::from_text(text))
    }

    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::new(BlockKind::heading(level), InlineRun::from_text(text))
    }

    pub fn todo(text: impl Into<String>, checked: bool) -> Self {
        Self::new(BlockKind::Todo { checked }, InlineRun::from_text(text))
    }

    pub fn divider() -> Self {
        Self::empty(BlockKind::Divider)
    }

    pub fn toggle(title: impl Into<String>, body: Vec<Block>) -> Self {
        let mut block = Self::new(BlockKind::toggle(), InlineRun::from_text(title));
        block.children = body;
        block
    }

    pub fn with_id(mut self, id: BlockId) -> Self {
        self.id = id;
        self
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    pub fn text_len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn plain_text(&self) -> String {
        self.content.plain_text()
    }

    pub fn has_empty_body(&self) -> bool {
        self.children.len() <= 1
            && self
                .children
                .iter()
                .all(|b| b.kind.is_text_bearing() && b.is_empty() && b.children.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(skip)]
    next_id: u64,
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.blocks == other.blocks
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self::from_blocks(vec![Block::paragraph("")])
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let mut doc = Self { blocks, next_id: 0 };
        doc.ensure_ids();
        doc
    }

    /// Allocates an id greater than any id currently in the tree.
    pub fn allocate_id(&mut self) -> BlockId {
        if self.next_id == 0 {
            self.next_id = self.max_id() + 1;
        }
        let id = BlockId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Gives `block` and its descendants fresh ids from this document.
    pub fn adopt(&mut self, mut block: Block) -> Block {
        fn walk(doc: &mut Document, block: &mut Block) {
            block.id = doc.allocate_id();
            for child in &mut block.children {
                walk(doc, child);
            }
        }
        walk(self, &mut block);
        block
    }

    /// Replaces unassigned and duplicate ids. Returns whether anything changed.
    pub fn ensure_ids(&mut self) -> bool {
        fn walk(blocks: &mut [Block], seen: &mut HashSet<BlockId>, next: &mut u64) -> bool {
            let mut changed = false;
            for block in blocks {
                if !block.id.is_assigned() || !seen.insert(block.id) {
                    block.id = BlockId(*next);
                    *next += 1;
                    seen.insert(block.id);
                    changed = true;
                }
                changed |= walk(&mut block.children, seen, next);
            }
            changed
        }

        let mut next = self.max_id().max(self.next_id.saturating_sub(1)) + 1;
        let changed = walk(&mut self.blocks, &mut HashSet::new(), &mut next);
        self.next_id = next;
        changed
    }

    fn max_id(&self) -> u64 {
        fn walk(blocks: &[Block]) -> u64 {
            blocks
                .iter()
                .map(|b| b.id.0.max(walk(&b.children)))
                .max()
                .unwrap_or(0)
        }
        walk(&self.blocks)
    }

    pub fn find_path(&self, id: BlockId) -> Option<Path> {
        fn walk(blocks: &[Block], id: BlockId, path: &mut Path) -> bool {
            for (ix, block) in blocks.iter().enumerate() {
                path.push(ix);
                if block.id == id || walk(&block.children, id, path) {
                    return true;
                }
                path.pop();
            }
            false
        }

        if !id.is_assigned() {
            return None;
        }
        let mut path = Vec::new();
        walk(&self.blocks, id, &mut path).then_some(path)
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.find_path(id).is_some()
    }

    pub fn block_at(&self, path: &[usize]) -> Option<&Block> {
        let (first, rest) = path.split_first()?;
        let mut block = self.blocks.get(*first)?;
        for &ix in rest {
            block = block.children.get(ix)?;
        }
        Some(block)
    }

    pub fn block_at_mut(&mut self, path: &[usize]) -> Option<&mut Block> {
        let (first, rest) = path.split_first()?;
        let mut block = self.blocks.get_mut(*first)?;
        for &ix in rest {
            block = block.children.get_mut(ix)?;
        }
        Some(block)
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        let path = self.find_path(id)?;
        self.block_at(&path)
    }

    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        let path = self.find_path(id)?;
        self.block_at_mut(&path)
    }

    /// The sibling list addressed by `parent` (the root list when empty).
    pub fn siblings_mut(&mut self, parent: &[usize]) -> Option<&mut Vec<Block>> {
        if parent.is_empty() {
            return Some(&mut self.blocks);
        }
        self.block_at_mut(parent).map(|b| &mut b.children)
    }

    pub fn siblings(&self, parent: &[usize]) -> Option<&[Block]> {
        if parent.is_empty() {
            return Some(&self.blocks);
        }
        self.block_at(parent).map(|b| b.children.as_slice())
    }

    pub fn parent_block(&self, id: BlockId) -> Option<&Block> {
        let path = self.find_path(id)?;
        let (_, parent) = path.split_last()?;
        if parent.is_empty() {
            return None;
        }
        self.block_at(parent)
    }

    /// Every block id in document order (toggle title before its body).
    pub fn block_ids(&self) -> Vec<BlockId> {
        fn walk(blocks: &[Block], out: &mut Vec<BlockId>) {
            for block in blocks {
                out.push(block.id);
                walk(&block.children, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.blocks, &mut out);
        out
    }

    /// Text-bearing blocks a caret can visit, skipping bodies of closed toggles.
    pub fn navigable_ids(&self) -> Vec<BlockId> {
        fn walk(blocks: &[Block], out: &mut Vec<BlockId>) {
            for block in blocks {
                if block.kind.is_text_bearing() {
                    out.push(block.id);
                }
                if !matches!(block.kind, BlockKind::Toggle { open: false }) {
                    walk(&block.children, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.blocks, &mut out);
        out
    }

    pub fn first_editable(&self) -> Option<BlockId> {
        self.editable_ids().first().copied()
    }

    pub fn editable_after(&self, id: BlockId) -> Option<BlockId> {
        self.neighbour_editable(id, true)
    }

    pub fn editable_before(&self, id: BlockId) -> Option<BlockId> {
        self.neighbour_editable(id, false)
    }

    fn editable_ids(&self) -> Vec<BlockId> {
        fn walk(blocks: &[Block], out: &mut Vec<BlockId>) {
            for block in blocks {
                if block.kind.is_text_bearing() {
                    out.push(block.id);
                }
                walk(&block.children, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.blocks, &mut out);
        out
    }

    fn neighbour_editable(&self, id: BlockId, forward: bool) -> Option<BlockId> {
        let order = self.block_ids();
        let ix = order.iter().position(|candidate| *candidate == id)?;
        let is_editable = |candidate: &&BlockId| {
            self.block(**candidate)
                .is_some_and(|b| b.kind.is_text_bearing())
        };
        if forward {
            order[ix + 1..].iter().find(is_editable).copied()
        } else {
            order[..ix].iter().rev().find(is_editable).copied()
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(
            self.blocks.as_slice(),
            [only] if only.kind == BlockKind::Paragraph && only.is_empty() && only.children.is_empty()
        )
    }

    /// Applies `f` to every block, depth first. Returns whether any call reported a change.
    pub fn visit_mut(&mut self, f: &mut impl FnMut(&mut Block) -> bool) -> bool {
        fn walk(blocks: &mut [Block], f: &mut impl FnMut(&mut Block) -> bool) -> bool {
            let mut changed = false;
            for block in blocks {
                changed |= f(block);
                changed |= walk(&mut block.children, f);
            }
            changed
        }
        walk(&mut self.blocks, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub block: BlockId,
    pub offset: usize,
}

impl Point {
    pub fn new(block: BlockId, offset: usize) -> Self {
        Self { block, offset }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub anchor: Point,
    pub focus: Point,
}

impl Selection {
    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn caret(&self) -> &Point {
        &self.focus
    }
}
