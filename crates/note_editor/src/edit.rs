//! Tree edits over a [`Document`].
//!
//! Each edit returns the caret it leaves behind, or `None` when it did not
//! apply. Callers run the normalizer afterwards.

use tracing::debug;

use crate::core::{Block, BlockId, BlockKind, Document, Point, Selection};
use crate::inline::{Inline, InlineRun};
use crate::trigger::TriggerContext;

pub fn ordered_points(doc: &Document, selection: &Selection) -> Option<(Point, Point)> {
    let order = doc.block_ids();
    let rank = |point: &Point| {
        order
            .iter()
            .position(|id| *id == point.block)
            .map(|ix| (ix, point.offset))
    };
    let anchor = rank(&selection.anchor)?;
    let focus = rank(&selection.focus)?;
    if anchor <= focus {
        Some((selection.anchor.clone(), selection.focus.clone()))
    } else {
        Some((selection.focus.clone(), selection.anchor.clone()))
    }
}

pub fn insert_text(doc: &mut Document, at: &Point, text: &str) -> Option<Point> {
    let block = doc.block_mut(at.block)?;
    if block.kind.is_void() {
        return None;
    }
    let offset = if block.kind.is_toggle() {
        block.content.insert_text(at.offset, &text.replace('\n', " "))
    } else {
        block.content.insert_text(at.offset, text)
    };
    Some(Point::new(block.id, offset))
}

/// Plain backspace: delete the unit before the caret or join with the block above.
pub fn delete_backward(doc: &mut Document, at: &Point) -> Option<Point> {
    let path = doc.find_path(at.block)?;
    let block = doc.block_at_mut(&path)?;
    let offset = block.content.clamp(at.offset);
    if offset > 0 {
        let prev = block.content.prev_boundary(offset);
        block.content.remove_range(prev..offset);
        return Some(Point::new(block.id, prev));
    }

    let (&ix, parent) = path.split_last()?;
    if ix == 0 {
        if parent.is_empty()
            && block.kind != BlockKind::Paragraph
            && block.kind.is_text_bearing()
            && block.children.is_empty()
        {
            block.kind = BlockKind::Paragraph;
            block.indent = 0;
            return Some(Point::new(block.id, 0));
        }
        return None;
    }
    if !block.children.is_empty() {
        return None;
    }

    let siblings = doc.siblings_mut(parent)?;
    if siblings[ix - 1].kind.is_void() {
        siblings.remove(ix - 1);
        return Some(Point::new(at.block, 0));
    }

    let removed = siblings.remove(ix);
    let prev = &mut siblings[ix - 1];
    let join = prev.text_len();
    let tail = if prev.kind.is_code() {
        InlineRun::from_text(removed.plain_text())
    } else {
        removed.content
    };
    prev.content.append(tail);
    Some(Point::new(prev.id, join))
}

pub fn delete_selection(doc: &mut Document, selection: &Selection) -> Option<Point> {
    let (start, end) = ordered_points(doc, selection)?;
    if start == end {
        return Some(start);
    }

    if covers_document(doc, &start, &end) {
        *doc = Document::from_blocks(vec![Block::paragraph("")]);
        let id = doc.blocks.first()?.id;
        return Some(Point::new(id, 0));
    }

    if start.block == end.block {
        let block = doc.block_mut(start.block)?;
        block.content.remove_range(start.offset..end.offset);
        return Some(Point::new(block.id, block.content.clamp(start.offset)));
    }

    let start_path = doc.find_path(start.block)?;
    let end_path = doc.find_path(end.block)?;
    let (&start_ix, start_parent) = start_path.split_last()?;
    let (&end_ix, end_parent) = end_path.split_last()?;

    if start_parent == end_parent {
        let siblings = doc.siblings_mut(start_parent)?;
        let tail = siblings[end_ix].content.split_off(end.offset);
        siblings.drain(start_ix + 1..=end_ix);
        let first = &mut siblings[start_ix];
        let _ = first.content.split_off(start.offset);
        let offset = first.content.len();
        first.content.append(tail);
        return Some(Point::new(first.id, offset));
    }

    // Endpoints in different sibling lists: trim both ends and drop every
    // block strictly between them that does not enclose either endpoint.
    let order = doc.block_ids();
    let first_ix = order.iter().position(|id| *id == start.block)?;
    let last_ix = order.iter().position(|id| *id == end.block)?;
    let enclosing: Vec<BlockId> = ancestors(doc, start.block)
        .into_iter()
        .chain(ancestors(doc, end.block))
        .collect();
    for id in &order[first_ix + 1..last_ix] {
        if !enclosing.contains(id) {
            remove_block(doc, *id);
        }
    }

    if let Some(block) = doc.block_mut(end.block) {
        block.content.remove_range(0..end.offset);
    }
    let block = doc.block_mut(start.block)?;
    let _ = block.content.split_off(start.offset);
    Some(Point::new(block.id, block.content.len()))
}

fn covers_document(doc: &Document, start: &Point, end: &Point) -> bool {
    let ids = doc.block_ids();
    let (Some(first), Some(last)) = (ids.first(), ids.last()) else {
        return false;
    };
    let last_len = doc.block(*last).map(Block::text_len).unwrap_or(0);
    start.block == *first && start.offset == 0 && end.block == *last && end.offset >= last_len
}

fn ancestors(doc: &Document, id: BlockId) -> Vec<BlockId> {
    let Some(path) = doc.find_path(id) else {
        return Vec::new();
    };
    (1..path.len())
        .filter_map(|len| doc.block_at(&path[..len]).map(|b| b.id))
        .collect()
}

pub fn remove_block(doc: &mut Document, id: BlockId) -> Option<Block> {
    let path = doc.find_path(id)?;
    let (&ix, parent) = path.split_last()?;
    let siblings = doc.siblings_mut(parent)?;
    Some(siblings.remove(ix))
}

/// Inserts `block` (with fresh ids) right after `after`, or at the end of the
/// document when `after` is gone.
pub fn insert_block_after(doc: &mut Document, after: BlockId, block: Block) -> BlockId {
    let block = doc.adopt(block);
    let id = block.id;
    if let Some(path) = doc.find_path(after) {
        if let Some((&ix, parent)) = path.split_last() {
            if let Some(siblings) = doc.siblings_mut(parent) {
                siblings.insert(ix + 1, block);
                return id;
            }
        }
    }
    doc.blocks.push(block);
    id
}

/// Backspace in an empty to-do: it becomes a paragraph keeping its indent as padding.
pub fn convert_todo_to_paragraph(doc: &mut Document, id: BlockId) -> Option<Point> {
    let block = doc.block_mut(id)?;
    if !block.kind.is_todo() {
        return None;
    }
    block.padding = block.indent;
    block.indent = 0;
    block.kind = BlockKind::Paragraph;
    Some(Point::new(id, 0))
}

pub fn replace_with_empty_paragraph(doc: &mut Document, id: BlockId) -> Option<Point> {
    let path = doc.find_path(id)?;
    let (&ix, parent) = path.split_last()?;
    let replacement = doc.adopt(Block::paragraph(""));
    let new_id = replacement.id;
    let siblings = doc.siblings_mut(parent)?;
    siblings[ix] = replacement;
    Some(Point::new(new_id, 0))
}

/// Shifts the indent by `delta`, saturating at `0..=max`. `None` when nothing moved.
pub fn adjust_indent(doc: &mut Document, id: BlockId, delta: i8, max: u8) -> Option<()> {
    let block = doc.block_mut(id)?;
    if !block.kind.supports_indent() {
        return None;
    }
    let next = (i16::from(block.indent) + i16::from(delta)).clamp(0, i16::from(max));
    let next = u8::try_from(next).ok()?;
    if next == block.indent {
        return None;
    }
    block.indent = next;
    Some(())
}

/// Removes the trigger text and turns its block (or a new block after it)
/// into `kind`.
pub fn apply_slash_command(doc: &mut Document, ctx: &TriggerContext, kind: BlockKind) -> Option<Point> {
    if !ctx.is_attached(doc) {
        debug!(block = %ctx.anchor, "slash trigger detached; skipping commit");
        return None;
    }

    let block = doc.block_mut(ctx.anchor)?;
    block.content.remove_range(ctx.range.clone());
    let tail = block.content.split_off(ctx.range.start);

    if block.content.is_empty() {
        let was_indentable = block.kind.supports_indent();
        block.kind = kind.clone();
        if kind.supports_indent() {
            if !was_indentable {
                block.indent = block.padding;
            }
            block.padding = 0;
        } else {
            block.indent = 0;
        }
        if kind.is_toggle() && block.children.is_empty() {
            block.children.push(Block::paragraph(""));
        }

        let id = block.id;
        if kind.is_void() {
            return Some(Point::new(insert_block_after(doc, id, Block::new(BlockKind::Paragraph, tail)), 0));
        }
        block.content = tail;
        return Some(Point::new(id, 0));
    }

    let anchor = block.id;
    if kind.is_void() {
        let divider = insert_block_after(doc, anchor, Block::empty(kind));
        let after = insert_block_after(doc, divider, Block::new(BlockKind::Paragraph, tail));
        return Some(Point::new(after, 0));
    }

    let mut created = Block::new(kind, tail);
    if created.kind.is_toggle() {
        created.children.push(Block::paragraph(""));
    }
    Some(Point::new(insert_block_after(doc, anchor, created), 0))
}

/// Replaces the trigger text with an atomic tag followed by one space.
pub fn apply_tag(doc: &mut Document, ctx: &TriggerContext, name: &str) -> Option<Point> {
    if !ctx.is_attached(doc) {
        debug!(block = %ctx.anchor, "tag trigger detached; skipping commit");
        return None;
    }
    let block = doc.block_mut(ctx.anchor)?;
    block.content.remove_range(ctx.range.clone());
    let after_tag = block.content.insert_inline(ctx.range.start, Inline::tag(name));
    let offset = block.content.insert_text(after_tag, " ");
    Some(Point::new(block.id, offset))
}

/// Inserts pasted blocks at `at`; the caret lands after the inserted content.
pub fn insert_fragment(doc: &mut Document, at: &Point, blocks: Vec<Block>) -> Option<Point> {
    if blocks.is_empty() {
        return None;
    }
    let target = doc.block(at.block)?;
    if target.kind.is_void() {
        return None;
    }
    if target.kind.is_code() {
        return insert_text(doc, at, &fragment_text(&blocks, "\n"));
    }
    if target.kind.is_toggle() {
        return insert_text(doc, at, &fragment_text(&blocks, " "));
    }

    let block = doc.block_mut(at.block)?;
    let tail = block.content.split_off(at.offset);
    let target_is_empty_paragraph =
        block.kind == BlockKind::Paragraph && block.content.is_empty() && block.children.is_empty();

    let mut incoming = blocks.into_iter();
    let mut last = at.block;
    if let Some(first) = incoming.next() {
        if first.kind == BlockKind::Paragraph && first.children.is_empty() {
            block.content.append(first.content);
        } else if target_is_empty_paragraph {
            let path = doc.find_path(at.block)?;
            let (&ix, parent) = path.split_last()?;
            let first = doc.adopt(first);
            last = first.id;
            doc.siblings_mut(parent)?[ix] = first;
        } else {
            last = insert_block_after(doc, last, first);
        }
    }
    for block in incoming {
        last = insert_block_after(doc, last, block);
    }

    let last_block = doc.block_mut(last)?;
    if last_block.kind.is_void() {
        let after = insert_block_after(doc, last, Block::new(BlockKind::Paragraph, tail));
        return Some(Point::new(after, 0));
    }
    let offset = last_block.content.len();
    last_block.content.append(tail);
    Some(Point::new(last, offset))
}

fn fragment_text(blocks: &[Block], separator: &str) -> String {
    fn walk(blocks: &[Block], out: &mut Vec<String>) {
        for block in blocks {
            if block.kind.is_text_bearing() {
                out.push(block.plain_text());
            }
            walk(&block.children, out);
        }
    }
    let mut lines = Vec::new();
    walk(blocks, &mut lines);
    lines.join(separator)
}

pub fn move_left(doc: &Document, at: &Point) -> Option<Point> {
    let block = doc.block(at.block)?;
    let offset = block.content.clamp(at.offset);
    if offset > 0 {
        return Some(Point::new(block.id, block.content.prev_boundary(offset)));
    }
    let prev = neighbour(doc, at.block, false)?;
    Some(Point::new(prev.id, prev.text_len()))
}

pub fn move_right(doc: &Document, at: &Point) -> Option<Point> {
    let block = doc.block(at.block)?;
    let offset = block.content.clamp(at.offset);
    if offset < block.text_len() {
        return Some(Point::new(block.id, block.content.next_boundary(offset)));
    }
    let next = neighbour(doc, at.block, true)?;
    Some(Point::new(next.id, 0))
}

pub fn move_up(doc: &Document, at: &Point) -> Option<Point> {
    let prev = neighbour(doc, at.block, false)?;
    Some(Point::new(prev.id, prev.content.clamp(at.offset)))
}

pub fn move_down(doc: &Document, at: &Point) -> Option<Point> {
    let next = neighbour(doc, at.block, true)?;
    Some(Point::new(next.id, next.content.clamp(at.offset)))
}

fn neighbour(doc: &Document, id: BlockId, forward: bool) -> Option<&Block> {
    let order = doc.navigable_ids();
    let ix = order.iter().position(|candidate| *candidate == id)?;
    let target = if forward {
        order.get(ix + 1)?
    } else {
        order.get(ix.checked_sub(1)?)?
    };
    doc.block(*target)
}

pub fn toggle_checked(doc: &mut Document, id: BlockId) -> Option<()> {
    match &mut doc.block_mut(id)?.kind {
        BlockKind::Todo { checked } => {
            *checked = !*checked;
            Some(())
        }
        _ => None,
    }
}

pub fn set_toggle_open(doc: &mut Document, id: BlockId, open: bool) -> Option<()> {
    match &mut doc.block_mut(id)?.kind {
        BlockKind::Toggle { open: current } if *current != open => {
            *current = open;
            Some(())
        }
        _ => None,
    }
}
