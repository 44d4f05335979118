//! Per-block keyboard policy for Enter, Backspace and Tab.

use crate::core::{BlockId, BlockKind, Document, Selection};

/// Four non-breaking spaces, the visual tab.
pub const SOFT_TAB: &str = "\u{a0}\u{a0}\u{a0}\u{a0}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Enter,
    Backspace,
    Tab,
    Escape,
    Space,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyPress {
    pub key: Key,
    pub shift: bool,
}

impl KeyPress {
    pub fn new(key: Key) -> Self {
        Self { key, shift: false }
    }

    pub fn shift(key: Key) -> Self {
        Self { key, shift: true }
    }
}

impl From<Key> for KeyPress {
    fn from(key: Key) -> Self {
        KeyPress::new(key)
    }
}

/// Whether the editor consumed a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Handled,
    Ignored,
}

impl From<bool> for KeyOutcome {
    fn from(handled: bool) -> Self {
        if handled {
            KeyOutcome::Handled
        } else {
            KeyOutcome::Ignored
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretClass {
    StartOfEmpty,
    StartOfNonEmpty,
    Middle,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRole {
    Standalone,
    ToggleTitle,
    ToggleBody,
}

/// Everything the policy looks at, captured from the document at the caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyContext {
    pub block: BlockId,
    pub kind: BlockKind,
    pub role: BlockRole,
    pub caret: CaretClass,
    pub indent: u8,
    pub collapsed: bool,
    /// The enclosing toggle for titles and bodies.
    pub toggle: Option<BlockId>,
    pub toggle_title_empty: bool,
    pub toggle_body_empty: bool,
}

impl KeyContext {
    pub fn at(doc: &Document, selection: &Selection) -> Option<Self> {
        let caret = selection.caret();
        let block = doc.block(caret.block)?;

        let (role, toggle) = if block.kind.is_toggle() {
            (BlockRole::ToggleTitle, Some(block))
        } else {
            match doc.parent_block(block.id) {
                Some(parent) if parent.kind.is_toggle() => (BlockRole::ToggleBody, Some(parent)),
                _ => (BlockRole::Standalone, None),
            }
        };

        let offset = block.content.clamp(caret.offset);
        let caret_class = if block.is_empty() {
            CaretClass::StartOfEmpty
        } else if offset == 0 {
            CaretClass::StartOfNonEmpty
        } else if offset >= block.text_len() {
            CaretClass::End
        } else {
            CaretClass::Middle
        };

        Some(Self {
            block: block.id,
            kind: block.kind.clone(),
            role,
            caret: caret_class,
            indent: block.indent,
            collapsed: selection.is_collapsed(),
            toggle: toggle.map(|t| t.id),
            toggle_title_empty: toggle.is_some_and(|t| t.is_empty()),
            toggle_body_empty: toggle.is_some_and(|t| t.has_empty_body()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    /// Plain text editing behavior for the key.
    Default,
    /// Swallow the key without touching the document.
    Ignore,
    InsertBlockAfter { kind: BlockKind, indent: u8 },
    InsertSoftBreak,
    ConvertTodoToParagraph,
    ReplaceToggleWithParagraph,
    MoveCaretToToggleTitleEnd,
    AdjustIndent(i8),
    InsertText(&'static str),
}

pub fn resolve(ctx: &KeyContext, press: KeyPress) -> KeyAction {
    match press.key {
        Key::Enter => resolve_enter(ctx, press.shift),
        Key::Backspace => resolve_backspace(ctx),
        Key::Tab => resolve_tab(ctx, press.shift),
        Key::Escape
        | Key::Space
        | Key::ArrowUp
        | Key::ArrowDown
        | Key::ArrowLeft
        | Key::ArrowRight => KeyAction::Default,
    }
}

fn resolve_enter(ctx: &KeyContext, shift: bool) -> KeyAction {
    if shift {
        return KeyAction::Default;
    }
    match ctx.role {
        BlockRole::ToggleTitle => return KeyAction::Ignore,
        BlockRole::ToggleBody => return KeyAction::InsertSoftBreak,
        BlockRole::Standalone => {}
    }
    match &ctx.kind {
        BlockKind::Todo { .. } => KeyAction::InsertBlockAfter {
            kind: BlockKind::todo(),
            indent: ctx.indent,
        },
        BlockKind::Paragraph
        | BlockKind::Heading { .. }
        | BlockKind::BulletedItem
        | BlockKind::NumberedItem
        | BlockKind::Quote
        | BlockKind::Code
        | BlockKind::Divider
        | BlockKind::Callout
        | BlockKind::Toggle { .. }
        | BlockKind::Image { .. } => KeyAction::InsertBlockAfter {
            kind: BlockKind::Paragraph,
            indent: 0,
        },
    }
}

fn resolve_backspace(ctx: &KeyContext) -> KeyAction {
    if !ctx.collapsed || ctx.caret != CaretClass::StartOfEmpty {
        return KeyAction::Default;
    }
    match ctx.role {
        BlockRole::ToggleBody if ctx.toggle_body_empty => {
            return KeyAction::MoveCaretToToggleTitleEnd;
        }
        BlockRole::ToggleTitle if ctx.toggle_body_empty => {
            return KeyAction::ReplaceToggleWithParagraph;
        }
        // A non-empty body keeps the toggle; the key falls through.
        BlockRole::ToggleTitle => return KeyAction::Default,
        BlockRole::ToggleBody | BlockRole::Standalone => {}
    }
    match &ctx.kind {
        BlockKind::Todo { .. } => KeyAction::ConvertTodoToParagraph,
        BlockKind::Paragraph
        | BlockKind::Heading { .. }
        | BlockKind::BulletedItem
        | BlockKind::NumberedItem
        | BlockKind::Quote
        | BlockKind::Code
        | BlockKind::Divider
        | BlockKind::Callout
        | BlockKind::Toggle { .. }
        | BlockKind::Image { .. } => KeyAction::Default,
    }
}

fn resolve_tab(ctx: &KeyContext, shift: bool) -> KeyAction {
    match &ctx.kind {
        BlockKind::Todo { .. } => KeyAction::AdjustIndent(if shift { -1 } else { 1 }),
        BlockKind::Paragraph
        | BlockKind::Heading { .. }
        | BlockKind::BulletedItem
        | BlockKind::NumberedItem
        | BlockKind::Quote
        | BlockKind::Code
        | BlockKind::Divider
        | BlockKind::Callout
        | BlockKind::Toggle { .. }
        | BlockKind::Image { .. } => KeyAction::InsertText(SOFT_TAB),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(kind: BlockKind, role: BlockRole, caret: CaretClass) -> KeyContext {
        KeyContext {
            block: BlockId(1),
            kind,
            role,
            caret,
            indent: 2,
            collapsed: true,
            toggle: None,
            toggle_title_empty: true,
            toggle_body_empty: false,
        }
    }

    #[test]
    fn enter_in_todo_inherits_indent() {
        let todo = ctx(BlockKind::todo(), BlockRole::Standalone, CaretClass::Middle);
        assert_eq!(
            resolve(&todo, Key::Enter.into()),
            KeyAction::InsertBlockAfter {
                kind: BlockKind::todo(),
                indent: 2
            }
        );
        assert_eq!(resolve(&todo, KeyPress::shift(Key::Enter)), KeyAction::Default);
    }

    #[test]
    fn toggle_title_with_body_falls_through() {
        let title = ctx(BlockKind::toggle(), BlockRole::ToggleTitle, CaretClass::StartOfEmpty);
        assert_eq!(resolve(&title, Key::Backspace.into()), KeyAction::Default);
        assert_eq!(resolve(&title, Key::Enter.into()), KeyAction::Ignore);
    }

    #[test]
    fn backspace_mid_block_is_default() {
        let todo = ctx(BlockKind::todo(), BlockRole::Standalone, CaretClass::End);
        assert_eq!(resolve(&todo, Key::Backspace.into()), KeyAction::Default);
    }

    #[test]
    fn tab_outside_todo_inserts_soft_tab() {
        let para = ctx(BlockKind::Paragraph, BlockRole::Standalone, CaretClass::End);
        assert_eq!(resolve(&para, Key::Tab.into()), KeyAction::InsertText(SOFT_TAB));
        assert_eq!(resolve(&para, KeyPress::shift(Key::Tab)), KeyAction::InsertText(SOFT_TAB));
    }
}
