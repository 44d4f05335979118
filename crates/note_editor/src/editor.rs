use tracing::{debug, trace, warn};

use crate::config::EditorConfig;
use crate::core::{Block, BlockId, Document, Point, Selection};
use crate::edit;
use crate::keymap::{self, BlockRole, Key, KeyAction, KeyContext, KeyOutcome, KeyPress};
use crate::menu::{CommandCatalog, MenuCommit, MenuState};
use crate::normalize::Normalizer;
use crate::paste::{self, PasteData};
use crate::trigger::{self, DetectOptions, TriggerChar};

#[derive(Clone)]
struct Snapshot {
    doc: Document,
    selection: Selection,
}

/// Where a dismissed trigger sits; it stays closed while this still matches.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TriggerAnchor {
    block: BlockId,
    start: usize,
    trigger: TriggerChar,
}

type ChangeListener = Box<dyn FnMut(&Document)>;

/// An editor instance: the only owner of its document.
///
/// Every mutation goes through an input method (text, keys, paste, menu
/// selection, block toggles), is normalized, recorded for undo and reported
/// to the change listeners.
pub struct Editor {
    doc: Document,
    selection: Selection,
    config: EditorConfig,
    catalog: CommandCatalog,
    tags: Vec<String>,
    normalizer: Normalizer,
    menu: Option<MenuState>,
    dismissed: Option<TriggerAnchor>,
    composition: Option<String>,
    focused: bool,
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    listeners: Vec<ChangeListener>,
}

impl Editor {
    pub fn new(initial_content: &str, config: EditorConfig) -> Self {
        let doc = Document::from_initial_content(initial_content);
        let selection = Selection::collapsed(Point::new(BlockId::UNASSIGNED, 0));
        Self::from_document(doc, selection, config)
    }

    pub fn from_document(doc: Document, selection: Selection, config: EditorConfig) -> Self {
        let config = config.with_defaults();
        let mut editor = Self {
            doc,
            selection,
            tags: config.available_tags.clone(),
            config,
            catalog: CommandCatalog::standard(),
            normalizer: Normalizer::standard(),
            menu: None,
            dismissed: None,
            composition: None,
            focused: false,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            listeners: Vec::new(),
        };
        editor.normalize_in_place();
        editor
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn caret(&self) -> &Point {
        self.selection.caret()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn catalog(&self) -> &CommandCatalog {
        &self.catalog
    }

    pub fn set_catalog(&mut self, catalog: CommandCatalog) {
        self.catalog = catalog;
        self.menu = None;
        self.refresh_trigger();
    }

    pub fn menu(&self) -> Option<&MenuState> {
        self.menu.as_ref().filter(|menu| menu.is_visible())
    }

    pub fn on_change(&mut self, listener: impl FnMut(&Document) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn focus(&mut self) {
        self.focused = true;
    }

    pub fn blur(&mut self) {
        self.focused = false;
        self.menu = None;
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn placeholder(&self) -> Option<&str> {
        (self.doc.is_blank() && !self.config.placeholder.is_empty())
            .then_some(self.config.placeholder.as_str())
    }

    pub fn block_placeholder(&self, id: BlockId) -> Option<&'static str> {
        let block = self.doc.block(id)?;
        if block.is_empty() {
            block.kind.placeholder()
        } else {
            None
        }
    }

    pub fn is_composing(&self) -> bool {
        self.composition.is_some()
    }

    pub fn composition_text(&self) -> Option<&str> {
        self.composition.as_deref()
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = self.normalizer.normalize_selection(&self.doc, &selection);
        self.refresh_trigger();
    }

    pub fn insert_text(&mut self, text: &str) -> bool {
        if self.is_composing() || text.is_empty() {
            return false;
        }
        self.commit("input", |doc, selection| {
            let caret = collapse(doc, selection)?;
            edit::insert_text(doc, &caret, text).map(Selection::collapsed)
        })
    }

    pub fn handle_key(&mut self, press: KeyPress) -> KeyOutcome {
        if self.is_composing() {
            return KeyOutcome::Ignored;
        }
        if let Some(outcome) = self.handle_menu_key(press) {
            return outcome;
        }

        match press.key {
            Key::Escape => return KeyOutcome::Ignored,
            Key::Space => return self.insert_text(" ").into(),
            Key::ArrowLeft | Key::ArrowRight | Key::ArrowUp | Key::ArrowDown => {
                return self.move_caret(press).into();
            }
            Key::Enter | Key::Backspace | Key::Tab => {}
        }

        let Some(ctx) = KeyContext::at(&self.doc, &self.selection) else {
            return KeyOutcome::Ignored;
        };
        let action = keymap::resolve(&ctx, press);
        trace!(key = ?press.key, shift = press.shift, ?action, "key policy");
        self.execute(&ctx, press, action)
    }

    fn handle_menu_key(&mut self, press: KeyPress) -> Option<KeyOutcome> {
        let menu = self.menu.as_mut().filter(|menu| menu.is_visible())?;
        match press.key {
            Key::ArrowDown => menu.select_next(),
            Key::ArrowUp => menu.select_previous(),
            Key::Enter | Key::Tab => {
                let index = menu.highlighted;
                self.commit_menu(Some(index));
            }
            Key::Space
                if menu.context.trigger == TriggerChar::Hash && !menu.context.filter.is_empty() =>
            {
                self.commit_menu(None);
            }
            Key::Escape => self.dismiss_menu(),
            Key::Space | Key::Backspace | Key::ArrowLeft | Key::ArrowRight => return None,
        }
        Some(KeyOutcome::Handled)
    }

    fn execute(&mut self, ctx: &KeyContext, press: KeyPress, action: KeyAction) -> KeyOutcome {
        let handled = match action {
            KeyAction::Ignore => true,
            KeyAction::Default => match press.key {
                Key::Enter if ctx.role == BlockRole::ToggleTitle => true,
                Key::Enter => self.insert_text("\n"),
                Key::Backspace => self.commit("key:backspace", |doc, selection| {
                    let point = if selection.is_collapsed() {
                        edit::delete_backward(doc, selection.caret())?
                    } else {
                        edit::delete_selection(doc, selection)?
                    };
                    Some(Selection::collapsed(point))
                }),
                _ => false,
            },
            KeyAction::InsertBlockAfter { kind, indent } => {
                self.commit("key:enter", |doc, selection| {
                    let caret = collapse(doc, selection)?;
                    let id = edit::insert_block_after(doc, caret.block, Block::empty(kind).with_indent(indent));
                    Some(Selection::collapsed(Point::new(id, 0)))
                });
                true
            }
            KeyAction::InsertSoftBreak => self.insert_text("\n"),
            KeyAction::ConvertTodoToParagraph => self.commit("key:backspace", |doc, _| {
                edit::convert_todo_to_paragraph(doc, ctx.block).map(Selection::collapsed)
            }),
            KeyAction::ReplaceToggleWithParagraph => {
                let Some(toggle) = ctx.toggle else {
                    return KeyOutcome::Ignored;
                };
                self.commit("key:backspace", |doc, _| {
                    edit::replace_with_empty_paragraph(doc, toggle).map(Selection::collapsed)
                })
            }
            KeyAction::MoveCaretToToggleTitleEnd => {
                let Some(title) = ctx.toggle.and_then(|id| self.doc.block(id)) else {
                    return KeyOutcome::Ignored;
                };
                let point = Point::new(title.id, title.text_len());
                self.set_selection(Selection::collapsed(point));
                true
            }
            KeyAction::AdjustIndent(delta) => {
                let max = self.config.max_indent_level;
                self.commit("key:tab", |doc, selection| {
                    edit::adjust_indent(doc, ctx.block, delta, max).map(|()| selection.clone())
                });
                // Saturated indent still consumes the key.
                true
            }
            KeyAction::InsertText(text) => self.insert_text(text),
        };
        handled.into()
    }

    fn move_caret(&mut self, press: KeyPress) -> bool {
        let focus = self.selection.focus.clone();
        let moved = match press.key {
            Key::ArrowLeft => edit::move_left(&self.doc, &focus),
            Key::ArrowRight => edit::move_right(&self.doc, &focus),
            Key::ArrowUp => edit::move_up(&self.doc, &focus),
            Key::ArrowDown => edit::move_down(&self.doc, &focus),
            _ => None,
        };
        let Some(point) = moved else {
            return false;
        };
        let selection = if press.shift {
            Selection {
                anchor: self.selection.anchor.clone(),
                focus: point,
            }
        } else {
            Selection::collapsed(point)
        };
        self.set_selection(selection);
        true
    }

    pub fn paste(&mut self, data: &PasteData) -> bool {
        if self.is_composing() {
            return false;
        }
        let blocks = paste::prepare(data);
        if blocks.is_empty() {
            return false;
        }
        self.commit("paste", |doc, selection| {
            let caret = collapse(doc, selection)?;
            edit::insert_fragment(doc, &caret, blocks).map(Selection::collapsed)
        })
    }

    /// Commits the menu entry at `index` (a click on the menu).
    pub fn choose_menu_item(&mut self, index: usize) -> bool {
        self.commit_menu(Some(index))
    }

    pub fn dismiss_menu(&mut self) {
        if let Some(menu) = self.menu.take() {
            self.dismissed = Some(TriggerAnchor {
                block: menu.context.anchor,
                start: menu.context.range.start,
                trigger: menu.context.trigger,
            });
        }
    }

    fn commit_menu(&mut self, index: Option<usize>) -> bool {
        let Some(menu) = self.menu.take() else {
            return false;
        };
        let choice = match index {
            Some(index) => menu.resolve(index, &self.tags),
            None => menu.raw_tag(&self.tags),
        };
        let Some(choice) = choice else {
            debug!(?index, "menu selection did not resolve");
            self.menu = Some(menu);
            return false;
        };

        let ctx = menu.context;
        match choice {
            MenuCommit::Block(kind) => self.commit("menu:command", |doc, _| {
                edit::apply_slash_command(doc, &ctx, kind).map(Selection::collapsed)
            }),
            MenuCommit::Tag(name) => {
                let committed = self.commit("menu:tag", |doc, _| {
                    edit::apply_tag(doc, &ctx, &name).map(Selection::collapsed)
                });
                if committed && !self.tags.contains(&name) {
                    self.tags.push(name);
                }
                committed
            }
        }
    }

    pub fn composition_start(&mut self) {
        self.composition = Some(String::new());
    }

    pub fn composition_update(&mut self, text: &str) {
        if let Some(composition) = &mut self.composition {
            composition.clear();
            composition.push_str(text);
        }
    }

    /// Ends composition and applies the composed text as one input.
    pub fn composition_end(&mut self, text: &str) -> bool {
        if self.composition.take().is_none() {
            return false;
        }
        if text.is_empty() {
            self.refresh_trigger();
            return false;
        }
        self.insert_text(text)
    }

    pub fn toggle_checked(&mut self, id: BlockId) -> bool {
        self.commit("block:check", |doc, selection| {
            edit::toggle_checked(doc, id).map(|()| selection.clone())
        })
    }

    /// Opens or closes a toggle; closing moves a caret out of the hidden body.
    pub fn set_toggle_open(&mut self, id: BlockId, open: bool) -> bool {
        self.commit("block:toggle", |doc, selection| {
            edit::set_toggle_open(doc, id, open)?;
            if open || !is_inside(doc, selection.caret().block, id) {
                return Some(selection.clone());
            }
            let title = doc.block(id)?;
            Some(Selection::collapsed(Point::new(id, title.text_len())))
        })
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };
        self.redo_stack.push(self.snapshot());
        self.restore(snapshot);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        self.undo_stack.push(self.snapshot());
        self.restore(snapshot);
        true
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            doc: self.doc.clone(),
            selection: self.selection.clone(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.doc = snapshot.doc;
        self.selection = snapshot.selection;
        self.composition = None;
        self.dismissed = None;
        self.menu = None;
        self.refresh_trigger();
        self.emit_change();
    }

    /// Applies `apply` to the document and records it.
    ///
    /// `None` from `apply` leaves the document exactly as it was.
    fn commit(
        &mut self,
        source: &'static str,
        apply: impl FnOnce(&mut Document, &Selection) -> Option<Selection>,
    ) -> bool {
        let before = self.snapshot();
        let Some(selection) = apply(&mut self.doc, &self.selection) else {
            trace!(source, "edit did not apply");
            self.doc = before.doc;
            return false;
        };

        if let Err(err) = self.normalizer.normalize(&mut self.doc, &self.config) {
            warn!(source, %err, "document left partially normalized");
        }
        self.selection = self.normalizer.normalize_selection(&self.doc, &selection);

        if self.doc != before.doc {
            self.undo_stack.push(before);
            if self.undo_stack.len() > self.config.max_undo {
                let overflow = self.undo_stack.len() - self.config.max_undo;
                self.undo_stack.drain(..overflow);
            }
            self.redo_stack.clear();
            trace!(source, blocks = self.doc.blocks.len(), "committed edit");
            self.refresh_trigger();
            self.emit_change();
        } else {
            self.refresh_trigger();
        }
        true
    }

    fn normalize_in_place(&mut self) {
        if let Err(err) = self.normalizer.normalize(&mut self.doc, &self.config) {
            warn!(%err, "initial document left partially normalized");
        }
        self.selection = self
            .normalizer
            .normalize_selection(&self.doc, &self.selection);
    }

    fn refresh_trigger(&mut self) {
        if self.is_composing() {
            return;
        }
        let options = DetectOptions {
            tags_enabled: !self.tags.is_empty(),
            triggers_in_code: self.config.triggers_in_code,
        };
        let found = if self.selection.is_collapsed() {
            trigger::detect(&self.doc, self.selection.caret(), options)
        } else {
            None
        };
        let Some(ctx) = found else {
            self.menu = None;
            self.dismissed = None;
            return;
        };

        let anchor = TriggerAnchor {
            block: ctx.anchor,
            start: ctx.range.start,
            trigger: ctx.trigger,
        };
        if self.dismissed.as_ref() == Some(&anchor) {
            self.menu = None;
            return;
        }
        self.dismissed = None;

        let highlighted = match &self.menu {
            Some(menu) if menu.context == ctx => menu.highlighted,
            _ => 0,
        };
        self.menu = Some(MenuState::new(ctx, &self.catalog, &self.tags).with_highlighted(highlighted));
    }

    fn emit_change(&mut self) {
        for listener in self.listeners.iter_mut() {
            listener(&self.doc);
        }
    }
}

/// The caret after removing any selected range.
fn collapse(doc: &mut Document, selection: &Selection) -> Option<Point> {
    if selection.is_collapsed() {
        Some(selection.caret().clone())
    } else {
        edit::delete_selection(doc, selection)
    }
}

fn is_inside(doc: &Document, id: BlockId, ancestor: BlockId) -> bool {
    match (doc.find_path(id), doc.find_path(ancestor)) {
        (Some(path), Some(prefix)) => path.len() > prefix.len() && path.starts_with(&prefix),
        _ => false,
    }
}
