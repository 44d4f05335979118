use manos_note_editor::keymap::SOFT_TAB;
use manos_note_editor::{
    Block, BlockKind, Document, Editor, EditorConfig, Key, KeyOutcome, KeyPress, Point, Selection,
};

fn editor_at(blocks: Vec<Block>, pick: impl Fn(&Document) -> Point) -> Editor {
    let doc = Document::from_blocks(blocks);
    let caret = pick(&doc);
    Editor::from_document(doc, Selection::collapsed(caret), EditorConfig::default())
}

fn end_of_first(doc: &Document) -> Point {
    Point::new(doc.blocks[0].id, doc.blocks[0].text_len())
}

fn kinds(editor: &Editor) -> Vec<BlockKind> {
    editor.doc().blocks.iter().map(|b| b.kind.clone()).collect()
}

#[test]
fn enter_on_todo_continues_the_list() {
    let mut editor = editor_at(vec![Block::todo("buy milk", true).with_indent(2)], end_of_first);

    assert_eq!(editor.handle_key(KeyPress::new(Key::Enter)), KeyOutcome::Handled);
    editor.insert_text("eggs");
    editor.handle_key(KeyPress::new(Key::Enter));

    let blocks = &editor.doc().blocks;
    assert_eq!(blocks.len(), 3);
    assert_eq!(blocks[1].kind, BlockKind::Todo { checked: false });
    assert_eq!(blocks[1].plain_text(), "eggs");
    assert!(blocks.iter().all(|b| b.indent == 2));
    assert_eq!(editor.caret(), &Point::new(blocks[2].id, 0));
}

#[test]
fn enter_elsewhere_starts_a_paragraph() {
    let mut editor = editor_at(
        vec![Block::heading(1, "Title"), Block::paragraph("hello")],
        |doc| Point::new(doc.blocks[1].id, 2),
    );
    editor.handle_key(KeyPress::new(Key::Enter));
    assert_eq!(
        kinds(&editor),
        vec![BlockKind::heading(1), BlockKind::Paragraph, BlockKind::Paragraph]
    );
    assert_eq!(editor.doc().blocks[1].plain_text(), "hello");
    assert_eq!(editor.caret(), &Point::new(editor.doc().blocks[2].id, 0));

    let first = editor.doc().blocks[0].id;
    editor.set_selection(Selection::collapsed(Point::new(first, 5)));
    editor.handle_key(KeyPress::new(Key::Enter));
    assert_eq!(editor.doc().blocks[1].kind, BlockKind::Paragraph);
    assert!(editor.doc().blocks[1].is_empty());
}

#[test]
fn enter_in_toggle_title_is_swallowed() {
    let mut editor = editor_at(
        vec![Block::toggle("Title", vec![Block::paragraph("body")])],
        end_of_first,
    );
    let before = editor.doc().clone();

    assert_eq!(editor.handle_key(KeyPress::new(Key::Enter)), KeyOutcome::Handled);
    assert_eq!(editor.handle_key(KeyPress::shift(Key::Enter)), KeyOutcome::Handled);
    assert_eq!(editor.doc(), &before);
}

#[test]
fn enter_in_toggle_body_is_a_soft_break() {
    let mut editor = editor_at(
        vec![Block::toggle("Title", vec![Block::paragraph("body")])],
        |doc| Point::new(doc.blocks[0].children[0].id, 4),
    );
    editor.handle_key(KeyPress::new(Key::Enter));

    let toggle = &editor.doc().blocks[0];
    assert_eq!(editor.doc().blocks.len(), 1);
    assert_eq!(toggle.children.len(), 1);
    assert_eq!(toggle.children[0].plain_text(), "body\n");
    assert_eq!(editor.caret().offset, 5);
}

#[test]
fn shift_enter_is_a_soft_break() {
    let mut editor = editor_at(vec![Block::todo("a", false)], end_of_first);
    editor.handle_key(KeyPress::shift(Key::Enter));
    editor.insert_text("b");
    assert_eq!(editor.doc().blocks.len(), 1);
    assert_eq!(editor.doc().blocks[0].plain_text(), "a\nb");
}

#[test]
fn backspace_in_empty_todo_turns_it_into_a_padded_paragraph() {
    let mut editor = editor_at(
        vec![Block::paragraph("a"), Block::todo("", false).with_indent(2)],
        |doc| Point::new(doc.blocks[1].id, 0),
    );
    let todo = editor.doc().blocks[1].id;

    editor.handle_key(KeyPress::new(Key::Backspace));

    let block = &editor.doc().blocks[1];
    assert_eq!(block.id, todo);
    assert_eq!(block.kind, BlockKind::Paragraph);
    assert_eq!(block.padding, 2);
    assert_eq!(block.indent, 0);
    assert_eq!(editor.caret(), &Point::new(todo, 0));
}

#[test]
fn backspace_in_non_empty_todo_edits_text() {
    let mut editor = editor_at(vec![Block::todo("ab", false)], end_of_first);
    editor.handle_key(KeyPress::new(Key::Backspace));
    assert_eq!(editor.doc().blocks[0].kind, BlockKind::Todo { checked: false });
    assert_eq!(editor.doc().blocks[0].plain_text(), "a");
}

#[test]
fn backspace_in_empty_toggle_body_moves_to_title() {
    let mut editor = editor_at(
        vec![Block::toggle("Title", vec![Block::paragraph("")])],
        |doc| Point::new(doc.blocks[0].children[0].id, 0),
    );
    let before = editor.doc().clone();

    editor.handle_key(KeyPress::new(Key::Backspace));

    assert_eq!(editor.doc(), &before);
    assert_eq!(editor.caret(), &Point::new(before.blocks[0].id, 5));
}

#[test]
fn backspace_in_empty_toggle_replaces_it() {
    let mut editor = editor_at(
        vec![
            Block::paragraph("above"),
            Block::toggle("", vec![Block::paragraph("")]),
        ],
        |doc| Point::new(doc.blocks[1].id, 0),
    );
    let toggle = editor.doc().blocks[1].id;

    editor.handle_key(KeyPress::new(Key::Backspace));

    let blocks = &editor.doc().blocks;
    assert_eq!(kinds(&editor), vec![BlockKind::Paragraph, BlockKind::Paragraph]);
    assert!(blocks[1].is_empty());
    assert!(blocks[1].children.is_empty());
    assert_ne!(blocks[1].id, toggle);
    assert_eq!(editor.caret(), &Point::new(blocks[1].id, 0));
}

#[test]
fn backspace_in_empty_title_with_content_keeps_the_toggle() {
    let mut editor = editor_at(
        vec![Block::toggle("", vec![Block::paragraph("kept")])],
        |doc| Point::new(doc.blocks[0].id, 0),
    );
    let before = editor.doc().clone();

    editor.handle_key(KeyPress::new(Key::Backspace));

    assert_eq!(editor.doc(), &before);
}

#[test]
fn tab_indents_todos_within_bounds() {
    let mut editor = editor_at(vec![Block::todo("task", false)], end_of_first);

    for _ in 0..7 {
        assert_eq!(editor.handle_key(KeyPress::new(Key::Tab)), KeyOutcome::Handled);
    }
    assert_eq!(editor.doc().blocks[0].indent, 5);

    for _ in 0..7 {
        assert_eq!(editor.handle_key(KeyPress::shift(Key::Tab)), KeyOutcome::Handled);
    }
    assert_eq!(editor.doc().blocks[0].indent, 0);
    assert_eq!(editor.doc().blocks[0].plain_text(), "task");
}

#[test]
fn tab_max_follows_config() {
    let doc = Document::from_blocks(vec![Block::todo("task", false)]);
    let id = doc.blocks[0].id;
    let config = EditorConfig {
        max_indent_level: 2,
        ..EditorConfig::default()
    };
    let mut editor = Editor::from_document(doc, Selection::collapsed(Point::new(id, 0)), config);
    for _ in 0..4 {
        editor.handle_key(KeyPress::new(Key::Tab));
    }
    assert_eq!(editor.doc().blocks[0].indent, 2);
}

#[test]
fn tab_elsewhere_inserts_a_soft_tab() {
    let mut editor = editor_at(vec![Block::paragraph("ab")], |doc| {
        Point::new(doc.blocks[0].id, 1)
    });
    editor.handle_key(KeyPress::new(Key::Tab));
    assert_eq!(
        editor.doc().blocks[0].plain_text(),
        format!("a{SOFT_TAB}b")
    );
    assert_eq!(editor.caret().offset, 1 + SOFT_TAB.len());
}

#[test]
fn escape_without_menu_is_ignored() {
    let mut editor = editor_at(vec![Block::paragraph("x")], end_of_first);
    assert_eq!(editor.handle_key(KeyPress::new(Key::Escape)), KeyOutcome::Ignored);
}
