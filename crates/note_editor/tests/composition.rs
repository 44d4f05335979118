use manos_note_editor::{
    Block, Document, Editor, EditorConfig, Key, KeyOutcome, KeyPress, PasteData, Point, Selection,
};

fn editor() -> Editor {
    let doc = Document::from_blocks(vec![Block::paragraph("")]);
    let first = doc.blocks[0].id;
    Editor::from_document(
        doc,
        Selection::collapsed(Point::new(first, 0)),
        EditorConfig::default(),
    )
}

#[test]
fn composed_text_lands_once_at_the_end() {
    let mut editor = editor();
    editor.composition_start();
    editor.composition_update("k");
    editor.composition_update("か");
    assert!(editor.is_composing());
    assert_eq!(editor.composition_text(), Some("か"));
    assert!(editor.doc().is_blank());

    assert!(editor.composition_end("漢字"));

    assert!(!editor.is_composing());
    assert_eq!(editor.doc().blocks[0].plain_text(), "漢字");
    assert_eq!(editor.caret().offset, "漢字".len());
}

#[test]
fn input_is_held_back_while_composing() {
    let mut editor = editor();
    editor.composition_start();

    assert_eq!(editor.handle_key(KeyPress::new(Key::Enter)), KeyOutcome::Ignored);
    assert!(!editor.insert_text("x"));
    assert!(!editor.paste(&PasteData::text("y")));
    assert!(editor.doc().is_blank());
    assert!(!editor.can_undo());
}

#[test]
fn cancelled_composition_changes_nothing() {
    let mut editor = editor();
    editor.composition_start();
    editor.composition_update("abc");
    assert!(!editor.composition_end(""));
    assert!(editor.doc().is_blank());
    assert!(!editor.composition_end("late"));
}

#[test]
fn composed_trigger_opens_the_menu_afterwards() {
    let mut editor = editor();
    editor.composition_start();
    editor.composition_update("/");
    assert!(editor.menu().is_none());

    editor.composition_end("/");

    assert!(editor.menu().is_some());
}
