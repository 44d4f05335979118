use manos_note_editor::{
    Block, BlockKind, Document, Editor, EditorConfig, Inline, InlineRun, Key, KeyPress, MenuItem, Point,
    Selection,
};

fn tagged_editor(blocks: Vec<Block>, tags: &[&str]) -> Editor {
    let doc = Document::from_blocks(blocks);
    let first = doc.blocks[0].id;
    Editor::from_document(
        doc,
        Selection::collapsed(Point::new(first, 0)),
        EditorConfig::default().with_tags(tags.iter().copied()),
    )
}

fn type_text(editor: &mut Editor, text: &str) {
    for ch in text.chars() {
        editor.insert_text(ch.encode_utf8(&mut [0; 4]));
    }
}

#[test]
fn hash_filter_then_enter_inserts_an_atomic_tag() {
    let mut editor = tagged_editor(vec![Block::paragraph("")], &["project-x", "personal"]);
    type_text(&mut editor, "Great #proj");

    let menu = editor.menu().expect("tag menu open");
    assert_eq!(
        menu.items,
        vec![
            MenuItem::Tag("project-x".into()),
            MenuItem::CreateTag("proj".into())
        ]
    );

    editor.handle_key(KeyPress::new(Key::Enter));

    let block = &editor.doc().blocks[0];
    assert_eq!(
        block.content,
        InlineRun::from_spans(vec![
            Inline::text("Great "),
            Inline::tag("project-x"),
            Inline::text(" "),
        ])
    );
    assert_eq!(editor.caret(), &Point::new(block.id, 8));
    assert!(editor.menu().is_none());
}

#[test]
fn bare_hash_lists_every_tag() {
    let mut editor = tagged_editor(vec![Block::paragraph("")], &["project-x", "personal"]);
    type_text(&mut editor, "#");
    let labels: Vec<String> = editor
        .menu()
        .map(|menu| menu.items.iter().map(MenuItem::label).collect())
        .unwrap_or_default();
    assert_eq!(labels, vec!["#project-x", "#personal"]);
}

#[test]
fn created_tag_keeps_typed_casing_and_is_remembered() {
    let mut editor = tagged_editor(vec![Block::paragraph("")], &["personal"]);
    type_text(&mut editor, "#NewTag");
    assert_eq!(
        editor.menu().map(|menu| menu.items.clone()),
        Some(vec![MenuItem::CreateTag("NewTag".into())])
    );

    editor.handle_key(KeyPress::new(Key::Enter));
    assert_eq!(editor.tags(), ["personal", "NewTag"]);

    type_text(&mut editor, "#newtag");
    assert_eq!(
        editor.menu().map(|menu| menu.items.clone()),
        Some(vec![MenuItem::Tag("NewTag".into())])
    );
    editor.handle_key(KeyPress::new(Key::Tab));

    let tags: Vec<&str> = editor.doc().blocks[0].content.tags().collect();
    assert_eq!(tags, vec!["NewTag", "NewTag"]);
}

#[test]
fn identical_tags_stay_separate_spans() {
    let mut editor = tagged_editor(vec![Block::paragraph("")], &["personal"]);
    type_text(&mut editor, "#personal");
    editor.handle_key(KeyPress::new(Key::Enter));
    type_text(&mut editor, "#personal");
    editor.handle_key(KeyPress::new(Key::Enter));

    let block = &editor.doc().blocks[0];
    assert_eq!(
        block.content,
        InlineRun::from_spans(vec![
            Inline::tag("personal"),
            Inline::text(" "),
            Inline::tag("personal"),
            Inline::text(" "),
        ])
    );
    assert_eq!(editor.caret().offset, 4);
}

#[test]
fn space_commits_the_typed_name() {
    let mut editor = tagged_editor(vec![Block::paragraph("")], &["personal"]);
    type_text(&mut editor, "#PERSONAL");
    editor.handle_key(KeyPress::new(Key::Space));

    let block = &editor.doc().blocks[0];
    assert_eq!(
        block.content,
        InlineRun::from_spans(vec![Inline::tag("personal"), Inline::text(" ")])
    );
    assert_eq!(editor.caret().offset, 2);
}

#[test]
fn space_right_after_hash_closes_the_menu() {
    let mut editor = tagged_editor(vec![Block::paragraph("")], &["personal"]);
    type_text(&mut editor, "#");
    editor.handle_key(KeyPress::new(Key::Space));
    assert!(editor.menu().is_none());
    assert_eq!(editor.doc().blocks[0].plain_text(), "# ");
}

#[test]
fn hash_is_plain_text_without_tags() {
    let mut editor = tagged_editor(vec![Block::paragraph("")], &[]);
    type_text(&mut editor, "#abc");
    assert!(editor.menu().is_none());
    assert_eq!(editor.doc().blocks[0].plain_text(), "#abc");
}

#[test]
fn backspace_removes_a_tag_as_one_unit() {
    let mut editor = tagged_editor(vec![Block::paragraph("")], &["project-x"]);
    type_text(&mut editor, "Great #proj");
    editor.handle_key(KeyPress::new(Key::Enter));
    let id = editor.doc().blocks[0].id;
    editor.set_selection(Selection::collapsed(Point::new(id, 7)));

    editor.handle_key(KeyPress::new(Key::Backspace));

    let block = &editor.doc().blocks[0];
    assert_eq!(block.content.tags().count(), 0);
    assert_eq!(block.plain_text(), "Great  ");
    assert_eq!(editor.caret().offset, 6);
}

#[test]
fn tag_always_keeps_a_trailing_text_position() {
    let doc = Document::from_blocks(vec![Block::new(
        BlockKind::Paragraph,
        InlineRun::from_spans(vec![Inline::text("see "), Inline::tag("x")]),
    )]);
    let id = doc.blocks[0].id;
    let editor = Editor::from_document(
        doc,
        Selection::collapsed(Point::new(id, 5)),
        EditorConfig::default(),
    );
    assert_eq!(
        editor.doc().blocks[0].content.spans.last(),
        Some(&Inline::text(" "))
    );
}

#[test]
fn escape_leaves_the_hash_text_and_the_tag_list_alone() {
    let mut editor = tagged_editor(vec![Block::paragraph("")], &["project-x", "personal"]);
    type_text(&mut editor, "Great #proj");
    let before = editor.doc().clone();
    assert!(editor.menu().is_some());

    editor.handle_key(KeyPress::new(Key::Escape));

    assert!(editor.menu().is_none());
    assert_eq!(editor.doc(), &before);
    assert_eq!(editor.doc().blocks[0].plain_text(), "Great #proj");
    assert_eq!(editor.tags(), ["project-x", "personal"]);

    type_text(&mut editor, "e");
    assert!(editor.menu().is_none());
    assert_eq!(editor.doc().blocks[0].plain_text(), "Great #proje");

    for _ in 0.."#proje".len() {
        editor.handle_key(KeyPress::new(Key::Backspace));
    }
    assert_eq!(editor.doc().blocks[0].plain_text(), "Great ");
    type_text(&mut editor, "#");
    assert!(editor.menu().is_some());
}
