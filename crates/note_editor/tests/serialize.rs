use manos_note_editor::{
    Block, BlockKind, Document, Editor, EditorConfig, Inline, InlineRun, NoteValue, ValueError,
};

fn sample() -> Document {
    let mut padded = Block::paragraph("aside");
    padded.padding = 2;
    let mut bullet = Block::new(BlockKind::BulletedItem, InlineRun::from_text("two"));
    bullet.indent = 1;

    Document::from_blocks(vec![
        Block::heading(1, "Title"),
        Block::new(
            BlockKind::Paragraph,
            InlineRun::from_spans(vec![
                Inline::text("see "),
                Inline::tag("work"),
                Inline::text(" "),
                Inline::link("https://x.io", "site"),
            ]),
        ),
        padded,
        Block::todo("ship & tell", true).with_indent(1),
        Block::new(BlockKind::BulletedItem, InlineRun::from_text("one")),
        bullet,
        Block::new(BlockKind::NumberedItem, InlineRun::from_text("first")),
        Block::new(BlockKind::Quote, InlineRun::from_text("wise")),
        Block::new(BlockKind::Code, InlineRun::from_text("if a < b {\n    go();\n}")),
        Block::divider(),
        Block::new(BlockKind::Callout, InlineRun::from_text("heads up")),
        Block::toggle("More", vec![Block::paragraph("hidden")]),
        Block::empty(BlockKind::Image {
            src: "https://cdn.example.com/a.png".into(),
            alt: "A \"quoted\" alt".into(),
        }),
    ])
}

#[test]
fn html_uses_the_paste_vocabulary() {
    let doc = Document::from_blocks(vec![
        Block::heading(2, "Plan"),
        Block::todo("a < b", false).with_indent(1),
        Block::new(BlockKind::BulletedItem, InlineRun::from_text("x")),
        Block::new(BlockKind::BulletedItem, InlineRun::from_text("y")).with_indent(1),
        Block::divider(),
        Block::toggle("T", vec![Block::paragraph("line\nbreak")]),
    ]);

    assert_eq!(
        doc.to_html(),
        "<h2>Plan</h2>\
         <div data-block=\"todo\" data-checked=\"false\" data-indent=\"1\">a &lt; b</div>\
         <ul><li>x</li><li data-indent=\"1\">y</li></ul>\
         <hr>\
         <details data-block=\"toggle\" open><summary>T</summary><p>line<br>break</p></details>"
    );
}

#[test]
fn html_reads_back_into_the_same_blocks() {
    let doc = sample();
    let restored = Document::from_initial_content(&doc.to_html());
    assert_eq!(restored, doc);
}

#[test]
fn note_value_round_trips_through_json() {
    let doc = sample();
    let json = NoteValue::from_document(doc.clone())
        .to_json_pretty()
        .expect("serializes");
    assert!(json.contains("\"schema\": \"manos-note\""));

    let value = NoteValue::from_json_str(&json).expect("parses");
    assert_eq!(value.version, 1);
    assert_eq!(value.into_document(), doc);
}

#[test]
fn foreign_or_newer_values_are_rejected() {
    let other = r#"{"schema":"other","version":1,"document":{"blocks":[]}}"#;
    assert!(matches!(
        NoteValue::from_json_str(other),
        Err(ValueError::UnsupportedSchema { found }) if found == "other"
    ));

    let newer = r#"{"schema":"manos-note","version":9,"document":{"blocks":[]}}"#;
    assert!(matches!(
        NoteValue::from_json_str(newer),
        Err(ValueError::UnsupportedVersion { found: 9, supported: 1 })
    ));

    assert!(matches!(
        NoteValue::from_json_str("{not json"),
        Err(ValueError::Json(_))
    ));
}

#[test]
fn stored_values_without_ids_get_fresh_ones() {
    let json = r#"{"document":{"blocks":[
        {"kind":"heading","level":2,"content":[{"span":"text","text":"Hi"}]},
        {"kind":"toggle","open":true,"children":[{"kind":"paragraph"}]}
    ]}}"#;
    let doc = NoteValue::from_json_str(json).expect("parses").into_document();

    let ids = doc.block_ids();
    assert_eq!(ids.len(), 3);
    assert!(ids.iter().all(|id| id.is_assigned()));
    assert_eq!(doc.blocks[0].kind, BlockKind::heading(2));
}

#[test]
fn initial_content_formats() {
    let plain = Document::from_initial_content("first\n\nsecond");
    assert_eq!(
        plain.blocks.iter().map(Block::plain_text).collect::<Vec<_>>(),
        vec!["first", "second"]
    );

    let markup = Document::from_initial_content("<h2>Hi</h2><p>there</p>");
    assert_eq!(markup.blocks[0].kind, BlockKind::heading(2));

    let broken_json = Document::from_initial_content("{oops");
    assert_eq!(broken_json.blocks[0].plain_text(), "{oops");

    let blank = Document::from_initial_content("   \n ");
    assert!(blank.is_blank());
}

#[test]
fn editor_accepts_a_stored_value() {
    let json = NoteValue::from_document(sample())
        .to_json_pretty()
        .expect("serializes");
    let editor = Editor::new(&json, EditorConfig::default());
    assert_eq!(editor.doc().blocks.len(), sample().blocks.len());
    assert_eq!(editor.doc().blocks[11].children[0].plain_text(), "hidden");
}

#[test]
fn plain_text_skips_void_blocks() {
    let doc = Document::from_blocks(vec![
        Block::heading(1, "T"),
        Block::divider(),
        Block::toggle("A", vec![Block::paragraph("b")]),
    ]);
    assert_eq!(doc.to_plain_text(), "T\nA\nb");
}
