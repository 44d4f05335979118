use manos_note_editor::trigger::{self, DetectOptions, TriggerChar};
use manos_note_editor::{Block, BlockKind, Document, Inline, InlineRun, Point};

const TAGS: DetectOptions = DetectOptions {
    tags_enabled: true,
    triggers_in_code: false,
};

fn doc_with(block: Block) -> Document {
    Document::from_blocks(vec![block])
}

#[test]
fn slash_mid_line_reports_its_range() {
    let doc = doc_with(Block::paragraph("write /hea"));
    let id = doc.blocks[0].id;

    let found = trigger::detect(&doc, &Point::new(id, 10), DetectOptions::default())
        .expect("trigger");

    assert_eq!(found.trigger, TriggerChar::Slash);
    assert_eq!(found.filter, "hea");
    assert_eq!(found.range, 6..10);
    assert_eq!(found.anchor, id);
    assert!(found.is_attached(&doc));
}

#[test]
fn only_text_before_the_caret_counts() {
    let doc = doc_with(Block::paragraph("/head more"));
    let id = doc.blocks[0].id;
    assert_eq!(
        trigger::detect(&doc, &Point::new(id, 3), DetectOptions::default())
            .map(|found| found.filter),
        Some("he".to_string())
    );
    assert_eq!(
        trigger::detect(&doc, &Point::new(id, 10), DetectOptions::default()),
        None
    );
}

#[test]
fn offsets_after_a_tag_are_shifted_by_its_width() {
    let doc = doc_with(Block::new(
        BlockKind::Paragraph,
        InlineRun::from_spans(vec![
            Inline::text("a "),
            Inline::tag("x"),
            Inline::text(" #pr"),
        ]),
    ));
    let id = doc.blocks[0].id;

    let found = trigger::detect(&doc, &Point::new(id, 7), TAGS).expect("trigger");

    assert_eq!(found.trigger, TriggerChar::Hash);
    assert_eq!(found.filter, "pr");
    assert_eq!(found.range, 4..7);
    assert!(found.is_attached(&doc));
}

#[test]
fn links_and_voids_never_trigger() {
    let doc = doc_with(Block::new(
        BlockKind::Paragraph,
        InlineRun::from_spans(vec![Inline::link("https://x.io", "/x")]),
    ));
    let id = doc.blocks[0].id;
    assert_eq!(trigger::detect(&doc, &Point::new(id, 2), TAGS), None);

    let doc = doc_with(Block::divider());
    let id = doc.blocks[0].id;
    assert_eq!(trigger::detect(&doc, &Point::new(id, 0), TAGS), None);
}

#[test]
fn hash_in_a_word_is_still_a_trigger_when_tags_exist() {
    let doc = doc_with(Block::paragraph("issue#12"));
    let id = doc.blocks[0].id;
    let found = trigger::detect(&doc, &Point::new(id, 8), TAGS).expect("trigger");
    assert_eq!(found.trigger, TriggerChar::Hash);
    assert_eq!(found.filter, "12");
}
