use crate::core::Block;

/// Blank-line separated chunks become paragraphs; single newlines stay as soft breaks.
pub fn blocks_from_text(text: &str) -> Vec<Block> {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut blocks = Vec::new();
    let mut chunk: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        if line.trim().is_empty() {
            if !chunk.is_empty() {
                blocks.push(Block::paragraph(chunk.join("\n")));
                chunk.clear();
            }
        } else {
            chunk.push(line);
        }
    }
    if !chunk.is_empty() {
        blocks.push(Block::paragraph(chunk.join("\n")));
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_and_soft_breaks() {
        let blocks = blocks_from_text("one\r\ntwo\r\n\r\n\r\nthree\n");
        let texts: Vec<String> = blocks.iter().map(Block::plain_text).collect();
        assert_eq!(texts, vec!["one\ntwo", "three"]);
    }

    #[test]
    fn whitespace_only_is_nothing() {
        assert!(blocks_from_text(" \n\t\n").is_empty());
    }
}
