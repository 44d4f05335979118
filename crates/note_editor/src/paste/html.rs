//! A small, forgiving markup parser for clipboard fragments.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HtmlError {
    #[error("unterminated tag starting at byte {0}")]
    UnterminatedTag(usize),

    #[error("unterminated comment starting at byte {0}")]
    UnterminatedComment(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlNode {
    Element(HtmlElement),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlElement {
    /// Lowercase tag name.
    pub name: String,
    /// Attributes in source order, names lowercased, values entity-decoded.
    pub attrs: Vec<(String, String)>,
    pub children: Vec<HtmlNode>,
}

impl HtmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }
}

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title", "xmp"];

/// Elements whose start tag implicitly closes an open `<p>`.
const CLOSES_PARAGRAPH: &[&str] = &[
    "address", "article", "aside", "blockquote", "details", "div", "dl", "fieldset", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "pre", "section", "summary", "table", "ul",
];

pub fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Start {
        name: String,
        attrs: Vec<(String, String)>,
    },
    End {
        name: String,
    },
    Text(String),
}

/// Parses a fragment, failing on unterminated tags and comments.
pub fn parse_fragment(input: &str) -> Result<Vec<HtmlNode>, HtmlError> {
    Ok(build_tree(tokenize(input, true)?))
}

/// Parses a fragment, keeping whatever can be recovered from broken markup.
pub fn parse_fragment_lenient(input: &str) -> Vec<HtmlNode> {
    build_tree(tokenize(input, false).unwrap_or_default())
}

fn tokenize(input: &str, strict: bool) -> Result<Vec<Token>, HtmlError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut text_start = 0;

    let flush = |tokens: &mut Vec<Token>, from: usize, to: usize| {
        if from < to {
            tokens.push(Token::Text(decode_entities(&input[from..to])));
        }
    };

    while pos < bytes.len() {
        if bytes[pos] != b'<' {
            pos += 1;
            continue;
        }
        let rest = &input[pos..];

        if rest.starts_with("<!--") {
            flush(&mut tokens, text_start, pos);
            match rest[4..].find("-->") {
                Some(end) => pos += 4 + end + 3,
                None if strict => return Err(HtmlError::UnterminatedComment(pos)),
                None => pos = bytes.len(),
            }
            text_start = pos;
            continue;
        }

        if rest.starts_with("<!") || rest.starts_with("<?") {
            flush(&mut tokens, text_start, pos);
            match rest.find('>') {
                Some(end) => pos += end + 1,
                None if strict => return Err(HtmlError::UnterminatedTag(pos)),
                None => pos = bytes.len(),
            }
            text_start = pos;
            continue;
        }

        let closing = rest.starts_with("</");
        let name_start = pos + if closing { 2 } else { 1 };
        if !bytes.get(name_start).is_some_and(u8::is_ascii_alphabetic) {
            // A lone '<' is literal text.
            pos += 1;
            continue;
        }

        flush(&mut tokens, text_start, pos);
        let tag_start = pos;
        let Some(parsed) = parse_tag(input, name_start) else {
            if strict {
                return Err(HtmlError::UnterminatedTag(tag_start));
            }
            pos = bytes.len();
            text_start = pos;
            break;
        };
        pos = parsed.end;

        if closing {
            tokens.push(Token::End { name: parsed.name });
        } else {
            // A trailing '/' does not end a non-void element.
            let raw = RAW_TEXT_ELEMENTS.contains(&parsed.name.as_str());
            let name = parsed.name.clone();
            tokens.push(Token::Start {
                name: parsed.name,
                attrs: parsed.attrs,
            });
            if raw {
                let close = format!("</{name}");
                let body_end = find_ascii_case_insensitive(&input[pos..], &close)
                    .map(|ix| pos + ix)
                    .unwrap_or(bytes.len());
                if body_end > pos {
                    tokens.push(Token::Text(input[pos..body_end].to_string()));
                }
                tokens.push(Token::End { name });
                pos = match input[body_end..].find('>') {
                    Some(ix) => body_end + ix + 1,
                    None => bytes.len(),
                };
            }
        }
        text_start = pos;
    }

    flush(&mut tokens, text_start, bytes.len());
    Ok(tokens)
}

struct ParsedTag {
    name: String,
    attrs: Vec<(String, String)>,
    end: usize,
}

fn is_delimiter(byte: u8) -> bool {
    byte.is_ascii_whitespace() || matches!(byte, b'>' | b'/' | b'=')
}

/// Parses from the first byte of a tag name up to and including its `>`.
fn parse_tag(input: &str, name_start: usize) -> Option<ParsedTag> {
    let bytes = input.as_bytes();
    let mut pos = name_start;
    while pos < bytes.len() && !is_delimiter(bytes[pos]) {
        pos += 1;
    }
    let name = input[name_start..pos].to_ascii_lowercase();
    let mut attrs = Vec::new();

    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        match bytes.get(pos)? {
            b'>' => {
                return Some(ParsedTag {
                    name,
                    attrs,
                    end: pos + 1,
                });
            }
            b'/' => {
                pos += 1;
                continue;
            }
            b'=' => {
                // Stray '=' without a name.
                pos += 1;
                continue;
            }
            _ => {}
        }

        let attr_start = pos;
        while pos < bytes.len() && !is_delimiter(bytes[pos]) {
            pos += 1;
        }
        let key = input[attr_start..pos].to_ascii_lowercase();

        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let mut value = String::new();
        if bytes.get(pos) == Some(&b'=') {
            pos += 1;
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            match bytes.get(pos)? {
                quote @ (b'"' | b'\'') => {
                    let close = input[pos + 1..].find(*quote as char)?;
                    value = decode_entities(&input[pos + 1..pos + 1 + close]);
                    pos += close + 2;
                }
                _ => {
                    let value_start = pos;
                    while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() && bytes[pos] != b'>' {
                        pos += 1;
                    }
                    value = decode_entities(&input[value_start..pos]);
                }
            }
        }
        if !key.is_empty() && !attrs.iter().any(|(existing, _)| *existing == key) {
            attrs.push((key, value));
        }
    }
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let needle = needle.as_bytes();
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}

/// Decodes the common named entities and numeric references.
pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        match decode_entity(rest) {
            Some((ch, used)) => {
                out.push(ch);
                rest = &rest[used..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(text: &str) -> Option<(char, usize)> {
    let semi = text.find(';')?;
    if semi > 10 {
        return None;
    }
    let body = &text[1..semi];
    let ch = match body.strip_prefix('#') {
        Some(number) => {
            let code = match number.strip_prefix(|c| c == 'x' || c == 'X') {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse::<u32>().ok()?,
            };
            match code {
                0 => char::REPLACEMENT_CHARACTER,
                _ => char::from_u32(code)?,
            }
        }
        None => match body {
            "amp" => '&',
            "lt" => '<',
            "gt" => '>',
            "quot" => '"',
            "apos" => '\'',
            "nbsp" => '\u{a0}',
            _ => return None,
        },
    };
    Some((ch, semi + 1))
}

fn build_tree(tokens: Vec<Token>) -> Vec<HtmlNode> {
    let mut root: Vec<HtmlNode> = Vec::new();
    let mut stack: Vec<HtmlElement> = Vec::new();

    fn attach(stack: &mut [HtmlElement], root: &mut Vec<HtmlNode>, node: HtmlNode) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => root.push(node),
        }
    }

    fn close_through(stack: &mut Vec<HtmlElement>, root: &mut Vec<HtmlNode>, ix: usize) {
        while stack.len() > ix {
            if let Some(element) = stack.pop() {
                attach(stack, root, HtmlNode::Element(element));
            }
        }
    }

    for token in tokens {
        match token {
            Token::Text(text) => attach(&mut stack, &mut root, HtmlNode::Text(text)),
            Token::Start { name, attrs } => {
                if CLOSES_PARAGRAPH.contains(&name.as_str()) {
                    if let Some(ix) = open_paragraph(&stack) {
                        close_through(&mut stack, &mut root, ix);
                    }
                }
                if name == "li" {
                    if let Some(ix) = open_list_item(&stack) {
                        close_through(&mut stack, &mut root, ix);
                    }
                }

                let element = HtmlElement {
                    name,
                    attrs,
                    children: Vec::new(),
                };
                if is_void_element(&element.name) {
                    attach(&mut stack, &mut root, HtmlNode::Element(element));
                } else {
                    stack.push(element);
                }
            }
            Token::End { name } => {
                if let Some(ix) = stack.iter().rposition(|open| open.name == name) {
                    close_through(&mut stack, &mut root, ix);
                } else if name == "br" {
                    attach(&mut stack, &mut root, HtmlNode::Element(HtmlElement::new("br")));
                }
            }
        }
    }

    close_through(&mut stack, &mut root, 0);
    root
}

/// An open `<p>` with only inline elements above it.
fn open_paragraph(stack: &[HtmlElement]) -> Option<usize> {
    let ix = stack.iter().rposition(|open| open.name == "p")?;
    stack[ix + 1..]
        .iter()
        .all(|open| !CLOSES_PARAGRAPH.contains(&open.name.as_str()))
        .then_some(ix)
}

/// An open `<li>` in the innermost list.
fn open_list_item(stack: &[HtmlElement]) -> Option<usize> {
    for (ix, open) in stack.iter().enumerate().rev() {
        match open.name.as_str() {
            "li" => return Some(ix),
            "ul" | "ol" => return None,
            _ => {}
        }
    }
    None
}

/// Text of the nodes with line breaks at `<br>` and block boundaries.
pub fn visible_text(nodes: &[HtmlNode]) -> String {
    fn walk(nodes: &[HtmlNode], out: &mut String) {
        for node in nodes {
            match node {
                HtmlNode::Text(text) => out.push_str(text),
                HtmlNode::Element(element) if element.name == "br" => out.push('\n'),
                HtmlNode::Element(element) => {
                    let block = CLOSES_PARAGRAPH.contains(&element.name.as_str());
                    if block && !out.is_empty() && !out.ends_with("\n\n") {
                        out.push_str("\n\n");
                    }
                    walk(&element.children, out);
                }
            }
        }
    }
    let mut out = String::new();
    walk(nodes, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(node: &HtmlNode) -> &HtmlElement {
        match node {
            HtmlNode::Element(element) => element,
            HtmlNode::Text(text) => panic!("expected element, got text {text:?}"),
        }
    }

    #[test]
    fn nested_elements_and_attributes() {
        let nodes = parse_fragment(r#"<P Class="x">a <a href='/y?a=1&amp;b=2'>link</a></p>"#).unwrap();
        assert_eq!(nodes.len(), 1);
        let p = element(&nodes[0]);
        assert_eq!(p.name, "p");
        assert_eq!(p.attr("class"), Some("x"));
        let a = element(&p.children[1]);
        assert_eq!(a.attr("href"), Some("/y?a=1&b=2"));
        assert_eq!(a.children, vec![HtmlNode::Text("link".into())]);
    }

    #[test]
    fn entities_are_decoded() {
        assert_eq!(decode_entities("a &lt;b&gt; &#65;&#x42; &nbsp;&bogus; &"), "a <b> AB \u{a0}&bogus; &");
    }

    #[test]
    fn script_body_is_raw_text() {
        let nodes = parse_fragment("<script>if (a < b) { x('</p>') }</script><p>ok</p>").unwrap();
        let script = element(&nodes[0]);
        assert_eq!(script.name, "script");
        assert_eq!(
            script.children,
            vec![HtmlNode::Text("if (a < b) { x('</p>') }".into())]
        );
        assert_eq!(element(&nodes[1]).name, "p");
    }

    #[test]
    fn trailing_slash_only_closes_void_elements() {
        let nodes = parse_fragment("<script/>alert(1)</script><div/>x</div><br/>").unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(
            element(&nodes[0]).children,
            vec![HtmlNode::Text("alert(1)".into())]
        );
        assert_eq!(element(&nodes[1]).children, vec![HtmlNode::Text("x".into())]);
        assert_eq!(element(&nodes[2]).name, "br");
    }

    #[test]
    fn block_start_closes_open_paragraph() {
        let nodes = parse_fragment("<p>one<div>two</div>").unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(element(&nodes[1]).name, "div");
    }

    #[test]
    fn list_items_close_each_other() {
        let nodes = parse_fragment("<ul><li>a<li>b</ul>").unwrap();
        let ul = element(&nodes[0]);
        assert_eq!(ul.children.len(), 2);
    }

    #[test]
    fn void_and_stray_end_tags() {
        let nodes = parse_fragment("a<br>b</span><img src=x.png>").unwrap();
        assert_eq!(nodes.len(), 4);
        assert_eq!(element(&nodes[1]).name, "br");
        assert_eq!(element(&nodes[3]).attr("src"), Some("x.png"));
    }

    #[test]
    fn unterminated_markup_is_an_error() {
        assert_eq!(parse_fragment("<p class=\"x"), Err(HtmlError::UnterminatedTag(0)));
        assert_eq!(parse_fragment("ok <!-- never"), Err(HtmlError::UnterminatedComment(3)));
        assert_eq!(
            parse_fragment_lenient("ok <!-- never"),
            vec![HtmlNode::Text("ok ".into())]
        );
    }

    #[test]
    fn lone_angle_bracket_is_text() {
        let nodes = parse_fragment("1 < 2").unwrap();
        assert_eq!(nodes, vec![HtmlNode::Text("1 < 2".into())]);
    }
}
