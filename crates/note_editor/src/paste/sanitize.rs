use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use super::html::{HtmlElement, HtmlNode};

/// Removed together with everything inside them.
const DROPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "iframe", "frame", "frameset", "object", "embed", "applet",
    "template", "svg", "math", "head", "title", "meta", "link", "base", "input", "button",
    "select", "textarea", "option", "optgroup", "datalist", "canvas", "audio", "video", "source",
    "track", "param",
];

/// Replaced by their children.
const UNWRAPPED_ELEMENTS: &[&str] = &["html", "body", "form", "fieldset", "label", "font"];

const ALLOWED_ATTRIBUTES: &[&str] = &[
    "href",
    "src",
    "alt",
    "open",
    "data-tag",
    "data-block",
    "data-checked",
    "data-indent",
    "data-padding",
];

const EXECUTABLE_SCHEMES: &[&str] = &["javascript:", "vbscript:", "livescript:", "data:"];

/// Strips executable content and presentation attributes from parsed markup.
pub fn sanitize(nodes: Vec<HtmlNode>) -> Vec<HtmlNode> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            HtmlNode::Text(text) => out.push(HtmlNode::Text(text)),
            HtmlNode::Element(element) => sanitize_element(element, &mut out),
        }
    }
    out
}

fn sanitize_element(mut element: HtmlElement, out: &mut Vec<HtmlNode>) {
    let name = element.name.as_str();
    if DROPPED_ELEMENTS.contains(&name) {
        return;
    }
    if UNWRAPPED_ELEMENTS.contains(&name) {
        out.extend(sanitize(element.children));
        return;
    }

    element
        .attrs
        .retain(|(key, _)| ALLOWED_ATTRIBUTES.contains(&key.as_str()));
    element.children = sanitize(std::mem::take(&mut element.children));

    match element.name.as_str() {
        "a" => {
            let safe = element.attr("href").is_some_and(|href| !is_executable_url(href));
            if !safe {
                out.extend(element.children);
                return;
            }
        }
        "img" => {
            let Some(src) = element.attr("src").and_then(resolve_image_source) else {
                return;
            };
            element.attrs.retain(|(key, _)| key != "src");
            element.attrs.push(("src".to_string(), src));
        }
        _ => {}
    }
    out.push(HtmlNode::Element(element));
}

/// True for URLs that run code or smuggle content when followed.
pub fn is_executable_url(url: &str) -> bool {
    let cleaned: String = url
        .chars()
        .filter(|ch| !ch.is_whitespace() && !ch.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    EXECUTABLE_SCHEMES
        .iter()
        .any(|scheme| cleaned.starts_with(scheme))
}

/// A loadable image source, or `None` when the image should be dropped.
pub fn resolve_image_source(src: &str) -> Option<String> {
    let src = src.trim();
    let lower = src.to_ascii_lowercase();
    if lower.starts_with("https://") || lower.starts_with("http://") {
        return Some(src.to_string());
    }
    if src.starts_with("//") && src.len() > 2 {
        return Some(format!("https:{src}"));
    }
    if lower.starts_with("data:image/") {
        let (meta, payload) = src["data:".len()..].split_once(',')?;
        let mime = meta.strip_suffix(";base64")?;
        if mime.eq_ignore_ascii_case("image/svg+xml") {
            return None;
        }
        let cleaned: String = payload.chars().filter(|ch| !ch.is_whitespace()).collect();
        STANDARD.decode(cleaned.as_bytes()).ok()?;
        return Some(src.to_string());
    }
    None
}
