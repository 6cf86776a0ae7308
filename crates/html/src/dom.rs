//! A small, forgiving HTML tree builder on top of quick-xml.
//!
//! Slide fragments are hand-templated HTML, not XML: void elements are not
//! closed, entities like `&nbsp;` appear in text and end tags may be
//! mismatched. The builder tolerates all of that and keeps only what slide
//! conversion needs: elements, attributes, text and `<style>` contents.

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Elements that never have content or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose content is raw text rather than markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// A single named or numeric character reference.
static ENTITY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#[xX][0-9a-fA-F]+|#[0-9]+|[A-Za-z][A-Za-z0-9]*);").unwrap()
});

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An HTML element with its attributes and children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    /// Lower-cased tag name.
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Value of an attribute, matched case-insensitively.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Class names from the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Child elements, skipping text.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// First descendant (depth-first, including self) with the given tag.
    pub fn find(&self, tag: &str) -> Option<&Element> {
        if self.tag == tag {
            return Some(self);
        }
        self.child_elements().find_map(|child| child.find(tag))
    }

    /// Every descendant (including self) with the given tag, in document order.
    pub fn find_all<'a>(&'a self, tag: &str, out: &mut Vec<&'a Element>) {
        if self.tag == tag {
            out.push(self);
        }
        for child in self.child_elements() {
            child.find_all(tag, out);
        }
    }

    /// Concatenated text of all descendants.
    pub fn text_content(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
            }
        }
    }
}

/// A parsed HTML document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Synthetic root holding the top-level nodes.
    pub root: Element,
}

impl Document {
    /// Parse an HTML string.
    ///
    /// Returns a message describing the first error the tokenizer could not
    /// recover from.
    pub fn parse(html: &str) -> Result<Self, String> {
        let mut reader = Reader::from_str(html);
        reader.trim_text(false);
        reader.check_end_names(false);

        let mut stack: Vec<Element> = vec![Element::new("#document")];

        loop {
            let position = reader.buffer_position();
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    let element = element_from(e);
                    let tag = element.tag.clone();

                    if VOID_ELEMENTS.contains(&tag.as_str()) {
                        append(&mut stack, Node::Element(element));
                    } else if RAW_TEXT_ELEMENTS.contains(&tag.as_str()) {
                        let end = e.to_end().into_owned();
                        let content = reader.read_text(end.name()).map_err(|err| {
                            format!("unterminated <{}> at byte {}: {}", tag, position, err)
                        })?;
                        let mut element = element;
                        if !content.is_empty() {
                            element.children.push(Node::Text(content.into_owned()));
                        }
                        append(&mut stack, Node::Element(element));
                    } else {
                        stack.push(element);
                    }
                }
                Ok(Event::Empty(ref e)) => {
                    append(&mut stack, Node::Element(element_from(e)));
                }
                Ok(Event::End(ref e)) => {
                    let tag = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
                    close(&mut stack, &tag);
                }
                Ok(Event::Text(e)) => {
                    let raw = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    append(&mut stack, Node::Text(decode_entities(&raw)));
                }
                Ok(Event::CData(e)) => {
                    let raw = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    append(&mut stack, Node::Text(raw));
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(format!("{} at byte {}", e, position)),
                _ => {}
            }
        }

        // Close anything left open at end of input.
        while stack.len() > 1 {
            if let Some(element) = stack.pop() {
                append(&mut stack, Node::Element(element));
            }
        }

        let root = stack.pop().unwrap_or_else(|| Element::new("#document"));
        Ok(Self { root })
    }

    /// The `<body>` element, if present.
    pub fn body(&self) -> Option<&Element> {
        self.root.find("body")
    }

    /// Contents of every `<style>` block, in document order.
    pub fn style_blocks(&self) -> Vec<String> {
        let mut styles = Vec::new();
        self.root.find_all("style", &mut styles);
        styles.into_iter().map(Element::text_content).collect()
    }

    /// Text of the `<title>` element.
    pub fn title(&self) -> Option<String> {
        self.root
            .find("title")
            .map(|t| t.text_content().trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

/// Build an element from a start tag, decoding attribute values.
fn element_from(e: &BytesStart) -> Element {
    let tag = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
    let attrs = e
        .html_attributes()
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
            let raw = String::from_utf8_lossy(&attr.value).into_owned();
            (key, decode_entities(&raw))
        })
        .collect();

    Element {
        tag,
        attrs,
        children: Vec::new(),
    }
}

/// Append a node to the innermost open element.
fn append(stack: &mut [Element], node: Node) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

/// Close the innermost open element named `tag`, implicitly closing any
/// elements opened inside it. Stray end tags are ignored.
fn close(stack: &mut Vec<Element>, tag: &str) {
    let Some(index) = stack.iter().rposition(|e| e.tag == tag) else {
        return;
    };
    if index == 0 {
        return;
    }
    while stack.len() > index {
        if let Some(element) = stack.pop() {
            append(stack, Node::Element(element));
        }
    }
}

/// Decode each character reference on its own. A bare `&` or an unknown
/// reference is kept as written.
fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    ENTITY_REGEX
        .replace_all(raw, |caps: &Captures| match unescape(&caps[0]) {
            Ok(text) => text.into_owned(),
            Err(_) => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_void_elements_do_not_nest() {
        let doc = Document::parse(
            r#"<!DOCTYPE html><html><head><meta charset="UTF-8"></head><body><img src="a.png"><div>after</div></body></html>"#,
        )
        .unwrap();

        let body = doc.body().unwrap();
        let tags: Vec<&str> = body.child_elements().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["img", "div"]);
        assert_eq!(body.child_elements().nth(1).unwrap().text_content(), "after");
    }

    #[test]
    fn test_entities_are_decoded() {
        let doc = Document::parse("<body><div>7&times; &amp; 3&nbsp;Wipes</div></body>").unwrap();
        assert_eq!(doc.body().unwrap().text_content(), "7\u{d7} & 3\u{a0}Wipes");
    }

    #[test]
    fn test_bare_ampersand_is_kept() {
        let doc = Document::parse("<body><p>Kills & Wipes</p></body>").unwrap();
        assert_eq!(doc.body().unwrap().text_content(), "Kills & Wipes");
    }

    #[test]
    fn test_entities_next_to_bare_ampersand_are_decoded() {
        let doc =
            Document::parse("<body><p>Fire &amp; Ice & Frost &times;3 &bogus;</p></body>").unwrap();
        assert_eq!(doc.body().unwrap().text_content(), "Fire & Ice & Frost \u{d7}3 &bogus;");
    }

    #[test]
    fn test_attribute_entities_next_to_bare_ampersand() {
        let doc = Document::parse(r#"<body><a href="/b?x=1&y=2&amp;z=3">t</a></body>"#).unwrap();
        let link = doc.body().unwrap().find("a").unwrap();
        assert_eq!(link.attr("href"), Some("/b?x=1&y=2&z=3"));
    }

    #[test]
    fn test_mismatched_end_tags_are_tolerated() {
        let doc = Document::parse("<body><div><span>one</div><p>two</p></body>").unwrap();
        let body = doc.body().unwrap();
        let tags: Vec<&str> = body.child_elements().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, vec!["div", "p"]);
        assert_eq!(body.text_content(), "onetwo");
    }

    #[test]
    fn test_style_and_script_content_is_raw() {
        let doc = Document::parse(
            "<html><head><style>.a > .b { color: red; }</style><script>const whTooltips = {colorLinks: true};</script></head><body></body></html>",
        )
        .unwrap();

        assert_eq!(doc.style_blocks(), vec![".a > .b { color: red; }".to_string()]);
        assert!(doc.body().unwrap().children.is_empty());
    }

    #[test]
    fn test_attributes_and_classes() {
        let doc = Document::parse(
            r#"<body class="col bg-surface center" style="width: 960px;"><a href="https://example.com/?a=1&amp;b=2" data-wowhead="spell=1">x</a></body>"#,
        )
        .unwrap();

        let body = doc.body().unwrap();
        assert!(body.has_class("bg-surface"));
        assert_eq!(body.attr("STYLE"), Some("width: 960px;"));
        let link = body.find("a").unwrap();
        assert_eq!(link.attr("href"), Some("https://example.com/?a=1&b=2"));
    }

    #[test]
    fn test_unclosed_elements_are_closed_at_eof() {
        let doc = Document::parse("<body><div>open").unwrap();
        assert_eq!(doc.body().unwrap().find("div").unwrap().text_content(), "open");
    }
}
