//! Style resolution for slide fragments.
//!
//! Supports the subset of CSS the raid report templates use: utility
//! classes, tag rules, custom properties with `var()`, and inline `style`
//! attributes. Selectors are limited to a single tag, a single class, `*`
//! and `:root`; anything more complex is ignored.

use deck_core::{Color, TextAlign};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::dom::Element;

/// Regex to strip CSS comments.
static CSS_COMMENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

/// Regex matching one `selector { declarations }` rule.
static CSS_RULE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([^{}]+)\{([^{}]*)\}").unwrap());

/// Regex matching `var(--name)` and `var(--name, fallback)`.
static CSS_VAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"var\(\s*(--[\w-]+)\s*(?:,\s*([^)]*))?\)").unwrap());

/// Regex splitting a length into number and unit.
static LENGTH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(-?[\d.]+)\s*(px|pt|em|rem|%|in)?$").unwrap());

/// Theme and utility classes shared by every generated slide.
const BUILTIN_CSS: &str = r#"
:root {
  --color-primary: #32CD32;
  --color-primary-foreground: #ffffff;
  --color-secondary: #D4AF37;
  --color-secondary-foreground: #1d1d1d;
  --color-accent: #2C1810;
  --color-accent-foreground: #ffffff;
  --color-surface: #1a1a1a;
  --color-surface-foreground: #f5f5f5;
  --color-muted: #2d2d2d;
  --color-muted-foreground: #a0a0a0;
  --color-border: #404040;
  --font-family-display: 'Arial Black', Arial, sans-serif;
  --font-family-content: Arial, sans-serif;
  --gap: 12px;
}

* { margin: 0; padding: 0; }
body { font-family: Arial, sans-serif; background-color: #1a1a1a; color: #f5f5f5; }
h1 { font-size: 32px; font-weight: bold; }
h2 { font-size: 24px; font-weight: bold; }
h3 { font-size: 19px; font-weight: bold; }
b { font-weight: bold; }
strong { font-weight: bold; }
em { font-style: italic; }
i { font-style: italic; }

.col { display: flex; flex-direction: column; }
.row { display: flex; flex-direction: row; align-items: center; }
.center { display: flex; align-items: center; justify-content: center; }
.fill-height { flex: 1; }
.fill-width { flex: 1; }
.fit { flex: none; }
.text-center { text-align: center; }
.text-left { text-align: left; }
.text-right { text-align: right; }

.bg-surface { background-color: #1a1a1a; }
.bg-primary { background-color: #32CD32; }
.bg-secondary { background-color: #D4AF37; }
.bg-muted { background-color: #2d2d2d; }
.bg-accent { background-color: #2C1810; }
.bg-border { background-color: #404040; }

.text-primary { color: #32CD32; }
.text-secondary { color: #D4AF37; }
.text-surface-foreground { color: #f5f5f5; }
.text-muted-foreground { color: #a0a0a0; }
.text-accent-foreground { color: #ffffff; }
.text-primary-foreground { color: #ffffff; }
.text-secondary-foreground { color: #1d1d1d; }

.text-xs { font-size: 12px; }
.text-sm { font-size: 14px; }
.text-base { font-size: 16px; }
.text-lg { font-size: 18px; }
.text-xl { font-size: 20px; }
.text-2xl { font-size: 24px; }
.text-3xl { font-size: 30px; }
.text-4xl { font-size: 36px; }
.text-5xl { font-size: 48px; }
.text-6xl { font-size: 60px; }
.text-7xl { font-size: 72px; }
.text-8xl { font-size: 96px; }
"#;

/// Browser default font size in px.
pub const DEFAULT_FONT_SIZE: f64 = 16.0;

/// Ordered property/value pairs.
pub type Declarations = Vec<(String, String)>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Selector {
    Universal,
    Tag(String),
    Class(String),
}

/// Rules and custom properties collected from the built-in theme and any
/// `<style>` blocks.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    rules: Vec<(Selector, Declarations)>,
    vars: HashMap<String, String>,
}

impl Stylesheet {
    /// An empty stylesheet.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in raid report theme.
    pub fn builtin() -> Self {
        let mut sheet = Self::new();
        sheet.add_css(BUILTIN_CSS);
        sheet
    }

    /// Parse CSS text and append its rules after the existing ones.
    pub fn add_css(&mut self, css: &str) {
        let css = CSS_COMMENT_REGEX.replace_all(css, "");

        for caps in CSS_RULE_REGEX.captures_iter(&css) {
            let declarations = parse_declarations(&caps[2]);

            for raw_selector in caps[1].split(',') {
                let selector = raw_selector.trim();
                if selector == ":root" || selector == "html" {
                    for (name, value) in &declarations {
                        if name.starts_with("--") {
                            self.vars.insert(name.clone(), value.clone());
                        }
                    }
                    continue;
                }
                if let Some(parsed) = parse_selector(selector) {
                    self.rules.push((parsed, declarations.clone()));
                } else {
                    log::debug!("Ignoring unsupported CSS selector '{}'", selector);
                }
            }
        }
    }

    /// Value of a custom property, if defined.
    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Replace `var()` references, using the fallback when a property is
    /// undefined. Nested references resolve up to a fixed depth.
    pub fn resolve_vars(&self, value: &str) -> String {
        let mut current = value.to_string();
        for _ in 0..4 {
            if !current.contains("var(") {
                break;
            }
            current = CSS_VAR_REGEX
                .replace_all(&current, |caps: &regex::Captures| {
                    self.vars
                        .get(&caps[1])
                        .cloned()
                        .or_else(|| caps.get(2).map(|m| m.as_str().trim().to_string()))
                        .unwrap_or_default()
                })
                .into_owned();
        }
        current
    }

    /// Declarations matching `element`, lowest precedence first: universal
    /// and tag rules, then class rules, then the inline `style` attribute.
    fn matching_declarations(&self, element: &Element) -> Declarations {
        let mut matched = Declarations::new();

        for (selector, declarations) in &self.rules {
            let hit = match selector {
                Selector::Universal => true,
                Selector::Tag(tag) => *tag == element.tag,
                Selector::Class(_) => false,
            };
            if hit {
                matched.extend(declarations.iter().cloned());
            }
        }
        for (selector, declarations) in &self.rules {
            if let Selector::Class(class) = selector {
                if element.has_class(class) {
                    matched.extend(declarations.iter().cloned());
                }
            }
        }
        if let Some(inline) = element.attr("style") {
            matched.extend(parse_declarations(inline));
        }

        matched
    }

    /// Compute the style of `element` given its parent's computed style.
    pub fn compute(&self, element: &Element, parent: &ComputedStyle) -> ComputedStyle {
        let mut style = parent.inherit_for(&element.tag);
        let declarations = self.matching_declarations(element);

        // Font size first so `em` lengths in the same block resolve against it.
        for (name, value) in declarations.iter().filter(|(n, _)| n == "font-size") {
            style.apply(name, &self.resolve_vars(value), parent.font_size);
        }
        for (name, value) in declarations.iter().filter(|(n, _)| n != "font-size") {
            style.apply(name, &self.resolve_vars(value), parent.font_size);
        }

        style
    }
}

fn parse_selector(selector: &str) -> Option<Selector> {
    if selector == "*" {
        return Some(Selector::Universal);
    }
    if let Some(class) = selector.strip_prefix('.') {
        if !class.is_empty() && class.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_') {
            return Some(Selector::Class(class.to_string()));
        }
        return None;
    }
    if !selector.is_empty() && selector.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Some(Selector::Tag(selector.to_ascii_lowercase()));
    }
    None
}

/// Parse `prop: value; prop: value` into ordered pairs.
///
/// Property names are lower-cased (custom properties keep their case) and
/// `!important` is dropped.
pub fn parse_declarations(block: &str) -> Declarations {
    block
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim();
            let name = if name.starts_with("--") {
                name.to_string()
            } else {
                name.to_ascii_lowercase()
            };
            let value = value.trim().trim_end_matches("!important").trim().to_string();
            if name.is_empty() || value.is_empty() {
                None
            } else {
                Some((name, value))
            }
        })
        .collect()
}

/// A CSS length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Px(f64),
    Percent(f64),
}

impl Length {
    /// Resolve against the containing block size.
    pub fn resolve(&self, container: f64) -> f64 {
        match self {
            Length::Px(px) => *px,
            Length::Percent(pct) => container * pct / 100.0,
        }
    }
}

/// Parse a CSS length. `em` resolves against `font_size`; `rem` against the
/// browser default.
pub fn parse_length(value: &str, font_size: f64) -> Option<Length> {
    let value = value.trim();
    if value == "0" {
        return Some(Length::Px(0.0));
    }
    let caps = LENGTH_REGEX.captures(value)?;
    let number: f64 = caps[1].parse().ok()?;
    let length = match caps.get(2).map(|m| m.as_str()) {
        Some("px") | None => Length::Px(number),
        Some("pt") => Length::Px(number * 96.0 / 72.0),
        Some("in") => Length::Px(number * 96.0),
        Some("em") => Length::Px(number * font_size),
        Some("rem") => Length::Px(number * DEFAULT_FONT_SIZE),
        Some("%") => Length::Percent(number),
        Some(_) => return None,
    };
    Some(length)
}

fn parse_px(value: &str, font_size: f64) -> Option<f64> {
    match parse_length(value, font_size)? {
        Length::Px(px) => Some(px),
        Length::Percent(_) => None,
    }
}

/// Top, right, bottom, left.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }

    /// Parse the one to four value shorthand; `auto` counts as zero.
    fn parse_shorthand(value: &str, font_size: f64) -> Option<Self> {
        let parts: Vec<f64> = value
            .split_whitespace()
            .map(|p| if p == "auto" { Some(0.0) } else { parse_px(p, font_size) })
            .collect::<Option<Vec<_>>>()?;
        let edges = match parts.as_slice() {
            [all] => Self { top: *all, right: *all, bottom: *all, left: *all },
            [v, h] => Self { top: *v, right: *h, bottom: *v, left: *h },
            [t, h, b] => Self { top: *t, right: *h, bottom: *b, left: *h },
            [t, r, b, l] => Self { top: *t, right: *r, bottom: *b, left: *l },
            _ => return None,
        };
        Some(edges)
    }
}

/// One border side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Border {
    pub width: f64,
    pub color: Color,
}

/// Parse `8px solid #32CD32`. Returns `None` for `none` or zero width;
/// a missing color falls back to `current_color`.
fn parse_border(value: &str, font_size: f64, current_color: Option<Color>) -> Option<Border> {
    let mut width = None;
    let mut color = None;
    let mut visible = true;

    for token in value.split_whitespace() {
        match token {
            "none" | "hidden" => visible = false,
            "solid" | "dashed" | "dotted" | "double" => {}
            "thin" => width = Some(1.0),
            "medium" => width = Some(3.0),
            "thick" => width = Some(5.0),
            _ => {
                if let Some(px) = parse_px(token, font_size) {
                    width = Some(px);
                } else if let Some(c) = Color::parse(token) {
                    color = Some(c);
                }
            }
        }
    }

    let width = width.unwrap_or(3.0);
    if !visible || width <= 0.0 {
        return None;
    }
    Some(Border {
        width,
        color: color.or(current_color)?,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Display {
    #[default]
    Block,
    Inline,
    Flex,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlexDirection {
    #[default]
    Row,
    Column,
}

/// Alignment along either flex axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Start,
    Center,
    End,
    Stretch,
    SpaceBetween,
}

impl Align {
    fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "flex-start" | "start" | "left" | "top" | "normal" => Some(Self::Start),
            "center" => Some(Self::Center),
            "flex-end" | "end" | "right" | "bottom" => Some(Self::End),
            "stretch" => Some(Self::Stretch),
            "space-between" | "space-around" | "space-evenly" => Some(Self::SpaceBetween),
            _ => None,
        }
    }
}

/// Resolved style of one element.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedStyle {
    // Inherited.
    pub color: Option<Color>,
    pub font_size: f64,
    pub bold: bool,
    pub italic: bool,
    pub text_align: TextAlign,
    pub uppercase: bool,
    pub font_family: Option<String>,
    pub line_height: f64,

    // Not inherited.
    pub display: Display,
    pub flex_direction: FlexDirection,
    pub flex_grow: f64,
    pub width: Option<Length>,
    pub height: Option<f64>,
    pub margin: Edges,
    pub padding: Edges,
    pub border_top: Option<Border>,
    pub border_right: Option<Border>,
    pub border_bottom: Option<Border>,
    pub border_left: Option<Border>,
    pub background: Option<Color>,
    pub gap: f64,
    pub align_items: Align,
    pub justify_content: Align,
    pub absolute: bool,
    pub top: Option<f64>,
    pub right: Option<f64>,
    pub bottom: Option<f64>,
    pub left: Option<f64>,
    pub object_fit_contain: bool,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            color: None,
            font_size: DEFAULT_FONT_SIZE,
            bold: false,
            italic: false,
            text_align: TextAlign::Left,
            uppercase: false,
            font_family: None,
            line_height: 1.2,
            display: Display::Block,
            flex_direction: FlexDirection::Row,
            flex_grow: 0.0,
            width: None,
            height: None,
            margin: Edges::default(),
            padding: Edges::default(),
            border_top: None,
            border_right: None,
            border_bottom: None,
            border_left: None,
            background: None,
            gap: 0.0,
            align_items: Align::Stretch,
            justify_content: Align::Start,
            absolute: false,
            top: None,
            right: None,
            bottom: None,
            left: None,
            object_fit_contain: false,
        }
    }
}

/// Elements that flow inline by default.
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "br", "code", "em", "i", "img", "small", "span", "strong", "sub", "sup", "u",
];

impl ComputedStyle {
    /// A child style: inherited properties copied, the rest reset.
    pub(crate) fn inherit_for(&self, tag: &str) -> Self {
        Self {
            color: self.color,
            font_size: self.font_size,
            bold: self.bold,
            italic: self.italic,
            text_align: self.text_align,
            uppercase: self.uppercase,
            font_family: self.font_family.clone(),
            line_height: self.line_height,
            display: if INLINE_TAGS.contains(&tag) {
                Display::Inline
            } else {
                Display::Block
            },
            ..Self::default()
        }
    }

    pub fn is_flex(&self) -> bool {
        self.display == Display::Flex
    }

    pub fn is_inline(&self) -> bool {
        self.display == Display::Inline
    }

    /// Border widths as edges.
    pub fn border_widths(&self) -> Edges {
        let width = |b: &Option<Border>| b.map(|b| b.width).unwrap_or(0.0);
        Edges {
            top: width(&self.border_top),
            right: width(&self.border_right),
            bottom: width(&self.border_bottom),
            left: width(&self.border_left),
        }
    }

    /// Apply one declaration. Unknown properties are ignored.
    fn apply(&mut self, name: &str, value: &str, parent_font_size: f64) {
        let value = value.trim();
        let fs = self.font_size;

        match name {
            "display" => {
                self.display = match value {
                    "flex" | "inline-flex" => Display::Flex,
                    "inline" => Display::Inline,
                    "none" => Display::None,
                    // inline-block and friends lay out as blocks
                    _ => Display::Block,
                }
            }
            "flex-direction" => {
                self.flex_direction = if value.starts_with("column") {
                    FlexDirection::Column
                } else {
                    FlexDirection::Row
                }
            }
            "flex" => {
                self.flex_grow = match value {
                    "none" => 0.0,
                    "auto" => 1.0,
                    _ => value
                        .split_whitespace()
                        .next()
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(0.0),
                }
            }
            "flex-grow" => self.flex_grow = value.parse().unwrap_or(0.0),
            "width" => self.width = parse_length(value, fs),
            "height" => self.height = parse_px(value, fs),
            "margin" => {
                if let Some(edges) = Edges::parse_shorthand(value, fs) {
                    self.margin = edges;
                }
            }
            "margin-top" => self.margin.top = parse_px(value, fs).unwrap_or(0.0),
            "margin-right" => self.margin.right = parse_px(value, fs).unwrap_or(0.0),
            "margin-bottom" => self.margin.bottom = parse_px(value, fs).unwrap_or(0.0),
            "margin-left" => self.margin.left = parse_px(value, fs).unwrap_or(0.0),
            "padding" => {
                if let Some(edges) = Edges::parse_shorthand(value, fs) {
                    self.padding = edges;
                }
            }
            "padding-top" => self.padding.top = parse_px(value, fs).unwrap_or(0.0),
            "padding-right" => self.padding.right = parse_px(value, fs).unwrap_or(0.0),
            "padding-bottom" => self.padding.bottom = parse_px(value, fs).unwrap_or(0.0),
            "padding-left" => self.padding.left = parse_px(value, fs).unwrap_or(0.0),
            "border" => {
                let border = parse_border(value, fs, self.color);
                self.border_top = border;
                self.border_right = border;
                self.border_bottom = border;
                self.border_left = border;
            }
            "border-top" => self.border_top = parse_border(value, fs, self.color),
            "border-right" => self.border_right = parse_border(value, fs, self.color),
            "border-bottom" => self.border_bottom = parse_border(value, fs, self.color),
            "border-left" => self.border_left = parse_border(value, fs, self.color),
            "background" | "background-color" => {
                // `background` may carry more than a color; take the first token that is one.
                self.background = Color::parse(value)
                    .or_else(|| value.split_whitespace().find_map(Color::parse));
            }
            "color" => {
                if let Some(color) = Color::parse(value) {
                    self.color = Some(color);
                }
            }
            "font-size" => {
                if let Some(px) = parse_length(value, parent_font_size).map(|l| match l {
                    Length::Px(px) => px,
                    Length::Percent(pct) => parent_font_size * pct / 100.0,
                }) {
                    self.font_size = px;
                }
            }
            "font-weight" => {
                self.bold = match value {
                    "bold" | "bolder" => true,
                    "normal" | "lighter" => false,
                    _ => value.parse::<u32>().map(|w| w >= 600).unwrap_or(self.bold),
                }
            }
            "font-style" => self.italic = value == "italic" || value == "oblique",
            "font-family" => {
                self.font_family = value
                    .split(',')
                    .next()
                    .map(|f| f.trim().trim_matches(|c| c == '\'' || c == '"').to_string())
                    .filter(|f| !f.is_empty() && f != "sans-serif" && f != "serif");
            }
            "text-align" => {
                self.text_align = match value {
                    "center" => TextAlign::Center,
                    "right" | "end" => TextAlign::Right,
                    _ => TextAlign::Left,
                }
            }
            "text-transform" => self.uppercase = value == "uppercase",
            "line-height" => {
                if let Ok(multiplier) = value.parse::<f64>() {
                    self.line_height = multiplier;
                } else if let Some(px) = parse_px(value, fs) {
                    if fs > 0.0 {
                        self.line_height = px / fs;
                    }
                }
            }
            "gap" => {
                let first = value.split_whitespace().next();
                self.gap = first.and_then(|v| parse_px(v, fs)).unwrap_or(0.0);
            }
            "align-items" => self.align_items = Align::parse(value).unwrap_or(Align::Stretch),
            "justify-content" => self.justify_content = Align::parse(value).unwrap_or(Align::Start),
            "position" => self.absolute = value == "absolute" || value == "fixed",
            "top" => self.top = parse_px(value, fs),
            "right" => self.right = parse_px(value, fs),
            "bottom" => self.bottom = parse_px(value, fs),
            "left" => self.left = parse_px(value, fs),
            "object-fit" => self.object_fit_contain = value == "contain",
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn body_of(html: &str) -> Element {
        Document::parse(html).unwrap().body().unwrap().clone()
    }

    #[test]
    fn test_parse_declarations() {
        let decls =
            parse_declarations("margin: 0 0 20px 0; font-weight: bold !important; --gap: 12px;");
        assert_eq!(
            decls,
            vec![
                ("margin".to_string(), "0 0 20px 0".to_string()),
                ("font-weight".to_string(), "bold".to_string()),
                ("--gap".to_string(), "12px".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_length() {
        assert_eq!(parse_length("20px", 16.0), Some(Length::Px(20.0)));
        assert_eq!(parse_length("0", 16.0), Some(Length::Px(0.0)));
        assert_eq!(parse_length("1.5em", 20.0), Some(Length::Px(30.0)));
        assert_eq!(parse_length("12pt", 16.0), Some(Length::Px(16.0)));
        assert_eq!(parse_length("50%", 16.0), Some(Length::Percent(50.0)));
        assert_eq!(parse_length("auto", 16.0), None);
    }

    #[test]
    fn test_edges_shorthand() {
        let edges = Edges::parse_shorthand("10px 16px", 16.0).unwrap();
        assert_eq!((edges.top, edges.right, edges.bottom, edges.left), (10.0, 16.0, 10.0, 16.0));

        let edges = Edges::parse_shorthand("0 0 8px 0", 16.0).unwrap();
        assert_eq!(edges.bottom, 8.0);
        assert_eq!(edges.vertical(), 8.0);
    }

    #[test]
    fn test_resolve_vars_with_fallback() {
        let sheet = Stylesheet::builtin();
        assert_eq!(sheet.resolve_vars("8px solid var(--color-primary)"), "8px solid #32CD32");
        assert_eq!(sheet.resolve_vars("var(--missing, #fff)"), "#fff");
    }

    #[test]
    fn test_class_rules_override_tag_rules_and_inline_wins() {
        let sheet = Stylesheet::builtin();
        let body = body_of(
            r#"<body><h1 class="text-5xl text-primary" style="margin: 0; font-weight: normal;">X</h1></body>"#,
        );
        let body_style = sheet.compute(&body, &ComputedStyle::default());
        let h1 = body.find("h1").unwrap();
        let style = sheet.compute(h1, &body_style);

        assert_eq!(style.font_size, 48.0);
        assert_eq!(style.color, Color::parse("#32CD32"));
        assert!(!style.bold);
    }

    #[test]
    fn test_inherited_and_reset_properties() {
        let sheet = Stylesheet::builtin();
        let body = body_of(
            r#"<body class="col bg-surface center"><div class="text-2xl"><span>t</span></div></body>"#,
        );
        let body_style = sheet.compute(&body, &ComputedStyle::default());
        assert!(body_style.is_flex());
        assert_eq!(body_style.flex_direction, FlexDirection::Column);
        assert_eq!(body_style.align_items, Align::Center);
        assert_eq!(body_style.justify_content, Align::Center);
        assert_eq!(body_style.color, Color::parse("#f5f5f5"));

        let div = body.find("div").unwrap();
        let div_style = sheet.compute(div, &body_style);
        assert_eq!(div_style.background, None);
        assert_eq!(div_style.color, body_style.color);
        assert_eq!(div_style.font_size, 24.0);

        let span_style = sheet.compute(div.find("span").unwrap(), &div_style);
        assert!(span_style.is_inline());
        assert_eq!(span_style.font_size, 24.0);
    }

    #[test]
    fn test_border_left_with_var() {
        let sheet = Stylesheet::builtin();
        let body = body_of(
            r#"<body><div style="border-left: 8px solid var(--color-secondary);"></div></body>"#,
        );
        let div = body.find("div").unwrap();
        let style = sheet.compute(div, &ComputedStyle::default());

        let border = style.border_left.unwrap();
        assert_eq!(border.width, 8.0);
        assert_eq!(border.color, Color::rgb(0xD4, 0xAF, 0x37));
        assert_eq!(style.border_widths().left, 8.0);
        assert!(style.border_top.is_none());
    }

    #[test]
    fn test_style_block_rules_and_root_vars() {
        let mut sheet = Stylesheet::builtin();
        sheet.add_css(
            ":root { --color-primary: #ff0000; } /* c */
            .callout, .note { padding: 4px; }
            .a > .b { color: blue; }",
        );

        assert_eq!(sheet.var("--color-primary"), Some("#ff0000"));
        let body = body_of(r#"<body><div class="note"></div></body>"#);
        let style = sheet.compute(body.find("div").unwrap(), &ComputedStyle::default());
        assert_eq!(style.padding.left, 4.0);
    }

    #[test]
    fn test_display_keywords() {
        let sheet = Stylesheet::builtin();
        let body = body_of(
            r#"<body>
                <span style="display: inline-block;"></span>
                <div style="display: inline;"></div>
                <div style="display: inline-flex;"></div>
                <div style="display: none;"></div>
            </body>"#,
        );
        let displays: Vec<Display> = body
            .child_elements()
            .map(|e| sheet.compute(e, &ComputedStyle::default()).display)
            .collect();

        assert_eq!(
            displays,
            vec![Display::Block, Display::Inline, Display::Flex, Display::None]
        );
    }

    #[test]
    fn test_flex_shorthand() {
        let sheet = Stylesheet::builtin();
        let body = body_of(
            r#"<body><div class="fill-height"></div><div style="flex: 2;"></div><div class="fit"></div></body>"#,
        );
        let grows: Vec<f64> = body
            .child_elements()
            .map(|e| sheet.compute(e, &ComputedStyle::default()).flex_grow)
            .collect();
        assert_eq!(grows, vec![1.0, 2.0, 0.0]);
    }
}
