//! Domain types for an in-memory slide deck.

use crate::color::Color;
use crate::error::{Error, Result};
use crate::units::{Frame, EMU_PER_INCH};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A presentation under construction.
///
/// Slides are appended in order by a converter and the whole deck is
/// serialized once by a writer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deck {
    /// Slide size preset.
    pub layout: SlideLayout,

    /// Document title written to the package properties.
    pub title: Option<String>,

    /// Document author written to the package properties.
    pub author: Option<String>,

    /// Slides in presentation order.
    pub slides: Vec<Slide>,
}

impl Deck {
    /// Create an empty deck with the given slide size.
    pub fn new(layout: SlideLayout) -> Self {
        Self {
            layout,
            title: None,
            author: None,
            slides: Vec::new(),
        }
    }

    /// Set the document title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the document author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Append a slide, numbering it after the slides already present.
    pub fn add_slide(&mut self, mut slide: Slide) -> &mut Slide {
        slide.number = self.slides.len() + 1;
        self.slides.push(slide);
        let last = self.slides.len() - 1;
        &mut self.slides[last]
    }

    /// Number of slides added so far.
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Slide width and height in EMUs.
    pub fn dimensions(&self) -> (i64, i64) {
        self.layout.dimensions()
    }
}

/// Named slide size presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SlideLayout {
    /// 10 x 5.625 inches.
    #[default]
    Widescreen16x9,
    /// 10 x 6.25 inches.
    Widescreen16x10,
    /// 10 x 7.5 inches.
    Standard4x3,
    /// 13 1/3 x 7.5 inches.
    Wide,
}

impl SlideLayout {
    /// Look up a preset by its presentation-library name, e.g. `LAYOUT_16x9`.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "LAYOUT_16X9" => Ok(Self::Widescreen16x9),
            "LAYOUT_16X10" => Ok(Self::Widescreen16x10),
            "LAYOUT_4X3" => Ok(Self::Standard4x3),
            "LAYOUT_WIDE" => Ok(Self::Wide),
            _ => Err(Error::UnsupportedLayout(name.to_string())),
        }
    }

    /// The preset's presentation-library name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Widescreen16x9 => "LAYOUT_16x9",
            Self::Widescreen16x10 => "LAYOUT_16x10",
            Self::Standard4x3 => "LAYOUT_4x3",
            Self::Wide => "LAYOUT_WIDE",
        }
    }

    /// Width and height in EMUs.
    pub fn dimensions(&self) -> (i64, i64) {
        match self {
            Self::Widescreen16x9 => (9_144_000, 5_143_500),
            Self::Widescreen16x10 => (9_144_000, 5_715_000),
            Self::Standard4x3 => (9_144_000, 6_858_000),
            Self::Wide => (12_192_000, 6_858_000),
        }
    }

    /// Width and height in inches.
    pub fn inches(&self) -> (f64, f64) {
        let (w, h) = self.dimensions();
        (w as f64 / EMU_PER_INCH as f64, h as f64 / EMU_PER_INCH as f64)
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f64 {
        let (w, h) = self.inches();
        w / h
    }
}

/// A single slide.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Slide {
    /// 1-based position in the deck; assigned by [`Deck::add_slide`].
    pub number: usize,

    /// The fragment file this slide was converted from.
    pub source: Option<PathBuf>,

    /// Solid background fill.
    pub background: Option<Color>,

    /// Shapes in z-order (first is bottom-most).
    pub shapes: Vec<Shape>,
}

impl Slide {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a slide remembering which fragment produced it.
    pub fn from_source(source: impl Into<PathBuf>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::default()
        }
    }

    pub fn add_shape(&mut self, shape: impl Into<Shape>) {
        self.shapes.push(shape.into());
    }

    /// Text boxes on this slide, in z-order.
    pub fn text_boxes(&self) -> impl Iterator<Item = &TextBox> {
        self.shapes.iter().filter_map(|s| match s {
            Shape::Text(t) => Some(t),
            _ => None,
        })
    }

    /// Plain text of every text box, one entry per box.
    pub fn texts(&self) -> Vec<String> {
        self.text_boxes().map(TextBox::plain_text).collect()
    }
}

/// Anything that can be placed on a slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Shape {
    Text(TextBox),
    Rect(RectShape),
    Picture(Picture),
}

impl Shape {
    pub fn frame(&self) -> Frame {
        match self {
            Shape::Text(t) => t.frame,
            Shape::Rect(r) => r.frame,
            Shape::Picture(p) => p.frame,
        }
    }
}

impl From<TextBox> for Shape {
    fn from(value: TextBox) -> Self {
        Shape::Text(value)
    }
}

impl From<RectShape> for Shape {
    fn from(value: RectShape) -> Self {
        Shape::Rect(value)
    }
}

impl From<Picture> for Shape {
    fn from(value: Picture) -> Self {
        Shape::Picture(value)
    }
}

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Vertical anchoring of text inside its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VerticalAnchor {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// A text box made of paragraphs of formatted runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextBox {
    pub frame: Frame,
    pub paragraphs: Vec<Paragraph>,
    pub anchor: VerticalAnchor,
}

impl TextBox {
    pub fn new(frame: Frame) -> Self {
        Self {
            frame,
            ..Self::default()
        }
    }

    pub fn add_paragraph(&mut self, paragraph: Paragraph) {
        self.paragraphs.push(paragraph);
    }

    /// Concatenated text, paragraphs separated by newlines.
    pub fn plain_text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_blank(&self) -> bool {
        self.paragraphs.iter().all(|p| p.plain_text().trim().is_empty())
    }
}

/// One paragraph of a text box.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Paragraph {
    pub runs: Vec<TextRun>,
    pub align: TextAlign,
}

impl Paragraph {
    pub fn new(align: TextAlign) -> Self {
        Self {
            runs: Vec::new(),
            align,
        }
    }

    pub fn push(&mut self, run: TextRun) {
        self.runs.push(run);
    }

    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// A run of text sharing one character format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,

    /// Font size in points.
    pub size_pt: f64,

    pub bold: bool,
    pub italic: bool,
    pub color: Option<Color>,
    pub font_face: Option<String>,

    /// External hyperlink target.
    pub link: Option<String>,
}

impl TextRun {
    pub fn new(text: impl Into<String>, size_pt: f64) -> Self {
        Self {
            text: text.into(),
            size_pt,
            bold: false,
            italic: false,
            color: None,
            font_face: None,
            link: None,
        }
    }
}

/// A filled rectangle without text (panels, accent bars).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RectShape {
    pub frame: Frame,
    pub fill: Color,
}

impl RectShape {
    pub fn new(frame: Frame, fill: Color) -> Self {
        Self { frame, fill }
    }
}

/// Raster formats that can be embedded in a package as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
}

impl ImageFormat {
    /// Detect an embeddable format from the file's magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"GIF8") {
            Some(Self::Gif)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
        }
    }
}

/// An embedded raster image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Picture {
    pub frame: Frame,
    pub data: Vec<u8>,
    pub format: ImageFormat,

    /// Alternative text.
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_slide_numbers_in_order() {
        let mut deck = Deck::new(SlideLayout::Widescreen16x9);
        deck.add_slide(Slide::from_source("a.html"));
        deck.add_slide(Slide::from_source("b.html"));

        assert_eq!(deck.slide_count(), 2);
        assert_eq!(deck.slides[0].number, 1);
        assert_eq!(deck.slides[1].number, 2);
        assert_eq!(deck.slides[1].source, Some(PathBuf::from("b.html")));
    }

    #[test]
    fn test_layout_from_name() {
        assert_eq!(
            SlideLayout::from_name("LAYOUT_16x9").unwrap(),
            SlideLayout::Widescreen16x9
        );
        assert_eq!(SlideLayout::from_name("layout_wide").unwrap(), SlideLayout::Wide);
        assert!(SlideLayout::from_name("LAYOUT_CUSTOM").is_err());
    }

    #[test]
    fn test_widescreen_dimensions() {
        let (w, h) = SlideLayout::Widescreen16x9.dimensions();
        assert_eq!(w, 9_144_000);
        assert_eq!(h, 5_143_500);
        assert!((SlideLayout::Widescreen16x9.aspect_ratio() - 16.0 / 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_wide_layout_uses_standard_size() {
        assert_eq!(SlideLayout::Wide.dimensions(), (12_192_000, 6_858_000));
        let (w, h) = SlideLayout::Wide.inches();
        assert!((w - 40.0 / 3.0).abs() < 1e-9);
        assert_eq!(h, 7.5);
        assert_eq!(SlideLayout::Standard4x3.dimensions(), (9_144_000, 6_858_000));
    }

    #[test]
    fn test_image_format_from_magic() {
        assert_eq!(
            ImageFormat::from_magic(&[0x89, b'P', b'N', b'G', 0x0D]),
            Some(ImageFormat::Png)
        );
        assert_eq!(
            ImageFormat::from_magic(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(ImageFormat::from_magic(b"RIFF\0\0\0\0WEBP"), None);
    }

    #[test]
    fn test_text_box_plain_text() {
        let mut text_box = TextBox::new(Frame::default());
        let mut first = Paragraph::new(TextAlign::Left);
        first.push(TextRun::new("Boss ", 12.0));
        first.push(TextRun::new("Breakdown", 12.0));
        text_box.add_paragraph(first);
        let mut second = Paragraph::new(TextAlign::Center);
        second.push(TextRun::new("3 Kills", 10.5));
        text_box.add_paragraph(second);

        assert_eq!(text_box.plain_text(), "Boss Breakdown\n3 Kills");
        assert!(!text_box.is_blank());
    }
}
