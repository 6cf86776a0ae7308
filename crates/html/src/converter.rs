//! [`SlideConverter`] for HTML slide fragments.

use deck_core::{Deck, Error, Result, Slide, SlideConverter, TextCleaner};
use std::borrow::Cow;
use std::path::Path;

use crate::dom::Document;
use crate::layout::layout_body;
use crate::style::Stylesheet;

/// Converts one HTML fragment into one slide.
#[derive(Debug, Clone, Default)]
pub struct HtmlConverter {
    cleaner: TextCleaner,
}

impl HtmlConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom text cleaner.
    pub fn with_cleaner(mut self, cleaner: TextCleaner) -> Self {
        self.cleaner = cleaner;
        self
    }

    /// Convert HTML text as if it had been read from `source`.
    ///
    /// Relative image paths resolve against the directory of `source`.
    pub fn convert_str(&self, html: &str, source: &Path, deck: &mut Deck) -> Result<()> {
        let document = Document::parse(html).map_err(|message| Error::HtmlParse {
            path: source.to_path_buf(),
            message,
        })?;
        let body = document.body().ok_or_else(|| Error::HtmlParse {
            path: source.to_path_buf(),
            message: "document has no <body>".to_string(),
        })?;

        let mut sheet = Stylesheet::builtin();
        for css in document.style_blocks() {
            sheet.add_css(&css);
        }

        let base_dir = source.parent().unwrap_or_else(|| Path::new("."));
        let mut slide = Slide::from_source(source);
        layout_body(body, &sheet, &self.cleaner, deck.layout, base_dir, &mut slide).map_err(
            |e| match e {
                Error::LayoutError(message) => {
                    Error::LayoutError(format!("{}: {}", source.display(), message))
                }
                other => other,
            },
        )?;

        if deck.title.is_none() {
            deck.title = document.title().map(|t| self.cleaner.clean_inline(&t));
        }

        let shape_count = slide.shapes.len();
        let number = deck.add_slide(slide).number;
        log::info!(
            "Converted {} into slide {} ({} shapes)",
            source.display(),
            number,
            shape_count
        );

        Ok(())
    }
}

impl SlideConverter for HtmlConverter {
    fn convert(&self, source: &Path, deck: &mut Deck) -> Result<()> {
        let bytes = std::fs::read(source).map_err(|e| Error::SlideSource {
            path: source.to_path_buf(),
            source: e,
        })?;
        let html = decode_html(&bytes);
        self.convert_str(&html, source, deck)
    }
}

/// Decode a fragment as UTF-8, falling back to Windows-1252.
fn decode_html(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(_) => {
            log::debug!("Slide source is not UTF-8; decoding as Windows-1252");
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            text
        }
    }
}
