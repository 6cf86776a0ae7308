//! PPTX read-back for inspecting written decks.

use deck_core::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::ZipArchive;

/// What a PPTX package contains, as seen by a reader.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeckSummary {
    /// Slide width in EMUs.
    pub slide_width: i64,

    /// Slide height in EMUs.
    pub slide_height: i64,

    /// Slides in presentation order.
    pub slides: Vec<SlideSummary>,
}

impl DeckSummary {
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }
}

/// Text found on one slide.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SlideSummary {
    /// 1-based position in the deck.
    pub number: usize,

    /// Archive path of the slide part.
    pub part: String,

    /// Text of each shape, in reading order (top-to-bottom, left-to-right).
    pub texts: Vec<String>,
}

impl SlideSummary {
    /// All shape texts joined with newlines.
    pub fn full_text(&self) -> String {
        self.texts.join("\n")
    }
}

/// Reader for PPTX (Office Open XML) packages.
pub struct PptxReader;

impl PptxReader {
    /// Create a new PPTX reader.
    pub fn new() -> Self {
        Self
    }

    /// Read a PPTX package from a reader.
    pub fn read<R: Read + Seek>(&self, reader: R) -> Result<DeckSummary> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let presentation = self.read_file_from_archive(&mut archive, "ppt/presentation.xml")?;
        let (slide_width, slide_height, slide_rel_ids) = self.parse_presentation(&presentation)?;

        let rels = self.read_file_from_archive(&mut archive, "ppt/_rels/presentation.xml.rels")?;
        let targets = self.parse_relationships(&rels)?;

        let mut summary = DeckSummary {
            slide_width,
            slide_height,
            slides: Vec::with_capacity(slide_rel_ids.len()),
        };

        for (idx, rel_id) in slide_rel_ids.iter().enumerate() {
            let target = targets.get(rel_id).ok_or_else(|| {
                Error::XmlError(format!("Slide relationship '{}' has no target", rel_id))
            })?;
            let part = if let Some(absolute) = target.strip_prefix('/') {
                absolute.to_string()
            } else {
                format!("ppt/{}", target)
            };
            let slide = self.read_slide(&mut archive, &part, idx + 1)?;
            summary.slides.push(slide);
        }

        Ok(summary)
    }

    /// Pull the slide size and ordered slide relationship IDs out of
    /// `presentation.xml`.
    fn parse_presentation(&self, xml: &str) -> Result<(i64, i64, Vec<String>)> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut width = 0;
        let mut height = 0;
        let mut rel_ids = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    match local_name(e.name().as_ref()) {
                        b"sldId" => {
                            if let Some(id) = attribute(e, b"r:id") {
                                rel_ids.push(id);
                            }
                        }
                        b"sldSz" => {
                            width = attribute(e, b"cx").and_then(|v| v.parse().ok()).unwrap_or(0);
                            height = attribute(e, b"cy").and_then(|v| v.parse().ok()).unwrap_or(0);
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!("Error parsing presentation: {}", e)));
                }
                _ => {}
            }
        }

        Ok((width, height, rel_ids))
    }

    /// Map relationship IDs to targets for every slide relationship.
    fn parse_relationships(&self, xml: &str) -> Result<HashMap<String, String>> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);
        let mut targets = HashMap::new();

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let rel_type = attribute(e, b"Type").unwrap_or_default();
                    // Only slides; "/slideMaster" and "/slideLayout" share the prefix.
                    if rel_type.ends_with("/slide") {
                        let id = attribute(e, b"Id");
                        if let (Some(id), Some(target)) = (id, attribute(e, b"Target")) {
                            targets.insert(id, target);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error parsing relationships: {}",
                        e
                    )));
                }
                _ => {}
            }
        }

        Ok(targets)
    }

    /// Read a single slide part from the archive.
    fn read_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        part: &str,
        number: usize,
    ) -> Result<SlideSummary> {
        let content = self.read_file_from_archive(archive, part)?;
        let mut shapes = self.extract_shapes_from_xml(&content)?;

        shapes.sort_by(|a, b| a.y.cmp(&b.y).then(a.x.cmp(&b.x)));

        Ok(SlideSummary {
            number,
            part: part.to_string(),
            texts: shapes.into_iter().map(|s| s.text).collect(),
        })
    }

    /// Extract shapes with text and position from slide XML.
    fn extract_shapes_from_xml(&self, xml_content: &str) -> Result<Vec<ShapeInfo>> {
        let mut shapes = Vec::new();
        let mut reader = Reader::from_str(xml_content);
        // Run text keeps its edge spaces; "Boss " + "Breakdown" must not fuse.
        reader.trim_text(false);

        let mut current_shape: Option<ShapeInfo> = None;
        let mut in_text = false;
        let mut current_text = String::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                    b"sp" | b"pic" => {
                        current_shape = Some(ShapeInfo::default());
                        current_text.clear();
                    }
                    b"off" => read_offset(e, current_shape.as_mut()),
                    b"p" if current_shape.is_some() => {
                        if !current_text.is_empty() {
                            current_text.push('\n');
                        }
                    }
                    b"t" => in_text = true,
                    _ => {}
                },
                Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                    b"off" => read_offset(e, current_shape.as_mut()),
                    b"br" if current_shape.is_some() => current_text.push('\n'),
                    _ => {}
                },
                Ok(Event::Text(ref e)) => {
                    if in_text {
                        let text = e
                            .unescape()
                            .map_err(|err| Error::XmlError(format!("Bad slide text: {}", err)))?;
                        current_text.push_str(&text);
                    }
                }
                Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                    b"sp" | b"pic" => {
                        if let Some(mut shape) = current_shape.take() {
                            shape.text = current_text.trim().to_string();
                            if !shape.text.is_empty() {
                                shapes.push(shape);
                            }
                        }
                        current_text.clear();
                    }
                    b"t" => in_text = false,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!("Error parsing slide: {}", e)));
                }
                _ => {}
            }
        }

        Ok(shapes)
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for PptxReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Information about a shape extracted from XML.
#[derive(Debug, Default)]
struct ShapeInfo {
    text: String,
    x: i64,
    y: i64,
    positioned: bool,
}

/// Record the first `a:off` seen inside a shape as its position.
fn read_offset(e: &BytesStart, shape: Option<&mut ShapeInfo>) {
    if let Some(shape) = shape.filter(|s| !s.positioned) {
        shape.positioned = true;
        if let Some(x) = attribute(e, b"x").and_then(|v| v.parse().ok()) {
            shape.x = x;
        }
        if let Some(y) = attribute(e, b"y").and_then(|v| v.parse().ok()) {
            shape.y = y;
        }
    }
}

/// Value of the attribute with exactly this qualified name.
fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PptxWriter;
    use deck_core::{Deck, Frame, Paragraph, Slide, SlideLayout, TextAlign, TextBox, TextRun};
    use std::io::Cursor;

    fn text_box(text: &str, x: i64, y: i64) -> TextBox {
        let mut text_box = TextBox::new(Frame::new(x, y, 1_000_000, 300_000));
        let mut paragraph = Paragraph::new(TextAlign::Left);
        for word in text.split_inclusive(' ') {
            paragraph.push(TextRun::new(word, 14.0));
        }
        text_box.add_paragraph(paragraph);
        text_box
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_round_trip_keeps_order_and_reading_order() {
        let mut deck = Deck::new(SlideLayout::Widescreen16x9);
        for title in ["Title", "Overview", "Closing"] {
            let mut slide = Slide::new();
            // Added bottom-first; the reader sorts top-to-bottom.
            slide.add_shape(text_box("Data from WarcraftLogs", 0, 4_000_000));
            slide.add_shape(text_box(title, 0, 100_000));
            deck.add_slide(slide);
        }

        let cursor = PptxWriter::new()
            .write(&deck, Cursor::new(Vec::new()))
            .unwrap();
        let summary = PptxReader::new()
            .read(Cursor::new(cursor.into_inner()))
            .unwrap();

        assert_eq!(summary.slide_count(), 3);
        assert_eq!(summary.slide_width, 9_144_000);
        assert_eq!(summary.slide_height, 5_143_500);
        let titles: Vec<&str> = summary.slides.iter().map(|s| s.texts[0].as_str()).collect();
        assert_eq!(titles, vec!["Title", "Overview", "Closing"]);
        assert_eq!(summary.slides[1].texts[1], "Data from WarcraftLogs");
        assert_eq!(summary.slides[2].part, "ppt/slides/slide3.xml");
        assert_eq!(summary.slides[0].full_text(), "Title\nData from WarcraftLogs");
    }

    #[test]
    fn test_shape_position_comes_from_first_offset() {
        let xml = r#"<p:sld xmlns:p="p" xmlns:a="a"><p:cSld><p:spTree>
            <p:sp><p:spPr><a:xfrm><a:off x="0" y="4000000"/></a:xfrm></p:spPr>
                <p:txBody><a:p><a:r><a:t>Footer</a:t></a:r></a:p></p:txBody>
                <a:xfrm><a:off x="0" y="0"/></a:xfrm></p:sp>
            <p:sp><p:spPr><a:xfrm><a:off x="0" y="100000"/></a:xfrm></p:spPr>
                <p:txBody><a:p><a:r><a:t>Title</a:t></a:r></a:p></p:txBody></p:sp>
        </p:spTree></p:cSld></p:sld>"#;

        let shapes = PptxReader::new().extract_shapes_from_xml(xml).unwrap();

        assert_eq!(shapes[0].text, "Footer");
        assert_eq!(shapes[0].y, 4_000_000);
        assert_eq!(shapes[1].y, 100_000);
    }

    #[test]
    fn test_rejects_non_zip_input() {
        let result = PptxReader::new().read(Cursor::new(b"not a zip".to_vec()));
        assert!(matches!(result, Err(Error::ZipError(_))));
    }
}
