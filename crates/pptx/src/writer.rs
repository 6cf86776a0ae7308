//! PPTX package writer.

use chrono::{DateTime, Utc};
use deck_core::{Deck, DeckWriter, Error, Result};
use std::fs::{self, OpenOptions};
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::parts;
use crate::slide::{render_slide, render_slide_rels};

/// Serializes a [`Deck`] into an Office Open XML presentation.
#[derive(Debug, Clone, Default)]
pub struct PptxWriter {
    /// Fixed document timestamp; `None` means "now" at write time.
    timestamp: Option<DateTime<Utc>>,
}

impl PptxWriter {
    /// Create a new PPTX writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp the document properties with a fixed time instead of the
    /// current one.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Write the deck as a PPTX package to a seekable writer.
    pub fn write<W: Write + Seek>(&self, deck: &Deck, writer: W) -> Result<W> {
        if deck.is_empty() {
            return Err(Error::InvalidDeck("deck has no slides".to_string()));
        }

        let timestamp = self
            .timestamp
            .unwrap_or_else(Utc::now)
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string();

        let mut media_counter = 0;
        let mut rendered = Vec::with_capacity(deck.slide_count());
        for slide in &deck.slides {
            rendered.push(render_slide(slide, &mut media_counter)?);
        }
        let image_formats: Vec<_> = rendered
            .iter()
            .flat_map(|r| r.media.iter().map(|m| m.format))
            .collect();

        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let put = |zip: &mut ZipWriter<W>, name: &str, data: &[u8]| -> Result<()> {
            zip.start_file(name, options)
                .map_err(|e| Error::ZipError(format!("Failed to start '{}': {}", name, e)))?;
            zip.write_all(data)?;
            Ok(())
        };

        put(
            &mut zip,
            "[Content_Types].xml",
            parts::content_types_xml(deck.slide_count(), &image_formats)?.as_bytes(),
        )?;
        put(&mut zip, "_rels/.rels", parts::root_rels_xml()?.as_bytes())?;
        put(
            &mut zip,
            "docProps/core.xml",
            parts::core_props_xml(deck, &timestamp)?.as_bytes(),
        )?;
        put(&mut zip, "docProps/app.xml", parts::app_props_xml(deck)?.as_bytes())?;
        put(&mut zip, "ppt/presentation.xml", parts::presentation_xml(deck)?.as_bytes())?;
        put(
            &mut zip,
            "ppt/_rels/presentation.xml.rels",
            parts::presentation_rels_xml(deck.slide_count())?.as_bytes(),
        )?;
        put(
            &mut zip,
            "ppt/slideMasters/slideMaster1.xml",
            parts::slide_master_xml()?.as_bytes(),
        )?;
        put(
            &mut zip,
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            parts::slide_master_rels_xml()?.as_bytes(),
        )?;
        put(
            &mut zip,
            "ppt/slideLayouts/slideLayout1.xml",
            parts::slide_layout_xml()?.as_bytes(),
        )?;
        put(
            &mut zip,
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            parts::slide_layout_rels_xml()?.as_bytes(),
        )?;
        put(&mut zip, "ppt/theme/theme1.xml", parts::theme_xml()?.as_bytes())?;
        put(&mut zip, "ppt/presProps.xml", parts::pres_props_xml().as_bytes())?;
        put(&mut zip, "ppt/viewProps.xml", parts::view_props_xml().as_bytes())?;
        put(&mut zip, "ppt/tableStyles.xml", parts::table_styles_xml().as_bytes())?;

        for (index, slide) in rendered.iter().enumerate() {
            let number = index + 1;
            log::debug!(
                "Writing slide {} ({} relationships, {} images)",
                number,
                slide.rels.len(),
                slide.media.len()
            );
            put(&mut zip, &format!("ppt/slides/slide{}.xml", number), slide.xml.as_bytes())?;
            put(
                &mut zip,
                &format!("ppt/slides/_rels/slide{}.xml.rels", number),
                render_slide_rels(&slide.rels)?.as_bytes(),
            )?;
            for media in &slide.media {
                put(&mut zip, &media.path, media.data)?;
            }
        }

        zip.finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish archive: {}", e)))
    }

    /// Write the deck to a new file, refusing to replace an existing one.
    ///
    /// The package is assembled in memory first, so a rejected deck never
    /// creates the file. A failed disk write removes the partial file.
    pub fn write_to_path(&self, deck: &Deck, path: &Path) -> Result<()> {
        let package = self.write(deck, Cursor::new(Vec::new()))?.into_inner();

        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        if let Err(e) = file.write_all(&package).and_then(|()| file.sync_all()) {
            drop(file);
            if let Err(cleanup) = fs::remove_file(path) {
                log::warn!("Failed to remove partial file {}: {}", path.display(), cleanup);
            }
            return Err(e.into());
        }
        Ok(())
    }
}

impl DeckWriter for PptxWriter {
    fn write_deck(&self, deck: &Deck, path: &Path) -> Result<()> {
        log::info!("Writing {} slides to {}", deck.slide_count(), path.display());
        self.write_to_path(deck, path)
    }
}
