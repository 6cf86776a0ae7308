//! Error types for deck assembly.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting slides or writing a deck.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A slide source could not be read.
    #[error("Failed to read slide source {}: {source}", path.display())]
    SlideSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The slide source is not well-formed enough to convert.
    #[error("HTML parsing error in {}: {message}", path.display())]
    HtmlParse { path: PathBuf, message: String },

    /// The slide content does not fit the deck layout.
    #[error("Layout error: {0}")]
    LayoutError(String),

    /// The requested layout preset is not known.
    #[error("Unsupported layout: {0}")]
    UnsupportedLayout(String),

    /// An embedded image could not be decoded or re-encoded.
    #[error("Image error: {0}")]
    ImageError(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or generation error (for PPTX).
    #[error("XML error: {0}")]
    XmlError(String),

    /// The deck cannot be serialized in its current state.
    #[error("Invalid deck: {0}")]
    InvalidDeck(String),
}
