//! PPTX (Office Open XML) backend for deck assembly.
//!
//! Writes decks as .pptx packages (ZIP archives of XML parts) and reads
//! them back for inspection.

mod parts;
pub mod reader;
mod slide;
pub mod writer;

pub use reader::{DeckSummary, PptxReader, SlideSummary};
pub use writer::PptxWriter;
