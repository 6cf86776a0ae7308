//! Assembly of the weekly raid-stats deck from its HTML slide fragments.

pub mod driver;

pub use driver::{next_stamp, output_path, report_sources, DeckBuilder, SlideSource};
