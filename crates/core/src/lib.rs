//! Core deck model, units, text cleanup and collaborator traits for
//! assembling presentations from HTML slide fragments.

pub mod color;
pub mod error;
pub mod normalize;
pub mod traits;
pub mod types;
pub mod units;

pub use color::Color;
pub use error::{Error, Result};
pub use normalize::TextCleaner;
pub use traits::{DeckWriter, SlideConverter};
pub use types::{
    Deck, ImageFormat, Paragraph, Picture, RectShape, Shape, Slide, SlideLayout, TextAlign,
    TextBox, TextRun, VerticalAnchor,
};
pub use units::Frame;
