//! Conversion of HTML slide fragments into deck slides.
//!
//! Each fragment is a standalone HTML document whose `<body>` is sized to
//! the slide. The converter parses it leniently, resolves the built-in
//! theme classes plus any `<style>` blocks, lays the boxes out and emits
//! rectangles, text boxes and pictures.

pub mod converter;
pub mod dom;
pub mod images;
mod layout;
pub mod style;

pub use converter::HtmlConverter;
