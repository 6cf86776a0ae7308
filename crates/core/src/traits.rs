//! Seams between the deck driver and its two collaborators.

use crate::error::Result;
use crate::types::Deck;
use std::path::Path;

/// Turns one slide source into exactly one slide appended to `deck`.
pub trait SlideConverter {
    fn convert(&self, source: &Path, deck: &mut Deck) -> Result<()>;
}

/// Serializes a finished deck.
pub trait DeckWriter {
    /// Write `deck` to a new file at `path`.
    ///
    /// Implementations must refuse to replace an existing file and report
    /// that case as an [`std::io::ErrorKind::AlreadyExists`] I/O error.
    fn write_deck(&self, deck: &Deck, path: &Path) -> Result<()>;
}

impl<T: SlideConverter + ?Sized> SlideConverter for &T {
    fn convert(&self, source: &Path, deck: &mut Deck) -> Result<()> {
        (**self).convert(source, deck)
    }
}

impl<T: DeckWriter + ?Sized> DeckWriter for &T {
    fn write_deck(&self, deck: &Deck, path: &Path) -> Result<()> {
        (**self).write_deck(deck, path)
    }
}
