//! The fixed slide sequence and the deck build/write steps.

use anyhow::{bail, Context, Result};
use chrono::Utc;
use deck_core::{Deck, DeckWriter, SlideConverter, SlideLayout};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

/// What each fragment in the sequence shows, in deck order.
const SLIDE_LABELS: [&str; 7] = [
    "Title",
    "Overview",
    "Boss breakdown",
    "Top performers",
    "Top 5 DPS overall",
    "Death causes",
    "Closing",
];

/// The death causes slide is only generated when there is death data.
const OPTIONAL_SLIDE: usize = 6;

/// How many fresh stamps to try when the output name is already taken.
const MAX_NAME_ATTEMPTS: usize = 16;

/// Last stamp handed out by [`next_stamp`].
static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// One fragment in the deck sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideSource {
    /// 1-based position in the sequence.
    pub number: usize,
    pub path: PathBuf,
    pub label: &'static str,

    /// Skipped without error when the file does not exist.
    pub optional: bool,
}

/// The fragment sequence `slide1.html` .. `slide7.html` under `slides_dir`.
pub fn report_sources(slides_dir: &Path) -> Vec<SlideSource> {
    SLIDE_LABELS
        .into_iter()
        .enumerate()
        .map(|(index, label)| {
            let number = index + 1;
            SlideSource {
                number,
                path: slides_dir.join(format!("slide{}.html", number)),
                label,
                optional: number == OPTIONAL_SLIDE,
            }
        })
        .collect()
}

/// `dir/raid-stats-<stamp>.pptx`.
pub fn output_path(dir: &Path, stamp: i64) -> PathBuf {
    dir.join(format!("raid-stats-{}.pptx", stamp))
}

/// Milliseconds since the Unix epoch, strictly increasing within the
/// process even when the clock has not moved.
pub fn next_stamp() -> i64 {
    loop {
        let previous = LAST_STAMP.load(Ordering::SeqCst);
        let stamp = Utc::now().timestamp_millis().max(previous + 1);
        if LAST_STAMP
            .compare_exchange(previous, stamp, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            return stamp;
        }
    }
}

/// Builds the deck from the fragment sequence and writes it out.
#[derive(Debug, Clone)]
pub struct DeckBuilder<C, W> {
    converter: C,
    writer: W,
    layout: SlideLayout,
    slides_dir: PathBuf,
}

impl<C: SlideConverter, W: DeckWriter> DeckBuilder<C, W> {
    /// A builder reading `slides/` into a 16:9 deck.
    pub fn new(converter: C, writer: W) -> Self {
        Self {
            converter,
            writer,
            layout: SlideLayout::Widescreen16x9,
            slides_dir: PathBuf::from("slides"),
        }
    }

    pub fn with_layout(mut self, layout: SlideLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_slides_dir(mut self, slides_dir: impl Into<PathBuf>) -> Self {
        self.slides_dir = slides_dir.into();
        self
    }

    /// Convert every fragment in order into a new deck.
    ///
    /// Stops at the first failure; nothing is written.
    pub fn build(&self) -> Result<Deck> {
        let mut deck = Deck::new(self.layout);

        for source in report_sources(&self.slides_dir) {
            if source.optional {
                let exists = source.path.try_exists().with_context(|| {
                    format!("Failed to check for {}", source.path.display())
                })?;
                if !exists {
                    log::info!(
                        "Skipping slide {} ({}): {} not found",
                        source.number,
                        source.label,
                        source.path.display()
                    );
                    continue;
                }
            }

            log::debug!("Converting slide {} ({})", source.number, source.label);
            let before = deck.slide_count();
            self.converter
                .convert(&source.path, &mut deck)
                .with_context(|| {
                    format!(
                        "Failed to convert {} ({})",
                        source.path.display(),
                        source.label
                    )
                })?;

            let after = deck.slide_count();
            if after != before + 1 {
                bail!(
                    "Converting {} changed the deck from {} to {} slides instead of adding one",
                    source.path.display(),
                    before,
                    after
                );
            }
        }

        Ok(deck)
    }

    /// Build the deck and write it under `output_dir`, returning the path.
    ///
    /// `output_dir` must already exist.
    pub fn run(&self, output_dir: &Path) -> Result<PathBuf> {
        let deck = self.build()?;
        log::info!("Built deck with {} slides", deck.slide_count());

        let mut attempts = 0;
        loop {
            let path = output_path(output_dir, next_stamp());
            attempts += 1;

            match self.writer.write_deck(&deck, &path) {
                Ok(()) => return Ok(path),
                Err(deck_core::Error::IoError(e))
                    if e.kind() == ErrorKind::AlreadyExists && attempts < MAX_NAME_ATTEMPTS =>
                {
                    log::debug!("{} already exists, trying a later stamp", path.display());
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to write {}", path.display()));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::{Error, Slide};
    use deck_html::HtmlConverter;
    use deck_pptx::{PptxReader, PptxWriter};
    use std::cell::{Cell, RefCell};
    use std::fs;
    use std::io::BufReader;

    /// Records which sources were converted, without reading them.
    #[derive(Default)]
    struct RecordingConverter {
        seen: RefCell<Vec<PathBuf>>,
    }

    impl SlideConverter for RecordingConverter {
        fn convert(&self, source: &Path, deck: &mut Deck) -> deck_core::Result<()> {
            self.seen.borrow_mut().push(source.to_path_buf());
            deck.add_slide(Slide::from_source(source));
            Ok(())
        }
    }

    /// Appends `added` slides for `slide2.html` (removing one when negative)
    /// and exactly one for every other source.
    struct MiscountingConverter {
        added: i32,
    }

    impl SlideConverter for MiscountingConverter {
        fn convert(&self, source: &Path, deck: &mut Deck) -> deck_core::Result<()> {
            if !source.ends_with("slide2.html") {
                deck.add_slide(Slide::from_source(source));
            } else if self.added < 0 {
                deck.slides.pop();
            } else {
                for _ in 0..self.added {
                    deck.add_slide(Slide::from_source(source));
                }
            }
            Ok(())
        }
    }

    /// Claims the first `collisions` names are taken.
    struct CollidingWriter {
        collisions: Cell<usize>,
        written: RefCell<Vec<PathBuf>>,
    }

    impl DeckWriter for CollidingWriter {
        fn write_deck(&self, _deck: &Deck, path: &Path) -> deck_core::Result<()> {
            if self.collisions.get() > 0 {
                self.collisions.set(self.collisions.get() - 1);
                return Err(Error::IoError(std::io::Error::from(ErrorKind::AlreadyExists)));
            }
            self.written.borrow_mut().push(path.to_path_buf());
            Ok(())
        }
    }

    fn fragment(title: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"></head>
<body class="col bg-surface" style="width: 960px; height: 540px; position: relative;">
    <div style="margin: 0 20px; padding-top: 20px;" class="fit">
        <h1 class="text-5xl text-primary" style="margin: 0;">{}</h1>
    </div>
    <div style="position: absolute; bottom: 20px; left: 20px; right: 20px;">
        <div class="text-xs text-muted-foreground">Data from WarcraftLogs</div>
    </div>
</body>
</html>"#,
            title
        )
    }

    /// A project directory with `slides/` holding the given fragments and an
    /// empty `output/`.
    fn project(numbers: &[usize]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let slides = dir.path().join("slides");
        fs::create_dir(&slides).unwrap();
        fs::create_dir(dir.path().join("output")).unwrap();
        for number in numbers {
            fs::write(
                slides.join(format!("slide{}.html", number)),
                fragment(&format!("SLIDE {}", number)),
            )
            .unwrap();
        }
        dir
    }

    fn real_builder(dir: &Path) -> DeckBuilder<HtmlConverter, PptxWriter> {
        DeckBuilder::new(HtmlConverter::new(), PptxWriter::new())
            .with_slides_dir(dir.join("slides"))
    }

    fn slide_titles(path: &Path) -> Vec<String> {
        let file = fs::File::open(path).unwrap();
        let summary = PptxReader::new().read(BufReader::new(file)).unwrap();
        summary.slides.iter().map(|s| s.texts[0].clone()).collect()
    }

    fn output_files(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir.join("output"))
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        files.sort();
        files
    }

    #[test]
    fn test_report_sources_order() {
        let sources = report_sources(Path::new("slides"));

        assert_eq!(sources.len(), 7);
        assert_eq!(sources[0].path, PathBuf::from("slides/slide1.html"));
        assert_eq!(sources[6].path, PathBuf::from("slides/slide7.html"));
        assert_eq!(sources[4].label, "Top 5 DPS overall");
        let optional: Vec<usize> =
            sources.iter().filter(|s| s.optional).map(|s| s.number).collect();
        assert_eq!(optional, vec![6]);
    }

    #[test]
    fn test_output_path_format() {
        assert_eq!(
            output_path(Path::new("output"), 1_700_000_000_123),
            PathBuf::from("output/raid-stats-1700000000123.pptx")
        );
    }

    #[test]
    fn test_stamps_strictly_increase() {
        let stamps: Vec<i64> = (0..100).map(|_| next_stamp()).collect();
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
        assert!(stamps[0] >= Utc::now().timestamp_millis() - 60_000);
    }

    #[test]
    fn test_missing_optional_slide_is_skipped() {
        let dir = project(&[1, 2, 3, 4, 5, 7]);
        let converter = RecordingConverter::default();
        let builder = DeckBuilder::new(&converter, PptxWriter::new())
            .with_slides_dir(dir.path().join("slides"));

        let deck = builder.build().unwrap();

        assert_eq!(deck.slide_count(), 6);
        let converted: Vec<String> = converter
            .seen
            .borrow()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            converted,
            vec![
                "slide1.html",
                "slide2.html",
                "slide3.html",
                "slide4.html",
                "slide5.html",
                "slide7.html"
            ]
        );
    }

    #[test]
    fn test_missing_mandatory_slide_is_passed_to_converter() {
        // Only slide 6 is checked up front; other sources go straight to the converter.
        let dir = project(&[]);
        let converter = RecordingConverter::default();
        let builder = DeckBuilder::new(&converter, PptxWriter::new())
            .with_slides_dir(dir.path().join("slides"));

        let deck = builder.build().unwrap();
        assert_eq!(deck.slide_count(), 6);
        assert_eq!(converter.seen.borrow().len(), 6);
    }

    #[cfg(unix)]
    #[test]
    fn test_existence_check_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("slides");
        fs::write(&not_a_dir, "plain file").unwrap();

        let converter = RecordingConverter::default();
        let builder = DeckBuilder::new(&converter, PptxWriter::new()).with_slides_dir(&not_a_dir);

        let err = builder.build().unwrap_err();
        assert!(format!("{:#}", err).contains("slide6.html"));
        assert_eq!(converter.seen.borrow().len(), 5);
    }

    #[test]
    fn test_name_collision_retries_with_new_stamp() {
        let writer = CollidingWriter {
            collisions: Cell::new(2),
            written: RefCell::new(Vec::new()),
        };
        let dir = project(&[]);
        let builder = DeckBuilder::new(RecordingConverter::default(), &writer)
            .with_slides_dir(dir.path().join("slides"));

        let path = builder.run(&dir.path().join("output")).unwrap();

        assert_eq!(writer.written.borrow().as_slice(), &[path]);
        assert_eq!(writer.collisions.get(), 0);
    }

    #[test]
    fn test_name_collisions_give_up_after_max_attempts() {
        let writer = CollidingWriter {
            collisions: Cell::new(MAX_NAME_ATTEMPTS),
            written: RefCell::new(Vec::new()),
        };
        let dir = project(&[]);
        let builder = DeckBuilder::new(RecordingConverter::default(), &writer)
            .with_slides_dir(dir.path().join("slides"));

        let err = builder.run(&dir.path().join("output")).unwrap_err();

        assert!(format!("{:#}", err).contains("raid-stats-"));
        assert!(writer.written.borrow().is_empty());
        assert_eq!(writer.collisions.get(), 0);
    }

    #[test]
    fn test_converter_must_add_exactly_one_slide() {
        for added in [-1, 0, 2] {
            let dir = project(&[]);
            let builder = DeckBuilder::new(MiscountingConverter { added }, PptxWriter::new())
                .with_slides_dir(dir.path().join("slides"));

            let err = builder.build().unwrap_err();

            assert!(err.to_string().contains("slide2.html"), "added {}: {}", added, err);
            assert!(err.to_string().contains("instead of adding one"));
        }
    }

    #[test]
    fn test_run_without_optional_slide() {
        let dir = project(&[1, 2, 3, 4, 5, 7]);

        let path = real_builder(dir.path()).run(&dir.path().join("output")).unwrap();

        assert_eq!(path.parent(), Some(dir.path().join("output").as_path()));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        let digits = name
            .strip_prefix("raid-stats-")
            .and_then(|rest| rest.strip_suffix(".pptx"))
            .unwrap();
        assert!(!digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()));

        assert_eq!(
            slide_titles(&path),
            vec!["SLIDE 1", "SLIDE 2", "SLIDE 3", "SLIDE 4", "SLIDE 5", "SLIDE 7"]
        );
    }

    #[test]
    fn test_run_with_optional_slide() {
        let dir = project(&[1, 2, 3, 4, 5, 6, 7]);

        let path = real_builder(dir.path()).run(&dir.path().join("output")).unwrap();

        let titles = slide_titles(&path);
        assert_eq!(titles.len(), 7);
        assert_eq!(titles[5], "SLIDE 6");
        assert_eq!(titles[6], "SLIDE 7");
    }

    #[test]
    fn test_missing_mandatory_slide_writes_nothing() {
        let dir = project(&[1, 2, 4, 5, 6, 7]);

        let err = real_builder(dir.path()).run(&dir.path().join("output")).unwrap_err();

        assert!(format!("{:#}", err).contains("slide3.html"));
        assert!(output_files(dir.path()).is_empty());
    }

    #[test]
    fn test_missing_output_directory_is_an_error() {
        let dir = project(&[1, 2, 3, 4, 5, 7]);

        let result = real_builder(dir.path()).run(&dir.path().join("no-such-dir"));

        assert!(result.is_err());
        assert!(!dir.path().join("no-such-dir").exists());
    }

    #[test]
    fn test_repeated_runs_write_distinct_files() {
        let dir = project(&[1, 2, 3, 4, 5, 7]);
        let builder = real_builder(dir.path());
        let output = dir.path().join("output");

        let first = builder.run(&output).unwrap();
        let second = builder.run(&output).unwrap();

        assert_ne!(first, second);
        assert_eq!(output_files(dir.path()).len(), 2);
        assert_eq!(slide_titles(&first), slide_titles(&second));
    }
}
