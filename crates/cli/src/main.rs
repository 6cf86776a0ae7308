//! Builds the weekly raid-stats presentation from `slides/*.html`.

use anyhow::Result;
use clap::Parser;
use deck_cli::DeckBuilder;
use deck_core::SlideLayout;
use deck_html::HtmlConverter;
use deck_pptx::PptxWriter;
use std::path::PathBuf;

/// Convert the raid report slide fragments into a PowerPoint deck.
#[derive(Parser, Debug)]
#[command(name = "raid-deck")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding slide1.html .. slide7.html
    #[arg(long, default_value = "slides")]
    slides_dir: PathBuf,

    /// Existing directory to write the deck into
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Slide size preset (LAYOUT_16x9, LAYOUT_16x10, LAYOUT_4x3, LAYOUT_WIDE)
    #[arg(short, long, default_value = "LAYOUT_16x9")]
    layout: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let layout = SlideLayout::from_name(&args.layout)?;
    let builder = DeckBuilder::new(HtmlConverter::new(), PptxWriter::new())
        .with_layout(layout)
        .with_slides_dir(&args.slides_dir);

    let path = builder.run(&args.output_dir)?;
    println!("Presentation created: {}", path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_reproduce_fixed_paths() {
        let args = Args::parse_from(["raid-deck"]);
        assert_eq!(args.slides_dir, PathBuf::from("slides"));
        assert_eq!(args.output_dir, PathBuf::from("output"));
        assert_eq!(SlideLayout::from_name(&args.layout).unwrap(), SlideLayout::Widescreen16x9);
        assert!(!args.verbose);
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from([
            "raid-deck",
            "--slides-dir",
            "week12",
            "-o",
            "out",
            "-l",
            "LAYOUT_WIDE",
            "-v",
        ]);
        assert_eq!(args.slides_dir, PathBuf::from("week12"));
        assert_eq!(args.output_dir, PathBuf::from("out"));
        assert_eq!(args.layout, "LAYOUT_WIDE");
        assert!(args.verbose);
    }
}
