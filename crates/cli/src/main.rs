use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use fontweave_merger::{MergeConfig, SheetOptions, run};

#[derive(Parser)]
#[command(name = "fontweave")]
#[command(about = "Merge TrueType fonts by character coverage", long_about = None)]
struct Cli {
    /// Source fonts in priority order; the first is the base font
    #[arg(required = true)]
    fonts: Vec<PathBuf>,

    /// Character list file, or a directory of .txt files
    #[arg(short, long)]
    chars: PathBuf,

    /// Output font file
    #[arg(short, long, default_value = "merged.ttf")]
    output: PathBuf,

    /// Write a per-character merge log
    #[arg(long)]
    log: Option<PathBuf>,

    /// Render the resolved glyphs to a PNG sheet
    #[arg(long)]
    glyph_sheet: Option<PathBuf>,

    /// Glyph cells per sheet row
    #[arg(long, default_value_t = 16)]
    sheet_columns: u32,

    /// Rendered glyph size in pixels
    #[arg(long, default_value_t = 64)]
    glyph_size: u32,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if cli.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Warn })
        .init();

    let config = MergeConfig {
        fonts: cli.fonts,
        chars: cli.chars,
        output: cli.output,
        log: cli.log,
        glyph_sheet: cli.glyph_sheet,
        sheet: SheetOptions { columns: cli.sheet_columns, glyph_px: cli.glyph_size },
    };

    let summary = run(&config)?;

    println!(
        "{}: {} characters, {} resolved, {} unresolved",
        config.output.display(),
        summary.required,
        summary.resolved,
        summary.unresolved
    );
    for path in &summary.unused_sources {
        eprintln!("warning: {} contributed no glyphs", path.display());
    }
    if !summary.report_failures.is_empty() {
        for err in &summary.report_failures {
            eprintln!("warning: {err}");
        }
    }

    Ok(())
}
