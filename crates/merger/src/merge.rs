//! The merge pipeline
//!
//! Sequential, single-run orchestration: load the character set, load the
//! sources, resolve, assemble, write the font atomically, then emit the
//! best-effort diagnostics (merge log, glyph sheet). Character-set and
//! source errors abort before anything is written; report failures are
//! surfaced but never roll back an already-written font.

use std::{
    fs::create_dir_all,
    io::Write,
    path::{Path, PathBuf},
};

use log::{error, info, warn};
use tempfile::NamedTempFile;

use crate::{
    ReportError, Result, assembler,
    charset::CharacterSet,
    report::write_log_file,
    resolver::{self, MergeReport},
    sheet::{SheetOptions, write_glyph_sheet},
    source::SourceRegistry,
};

/// Everything one merge run needs to know
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Input fonts in priority order; the first is the base font
    pub fonts: Vec<PathBuf>,
    /// Character list file, or directory of `.txt` files
    pub chars: PathBuf,
    /// Output font path
    pub output: PathBuf,
    /// Merge log path (optional diagnostic)
    pub log: Option<PathBuf>,
    /// Glyph sheet PNG path (optional diagnostic)
    pub glyph_sheet: Option<PathBuf>,
    pub sheet: SheetOptions,
}

/// What happened during a run
#[derive(Debug, Default)]
pub struct MergeSummary {
    pub required: usize,
    pub resolved: usize,
    pub unresolved: usize,
    /// Sources that supplied no glyph at all (diagnostic, not an error)
    pub unused_sources: Vec<PathBuf>,
    pub output_bytes: usize,
    /// Diagnostic outputs that could not be produced
    pub report_failures: Vec<ReportError>,
}

/// Run the full merge pipeline.
pub fn run(config: &MergeConfig) -> Result<MergeSummary> {
    // Character set first: an empty or unreadable list fails before any
    // font source is touched.
    let chars = CharacterSet::load(&config.chars)?;
    info!("character set: {} unique characters", chars.len());

    let registry = SourceRegistry::load(&config.fonts)?;

    let report = resolver::resolve(&chars, &registry);

    let font_bytes = assembler::assemble(&report, &registry)?;
    write_atomic(&config.output, &font_bytes)?;
    info!("wrote {} bytes to {}", font_bytes.len(), config.output.display());

    let mut summary = MergeSummary {
        required: report.total(),
        resolved: report.resolved_count(),
        unresolved: report.unresolved_count(),
        unused_sources: unused_source_paths(&report, &registry),
        output_bytes: font_bytes.len(),
        report_failures: Vec::new(),
    };

    for path in &summary.unused_sources {
        warn!("source supplied no glyphs: {}", path.display());
    }

    // Diagnostics are best-effort from here on; the output font is final.
    if let Some(log_path) = &config.log
        && let Err(err) = write_log_file(&report, &registry.labels(), log_path)
    {
        error!("{err}");
        summary.report_failures.push(err);
    }

    if let Some(sheet_path) = &config.glyph_sheet {
        let resolved_chars = resolved_chars(&report);
        if let Err(err) = write_glyph_sheet(&font_bytes, &resolved_chars, &config.sheet, sheet_path)
        {
            error!("{err}");
            summary.report_failures.push(err);
        }
    }

    Ok(summary)
}

fn resolved_chars(report: &MergeReport) -> Vec<char> {
    report
        .resolved()
        .filter_map(|d| d.codepoint.to_char())
        .collect()
}

fn unused_source_paths(report: &MergeReport, registry: &SourceRegistry) -> Vec<PathBuf> {
    report
        .unused_sources(registry)
        .into_iter()
        .filter_map(|rank| registry.get(rank).map(|s| s.path().to_path_buf()))
        .collect()
}

/// Write `data` to `path` without ever leaving a partial file behind:
/// the bytes land in a temp file in the destination directory, which is
/// then persisted into place.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            create_dir_all(parent)?;
            parent
        }
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
