use std::{io, path::PathBuf, result};

use read_fonts::ReadError;
use thiserror::Error;
use write_fonts::{BuilderError, error};

use crate::types::{Codepoint, OutputGlyphId};

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("failed to read character list '{path}': {source}")]
    CharacterSetRead { path: PathBuf, source: io::Error },

    #[error("character list '{path}' contains no characters")]
    EmptyCharacterSet { path: PathBuf },

    #[error("no source fonts provided")]
    NoSources,

    #[error("failed to read font '{path}': {source}")]
    SourceRead { path: PathBuf, source: io::Error },

    #[error("'{path}' is not a valid font: {source}")]
    SourceLoad { path: PathBuf, source: ReadError },

    #[error("'{path}' has unitsPerEm {actual}, but the base font uses {expected}")]
    IncompatibleUnitsPerEm { path: PathBuf, expected: u16, actual: u16 },

    #[error("codepoint {codepoint} is mapped to both {existing} and {duplicate}")]
    DuplicateCodepoint { codepoint: Codepoint, existing: OutputGlyphId, duplicate: OutputGlyphId },

    #[error("merged font requires {count} glyphs, exceeding the 65535 glyph limit")]
    GlyphLimit { count: usize },

    #[error("failed to read font table: {0}")]
    ReadTable(#[from] ReadError),

    #[error("failed to build font table: {0}")]
    Build(#[from] BuilderError),

    #[error("failed to write font: {0}")]
    WriteTable(#[from] error::Error),

    #[error("assembled font failed validation: {0}")]
    InvalidOutput(ReadError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = result::Result<T, MergeError>;

/// Failures from the best-effort diagnostic outputs (merge log, glyph sheet).
///
/// These never invalidate an already-written output font; the pipeline logs
/// them and carries on.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to write merge log '{path}': {source}")]
    Log { path: PathBuf, source: io::Error },

    #[error("failed to render glyph sheet: {0}")]
    Render(String),

    #[error("failed to write glyph sheet '{path}': {source}")]
    Sheet { path: PathBuf, source: image::ImageError },
}
