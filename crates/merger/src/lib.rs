//! Merging of TrueType fonts by character coverage.
//!
//! Given a required character set and a priority-ordered list of source
//! fonts, the merger resolves each character to the highest-priority source
//! that covers it, assembles a single self-consistent font from the winning
//! glyphs, and emits optional diagnostics: a per-character merge log and a
//! rendered glyph sheet PNG.

mod assembler;
mod charset;
mod error;
mod merge;
mod report;
mod resolver;
mod sheet;
mod source;
mod strategies;
mod tables;
mod types;

pub use assembler::{GlyphPlan, assemble, plan_glyphs};
pub use charset::CharacterSet;
pub use error::{MergeError, ReportError, Result};
pub use merge::{MergeConfig, MergeSummary, run};
pub use report::{write_log, write_log_file};
pub use resolver::{MergeReport, ResolutionDecision, resolve};
pub use sheet::{SheetOptions, render_glyph_sheet, write_glyph_sheet};
pub use source::{FontSource, SourceRegistry};
pub use types::{Codepoint, OutputGlyphId, SourceGlyphId, SourceRank};
