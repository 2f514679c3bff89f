//! Horizontal metrics for the assembled font
//!
//! Every output glyph keeps the advance width and left side bearing it had
//! in the source it was copied from.

use read_fonts::{FontRef, TableProvider};
use write_fonts::tables::hmtx::{Hmtx, LongMetric};

use crate::{Result, types::SourceGlyphId};

#[derive(Debug, Clone, Copy)]
pub struct GlyphMetrics {
    pub advance_width: u16,
    pub lsb: i16,
}

/// Read the advance/lsb for one glyph, handling the trailing run of glyphs
/// that share the last advance width.
pub fn glyph_metrics(font: &FontRef, gid: SourceGlyphId) -> Result<GlyphMetrics> {
    let hhea = font.hhea()?;
    let hmtx = font.hmtx()?;
    let num_h_metrics = hhea.number_of_h_metrics() as usize;
    let gid = gid.to_u16() as usize;

    let (advance, lsb) = if let Some(lm) = hmtx.h_metrics().get(gid) {
        (lm.advance.get(), lm.side_bearing.get())
    } else {
        let last_advance = if num_h_metrics > 0 {
            hmtx.h_metrics()
                .get(num_h_metrics - 1)
                .map(|lm| lm.advance.get())
                .unwrap_or(0)
        } else {
            0
        };
        let lsb_idx = gid.saturating_sub(num_h_metrics);
        let lsb = hmtx.left_side_bearings().get(lsb_idx).map(|b| b.get()).unwrap_or(0);
        (last_advance, lsb)
    };

    Ok(GlyphMetrics { advance_width: advance, lsb })
}

/// Build the hmtx table from per-glyph metrics in output glyph order.
///
/// All glyphs get a long metric; no trailing lsb-only compression is
/// attempted since glyphs come from different sources.
pub fn build_hmtx(metrics: &[GlyphMetrics]) -> Hmtx {
    Hmtx {
        h_metrics: metrics
            .iter()
            .map(|m| LongMetric { advance: m.advance_width, side_bearing: m.lsb })
            .collect(),
        left_side_bearings: Vec::new(),
    }
}
