//! Font assembly
//!
//! Turns the resolver's decisions into one self-consistent TrueType font:
//! `.notdef` from the base font at gid 0, then every winning glyph in
//! decision order, plus any composite components those glyphs reach. A
//! `(rank, source gid)` pair is copied exactly once, so two characters that
//! share a glyph inside one source also share it in the output.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::{debug, info, warn};
use read_fonts::{FontRef, TableProvider, tables::glyf::Glyph as ReadGlyph, types::Tag};
use write_fonts::{
    FontBuilder,
    tables::{
        glyf::{Glyph, GlyfLocaBuilder},
        loca::LocaFormat,
    },
};

use crate::{
    MergeError, Result,
    resolver::MergeReport,
    source::{FontSource, SourceRegistry},
    tables::{
        cmap::{build_cmap_format12, sorted_char_mappings},
        glyf::convert_glyph,
        hmtx::{GlyphMetrics, build_hmtx, glyph_metrics},
        metadata::{build_head, build_hhea, build_maxp, build_post},
    },
    types::{Codepoint, OutputGlyphId, SourceGlyphId, SourceRank},
};

/// Tables rebuilt from scratch; the base font's copies are never reused.
const REBUILT_TABLES: &[[u8; 4]] = &[
    *b"head", *b"maxp", *b"cmap", *b"hmtx", *b"hhea", *b"post", *b"glyf", *b"loca",
];

/// Base-font tables that index by glyph id or depend on the byte stream.
/// They would dangle after remapping, so they are dropped rather than copied.
const DROPPED_TABLES: &[[u8; 4]] = &[
    *b"GSUB", *b"GPOS", *b"GDEF", *b"BASE", *b"JSTF", *b"MATH", *b"kern", *b"morx", *b"mort",
    *b"vhea", *b"vmtx", *b"VORG", *b"hdmx", *b"LTSH", *b"sbix", *b"CBDT", *b"CBLC", *b"EBDT",
    *b"EBLC", *b"EBSC", *b"SVG ", *b"CFF ", *b"CFF2", *b"DSIG",
];

/// The output glyph order: which source glyph lands at which output id.
///
/// Insertion order is the output order, so planning must be deterministic.
#[derive(Debug, Default)]
pub struct GlyphPlan {
    order: IndexMap<(SourceRank, SourceGlyphId), OutputGlyphId>,
}

impl GlyphPlan {
    fn assign(&mut self, rank: SourceRank, gid: SourceGlyphId) -> OutputGlyphId {
        let next = OutputGlyphId::new(self.order.len() as u16);
        *self.order.entry((rank, gid)).or_insert(next)
    }

    pub fn get(&self, rank: SourceRank, gid: SourceGlyphId) -> Option<OutputGlyphId> {
        self.order.get(&(rank, gid)).copied()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Entries in output order
    pub fn iter(&self) -> impl Iterator<Item = (SourceRank, SourceGlyphId, OutputGlyphId)> + '_ {
        self.order.iter().map(|(&(rank, gid), &out)| (rank, gid, out))
    }

    /// Ranks that contribute at least one glyph, ascending
    pub fn contributing_ranks(&self) -> Vec<SourceRank> {
        let mut ranks: Vec<SourceRank> =
            self.order.keys().map(|&(rank, _)| rank).collect::<HashSet<_>>().into_iter().collect();
        ranks.sort();
        ranks
    }
}

/// Plan the output glyph order and character map from the merge report.
///
/// Returns the plan plus one `(codepoint, output gid)` entry per resolved
/// character.
pub fn plan_glyphs(
    report: &MergeReport,
    registry: &SourceRegistry,
) -> Result<(GlyphPlan, Vec<(Codepoint, OutputGlyphId)>)> {
    let mut plan = GlyphPlan::default();

    // gid 0 is always .notdef, taken from the base font
    plan.assign(registry.base().rank(), SourceGlyphId::new(0));

    let mut charmap = Vec::with_capacity(report.resolved_count());

    for decision in report.resolved() {
        let Some(rank) = decision.winner else { continue };
        let Some(source) = registry.get(rank) else { continue };
        let Some(gid) = source.glyph_id(decision.codepoint) else {
            // Coverage said yes at resolve time, so this cannot happen for a
            // read-only source; tolerate it rather than corrupt the output.
            warn!("{} lost its glyph for {} during assembly", source.label(), decision.codepoint);
            continue;
        };

        let out = collect_glyph(&mut plan, source, gid)?;
        charmap.push((decision.codepoint, out));
    }

    if plan.len() > u16::MAX as usize {
        return Err(MergeError::GlyphLimit { count: plan.len() });
    }

    debug!("planned {} output glyphs for {} characters", plan.len(), charmap.len());
    Ok((plan, charmap))
}

/// Copy one glyph into the plan, depth-first through composite components.
///
/// The parent is assigned before its components, so cyclic component chains
/// in a malformed source terminate instead of recursing forever.
fn collect_glyph(
    plan: &mut GlyphPlan,
    source: &FontSource,
    gid: SourceGlyphId,
) -> Result<OutputGlyphId> {
    let rank = source.rank();
    if let Some(out) = plan.get(rank, gid) {
        return Ok(out);
    }

    let out = plan.assign(rank, gid);

    let font = source.font()?;
    if let (Ok(glyf), Ok(loca)) = (font.glyf(), font.loca(None)) {
        let glyph = loca.get_glyf(read_fonts::types::GlyphId::new(gid.to_u32()), &glyf);
        if let Ok(Some(ReadGlyph::Composite(composite))) = glyph {
            let components: Vec<SourceGlyphId> = composite
                .components()
                .map(|c| SourceGlyphId::new(c.glyph.to_u32() as u16))
                .collect();
            for component in components {
                collect_glyph(plan, source, component)?;
            }
        }
    }

    Ok(out)
}

/// Assemble the output font bytes from the report and registry.
///
/// The result is validated by re-parsing before it is returned; nothing is
/// written to disk here.
pub fn assemble(report: &MergeReport, registry: &SourceRegistry) -> Result<Vec<u8>> {
    let (plan, charmap_entries) = plan_glyphs(report, registry)?;

    let mappings = sorted_char_mappings(&charmap_entries)?;
    let cmap = build_cmap_format12(&mappings);

    // Parse each source once; glyph copying below indexes by rank.
    let fonts: Vec<FontRef> = registry.iter().map(FontSource::font).collect::<Result<_>>()?;

    // Fonts that actually contribute glyphs, base first; these drive the
    // merged bounds and maxima.
    let contributing: Vec<FontRef> = plan
        .contributing_ranks()
        .iter()
        .map(|rank| fonts[rank.as_usize()].clone())
        .collect();

    let (glyphs, metrics) = copy_glyphs(&plan, &fonts)?;

    let mut glyf_builder = GlyfLocaBuilder::new();
    for glyph in &glyphs {
        // Empty and degenerate glyphs are allowed; validation happens on the
        // whole font below.
        let _ = glyf_builder.add_glyph(glyph);
    }
    let (glyf, loca, loca_format) = glyf_builder.build();

    let total_glyphs = plan.len() as u16;
    let mut head = build_head(&contributing)?;
    head.index_to_loc_format = match loca_format {
        LocaFormat::Short => 0,
        LocaFormat::Long => 1,
    };
    let maxp = build_maxp(&contributing, total_glyphs)?;
    let hhea = build_hhea(&contributing, total_glyphs)?;
    let hmtx = build_hmtx(&metrics);
    let post = build_post(&contributing, total_glyphs)?;

    let mut builder = FontBuilder::new();
    builder.add_table(&head)?;
    builder.add_table(&maxp)?;
    builder.add_table(&cmap)?;
    builder.add_table(&hmtx)?;
    builder.add_table(&hhea)?;
    builder.add_table(&post)?;
    builder.add_table(&glyf)?;
    builder.add_table(&loca)?;

    copy_base_tables(&mut builder, &fonts[0]);

    let bytes = builder.build();

    // Full in-memory validation before anything touches the output path.
    FontRef::new(&bytes).map_err(MergeError::InvalidOutput)?;

    info!("assembled {} glyphs, {} bytes", total_glyphs, bytes.len());
    Ok(bytes)
}

/// Copy every planned glyph (in output order) with remapped components,
/// along with its metrics from the owning source.
fn copy_glyphs(plan: &GlyphPlan, fonts: &[FontRef]) -> Result<(Vec<Glyph>, Vec<GlyphMetrics>)> {
    let mut glyphs = Vec::with_capacity(plan.len());
    let mut metrics = Vec::with_capacity(plan.len());

    for (rank, gid, _out) in plan.iter() {
        let font = &fonts[rank.as_usize()];

        let glyf = font.glyf()?;
        let loca = font.loca(None)?;

        let glyph = match loca.get_glyf(read_fonts::types::GlyphId::new(gid.to_u32()), &glyf) {
            Ok(Some(glyph)) => {
                // Hinting from non-base fonts may reference fpgm/cvt entries
                // that only the base font carries.
                let strip_hinting = rank != SourceRank::BASE;
                convert_glyph(&glyph, |g| plan.get(rank, g), strip_hinting)
            }
            _ => Glyph::Empty,
        };

        glyphs.push(glyph);
        metrics.push(glyph_metrics(font, gid)?);
    }

    // Strict validators reject composites that reference empty glyphs, so
    // such composites collapse to empty themselves.
    let empty_gids: HashSet<u16> = glyphs
        .iter()
        .enumerate()
        .filter_map(|(gid, g)| matches!(g, Glyph::Empty).then_some(gid as u16))
        .collect();

    for glyph in &mut glyphs {
        if let Glyph::Composite(composite) = glyph {
            let references_empty = composite
                .components()
                .iter()
                .any(|comp| empty_gids.contains(&comp.glyph.to_u16()));
            if references_empty {
                *glyph = Glyph::Empty;
            }
        }
    }

    Ok((glyphs, metrics))
}

/// Carry over the base font's remaining tables (name, OS/2, gasp, cvt,
/// fpgm, prep, ...) except those rebuilt above or glyph-id dependent.
fn copy_base_tables(builder: &mut FontBuilder, base: &FontRef) {
    let rebuilt: HashSet<Tag> = REBUILT_TABLES.iter().map(Tag::new).collect();
    let dropped: HashSet<Tag> = DROPPED_TABLES.iter().map(Tag::new).collect();

    for record in base.table_directory.table_records() {
        let tag = record.tag();
        if !rebuilt.contains(&tag)
            && !dropped.contains(&tag)
            && let Some(data) = base.table_data(tag)
        {
            builder.add_raw(tag, data.as_bytes().to_vec());
        }
    }
}
