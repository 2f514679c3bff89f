//! head, hhea, maxp, and post for the assembled font
//!
//! The base font supplies the fields that have no meaningful merge (dates,
//! caret slope, style flags). Bounds and processing maxima are widened
//! across every source that actually contributed a glyph, so rasterizer
//! limits stay honest no matter which source a glyph came from.

use std::result;

use font_types::Version16Dot16;
use read_fonts::{FontRef, TableProvider};
use write_fonts::tables::{head::Head, hhea::Hhea, maxp::Maxp, post::Post};

use crate::{
    MergeError, Result,
    strategies::{first, max, min},
};

/// Version 3.0 - no glyph names stored
const POST_VERSION_3: Version16Dot16 = Version16Dot16::new(3, 0);

/// Build the head table; `index_to_loc_format` is patched by the assembler
/// once the loca format is known.
pub fn build_head(fonts: &[FontRef]) -> Result<Head> {
    let tables = fonts
        .iter()
        .map(|f| f.head())
        .collect::<result::Result<Vec<_>, _>>()?;

    let x_mins: Vec<i16> = tables.iter().map(|t| t.x_min()).collect();
    let y_mins: Vec<i16> = tables.iter().map(|t| t.y_min()).collect();
    let x_maxs: Vec<i16> = tables.iter().map(|t| t.x_max()).collect();
    let y_maxs: Vec<i16> = tables.iter().map(|t| t.y_max()).collect();
    let lowest_rec_ppems: Vec<u16> = tables.iter().map(|t| t.lowest_rec_ppem()).collect();
    let font_revisions: Vec<i32> = tables.iter().map(|t| t.font_revision().to_bits()).collect();

    let base = tables.first().ok_or(MergeError::NoSources)?;

    Ok(Head {
        font_revision: font_types::Fixed::from_bits(max(&font_revisions)?),
        checksum_adjustment: 0, // Recomputed on write
        magic_number: 0x5F0F3CF5,
        flags: write_fonts::tables::head::Flags::from_bits_truncate(base.flags().bits()),
        units_per_em: base.units_per_em(),
        created: base.created(),
        modified: base.modified(),
        x_min: min(&x_mins)?,
        y_min: min(&y_mins)?,
        x_max: max(&x_maxs)?,
        y_max: max(&y_maxs)?,
        mac_style: write_fonts::tables::head::MacStyle::from_bits_truncate(base.mac_style().bits()),
        lowest_rec_ppem: max(&lowest_rec_ppems)?,
        font_direction_hint: base.font_direction_hint(),
        index_to_loc_format: base.index_to_loc_format(),
    })
}

pub fn build_hhea(fonts: &[FontRef], num_h_metrics: u16) -> Result<Hhea> {
    let tables = fonts
        .iter()
        .map(|f| f.hhea())
        .collect::<result::Result<Vec<_>, _>>()?;

    let ascenders: Vec<i16> = tables.iter().map(|t| t.ascender().to_i16()).collect();
    let descenders: Vec<i16> = tables.iter().map(|t| t.descender().to_i16()).collect();
    let line_gaps: Vec<i16> = tables.iter().map(|t| t.line_gap().to_i16()).collect();
    let advance_width_maxs: Vec<u16> =
        tables.iter().map(|t| t.advance_width_max().to_u16()).collect();
    let min_lsbs: Vec<i16> = tables.iter().map(|t| t.min_left_side_bearing().to_i16()).collect();
    let min_rsbs: Vec<i16> = tables.iter().map(|t| t.min_right_side_bearing().to_i16()).collect();
    let x_max_extents: Vec<i16> = tables.iter().map(|t| t.x_max_extent().to_i16()).collect();

    let base = tables.first().ok_or(MergeError::NoSources)?;

    Ok(Hhea {
        ascender: font_types::FWord::new(max(&ascenders)?),
        descender: font_types::FWord::new(min(&descenders)?),
        line_gap: font_types::FWord::new(max(&line_gaps)?),
        advance_width_max: font_types::UfWord::new(max(&advance_width_maxs)?),
        min_left_side_bearing: font_types::FWord::new(min(&min_lsbs)?),
        min_right_side_bearing: font_types::FWord::new(min(&min_rsbs)?),
        x_max_extent: font_types::FWord::new(max(&x_max_extents)?),
        caret_slope_rise: base.caret_slope_rise(),
        caret_slope_run: base.caret_slope_run(),
        caret_offset: base.caret_offset(),
        number_of_h_metrics: num_h_metrics,
    })
}

pub fn build_maxp(fonts: &[FontRef], num_glyphs: u16) -> Result<Maxp> {
    let tables = fonts
        .iter()
        .map(|f| f.maxp())
        .collect::<result::Result<Vec<_>, _>>()?;

    let max_points: Vec<u16> = tables.iter().map(|t| t.max_points().unwrap_or(0)).collect();
    let max_contours: Vec<u16> = tables.iter().map(|t| t.max_contours().unwrap_or(0)).collect();
    let max_composite_points: Vec<u16> =
        tables.iter().map(|t| t.max_composite_points().unwrap_or(0)).collect();
    let max_composite_contours: Vec<u16> =
        tables.iter().map(|t| t.max_composite_contours().unwrap_or(0)).collect();
    let max_zones: Vec<u16> = tables.iter().map(|t| t.max_zones().unwrap_or(1)).collect();
    let max_twilight_points: Vec<u16> =
        tables.iter().map(|t| t.max_twilight_points().unwrap_or(0)).collect();
    let max_storage: Vec<u16> = tables.iter().map(|t| t.max_storage().unwrap_or(0)).collect();
    let max_function_defs: Vec<u16> =
        tables.iter().map(|t| t.max_function_defs().unwrap_or(0)).collect();
    let max_instruction_defs: Vec<u16> =
        tables.iter().map(|t| t.max_instruction_defs().unwrap_or(0)).collect();
    let max_stack_elements: Vec<u16> =
        tables.iter().map(|t| t.max_stack_elements().unwrap_or(0)).collect();
    let max_size_of_instructions: Vec<u16> =
        tables.iter().map(|t| t.max_size_of_instructions().unwrap_or(0)).collect();
    let max_component_elements: Vec<u16> =
        tables.iter().map(|t| t.max_component_elements().unwrap_or(0)).collect();
    let max_component_depth: Vec<u16> =
        tables.iter().map(|t| t.max_component_depth().unwrap_or(0)).collect();

    Ok(Maxp {
        num_glyphs,
        max_points: Some(max(&max_points)?),
        max_contours: Some(max(&max_contours)?),
        max_composite_points: Some(max(&max_composite_points)?),
        max_composite_contours: Some(max(&max_composite_contours)?),
        max_zones: Some(max(&max_zones)?),
        max_twilight_points: Some(max(&max_twilight_points)?),
        max_storage: Some(first(&max_storage)?),
        max_function_defs: Some(first(&max_function_defs)?),
        max_instruction_defs: Some(first(&max_instruction_defs)?),
        max_stack_elements: Some(max(&max_stack_elements)?),
        max_size_of_instructions: Some(first(&max_size_of_instructions)?),
        max_component_elements: Some(max(&max_component_elements)?),
        max_component_depth: Some(max(&max_component_depth)?),
    })
}

/// post version 3.0: glyph names are dropped since the output order is a
/// synthetic mix of every source's orders.
pub fn build_post(fonts: &[FontRef], num_glyphs: u16) -> Result<Post> {
    let tables = fonts
        .iter()
        .map(|f| f.post())
        .collect::<result::Result<Vec<_>, _>>()?;

    let base = tables.first().ok_or(MergeError::NoSources)?;

    Ok(Post {
        version: POST_VERSION_3,
        num_glyphs: Some(num_glyphs),
        glyph_name_index: None,
        string_data: None,
        italic_angle: base.italic_angle(),
        underline_position: base.underline_position(),
        underline_thickness: base.underline_thickness(),
        is_fixed_pitch: base.is_fixed_pitch(),
        min_mem_type42: base.min_mem_type42(),
        max_mem_type42: base.max_mem_type42(),
        min_mem_type1: base.min_mem_type1(),
        max_mem_type1: base.max_mem_type1(),
    })
}
