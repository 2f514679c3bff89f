//! End-to-end merge tests over in-memory fonts built with write-fonts

use std::{
    fs::{read, write},
    path::PathBuf,
};

use fontweave_merger::{
    CharacterSet, Codepoint, MergeConfig, MergeError, MergeReport, ResolutionDecision,
    SheetOptions, SourceRank, SourceRegistry, assemble, resolve, run,
};
use read_fonts::{FontRef, TableProvider, types::GlyphId};
use write_fonts::{
    FontBuilder,
    tables::{
        glyf::{Anchor, Bbox, Component, ComponentFlags, CompositeGlyph, GlyfLocaBuilder, Glyph,
               SimpleGlyph, Transform},
        head::Head,
        hhea::Hhea,
        hmtx::{Hmtx, LongMetric},
        maxp::Maxp,
        post::Post,
    },
};

/// A filled square outline, distinguishable by size
fn square_glyph(size: i16) -> Glyph {
    let corner = |x, y| read_fonts::tables::glyf::CurvePoint { x, y, on_curve: true };
    let points = vec![corner(0, 0), corner(size, 0), corner(size, size), corner(0, size)];
    Glyph::Simple(SimpleGlyph {
        bbox: Bbox { x_min: 0, y_min: 0, x_max: size, y_max: size },
        contours: vec![points.into()],
        instructions: vec![],
    })
}

/// Build a minimal TrueType font: `.notdef` plus one square glyph per
/// `(char, advance)` entry. Advance widths make glyph provenance checkable
/// after a merge.
fn make_test_font(entries: &[(char, u16)], units_per_em: u16) -> Vec<u8> {
    let glyphs: Vec<Glyph> = std::iter::once(square_glyph(100))
        .chain(entries.iter().map(|&(_, adv)| square_glyph(adv.min(i16::MAX as u16) as i16)))
        .collect();

    let cmap_mappings: Vec<(char, GlyphId)> = entries
        .iter()
        .enumerate()
        .map(|(i, &(ch, _))| (ch, GlyphId::new(i as u32 + 1)))
        .collect();

    let advances: Vec<u16> =
        std::iter::once(100).chain(entries.iter().map(|&(_, adv)| adv)).collect();

    build_font(glyphs, cmap_mappings, advances, units_per_em)
}

/// Build a font whose only mapped character is a composite that references
/// an unmapped component glyph.
fn make_composite_font(ch: char, units_per_em: u16) -> Vec<u8> {
    let bbox = Bbox { x_min: 0, y_min: 0, x_max: 300, y_max: 300 };
    let component = Component {
        glyph: font_types::GlyphId16::new(1),
        anchor: Anchor::Offset { x: 0, y: 0 },
        transform: Transform::default(),
        flags: ComponentFlags::default(),
    };
    let composite = Glyph::Composite(CompositeGlyph::new(component, bbox));

    let glyphs = vec![square_glyph(100), square_glyph(300), composite];
    let cmap_mappings = vec![(ch, GlyphId::new(2))];
    let advances = vec![100, 300, 300];

    build_font(glyphs, cmap_mappings, advances, units_per_em)
}

fn build_font(
    glyphs: Vec<Glyph>,
    cmap_mappings: Vec<(char, GlyphId)>,
    advances: Vec<u16>,
    units_per_em: u16,
) -> Vec<u8> {
    let num_glyphs = glyphs.len() as u16;

    let mut glyf_builder = GlyfLocaBuilder::new();
    for glyph in &glyphs {
        glyf_builder.add_glyph(glyph).expect("add glyph");
    }
    let (glyf, loca, loca_format) = glyf_builder.build();

    let cmap = write_fonts::tables::cmap::Cmap::from_mappings(cmap_mappings).expect("cmap");

    let head = Head {
        font_revision: font_types::Fixed::from_f64(1.0),
        checksum_adjustment: 0,
        magic_number: 0x5F0F3CF5,
        flags: write_fonts::tables::head::Flags::empty(),
        units_per_em,
        created: font_types::LongDateTime::new(0),
        modified: font_types::LongDateTime::new(0),
        x_min: 0,
        y_min: 0,
        x_max: 500,
        y_max: 500,
        mac_style: write_fonts::tables::head::MacStyle::empty(),
        lowest_rec_ppem: 8,
        font_direction_hint: 2,
        index_to_loc_format: match loca_format {
            write_fonts::tables::loca::LocaFormat::Short => 0,
            write_fonts::tables::loca::LocaFormat::Long => 1,
        },
    };

    let hhea = Hhea {
        ascender: font_types::FWord::new(700),
        descender: font_types::FWord::new(-200),
        line_gap: font_types::FWord::new(0),
        advance_width_max: font_types::UfWord::new(500),
        min_left_side_bearing: font_types::FWord::new(0),
        min_right_side_bearing: font_types::FWord::new(0),
        x_max_extent: font_types::FWord::new(500),
        caret_slope_rise: 1,
        caret_slope_run: 0,
        caret_offset: 0,
        number_of_h_metrics: num_glyphs,
    };

    let hmtx = Hmtx {
        h_metrics: advances
            .iter()
            .map(|&advance| LongMetric { advance, side_bearing: 0 })
            .collect(),
        left_side_bearings: vec![],
    };

    let maxp = Maxp {
        num_glyphs,
        max_points: Some(4),
        max_contours: Some(1),
        max_composite_points: Some(4),
        max_composite_contours: Some(1),
        max_zones: Some(1),
        max_twilight_points: Some(0),
        max_storage: Some(0),
        max_function_defs: Some(0),
        max_instruction_defs: Some(0),
        max_stack_elements: Some(0),
        max_size_of_instructions: Some(0),
        max_component_elements: Some(1),
        max_component_depth: Some(1),
    };

    let post = Post {
        version: font_types::Version16Dot16::VERSION_3_0,
        italic_angle: font_types::Fixed::from_f64(0.0),
        underline_position: font_types::FWord::new(-100),
        underline_thickness: font_types::FWord::new(50),
        is_fixed_pitch: 0,
        min_mem_type42: 0,
        max_mem_type42: 0,
        min_mem_type1: 0,
        max_mem_type1: 0,
        num_glyphs: Some(num_glyphs),
        glyph_name_index: None,
        string_data: None,
    };

    let mut builder = FontBuilder::new();
    builder.add_table(&head).unwrap();
    builder.add_table(&hhea).unwrap();
    builder.add_table(&hmtx).unwrap();
    builder.add_table(&maxp).unwrap();
    builder.add_table(&cmap).unwrap();
    builder.add_table(&post).unwrap();
    builder.add_table(&glyf).unwrap();
    builder.add_table(&loca).unwrap();
    builder.build()
}

fn registry(fonts: Vec<(&str, Vec<u8>)>) -> SourceRegistry {
    SourceRegistry::from_data(
        fonts.into_iter().map(|(name, data)| (PathBuf::from(name), data)).collect(),
    )
    .expect("load registry")
}

fn merged_advance(font: &FontRef, ch: char) -> Option<u16> {
    let gid = font.cmap().ok()?.map_codepoint(ch)?;
    font.hmtx().ok()?.advance(gid)
}

// ============================================================================
// Resolution and assembly
// ============================================================================

#[test]
fn test_disjoint_coverage_merges_both_sources() {
    let base = make_test_font(&[('A', 500)], 1000);
    let fallback = make_test_font(&[('B', 600)], 1000);

    let registry = registry(vec![("base.ttf", base), ("fallback.ttf", fallback)]);
    let report = resolve(&CharacterSet::from_chars(['A', 'B']), &registry);
    assert_eq!(report.resolved_count(), 2);

    let bytes = assemble(&report, &registry).expect("assemble");
    let font = FontRef::new(&bytes).expect("parse merged font");

    assert_eq!(merged_advance(&font, 'A'), Some(500));
    assert_eq!(merged_advance(&font, 'B'), Some(600));
    // .notdef + A + B
    assert_eq!(font.maxp().unwrap().num_glyphs(), 3);
}

#[test]
fn test_base_font_wins_overlapping_coverage() {
    let base = make_test_font(&[('A', 500)], 1000);
    let fallback = make_test_font(&[('A', 777), ('B', 600)], 1000);

    let registry = registry(vec![("base.ttf", base), ("fallback.ttf", fallback)]);
    assert_eq!(registry.base().label(), "base.ttf");

    let report = resolve(&CharacterSet::from_chars(['A', 'B']), &registry);

    let bytes = assemble(&report, &registry).expect("assemble");
    let font = FontRef::new(&bytes).expect("parse merged font");

    // 'A' comes from the base font even though the fallback also covers it
    assert_eq!(merged_advance(&font, 'A'), Some(500));
    assert_eq!(merged_advance(&font, 'B'), Some(600));
}

#[test]
fn test_conflicting_decisions_are_rejected_at_assembly() {
    let base = make_test_font(&[('A', 500)], 1000);
    let fallback = make_test_font(&[('A', 700)], 1000);
    let registry = registry(vec![("base.ttf", base), ("fallback.ttf", fallback)]);

    // Two decisions claim the same codepoint with different winners; the
    // resolver never produces this, so it has to be hand-built.
    let decision = |rank: usize| ResolutionDecision {
        codepoint: Codepoint::from('A'),
        winner: Some(SourceRank::new(rank)),
        rejected: Vec::new(),
    };
    let report = MergeReport::from_decisions(vec![decision(0), decision(1)]);

    let result = assemble(&report, &registry);
    assert!(matches!(result, Err(MergeError::DuplicateCodepoint { .. })));
}

#[test]
fn test_unresolved_characters_are_reported_not_fatal() {
    let base = make_test_font(&[('A', 500)], 1000);

    let registry = registry(vec![("base.ttf", base)]);
    let report = resolve(&CharacterSet::from_chars(['A', '\u{4E00}']), &registry);

    assert_eq!(report.resolved_count(), 1);
    assert_eq!(report.unresolved_count(), 1);
    assert_eq!(report.resolved_count() + report.unresolved_count(), report.total());

    let bytes = assemble(&report, &registry).expect("assemble");
    let font = FontRef::new(&bytes).expect("parse merged font");
    assert!(font.cmap().unwrap().map_codepoint('A').is_some());
    assert!(font.cmap().unwrap().map_codepoint('\u{4E00}').is_none());
}

#[test]
fn test_composite_components_follow_their_glyph() {
    let base = make_test_font(&[('A', 500)], 1000);
    let fallback = make_composite_font('\u{00C5}', 1000);

    let registry = registry(vec![("base.ttf", base), ("fallback.ttf", fallback)]);
    let report = resolve(&CharacterSet::from_chars(['A', '\u{00C5}']), &registry);
    assert_eq!(report.resolved_count(), 2);

    let bytes = assemble(&report, &registry).expect("assemble");
    let font = FontRef::new(&bytes).expect("parse merged font");

    // .notdef + A + composite + its unmapped component
    assert_eq!(font.maxp().unwrap().num_glyphs(), 4);
    assert!(font.cmap().unwrap().map_codepoint('\u{00C5}').is_some());
}

#[test]
fn test_unused_source_is_flagged() {
    let base = make_test_font(&[('A', 500), ('B', 600)], 1000);
    let fallback = make_test_font(&[('A', 700)], 1000);

    let registry = registry(vec![("base.ttf", base), ("fallback.ttf", fallback)]);
    let report = resolve(&CharacterSet::from_chars(['A', 'B']), &registry);

    let unused = report.unused_sources(&registry);
    assert_eq!(unused.len(), 1);
    assert_eq!(unused[0].as_usize(), 1);
}

#[test]
fn test_mismatched_units_per_em_is_rejected() {
    let base = make_test_font(&[('A', 500)], 1000);
    let fallback = make_test_font(&[('B', 600)], 2048);

    let result = SourceRegistry::from_data(vec![
        (PathBuf::from("base.ttf"), base),
        (PathBuf::from("fallback.ttf"), fallback),
    ]);
    assert!(matches!(result, Err(MergeError::IncompatibleUnitsPerEm { .. })));
}

#[test]
fn test_disjoint_coverage_is_order_invariant() {
    let alpha = make_test_font(&[('A', 500)], 1000);
    let beta = make_test_font(&[('B', 600)], 1000);
    let chars = CharacterSet::from_chars(['A', 'B']);

    for fonts in [
        vec![("alpha.ttf", alpha.clone()), ("beta.ttf", beta.clone())],
        vec![("beta.ttf", beta), ("alpha.ttf", alpha)],
    ] {
        let registry = registry(fonts);
        let report = resolve(&chars, &registry);
        assert_eq!(report.resolved_count(), 2);

        let bytes = assemble(&report, &registry).expect("assemble");
        let font = FontRef::new(&bytes).expect("parse merged font");
        // Either order, each character keeps its own source's glyph
        assert_eq!(merged_advance(&font, 'A'), Some(500));
        assert_eq!(merged_advance(&font, 'B'), Some(600));
    }
}

#[test]
fn test_assembly_is_deterministic() {
    let base = make_test_font(&[('A', 500), ('C', 550)], 1000);
    let fallback = make_test_font(&[('B', 600)], 1000);

    let registry = registry(vec![("base.ttf", base), ("fallback.ttf", fallback)]);
    let report = resolve(&CharacterSet::from_chars(['A', 'B', 'C']), &registry);

    let first = assemble(&report, &registry).expect("assemble");
    let second = assemble(&report, &registry).expect("assemble");
    assert_eq!(first, second);
}

// ============================================================================
// Full pipeline
// ============================================================================

fn pipeline_config(dir: &std::path::Path, fonts: &[(&str, Vec<u8>)], chars: &str) -> MergeConfig {
    let mut font_paths = Vec::new();
    for (name, data) in fonts {
        let path = dir.join(name);
        write(&path, data).unwrap();
        font_paths.push(path);
    }

    let chars_path = dir.join("chars.txt");
    write(&chars_path, chars).unwrap();

    MergeConfig {
        fonts: font_paths,
        chars: chars_path,
        output: dir.join("merged.ttf"),
        log: None,
        glyph_sheet: None,
        sheet: SheetOptions::default(),
    }
}

#[test]
fn test_pipeline_writes_font_log_and_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let base = make_test_font(&[('A', 500)], 1000);
    let fallback = make_test_font(&[('B', 600)], 1000);

    let mut config =
        pipeline_config(dir.path(), &[("base.ttf", base), ("fallback.ttf", fallback)], "AB\n");
    config.log = Some(dir.path().join("merge.log"));
    config.glyph_sheet = Some(dir.path().join("sheet.png"));

    let summary = run(&config).expect("pipeline");
    assert_eq!(summary.required, 2);
    assert_eq!(summary.resolved, 2);
    assert_eq!(summary.unresolved, 0);
    assert!(summary.report_failures.is_empty());

    let font = read(&config.output).unwrap();
    assert_eq!(font.len(), summary.output_bytes);
    FontRef::new(&font).expect("parse output font");

    let log = std::fs::read_to_string(config.log.as_ref().unwrap()).unwrap();
    assert!(log.contains("U+0041 'A' <- base.ttf"));
    assert!(log.contains("U+0042 'B' <- fallback.ttf (rejected: base.ttf)"));
    assert!(log.contains("# 2 characters: 2 resolved, 0 unresolved"));

    let sheet = image::open(config.glyph_sheet.as_ref().unwrap()).expect("parse sheet");
    // 2 glyphs in 16 columns: one 96px row
    assert_eq!(sheet.height(), 96);
    assert_eq!(sheet.width(), 16 * 96);
}

#[test]
fn test_pipeline_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let base = make_test_font(&[('A', 500), ('B', 600)], 1000);

    let mut config = pipeline_config(dir.path(), &[("base.ttf", base)], "AB\n");
    config.glyph_sheet = Some(dir.path().join("sheet.png"));

    run(&config).expect("first run");
    let font1 = read(&config.output).unwrap();
    let sheet1 = read(config.glyph_sheet.as_ref().unwrap()).unwrap();

    run(&config).expect("second run");
    assert_eq!(read(&config.output).unwrap(), font1);
    assert_eq!(read(config.glyph_sheet.as_ref().unwrap()).unwrap(), sheet1);
}

#[test]
fn test_empty_character_list_aborts_before_output() {
    let dir = tempfile::tempdir().unwrap();
    let base = make_test_font(&[('A', 500)], 1000);

    let config = pipeline_config(dir.path(), &[("base.ttf", base)], "  \n\n");
    let result = run(&config);

    assert!(matches!(result, Err(MergeError::EmptyCharacterSet { .. })));
    assert!(!config.output.exists());
}

#[test]
fn test_invalid_source_aborts_before_output() {
    let dir = tempfile::tempdir().unwrap();

    let config = pipeline_config(dir.path(), &[("bogus.ttf", b"not a font".to_vec())], "A\n");
    let result = run(&config);

    match result {
        Err(MergeError::SourceLoad { path, .. }) => {
            assert!(path.ends_with("bogus.ttf"));
        }
        other => panic!("expected SourceLoad error, got {:?}", other.err()),
    }
    assert!(!config.output.exists());
}

#[test]
fn test_character_directory_input() {
    let dir = tempfile::tempdir().unwrap();
    let base = make_test_font(&[('A', 500), ('B', 600), ('C', 550)], 1000);

    let chars_dir = dir.path().join("charsets");
    std::fs::create_dir(&chars_dir).unwrap();
    write(chars_dir.join("one.txt"), "AB\n").unwrap();
    write(chars_dir.join("two.txt"), "BC\n").unwrap();
    write(chars_dir.join("ignored.csv"), "Z\n").unwrap();

    let font_path = dir.path().join("base.ttf");
    write(&font_path, &base).unwrap();

    let config = MergeConfig {
        fonts: vec![font_path],
        chars: chars_dir,
        output: dir.path().join("merged.ttf"),
        log: None,
        glyph_sheet: None,
        sheet: SheetOptions::default(),
    };

    let summary = run(&config).expect("pipeline");
    // A, B, C deduplicated across files; Z filtered out with its file
    assert_eq!(summary.required, 3);
    assert_eq!(summary.resolved, 3);
}
