//! cmap construction for the assembled font

use write_fonts::tables::cmap::{
    Cmap, Cmap12, CmapSubtable, EncodingRecord, PlatformId, SequentialMapGroup,
};

use crate::{
    MergeError, Result,
    types::{Codepoint, OutputGlyphId},
};

/// Sort character mappings and reject codepoint collisions.
///
/// The resolver produces one decision per character, so a duplicate here
/// means the decision list handed to the assembler is inconsistent; the
/// output format cannot map one codepoint to two glyphs.
pub fn sorted_char_mappings(
    entries: &[(Codepoint, OutputGlyphId)],
) -> Result<Vec<(u32, u32)>> {
    let mut sorted: Vec<(Codepoint, OutputGlyphId)> = entries.to_vec();
    sorted.sort_by_key(|(cp, _)| *cp);

    for pair in sorted.windows(2) {
        let [(cp_a, gid_a), (cp_b, gid_b)] = pair else { continue };
        if cp_a == cp_b && gid_a != gid_b {
            return Err(MergeError::DuplicateCodepoint {
                codepoint: *cp_a,
                existing: *gid_a,
                duplicate: *gid_b,
            });
        }
    }

    sorted.dedup();
    Ok(sorted.into_iter().map(|(cp, gid)| (cp.to_u32(), gid.to_u32())).collect())
}

/// Build a cmap table using only format 12 subtables.
///
/// Format 4 uses u16 segment counts and overflows with large CJK character
/// sets, so the assembled font always carries format 12 under both the
/// Unicode and Windows platforms.
pub fn build_cmap_format12(mappings: &[(u32, u32)]) -> Cmap {
    let groups = build_sequential_groups(mappings);

    let cmap12 = Cmap12 { language: 0, groups };

    let encoding_records = vec![
        EncodingRecord::new(
            PlatformId::Unicode,
            4, // Full Unicode
            CmapSubtable::Format12(cmap12.clone()),
        ),
        EncodingRecord::new(
            PlatformId::Windows,
            10, // Full Unicode
            CmapSubtable::Format12(cmap12),
        ),
    ];

    Cmap::new(encoding_records)
}

/// Build sequential map groups from sorted (codepoint, glyph id) pairs.
///
/// Groups consecutive codepoints that map to consecutive glyph ids.
fn build_sequential_groups(mappings: &[(u32, u32)]) -> Vec<SequentialMapGroup> {
    if mappings.is_empty() {
        return Vec::new();
    }

    let mut groups = Vec::new();
    let mut group_start_cp = mappings[0].0;
    let mut group_start_gid = mappings[0].1;
    let mut prev_cp = group_start_cp;
    let mut prev_gid = group_start_gid;

    for &(cp, gid) in &mappings[1..] {
        if cp == prev_cp + 1 && gid == prev_gid + 1 {
            prev_cp = cp;
            prev_gid = gid;
        } else {
            groups.push(SequentialMapGroup::new(group_start_cp, prev_cp, group_start_gid));
            group_start_cp = cp;
            group_start_gid = gid;
            prev_cp = cp;
            prev_gid = gid;
        }
    }

    groups.push(SequentialMapGroup::new(group_start_cp, prev_cp, group_start_gid));

    groups
}
