//! Priority-ordered font sources
//!
//! Each input font is wrapped as a [`FontSource`]: its bytes, its priority
//! rank (input position, 0 = highest), and a codepoint-to-glyph coverage map
//! built once at load time from the best cmap subtable. Sources are
//! read-only for the duration of a merge run.

use std::{
    collections::HashMap,
    fs::read,
    path::{Path, PathBuf},
};

use log::{debug, info};
use read_fonts::{
    FontRef, TableProvider,
    tables::cmap::{Cmap, CmapSubtable, PlatformId},
};

use crate::{
    MergeError, Result,
    strategies::equal,
    types::{Codepoint, SourceGlyphId, SourceRank},
};

/// One loaded font file with priority rank and coverage map
pub struct FontSource {
    rank: SourceRank,
    path: PathBuf,
    data: Vec<u8>,
    charmap: HashMap<Codepoint, SourceGlyphId>,
    units_per_em: u16,
}

impl FontSource {
    fn load(rank: SourceRank, path: &Path) -> Result<Self> {
        let data = read(path).map_err(|source| MergeError::SourceRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_data(rank, path.to_path_buf(), data)
    }

    /// Wrap already-loaded font bytes; used by [`SourceRegistry::from_data`]
    fn from_data(rank: SourceRank, path: PathBuf, data: Vec<u8>) -> Result<Self> {
        let load_err = |source| MergeError::SourceLoad { path: path.clone(), source };

        let font = FontRef::new(&data).map_err(load_err)?;
        let units_per_em = font.head().map_err(load_err)?.units_per_em();
        let cmap = font.cmap().map_err(load_err)?;
        let charmap = build_charmap(&cmap);

        debug!("{}: rank {rank}, {} mapped codepoints", path.display(), charmap.len());

        Ok(Self { rank, path, data, charmap, units_per_em })
    }

    pub fn rank(&self) -> SourceRank {
        self.rank
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Short identity for logs: the file name, falling back to the full path
    pub fn label(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    /// Coverage predicate: does this source provide a glyph for `cp`?
    pub fn has(&self, cp: Codepoint) -> bool {
        self.charmap.contains_key(&cp)
    }

    /// The source-local glyph id for `cp`, if covered
    pub fn glyph_id(&self, cp: Codepoint) -> Option<SourceGlyphId> {
        self.charmap.get(&cp).copied()
    }

    /// Re-borrow the parsed font. The data was validated at load, so this
    /// only fails if the bytes were somehow corrupted in memory.
    pub fn font(&self) -> Result<FontRef<'_>> {
        FontRef::new(&self.data).map_err(|source| MergeError::SourceLoad {
            path: self.path.clone(),
            source,
        })
    }
}

/// The ordered collection of font sources for one merge run
pub struct SourceRegistry {
    sources: Vec<FontSource>,
}

impl SourceRegistry {
    /// Load fonts in priority order; the first path becomes rank 0.
    ///
    /// Any unreadable or unparseable font aborts the run, naming the file.
    pub fn load(paths: &[PathBuf]) -> Result<Self> {
        let sources = paths
            .iter()
            .enumerate()
            .map(|(i, path)| FontSource::load(SourceRank::new(i), path))
            .collect::<Result<Vec<_>>>()?;
        Self::from_sources(sources)
    }

    /// Build a registry from in-memory font blobs, labelled by path
    pub fn from_data(fonts: Vec<(PathBuf, Vec<u8>)>) -> Result<Self> {
        let sources = fonts
            .into_iter()
            .enumerate()
            .map(|(i, (path, data))| FontSource::from_data(SourceRank::new(i), path, data))
            .collect::<Result<Vec<_>>>()?;
        Self::from_sources(sources)
    }

    fn from_sources(sources: Vec<FontSource>) -> Result<Self> {
        if sources.is_empty() {
            return Err(MergeError::NoSources);
        }

        // Outlines from mismatched unitsPerEm would silently misscale, so a
        // mixed set is rejected up front.
        let upems: Vec<u16> = sources.iter().map(|s| s.units_per_em()).collect();
        equal(&upems, |&expected, &actual| {
            let odd = sources.iter().find(|s| s.units_per_em() == actual);
            MergeError::IncompatibleUnitsPerEm {
                path: odd.map(|s| s.path().to_path_buf()).unwrap_or_default(),
                expected,
                actual,
            }
        })?;

        info!("loaded {} font sources", sources.len());
        Ok(Self { sources })
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Iterate sources in ascending rank order
    pub fn iter(&self) -> impl Iterator<Item = &FontSource> {
        self.sources.iter()
    }

    pub fn get(&self, rank: SourceRank) -> Option<&FontSource> {
        self.sources.get(rank.as_usize())
    }

    /// The base font: rank 0, supplier of `.notdef` and shared tables
    pub fn base(&self) -> &FontSource {
        &self.sources[0]
    }

    /// Log labels for every source, indexed by rank
    pub fn labels(&self) -> Vec<String> {
        self.sources.iter().map(FontSource::label).collect()
    }
}

/// Extract a codepoint-to-glyph map from the best cmap subtable.
///
/// Preference order: format 12 (full Unicode), format 4 (BMP), then
/// whatever parses. Within one subtable the first mapping for a codepoint
/// wins.
fn build_charmap(cmap: &Cmap) -> HashMap<Codepoint, SourceGlyphId> {
    let mut charmap = HashMap::new();
    if let Some(subtable) = find_best_subtable(cmap) {
        for (cp, gid) in iter_subtable(&subtable) {
            charmap.entry(cp).or_insert(gid);
        }
    }
    charmap
}

fn find_best_subtable<'a>(cmap: &'a Cmap<'a>) -> Option<CmapSubtable<'a>> {
    let records = cmap.encoding_records();

    // Try to find format 12 first (Unicode full)
    for record in records {
        if (record.platform_id() == PlatformId::Unicode
            || (record.platform_id() == PlatformId::Windows && record.encoding_id() == 10))
            && let Ok(subtable) = record.subtable(cmap.offset_data())
            && matches!(subtable, CmapSubtable::Format12(_))
        {
            return Some(subtable);
        }
    }

    // Fall back to format 4 (BMP)
    for record in records {
        if (record.platform_id() == PlatformId::Unicode
            || (record.platform_id() == PlatformId::Windows && record.encoding_id() == 1))
            && let Ok(subtable) = record.subtable(cmap.offset_data())
            && matches!(subtable, CmapSubtable::Format4(_))
        {
            return Some(subtable);
        }
    }

    // Take any subtable
    records.iter().find_map(|r| r.subtable(cmap.offset_data()).ok())
}

fn iter_subtable(subtable: &CmapSubtable) -> Vec<(Codepoint, SourceGlyphId)> {
    let mut mappings = Vec::new();

    match subtable {
        CmapSubtable::Format4(f4) => {
            let end_codes = f4.end_code();
            let start_codes = f4.start_code();
            let id_deltas = f4.id_delta();
            let id_range_offsets = f4.id_range_offsets();
            let glyph_id_array = f4.glyph_id_array();

            let seg_count = f4.seg_count_x2() as usize / 2;
            for seg in 0..seg_count {
                let end_code = end_codes.get(seg).map(|v| v.get()).unwrap_or(0xFFFF);
                let start_code = start_codes.get(seg).map(|v| v.get()).unwrap_or(0);
                let id_delta = id_deltas.get(seg).map(|v| v.get()).unwrap_or(0);
                let id_range_offset = id_range_offsets.get(seg).map(|v| v.get()).unwrap_or(0);

                if start_code == 0xFFFF {
                    continue;
                }

                for cp in start_code..=end_code {
                    let gid = if id_range_offset == 0 {
                        ((cp as i32 + id_delta as i32) & 0xFFFF) as u16
                    } else {
                        let glyph_idx = (id_range_offset as usize / 2) + (cp - start_code) as usize
                            - (seg_count - seg);
                        match glyph_id_array.get(glyph_idx) {
                            Some(gid) if gid.get() != 0 => {
                                ((gid.get() as i32 + id_delta as i32) & 0xFFFF) as u16
                            }
                            _ => 0,
                        }
                    };

                    if gid != 0 {
                        mappings.push((Codepoint::new(cp as u32), SourceGlyphId::new(gid)));
                    }
                }
            }
        }
        CmapSubtable::Format12(f12) => {
            for group in f12.groups() {
                let start = group.start_char_code();
                let end = group.end_char_code();
                let mut gid = group.start_glyph_id();
                for cp in start..=end {
                    if gid != 0 {
                        mappings.push((Codepoint::new(cp), SourceGlyphId::new(gid as u16)));
                    }
                    gid += 1;
                }
            }
        }
        CmapSubtable::Format6(f6) => {
            let first = f6.first_code() as u32;
            for (i, gid) in f6.glyph_id_array().iter().enumerate() {
                let gid = gid.get();
                if gid != 0 {
                    mappings.push((Codepoint::new(first + i as u32), SourceGlyphId::new(gid)));
                }
            }
        }
        _ => {}
    }

    mappings
}
