//! Character set loading
//!
//! The required character universe comes from a plain-text file (or a
//! directory of `.txt` files): every character on a non-empty line joins the
//! set. Input order is preserved and duplicates collapse to their first
//! occurrence so that downstream decisions, logs, and the glyph sheet are
//! reproducible across runs.

use std::{
    fs::{read_dir, read_to_string},
    path::{Path, PathBuf},
};

use indexmap::IndexSet;
use log::debug;

use crate::{MergeError, Result, types::Codepoint};

/// Ordered, deduplicated set of characters the merged font must cover
#[derive(Debug, Clone, Default)]
pub struct CharacterSet {
    chars: IndexSet<char>,
}

impl CharacterSet {
    /// Load the character set from a text file or a directory of `.txt` files.
    ///
    /// Directory entries are visited in sorted filename order so that the
    /// resulting iteration order never depends on filesystem enumeration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let files = list_input_files(path)?;

        let mut chars = IndexSet::new();
        for file in &files {
            let text = read_to_string(file).map_err(|source| MergeError::CharacterSetRead {
                path: file.clone(),
                source,
            })?;
            for line in text.lines() {
                chars.extend(line.trim().chars());
            }
            debug!("read {}: {} unique characters so far", file.display(), chars.len());
        }

        if chars.is_empty() {
            return Err(MergeError::EmptyCharacterSet { path: path.to_path_buf() });
        }

        Ok(Self { chars })
    }

    /// Build a character set directly from characters, keeping first-seen order
    pub fn from_chars(chars: impl IntoIterator<Item = char>) -> Self {
        Self { chars: chars.into_iter().collect() }
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn contains(&self, ch: char) -> bool {
        self.chars.contains(&ch)
    }

    /// Iterate characters in input order
    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.chars.iter().copied()
    }

    /// Iterate codepoints in input order
    pub fn codepoints(&self) -> impl Iterator<Item = Codepoint> + '_ {
        self.chars.iter().map(|&ch| Codepoint::from(ch))
    }
}

fn list_input_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_dir() {
        let entries = read_dir(path).map_err(|source| MergeError::CharacterSetRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "txt"))
            .collect();
        files.sort();
        if files.is_empty() {
            return Err(MergeError::EmptyCharacterSet { path: path.to_path_buf() });
        }
        Ok(files)
    } else {
        Ok(vec![path.to_path_buf()])
    }
}
