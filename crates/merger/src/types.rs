//! Domain-specific newtypes for type safety
//!
//! These types keep source-font glyph ids, output-font glyph ids, and
//! priority ranks from being mixed up, and provide self-documenting APIs.

use std::{
    fmt,
    fmt::{Display, Formatter, Result},
};

macro_rules! u16_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u16);

        impl $name {
            pub const fn new(id: u16) -> Self {
                Self(id)
            }

            pub const fn to_u16(self) -> u16 {
                self.0
            }

            pub const fn to_u32(self) -> u32 {
                self.0 as u32
            }
        }

        impl From<u16> for $name {
            fn from(id: u16) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u16 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $label, self.0)
            }
        }
    };
}

u16_id!(
    /// A glyph ID within one source font (before merging)
    SourceGlyphId,
    "gid"
);

u16_id!(
    /// A glyph ID in the assembled output font
    OutputGlyphId,
    "out"
);

/// Priority rank of a font source; rank 0 is the highest priority
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceRank(pub usize);

impl SourceRank {
    pub const fn new(rank: usize) -> Self {
        Self(rank)
    }

    pub const fn as_usize(self) -> usize {
        self.0
    }

    /// The rank of the base font, which supplies `.notdef` and shared tables
    pub const BASE: SourceRank = SourceRank(0);
}

impl From<usize> for SourceRank {
    fn from(rank: usize) -> Self {
        Self(rank)
    }
}

impl From<SourceRank> for usize {
    fn from(SourceRank(rank): SourceRank) -> Self {
        rank
    }
}

impl Display for SourceRank {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "source[{}]", self.0)
    }
}

/// A Unicode codepoint required in the output font
#[repr(transparent)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Codepoint(pub u32);

impl Codepoint {
    pub const fn new(cp: u32) -> Self {
        Self(cp)
    }

    pub const fn to_u32(self) -> u32 {
        self.0
    }

    /// Convert to a Rust char if valid
    pub fn to_char(self) -> Option<char> {
        char::from_u32(self.0)
    }
}

impl From<u32> for Codepoint {
    fn from(cp: u32) -> Self {
        Self(cp)
    }
}

impl From<char> for Codepoint {
    fn from(ch: char) -> Self {
        Self(ch as u32)
    }
}

impl From<Codepoint> for u32 {
    fn from(cp: Codepoint) -> Self {
        cp.0
    }
}

impl Display for Codepoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "U+{:04X}", self.0)
    }
}
