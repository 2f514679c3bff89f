//! Table construction for the assembled font

pub mod cmap;
pub mod glyf;
pub mod hmtx;
pub mod metadata;
