//! TrueType outline conversion
//!
//! Glyphs are copied from their winning source unchanged, except that
//! composite components are remapped to output glyph ids and per-glyph
//! hinting instructions are stripped from every source but the base font.
//! Instructions may reference functions in `fpgm` or values in `cvt`, and
//! only the base font's copies of those tables survive the merge; keeping
//! foreign instructions could crash strict rasterizers.

use read_fonts::tables::glyf::{CurvePoint, Glyph as ReadGlyph};
use write_fonts::tables::glyf::{
    Anchor, Bbox, Component, ComponentFlags, CompositeGlyph, Contour, Glyph, SimpleGlyph,
    Transform,
};

use crate::types::{OutputGlyphId, SourceGlyphId};

/// Convert a read-fonts glyph to a write-fonts glyph.
///
/// `remap` translates the owning source's glyph ids into output ids; any
/// component the remap does not know collapses to `.notdef`.
pub fn convert_glyph(
    glyph: &ReadGlyph,
    remap: impl Fn(SourceGlyphId) -> Option<OutputGlyphId>,
    strip_hinting: bool,
) -> Glyph {
    match glyph {
        ReadGlyph::Simple(simple) => {
            let mut contours: Vec<Contour> = Vec::new();

            let end_pts = simple.end_pts_of_contours();
            let mut points_iter = simple.points();
            let mut current_point = 0usize;

            for end_pt in end_pts {
                let end = end_pt.get() as usize;
                let mut contour_points = Vec::new();

                while current_point <= end {
                    if let Some(pt) = points_iter.next() {
                        contour_points.push(CurvePoint {
                            x: pt.x,
                            y: pt.y,
                            on_curve: pt.on_curve,
                        });
                    }
                    current_point += 1;
                }

                contours.push(contour_points.into());
            }

            let bbox = Bbox {
                x_min: simple.x_min(),
                y_min: simple.y_min(),
                x_max: simple.x_max(),
                y_max: simple.y_max(),
            };

            let instructions = if strip_hinting { vec![] } else { simple.instructions().to_vec() };

            Glyph::Simple(SimpleGlyph { bbox, contours, instructions })
        }
        ReadGlyph::Composite(composite) => {
            let mut components: Vec<Component> = Vec::new();

            for comp in composite.components() {
                let old_gid = SourceGlyphId::new(comp.glyph.to_u32() as u16);
                let new_gid = remap(old_gid).map(OutputGlyphId::to_u16).unwrap_or(0);

                let anchor = match comp.anchor {
                    read_fonts::tables::glyf::Anchor::Offset { x, y } => Anchor::Offset { x, y },
                    read_fonts::tables::glyf::Anchor::Point { base, component } => {
                        Anchor::Point { base, component }
                    }
                };

                let transform = Transform {
                    xx: comp.transform.xx,
                    yx: comp.transform.yx,
                    xy: comp.transform.xy,
                    yy: comp.transform.yy,
                };

                let flags: ComponentFlags = comp.flags.into();

                components.push(Component {
                    glyph: font_types::GlyphId16::new(new_gid),
                    anchor,
                    transform,
                    flags,
                });
            }

            if components.is_empty() {
                return Glyph::Empty;
            }

            let bbox = Bbox {
                x_min: composite.x_min(),
                y_min: composite.y_min(),
                x_max: composite.x_max(),
                y_max: composite.y_max(),
            };

            let first_component = components.remove(0);
            let mut composite_glyph = CompositeGlyph::new(first_component, bbox);

            for comp in components {
                composite_glyph.add_component(comp, bbox);
            }

            Glyph::Composite(composite_glyph)
        }
    }
}
