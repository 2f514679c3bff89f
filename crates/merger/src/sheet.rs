//! Glyph sheet rendering
//!
//! Renders every resolved glyph from the *assembled* font into a fixed grid
//! and encodes it as a PNG, so two merge runs can be diffed visually (and
//! byte-for-byte: identical inputs produce identical sheets). Cells are laid
//! out in decision order, one glyph per cell, left to right, top to bottom.

use std::path::Path;

use image::{GrayImage, Luma};
use log::debug;
use swash::{
    FontRef,
    scale::{Render, ScaleContext, Source},
    zeno,
};

use crate::ReportError;

/// Layout knobs for the glyph sheet
#[derive(Debug, Clone, Copy)]
pub struct SheetOptions {
    /// Glyph cells per row
    pub columns: u32,
    /// Rendered glyph size in pixels
    pub glyph_px: u32,
}

impl Default for SheetOptions {
    fn default() -> Self {
        Self { columns: 16, glyph_px: 64 }
    }
}

impl SheetOptions {
    fn cell_px(&self) -> u32 {
        // Quarter-size padding keeps ascenders/descenders inside the cell.
        self.glyph_px + self.glyph_px / 2
    }
}

/// Render the glyph sheet for `chars` (in order) from the assembled font.
pub fn render_glyph_sheet(
    font_data: &[u8],
    chars: &[char],
    options: &SheetOptions,
) -> Result<GrayImage, ReportError> {
    let font = FontRef::from_index(font_data, 0)
        .ok_or_else(|| ReportError::Render("assembled font could not be reparsed".into()))?;

    let columns = options.columns.max(1);
    let cell = options.cell_px();
    let rows = (chars.len() as u32).div_ceil(columns).max(1);

    let width = columns * cell;
    let height = rows * cell;
    let mut img = GrayImage::from_pixel(width.max(1), height.max(1), Luma([255u8]));

    // Baseline sits a fixed ascent below the top of each cell.
    let metrics = font.metrics(&[]);
    let scale = options.glyph_px as f32 / metrics.units_per_em.max(1) as f32;
    let pad = (cell - options.glyph_px) / 2;
    let baseline = pad as f32 + metrics.ascent * scale;

    let charmap = font.charmap();
    let mut context = ScaleContext::new();
    let mut scaler = context
        .builder(font)
        .size(options.glyph_px as f32)
        .hint(false)
        .build();

    for (idx, &ch) in chars.iter().enumerate() {
        let glyph_id = charmap.map(ch);
        if glyph_id == 0 {
            // Not in the assembled font; leave the cell blank.
            continue;
        }

        let Some(mask) = Render::new(&[Source::Outline])
            .format(zeno::Format::Alpha)
            .render(&mut scaler, glyph_id)
        else {
            continue;
        };

        let col = idx as u32 % columns;
        let row = idx as u32 / columns;
        let origin_x = (col * cell) as i32 + pad as i32 + mask.placement.left;
        let origin_y = (row * cell) as i32 + baseline as i32 - mask.placement.top;

        blit_mask(&mut img, &mask.data, mask.placement.width, mask.placement.height, origin_x, origin_y);
    }

    debug!("rendered glyph sheet: {} glyph cells, {}x{} px", chars.len(), width, height);
    Ok(img)
}

/// Render and write the glyph sheet PNG.
pub fn write_glyph_sheet(
    font_data: &[u8],
    chars: &[char],
    options: &SheetOptions,
    path: &Path,
) -> Result<(), ReportError> {
    let img = render_glyph_sheet(font_data, chars, options)?;
    img.save(path).map_err(|source| ReportError::Sheet { path: path.to_path_buf(), source })
}

/// Blend an alpha mask onto the sheet as dark-on-light coverage.
fn blit_mask(img: &mut GrayImage, data: &[u8], width: u32, height: u32, x: i32, y: i32) {
    let (img_w, img_h) = img.dimensions();
    let mut i = 0usize;

    for off_y in 0..height as i32 {
        for off_x in 0..width as i32 {
            let alpha = data.get(i).copied().unwrap_or(0);
            i += 1;

            let px = x + off_x;
            let py = y + off_y;
            if px < 0 || py < 0 || px as u32 >= img_w || py as u32 >= img_h {
                continue;
            }

            let pixel = img.get_pixel_mut(px as u32, py as u32);
            let shade = 255 - alpha;
            if shade < pixel.0[0] {
                *pixel = Luma([shade]);
            }
        }
    }
}
