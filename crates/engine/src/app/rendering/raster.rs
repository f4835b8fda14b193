use crate::app::camera::CircleMask;
use crate::app::display::Rect;
use crate::app::font::{glyph_bits, glyph_cell_lit, advance_px, line_advance_px, GLYPH_HEIGHT, GLYPH_WIDTH};

pub(crate) struct LoadedSprite {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) rgba: Vec<u8>,
}

/// Source rectangle inside a sprite, in sprite pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SpriteRegion {
    pub(crate) x: u32,
    pub(crate) y: u32,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

/// Region of frame `frame` in a row-major sheet; wraps past the last frame.
pub(crate) fn sheet_frame_region(
    sheet_width: u32,
    sheet_height: u32,
    frame_width: u32,
    frame_height: u32,
    frame: u32,
) -> Option<SpriteRegion> {
    if frame_width == 0 || frame_height == 0 {
        return None;
    }
    let columns = sheet_width / frame_width;
    let rows = sheet_height / frame_height;
    let total = columns.checked_mul(rows).filter(|total| *total > 0)?;
    let frame = frame % total;
    Some(SpriteRegion {
        x: (frame % columns) * frame_width,
        y: (frame / columns) * frame_height,
        width: frame_width,
        height: frame_height,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ClipRect {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

/// RGBA frame view restricted to one camera's viewport and mask.
pub(crate) struct Raster<'a> {
    frame: &'a mut [u8],
    width: u32,
    clip: ClipRect,
    mask: Option<CircleMask>,
}

impl<'a> Raster<'a> {
    pub(crate) fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            frame,
            width,
            clip: ClipRect {
                left: 0,
                top: 0,
                right: width as i32,
                bottom: height as i32,
            },
            mask: None,
        }
    }

    pub(crate) fn with_clip(mut self, viewport: Rect) -> Self {
        let left = viewport.x.round() as i32;
        let top = viewport.y.round() as i32;
        let right = (viewport.x + viewport.width).round() as i32;
        let bottom = (viewport.y + viewport.height).round() as i32;
        self.clip = ClipRect {
            left: left.max(self.clip.left),
            top: top.max(self.clip.top),
            right: right.min(self.clip.right),
            bottom: bottom.min(self.clip.bottom),
        };
        self
    }

    pub(crate) fn with_mask(mut self, mask: Option<CircleMask>) -> Self {
        self.mask = mask;
        self
    }

    pub(crate) fn plot(&mut self, x: i32, y: i32, color: [u8; 4], alpha: f32) {
        if x < self.clip.left || x >= self.clip.right || y < self.clip.top || y >= self.clip.bottom
        {
            return;
        }
        if let Some(mask) = self.mask {
            if !mask.contains(x as f32 + 0.5, y as f32 + 0.5) {
                return;
            }
        }
        let coverage = (color[3] as f32 / 255.0) * alpha.clamp(0.0, 1.0);
        if coverage <= 0.0 {
            return;
        }
        let Some(offset) = (y as usize)
            .checked_mul(self.width as usize)
            .and_then(|row| row.checked_add(x as usize))
            .and_then(|pixel| pixel.checked_mul(4))
        else {
            return;
        };
        let Some(pixel) = self.frame.get_mut(offset..offset + 4) else {
            return;
        };
        if coverage >= 1.0 {
            pixel[..3].copy_from_slice(&color[..3]);
        } else {
            for channel in 0..3 {
                let blended =
                    color[channel] as f32 * coverage + pixel[channel] as f32 * (1.0 - coverage);
                pixel[channel] = blended.round() as u8;
            }
        }
        pixel[3] = 255;
    }

    pub(crate) fn fill_clip(&mut self, color: [u8; 4]) {
        for y in self.clip.top..self.clip.bottom {
            for x in self.clip.left..self.clip.right {
                self.plot(x, y, color, 1.0);
            }
        }
    }

    /// Fills the pixels whose centres fall inside the rectangle.
    pub(crate) fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: [u8; 4], alpha: f32) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let left = x.round() as i32;
        let top = y.round() as i32;
        let right = (x + width).round() as i32;
        let bottom = (y + height).round() as i32;
        for py in top.max(self.clip.top)..bottom.min(self.clip.bottom) {
            for px in left.max(self.clip.left)..right.min(self.clip.right) {
                self.plot(px, py, color, alpha);
            }
        }
    }

    pub(crate) fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: [u8; 4], alpha: f32) {
        if radius <= 0.0 {
            return;
        }
        let left = (cx - radius).floor() as i32;
        let right = (cx + radius).ceil() as i32;
        let top = (cy - radius).floor() as i32;
        let bottom = (cy + radius).ceil() as i32;
        let r2 = radius * radius;
        for py in top.max(self.clip.top)..bottom.min(self.clip.bottom) {
            for px in left.max(self.clip.left)..right.min(self.clip.right) {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.plot(px, py, color, alpha);
                }
            }
        }
    }

    /// Nearest-neighbour scaled copy of `region` with its top-left at `(left, top)`.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn blit(
        &mut self,
        sprite: &LoadedSprite,
        region: SpriteRegion,
        left: f32,
        top: f32,
        scale: f32,
        flip_x: bool,
        alpha: f32,
    ) {
        if region.width == 0 || region.height == 0 || !scale.is_finite() || scale <= 0.0 {
            return;
        }
        if region.x + region.width > sprite.width || region.y + region.height > sprite.height {
            return;
        }
        let expected_len = sprite.width as usize * sprite.height as usize * 4;
        if sprite.rgba.len() < expected_len {
            return;
        }
        let out_w = (region.width as f32 * scale).round().max(1.0) as i32;
        let out_h = (region.height as f32 * scale).round().max(1.0) as i32;
        let left = left.round() as i32;
        let top = top.round() as i32;
        let inv_scale = scale.recip();
        for dy in 0..out_h {
            let py = top + dy;
            if py < self.clip.top || py >= self.clip.bottom {
                continue;
            }
            let src_y = ((dy as f32 * inv_scale) as u32).min(region.height - 1) + region.y;
            for dx in 0..out_w {
                let px = left + dx;
                if px < self.clip.left || px >= self.clip.right {
                    continue;
                }
                let mut src_x = ((dx as f32 * inv_scale) as u32).min(region.width - 1);
                if flip_x {
                    src_x = region.width - 1 - src_x;
                }
                let src_x = src_x + region.x;
                let offset = (src_y as usize * sprite.width as usize + src_x as usize) * 4;
                let color = [
                    sprite.rgba[offset],
                    sprite.rgba[offset + 1],
                    sprite.rgba[offset + 2],
                    sprite.rgba[offset + 3],
                ];
                if color[3] == 0 {
                    continue;
                }
                self.plot(px, py, color, alpha);
            }
        }
    }

    /// Draws pre-wrapped lines with their block's top-left at `(left, top)`.
    pub(crate) fn draw_text(
        &mut self,
        lines: &[String],
        left: f32,
        top: f32,
        cell_px: f32,
        color: [u8; 4],
        alpha: f32,
    ) {
        if cell_px <= 0.0 {
            return;
        }
        for (line_index, line) in lines.iter().enumerate() {
            let line_top = top + line_index as f32 * line_advance_px(cell_px);
            for (char_index, ch) in line.chars().enumerate() {
                let bits = glyph_bits(ch);
                if bits == 0 {
                    continue;
                }
                let glyph_left = left + char_index as f32 * advance_px(cell_px);
                for row in 0..GLYPH_HEIGHT {
                    for col in 0..GLYPH_WIDTH {
                        if !glyph_cell_lit(bits, row, col) {
                            continue;
                        }
                        self.fill_rect(
                            glyph_left + col as f32 * cell_px,
                            line_top + row as f32 * cell_px,
                            cell_px,
                            cell_px,
                            color,
                            alpha,
                        );
                    }
                }
            }
        }
    }
}
