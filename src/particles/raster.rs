//! Text → alpha bitmap → particle rest positions.

use crate::config::ParticleConfig;
use crate::error::Result;

use super::Viewport;

/// Where and how big the title and subtitle are drawn on the offscreen bitmap.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub bitmap_width: u32,
    pub bitmap_height: u32,
    pub title_font_px: f64,
    pub subtitle_font_px: f64,
    /// Vertical centre lines (text is drawn horizontally centred, baseline middle).
    pub title_y: f64,
    pub subtitle_y: f64,
    /// Added to bitmap coordinates to land in viewport coordinates.
    pub offset: (f64, f64),
    pub font_family: String,
}

impl TextLayout {
    /// Sizes the title so its glyph run fits the viewport width, and also
    /// the viewport height so the whole block stays on screen.
    pub fn compute(title: &str, viewport: Viewport, config: &ParticleConfig) -> Option<Self> {
        if !viewport.is_drawable() {
            return None;
        }
        let chars = title.chars().count().max(1) as f64;
        let block_factor = 1.0 + config.subtitle_scale + config.subtitle_offset;
        let title_font_px = (viewport.width / (chars * config.title_width_factor))
            .min(config.title_size_max)
            .min(viewport.height / (1.5 * block_factor));
        if !(title_font_px.is_finite() && title_font_px >= 1.0) {
            return None;
        }
        let subtitle_font_px = title_font_px * config.subtitle_scale;
        let block_height = title_font_px * block_factor;

        let bitmap_width = viewport.width.floor() as u32;
        let bitmap_height = (block_height * 1.5).ceil() as u32;
        let title_y = f64::from(bitmap_height) / 2.0 - subtitle_font_px / 2.0;
        let subtitle_y = title_y + title_font_px * config.subtitle_offset;

        Some(Self {
            bitmap_width,
            bitmap_height,
            title_font_px,
            subtitle_font_px,
            title_y,
            subtitle_y,
            offset: (
                (viewport.width - f64::from(bitmap_width)) / 2.0,
                (viewport.height - f64::from(bitmap_height)) / 2.0,
            ),
            font_family: config.font_family.clone(),
        })
    }

    /// CSS font shorthand for a given pixel size.
    pub fn font(&self, px: f64) -> String {
        format!("bold {px}px {}", self.font_family)
    }
}

/// Alpha channel of an offscreen rendering, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphBitmap {
    width: usize,
    height: usize,
    alpha: Vec<u8>,
}

impl GlyphBitmap {
    pub fn blank(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            alpha: vec![0; width * height],
        }
    }

    /// Keeps only the alpha byte of each RGBA pixel. Returns `None` when the
    /// buffer does not match the dimensions.
    pub fn from_rgba(width: usize, height: usize, rgba: &[u8]) -> Option<Self> {
        if rgba.len() != width * height * 4 {
            return None;
        }
        Some(Self {
            width,
            height,
            alpha: rgba.chunks_exact(4).map(|px| px[3]).collect(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn alpha_at(&self, x: usize, y: usize) -> u8 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        self.alpha[y * self.width + x]
    }

    /// Paints an axis-aligned block, clipped to the bitmap.
    pub fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, alpha: u8) {
        let x0 = x.max(0.0).floor() as usize;
        let y0 = y.max(0.0).floor() as usize;
        let x1 = ((x + w).max(0.0).ceil() as usize).min(self.width);
        let y1 = ((y + h).max(0.0).ceil() as usize).min(self.height);
        for row in y0..y1 {
            self.alpha[row * self.width + x0.min(x1)..row * self.width + x1].fill(alpha);
        }
    }

    /// Stride-sampled pixels whose alpha is strictly above `threshold`.
    pub fn ink(&self, stride: usize, threshold: u8) -> impl Iterator<Item = (usize, usize)> + '_ {
        let stride = stride.max(1);
        (0..self.height).step_by(stride).flat_map(move |y| {
            (0..self.width)
                .step_by(stride)
                .filter(move |&x| self.alpha[y * self.width + x] > threshold)
                .map(move |x| (x, y))
        })
    }
}

/// Draws the title and subtitle described by a [`TextLayout`].
pub trait GlyphRasterizer {
    fn rasterize(&mut self, layout: &TextLayout, title: &str, subtitle: &str) -> Result<GlyphBitmap>;
}
