use std::f64::consts::TAU;

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

use crate::config::Rgb;
use crate::error::{FxError, Result};
use crate::particles::raster::{GlyphBitmap, GlyphRasterizer, TextLayout};
use crate::particles::DrawSurface;

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| FxError::CapabilityUnavailable("2D canvas not supported".into()))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| FxError::CapabilityUnavailable("2d context has wrong type".into()))
}

/// The visible particle canvas.
pub struct Canvas2dSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    fill: Option<Rgb>,
}

impl Canvas2dSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self> {
        let ctx = context_2d(&canvas)?;
        Ok(Self {
            canvas,
            ctx,
            fill: None,
        })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

impl DrawSurface for Canvas2dSurface {
    fn clear(&mut self, width: f64, height: f64) {
        let (w, h) = (width.max(0.0) as u32, height.max(0.0) as u32);
        if self.canvas.width() != w || self.canvas.height() != h {
            // Resizing wipes the canvas and its state.
            self.canvas.set_width(w);
            self.canvas.set_height(h);
            self.fill = None;
        } else {
            self.ctx.clear_rect(0.0, 0.0, width, height);
        }
    }

    fn fill_disc(&mut self, x: f64, y: f64, radius: f64, color: Rgb) {
        if self.fill != Some(color) {
            self.ctx.set_fill_style_str(&color.to_css());
            self.fill = Some(color);
        }
        self.ctx.begin_path();
        if self.ctx.arc(x, y, radius, 0.0, TAU).is_ok() {
            self.ctx.fill();
        }
    }
}

/// Draws text on a detached canvas and reads its pixels back.
pub struct CanvasRasterizer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasRasterizer {
    pub fn new(document: &Document) -> Result<Self> {
        let canvas: HtmlCanvasElement = document.create_element("canvas")?.unchecked_into();
        let ctx = context_2d(&canvas)?;
        Ok(Self { canvas, ctx })
    }
}

impl GlyphRasterizer for CanvasRasterizer {
    fn rasterize(&mut self, layout: &TextLayout, title: &str, subtitle: &str) -> Result<GlyphBitmap> {
        self.canvas.set_width(layout.bitmap_width);
        self.canvas.set_height(layout.bitmap_height);

        let ctx = &self.ctx;
        let centre_x = f64::from(layout.bitmap_width) / 2.0;
        ctx.set_fill_style_str("white");
        ctx.set_text_align("center");
        ctx.set_text_baseline("middle");

        ctx.set_font(&layout.font(layout.title_font_px));
        ctx.fill_text(title, centre_x, layout.title_y)?;
        if !subtitle.is_empty() {
            ctx.set_font(&layout.font(layout.subtitle_font_px));
            ctx.fill_text(subtitle, centre_x, layout.subtitle_y)?;
        }

        let image = ctx
            .get_image_data(0.0, 0.0, f64::from(layout.bitmap_width), f64::from(layout.bitmap_height))
            .map_err(|e| FxError::Rasterization(format!("{e:?}")))?;
        let rgba = image.data();
        GlyphBitmap::from_rgba(image.width() as usize, image.height() as usize, &rgba)
            .ok_or_else(|| FxError::Rasterization("pixel buffer does not match its size".into()))
    }
}
