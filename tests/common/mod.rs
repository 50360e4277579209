#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use hero_fx::audio::{AnalysisGraph, AudioGraphFactory};
use hero_fx::config::Rgb;
use hero_fx::error::{FxError, Result, ShaderStage};
use hero_fx::particles::raster::{GlyphBitmap, GlyphRasterizer, TextLayout};
use hero_fx::particles::DrawSurface;
use hero_fx::shader::GpuBackend;

/// Everything the fake GPU saw, shared with the test after the backend is moved.
#[derive(Debug, Default)]
pub struct GpuLog {
    pub layout: (f64, f64),
    pub dpr: f64,
    pub backing: (u32, u32),
    pub fail_compile: bool,
    pub fail_texture: bool,

    pub programs_compiled: usize,
    pub programs_deleted: usize,
    pub buffers_deleted: usize,
    pub textures_created: usize,
    pub textures_deleted: usize,
    pub context_released: usize,
    pub backing_resizes: usize,
    pub draws: usize,
    pub floats: Vec<(String, f32)>,
    pub vec2s: Vec<(String, f32, f32)>,
    pub bools: Vec<(String, bool)>,
    pub spectrum_uploads: Vec<Vec<f32>>,
}

pub struct MockGpu {
    pub log: Rc<RefCell<GpuLog>>,
}

impl MockGpu {
    pub fn new(layout: (f64, f64), dpr: f64) -> (Self, Rc<RefCell<GpuLog>>) {
        let log = Rc::new(RefCell::new(GpuLog {
            layout,
            dpr,
            ..GpuLog::default()
        }));
        (Self { log: log.clone() }, log)
    }
}

impl GpuBackend for MockGpu {
    type Program = u32;
    type Buffer = u32;
    type Texture = u32;
    type Uniform = String;

    fn layout_size(&self) -> (f64, f64) {
        self.log.borrow().layout
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.log.borrow().dpr
    }

    fn compile_program(&mut self, vertex: &str, fragment: &str) -> Result<u32> {
        let mut log = self.log.borrow_mut();
        assert!(vertex.starts_with("#version 300 es"));
        assert!(fragment.starts_with("#version 300 es"));
        if log.fail_compile {
            return Err(FxError::ShaderCompile {
                stage: ShaderStage::Fragment,
                log: "ERROR: 0:1: syntax error".into(),
            });
        }
        log.programs_compiled += 1;
        Ok(1)
    }

    fn create_quad(&mut self, _program: &u32, vertices: &[f32]) -> Result<u32> {
        assert_eq!(vertices.len(), 12);
        Ok(2)
    }

    fn create_spectrum_texture(&mut self, bands: usize) -> Result<u32> {
        let mut log = self.log.borrow_mut();
        assert_eq!(bands, 8);
        if log.fail_texture {
            return Err(FxError::ResourceAllocation("spectrum texture"));
        }
        log.textures_created += 1;
        Ok(3)
    }

    fn uniform_location(&mut self, _program: &u32, name: &str) -> Option<String> {
        Some(name.to_owned())
    }

    fn backing_size(&self) -> (u32, u32) {
        self.log.borrow().backing
    }

    fn resize_backing(&mut self, width: u32, height: u32) {
        let mut log = self.log.borrow_mut();
        log.backing = (width, height);
        log.backing_resizes += 1;
    }

    fn use_program(&mut self, program: &u32) {
        assert_eq!(*program, 1);
    }

    fn set_float(&mut self, location: &String, value: f32) {
        self.log.borrow_mut().floats.push((location.clone(), value));
    }

    fn set_vec2(&mut self, location: &String, x: f32, y: f32) {
        self.log.borrow_mut().vec2s.push((location.clone(), x, y));
    }

    fn set_bool(&mut self, location: &String, value: bool) {
        self.log.borrow_mut().bools.push((location.clone(), value));
    }

    fn upload_spectrum(&mut self, _texture: &u32, location: &String, unit: u32, bands: &[f32]) -> Result<()> {
        assert_eq!(location, "iChannel0");
        assert_eq!(unit, 0);
        self.log.borrow_mut().spectrum_uploads.push(bands.to_vec());
        Ok(())
    }

    fn draw_quad(&mut self, _quad: &u32, vertex_count: i32) {
        assert_eq!(vertex_count, 6);
        self.log.borrow_mut().draws += 1;
    }

    fn delete_program(&mut self, _program: u32) {
        self.log.borrow_mut().programs_deleted += 1;
    }

    fn delete_buffer(&mut self, _buffer: u32) {
        self.log.borrow_mut().buffers_deleted += 1;
    }

    fn delete_texture(&mut self, _texture: u32) {
        self.log.borrow_mut().textures_deleted += 1;
    }

    fn release_context(&mut self) {
        self.log.borrow_mut().context_released += 1;
    }
}

/// Stands in for canvas text: every glyph is a solid block, so the ink is
/// predictable and proportional to the text length.
#[derive(Debug, Default)]
pub struct BlockRasterizer {
    pub calls: usize,
    pub fail: bool,
}

impl BlockRasterizer {
    fn draw_line(bitmap: &mut GlyphBitmap, text: &str, font_px: f64, centre_x: f64, centre_y: f64) {
        let glyph_w = font_px * 0.6;
        let glyph_h = font_px * 0.7;
        let chars = text.chars().count() as f64;
        let left = centre_x - chars * glyph_w / 2.0;
        for (i, c) in text.chars().enumerate() {
            if c.is_whitespace() {
                continue;
            }
            let x = left + i as f64 * glyph_w;
            // Leave a gap between glyphs like real text does.
            bitmap.fill_rect(x + glyph_w * 0.1, centre_y - glyph_h / 2.0, glyph_w * 0.8, glyph_h, 255);
        }
    }
}

impl GlyphRasterizer for BlockRasterizer {
    fn rasterize(&mut self, layout: &TextLayout, title: &str, subtitle: &str) -> Result<GlyphBitmap> {
        self.calls += 1;
        if self.fail {
            return Err(FxError::Rasterization("font not loaded".into()));
        }
        let mut bitmap = GlyphBitmap::blank(layout.bitmap_width as usize, layout.bitmap_height as usize);
        let centre_x = f64::from(layout.bitmap_width) / 2.0;
        Self::draw_line(&mut bitmap, title, layout.title_font_px, centre_x, layout.title_y);
        Self::draw_line(&mut bitmap, subtitle, layout.subtitle_font_px, centre_x, layout.subtitle_y);
        Ok(bitmap)
    }
}

#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub clears: usize,
    pub discs: Vec<(f64, f64, f64, Rgb)>,
}

impl DrawSurface for RecordingSurface {
    fn clear(&mut self, _width: f64, _height: f64) {
        self.clears += 1;
        self.discs.clear();
    }

    fn fill_disc(&mut self, x: f64, y: f64, radius: f64, color: Rgb) {
        self.discs.push((x, y, radius, color));
    }
}

#[derive(Debug, Default)]
pub struct AudioLog {
    pub connects: usize,
    pub reads: usize,
    pub stops: usize,
    pub disconnects: usize,
    pub closes: usize,
}

/// Failure switches for the fake analysis graph.
#[derive(Debug, Default, Clone, Copy)]
pub struct AudioFaults {
    pub connect: bool,
    pub read: bool,
    pub stop: bool,
    pub disconnect: bool,
    pub close: bool,
}

pub struct FakeAudio {
    pub log: Rc<RefCell<AudioLog>>,
    pub faults: AudioFaults,
    /// Byte level every bin reports.
    pub level: u8,
}

impl FakeAudio {
    pub fn new(faults: AudioFaults, level: u8) -> (Self, Rc<RefCell<AudioLog>>) {
        let log = Rc::new(RefCell::new(AudioLog::default()));
        (
            Self {
                log: log.clone(),
                faults,
                level,
            },
            log,
        )
    }
}

pub struct FakeGraph {
    log: Rc<RefCell<AudioLog>>,
    faults: AudioFaults,
    level: u8,
}

impl AudioGraphFactory for FakeAudio {
    type Graph = FakeGraph;

    fn connect(&mut self) -> Result<FakeGraph> {
        self.log.borrow_mut().connects += 1;
        if self.faults.connect {
            return Err(FxError::AudioInit("NotAllowedError: play() needs a gesture".into()));
        }
        Ok(FakeGraph {
            log: self.log.clone(),
            faults: self.faults,
            level: self.level,
        })
    }

    fn stop_playback(&mut self) -> Result<()> {
        self.log.borrow_mut().stops += 1;
        step(self.faults.stop, "pause")
    }
}

fn step(fail: bool, what: &str) -> Result<()> {
    if fail {
        Err(FxError::Js(format!("{what} threw")))
    } else {
        Ok(())
    }
}

impl AnalysisGraph for FakeGraph {
    fn bin_count(&self) -> usize {
        32
    }

    fn read_frequency_data(&mut self, bins: &mut [u8]) -> Result<()> {
        self.log.borrow_mut().reads += 1;
        step(self.faults.read, "getByteFrequencyData")?;
        bins.fill(self.level);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.log.borrow_mut().disconnects += 1;
        step(self.faults.disconnect, "disconnect")
    }

    fn close(&mut self) -> Result<()> {
        self.log.borrow_mut().closes += 1;
        step(self.faults.close, "close")
    }
}
