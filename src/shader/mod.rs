//! One parameterised full-screen fragment program and its GPU lifecycle.

pub mod programs;

use crate::audio::Spectrum;
use crate::error::{FxError, Result};
use programs::{ShaderProgram, UniformSource, FULLSCREEN_QUAD, VERTEX_SHADER};

/// Texture unit the spectrum sampler is bound to.
pub const SPECTRUM_UNIT: u32 = 0;

/// The GPU facility a [`ShaderSurface`] draws through.
///
/// Acquiring the context itself is the implementor's constructor; it must
/// fail with [`FxError::CapabilityUnavailable`] when there is none.
pub trait GpuBackend {
    type Program;
    type Buffer;
    type Texture;
    type Uniform;

    /// Layout box of the drawing surface's container, in CSS pixels.
    fn layout_size(&self) -> (f64, f64);
    fn device_pixel_ratio(&self) -> f64;

    fn compile_program(&mut self, vertex: &str, fragment: &str) -> Result<Self::Program>;
    /// Uploads the quad and wires it to the program's position attribute.
    fn create_quad(&mut self, program: &Self::Program, vertices: &[f32]) -> Result<Self::Buffer>;
    fn create_spectrum_texture(&mut self, bands: usize) -> Result<Self::Texture>;
    /// `None` when the program does not use the uniform (the compiler may strip it).
    fn uniform_location(&mut self, program: &Self::Program, name: &str) -> Option<Self::Uniform>;

    fn backing_size(&self) -> (u32, u32);
    /// Reallocates the backing store and resets the viewport.
    fn resize_backing(&mut self, width: u32, height: u32);

    fn use_program(&mut self, program: &Self::Program);
    fn set_float(&mut self, location: &Self::Uniform, value: f32);
    fn set_vec2(&mut self, location: &Self::Uniform, x: f32, y: f32);
    fn set_bool(&mut self, location: &Self::Uniform, value: bool);
    fn upload_spectrum(
        &mut self,
        texture: &Self::Texture,
        location: &Self::Uniform,
        unit: u32,
        bands: &[f32],
    ) -> Result<()>;
    fn draw_quad(&mut self, quad: &Self::Buffer, vertex_count: i32);

    fn delete_program(&mut self, program: Self::Program);
    fn delete_buffer(&mut self, buffer: Self::Buffer);
    fn delete_texture(&mut self, texture: Self::Texture);
    /// Drops the context itself; nothing may be drawn afterwards.
    fn release_context(&mut self);
}

/// Per-frame inputs of the fragment program.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderUniformState {
    /// Seconds since the first tick of this mount.
    pub time: f64,
    /// Physical pixels of the backing store.
    pub resolution_px: (u32, u32),
    pub spectrum: Option<Spectrum>,
    pub dark_mode: bool,
}

impl Default for ShaderUniformState {
    fn default() -> Self {
        Self {
            time: 0.0,
            resolution_px: (0, 0),
            spectrum: None,
            dark_mode: true,
        }
    }
}

/// Sizing knobs resolved from the preset and user config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSizing {
    pub max_pixel_ratio: f64,
    pub render_scale: f64,
}

impl Default for SurfaceSizing {
    fn default() -> Self {
        Self {
            max_pixel_ratio: 2.0,
            render_scale: 1.0,
        }
    }
}

impl SurfaceSizing {
    /// Physical backing size for a CSS layout box.
    pub fn physical_size(&self, css: (f64, f64), device_pixel_ratio: f64) -> (u32, u32) {
        let dpr = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio.min(self.max_pixel_ratio)
        } else {
            1.0
        };
        let scale = dpr * self.render_scale;
        let px = |v: f64| {
            if v.is_finite() && v > 0.0 {
                (v * scale).round().max(1.0) as u32
            } else {
                1
            }
        };
        (px(css.0), px(css.1))
    }
}

struct GpuResources<B: GpuBackend> {
    program: B::Program,
    quad: B::Buffer,
    spectrum_texture: Option<B::Texture>,
    bindings: Vec<(UniformSource, B::Uniform)>,
}

pub struct ShaderSurface<B: GpuBackend> {
    backend: B,
    name: String,
    sizing: SurfaceSizing,
    resources: Option<GpuResources<B>>,
    uniforms: ShaderUniformState,
    first_tick: Option<f64>,
}

impl<B: GpuBackend> ShaderSurface<B> {
    /// Compiles `program` against the backend, uploads the quad and sizes the
    /// backing store. Anything allocated before a failure is released again.
    pub fn mount(
        mut backend: B,
        program: &ShaderProgram,
        sizing: SurfaceSizing,
        initial: ShaderUniformState,
    ) -> Result<Self> {
        let fragment = program.fragment_source();
        let compiled = match backend.compile_program(VERTEX_SHADER, &fragment) {
            Ok(program) => program,
            Err(err) => {
                backend.release_context();
                return Err(err);
            }
        };
        let quad = match backend.create_quad(&compiled, &FULLSCREEN_QUAD) {
            Ok(quad) => quad,
            Err(err) => {
                backend.delete_program(compiled);
                backend.release_context();
                return Err(err);
            }
        };
        let spectrum_texture = if program.wants_audio() {
            match backend.create_spectrum_texture(crate::audio::BANDS) {
                Ok(texture) => Some(texture),
                Err(err) => {
                    backend.delete_buffer(quad);
                    backend.delete_program(compiled);
                    backend.release_context();
                    return Err(err);
                }
            }
        } else {
            None
        };

        let mut bindings = Vec::with_capacity(program.uniforms.len());
        for binding in program.uniforms.iter() {
            match backend.uniform_location(&compiled, binding.name) {
                Some(location) => bindings.push((binding.source, location)),
                None => log::debug!("{}: uniform {} is unused", program.name, binding.name),
            }
        }

        let mut surface = Self {
            backend,
            name: program.name.to_string(),
            sizing,
            resources: Some(GpuResources {
                program: compiled,
                quad,
                spectrum_texture,
                bindings,
            }),
            uniforms: initial,
            first_tick: None,
        };
        surface.resize();
        log::info!(
            "mounted shader {} at {}x{}",
            surface.name,
            surface.uniforms.resolution_px.0,
            surface.uniforms.resolution_px.1
        );
        Ok(surface)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uniforms(&self) -> &ShaderUniformState {
        &self.uniforms
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_disposed(&self) -> bool {
        self.resources.is_none()
    }

    /// Matches the backing store to the container. Only reallocates when the
    /// physical size actually changed; returns whether it did.
    pub fn resize(&mut self) -> bool {
        if self.resources.is_none() {
            return false;
        }
        let target = self
            .sizing
            .physical_size(self.backend.layout_size(), self.backend.device_pixel_ratio());
        self.uniforms.resolution_px = target;
        if self.backend.backing_size() == target {
            return false;
        }
        log::debug!("{}: backing store -> {}x{}", self.name, target.0, target.1);
        self.backend.resize_backing(target.0, target.1);
        true
    }

    pub fn set_spectrum(&mut self, spectrum: Spectrum) {
        self.uniforms.spectrum = Some(spectrum);
    }

    pub fn set_dark_mode(&mut self, dark: bool) {
        self.uniforms.dark_mode = dark;
    }

    /// Advances `time`, pushes every bound uniform and draws the quad once.
    pub fn tick(&mut self, timestamp_s: f64) -> Result<()> {
        let Some(res) = self.resources.as_ref() else {
            return Err(FxError::Disposed("shader surface"));
        };
        if timestamp_s.is_finite() {
            let origin = *self.first_tick.get_or_insert(timestamp_s);
            // Never run backwards, even if the platform clock does.
            self.uniforms.time = (timestamp_s - origin).max(self.uniforms.time);
        }
        self.uniforms.resolution_px = self.backend.backing_size();

        self.backend.use_program(&res.program);
        for (source, location) in &res.bindings {
            match source {
                UniformSource::Time => self.backend.set_float(location, self.uniforms.time as f32),
                UniformSource::Resolution => {
                    let (w, h) = self.uniforms.resolution_px;
                    self.backend.set_vec2(location, w as f32, h as f32);
                }
                UniformSource::DarkMode => self.backend.set_bool(location, self.uniforms.dark_mode),
                UniformSource::Spectrum => {
                    if let (Some(texture), Some(spectrum)) =
                        (res.spectrum_texture.as_ref(), self.uniforms.spectrum.as_ref())
                    {
                        self.backend.upload_spectrum(
                            texture,
                            location,
                            SPECTRUM_UNIT,
                            spectrum.as_slice(),
                        )?;
                    }
                }
            }
        }
        self.backend
            .draw_quad(&res.quad, (FULLSCREEN_QUAD.len() / 2) as i32);
        Ok(())
    }

    /// Releases texture, buffer, program and context. Idempotent.
    pub fn dispose(&mut self) {
        let Some(res) = self.resources.take() else {
            return;
        };
        if let Some(texture) = res.spectrum_texture {
            self.backend.delete_texture(texture);
        }
        self.backend.delete_buffer(res.quad);
        self.backend.delete_program(res.program);
        self.backend.release_context();
        log::debug!("{}: disposed", self.name);
    }
}

impl<B: GpuBackend> Drop for ShaderSurface<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}
