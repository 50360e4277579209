//! Per-frame drivers that tie a scheduler, a debounced rebuild and one
//! renderer together. The browser glue only feeds them timestamps and input.

use crate::audio::{AudioGraphFactory, AudioSpectrumSource};
use crate::config::{FxConfig, ShaderConfig};
use crate::debounce::Debounce;
use crate::error::Result;
use crate::particles::raster::GlyphRasterizer;
use crate::particles::{DrawSurface, ParticleField, Viewport};
use crate::scheduler::{FrameScheduler, TickOutcome};
use crate::shader::programs::ShaderProgram;
use crate::shader::{GpuBackend, ShaderSurface, ShaderUniformState, SurfaceSizing};

/// The preset's program with the config's fps and scale overrides applied.
pub fn resolve_shader(config: &ShaderConfig) -> (ShaderProgram, SurfaceSizing) {
    let mut program = config.variant.program();
    if let Some(fps) = config.fps {
        program.fps = fps;
    }
    if let Some(scale) = config.render_scale.filter(|s| s.is_finite() && *s > 0.0) {
        program.render_scale = scale;
    }
    let sizing = SurfaceSizing {
        max_pixel_ratio: config.max_pixel_ratio,
        render_scale: program.render_scale,
    };
    (program, sizing)
}

pub struct ShaderEffect<B: GpuBackend, F: AudioGraphFactory> {
    surface: ShaderSurface<B>,
    audio: Option<AudioSpectrumSource<F>>,
    scheduler: FrameScheduler,
    resize: Debounce,
}

impl<B: GpuBackend, F: AudioGraphFactory> ShaderEffect<B, F> {
    /// `audio` is only kept when the program actually samples a spectrum.
    pub fn mount(
        backend: B,
        program: &ShaderProgram,
        sizing: SurfaceSizing,
        dark: bool,
        audio: Option<F>,
        resize_debounce_ms: f64,
    ) -> Result<Self> {
        let initial = ShaderUniformState {
            dark_mode: dark,
            ..ShaderUniformState::default()
        };
        let surface = ShaderSurface::mount(backend, program, sizing, initial)?;
        let audio = audio
            .filter(|_| program.wants_audio())
            .map(AudioSpectrumSource::new);
        Ok(Self {
            surface,
            audio,
            scheduler: FrameScheduler::new(program.fps),
            resize: Debounce::new(resize_debounce_ms),
        })
    }

    pub fn surface(&self) -> &ShaderSurface<B> {
        &self.surface
    }

    pub fn audio(&self) -> Option<&AudioSpectrumSource<F>> {
        self.audio.as_ref()
    }

    pub fn audio_mut(&mut self) -> Option<&mut AudioSpectrumSource<F>> {
        self.audio.as_mut()
    }

    pub fn ticks(&self) -> u64 {
        self.scheduler.ticks()
    }

    /// Called from the resize listener; the real resize waits for the debounce.
    pub fn request_resize(&mut self, now_ms: f64) {
        self.resize.trigger(now_ms);
    }

    pub fn set_dark_mode(&mut self, dark: bool) {
        self.surface.set_dark_mode(dark);
    }

    /// Lazily builds the audio graph; true when real analysis is live.
    pub fn enable_audio(&mut self) -> bool {
        self.audio.as_mut().is_some_and(AudioSpectrumSource::ensure_graph)
    }

    pub fn frame(&mut self, now_ms: f64) -> TickOutcome {
        let Self {
            surface,
            audio,
            scheduler,
            resize,
        } = self;
        scheduler.run(now_ms, |now_ms| {
            if resize.fire_if_due(now_ms) {
                surface.resize();
            }
            let now_s = now_ms / 1000.0;
            if let Some(audio) = audio.as_mut() {
                surface.set_spectrum(audio.sample(now_s));
            }
            surface.tick(now_s)
        })
    }

    /// Stops ticking, then releases audio and GPU resources. Idempotent.
    pub fn dispose(&mut self) {
        self.scheduler.stop();
        self.resize.cancel();
        if let Some(audio) = self.audio.as_mut() {
            audio.teardown();
        }
        self.surface.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.surface.is_disposed()
    }
}

pub struct ParticleEffect {
    field: ParticleField,
    scheduler: FrameScheduler,
    rebuild: Debounce,
    text: String,
    subtitle: String,
    dark: bool,
    viewport: Viewport,
    built_at_ms: Option<f64>,
}

impl ParticleEffect {
    /// The first build waits `particles.start_delay_ms` so the page can settle.
    pub fn new(
        config: &FxConfig,
        text: &str,
        subtitle: &str,
        dark: bool,
        viewport: Viewport,
        seed: u64,
        now_ms: f64,
    ) -> Self {
        let mut rebuild = Debounce::new(config.scheduler.resize_debounce_ms);
        rebuild.trigger_after(now_ms, config.particles.start_delay_ms);
        Self {
            field: ParticleField::new(config.particles.clone(), seed),
            scheduler: FrameScheduler::new(config.scheduler.particle_fps),
            rebuild,
            text: text.to_owned(),
            subtitle: subtitle.to_owned(),
            dark,
            viewport,
            built_at_ms: None,
        }
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn ticks(&self) -> u64 {
        self.scheduler.ticks()
    }

    pub fn is_build_pending(&self) -> bool {
        self.rebuild.is_pending()
    }

    /// New text rebuilds on the next frame.
    pub fn set_text(&mut self, text: &str, subtitle: &str, now_ms: f64) {
        if self.text == text && self.subtitle == subtitle {
            return;
        }
        self.text = text.to_owned();
        self.subtitle = subtitle.to_owned();
        self.rebuild.trigger_after(now_ms, 0.0);
    }

    /// Particle colours are frozen per set, so a theme flip rebuilds the set.
    pub fn set_dark_mode(&mut self, dark: bool, now_ms: f64) {
        if self.dark == dark {
            return;
        }
        self.dark = dark;
        self.rebuild.trigger_after(now_ms, 0.0);
    }

    /// Records the container's current size for the pending build without
    /// re-arming it. The mount-time size may predate the page's own layout.
    pub fn observe_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Viewport changes are debounced; the rebuild happens once resizing stops.
    pub fn resize(&mut self, viewport: Viewport, now_ms: f64) {
        self.viewport = viewport;
        self.rebuild.trigger(now_ms);
    }

    pub fn frame<R, S>(
        &mut self,
        now_ms: f64,
        pointer: (f64, f64),
        rasterizer: &mut R,
        surface: &mut S,
    ) -> TickOutcome
    where
        R: GlyphRasterizer + ?Sized,
        S: DrawSurface + ?Sized,
    {
        let Self {
            field,
            scheduler,
            rebuild,
            text,
            subtitle,
            dark,
            viewport,
            built_at_ms,
        } = self;
        scheduler.run(now_ms, |now_ms| {
            if rebuild.fire_if_due(now_ms) {
                *built_at_ms = Some(now_ms);
                // A failed build leaves the field empty; it is retried only
                // on the next text, theme or viewport change.
                field.build(rasterizer, text, subtitle, *viewport, *dark)?;
            }
            let elapsed_s = built_at_ms.map_or(0.0, |t| (now_ms - t) / 1000.0);
            field.tick(pointer.0, pointer.1, elapsed_s);
            field.draw(surface);
            Ok(())
        })
    }

    pub fn dispose(&mut self) {
        self.scheduler.stop();
        self.rebuild.cancel();
    }

    pub fn is_disposed(&self) -> bool {
        self.scheduler.is_stopped()
    }
}
