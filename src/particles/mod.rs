//! Point-mass text: particles whose rest positions come from rasterised
//! glyphs, pulled home by a spring and pushed away by the pointer.

pub mod raster;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::{ParticleConfig, Rgb};
use crate::error::{FxError, Result};
use raster::{GlyphBitmap, GlyphRasterizer, TextLayout};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_drawable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width >= 1.0 && self.height >= 1.0
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        (0.0..=self.width).contains(&x) && (0.0..=self.height).contains(&y)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub origin_x: f64,
    pub origin_y: f64,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub size: f64,
    /// Snapshot of the theme at build time.
    pub color: Rgb,
    pub implosion_complete: bool,
    /// Seconds after the build before this particle starts converging.
    pub implosion_delay: f64,
}

impl Particle {
    pub fn displacement(&self) -> f64 {
        (self.origin_x - self.x).hypot(self.origin_y - self.y)
    }

    pub fn speed(&self) -> f64 {
        self.vx.hypot(self.vy)
    }
}

/// 2D drawing target for [`ParticleField::draw`].
pub trait DrawSurface {
    fn clear(&mut self, width: f64, height: f64);
    fn fill_disc(&mut self, x: f64, y: f64, radius: f64, color: Rgb);
}

/// Deterministic part of the pointer push on a particle at `(x, y)`:
/// radial falloff inside the radius plus a flat boost very close in.
/// `None` when the pointer is out of reach.
pub fn repulsion_impulse(
    config: &ParticleConfig,
    x: f64,
    y: f64,
    pointer_x: f64,
    pointer_y: f64,
) -> Option<(f64, f64)> {
    let dx = pointer_x - x;
    let dy = pointer_y - y;
    let distance = dx.hypot(dy);
    let radius = config.repulsion_radius;
    if !(distance < radius) {
        return None;
    }
    let falloff = (radius - distance) / radius;
    let angle = dy.atan2(dx);
    let (sin, cos) = angle.sin_cos();
    let mut push = falloff * config.repulsion_force;
    if distance < radius * config.close_range {
        push += config.close_boost;
    }
    Some((-cos * push, -sin * push))
}

pub struct ParticleField {
    config: ParticleConfig,
    particles: Vec<Particle>,
    viewport: Viewport,
    rng: SmallRng,
    /// Latches once every particle has converged after a build.
    implosion_done: bool,
    generation: u64,
}

impl ParticleField {
    pub fn new(config: ParticleConfig, seed: u64) -> Self {
        Self {
            config,
            particles: Vec::new(),
            viewport: Viewport::new(0.0, 0.0),
            rng: SmallRng::seed_from_u64(seed),
            implosion_done: true,
            generation: 0,
        }
    }

    pub fn config(&self) -> &ParticleConfig {
        &self.config
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Bumped by every build, successful or not.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn implosion_done(&self) -> bool {
        self.implosion_done
    }

    /// Replaces the whole particle set with one sampled from `text` and
    /// `subtitle`. On failure the field is left empty, never half-built.
    pub fn build<R: GlyphRasterizer + ?Sized>(
        &mut self,
        rasterizer: &mut R,
        text: &str,
        subtitle: &str,
        viewport: Viewport,
        is_dark: bool,
    ) -> Result<usize> {
        self.particles.clear();
        self.generation += 1;
        self.viewport = viewport;
        self.implosion_done = true;

        if text.trim().is_empty() && subtitle.trim().is_empty() {
            log::warn!("nothing to rasterize; particle field left empty");
            return Ok(0);
        }
        let Some(layout) = TextLayout::compute(text, viewport, &self.config) else {
            log::warn!(
                "viewport {}x{} too small for text; particle field left empty",
                viewport.width,
                viewport.height
            );
            return Ok(0);
        };
        let bitmap = rasterizer.rasterize(&layout, text, subtitle)?;
        if bitmap.width() != layout.bitmap_width as usize
            || bitmap.height() != layout.bitmap_height as usize
        {
            return Err(FxError::Rasterization(format!(
                "bitmap is {}x{}, layout asked for {}x{}",
                bitmap.width(),
                bitmap.height(),
                layout.bitmap_width,
                layout.bitmap_height
            )));
        }
        Ok(self.populate(&layout, &bitmap, is_dark))
    }

    fn populate(&mut self, layout: &TextLayout, bitmap: &GlyphBitmap, is_dark: bool) -> usize {
        let cfg = &self.config;
        let color = if is_dark { cfg.color_dark } else { cfg.color_light };
        let (off_x, off_y) = layout.offset;

        let origins: Vec<(f64, f64)> = bitmap
            .ink(cfg.density, cfg.alpha_threshold)
            .map(|(x, y)| (x as f64 + off_x, y as f64 + off_y))
            .filter(|&(x, y)| self.viewport.contains(x, y))
            .collect();

        self.particles.reserve(origins.len());
        for (origin_x, origin_y) in origins {
            let particle = spawn(&self.config, &mut self.rng, origin_x, origin_y, color);
            self.particles.push(particle);
        }
        self.implosion_done = !self.config.implosion || self.particles.is_empty();
        log::debug!(
            "built {} particles (generation {})",
            self.particles.len(),
            self.generation
        );
        self.particles.len()
    }

    /// One simulation step. `elapsed_s` is seconds since the build; pointer
    /// coordinates outside the viewport or non-finite are ignored.
    pub fn tick(&mut self, pointer_x: f64, pointer_y: f64, elapsed_s: f64) {
        let pointer = (pointer_x.is_finite()
            && pointer_y.is_finite()
            && self.viewport.contains(pointer_x, pointer_y))
        .then_some((pointer_x, pointer_y));
        let imploding = self.config.implosion && !self.implosion_done;

        let mut all_home = true;
        for p in &mut self.particles {
            if imploding && !p.implosion_complete {
                converge(&self.config, &mut self.rng, p, elapsed_s);
                all_home &= p.implosion_complete;
            }
            step(&self.config, &mut self.rng, p, pointer);
        }
        if imploding && all_home {
            self.implosion_done = true;
            log::debug!("implosion finished");
        }
    }

    pub fn draw<S: DrawSurface + ?Sized>(&self, surface: &mut S) {
        surface.clear(self.viewport.width, self.viewport.height);
        for p in &self.particles {
            surface.fill_disc(p.x, p.y, p.size, p.color);
        }
    }
}

fn spawn(config: &ParticleConfig, rng: &mut SmallRng, x: f64, y: f64, color: Rgb) -> Particle {
    let size = config.size_min + rng.gen::<f64>() * (config.size_max - config.size_min);
    let mut p = Particle {
        origin_x: x,
        origin_y: y,
        x,
        y,
        vx: 0.0,
        vy: 0.0,
        size,
        color,
        implosion_complete: true,
        implosion_delay: 0.0,
    };
    if config.implosion {
        let angle = rng.gen::<f64>() * std::f64::consts::TAU;
        let distance = config.implosion_distance * (0.8 + rng.gen::<f64>() * 0.4);
        p.x += angle.cos() * distance;
        p.y += angle.sin() * distance;
        p.implosion_complete = false;
        p.implosion_delay = rng.gen::<f64>() * config.implosion_stagger;
    }
    p
}

/// Eases towards the origin once the stagger delay has passed. The wobble is
/// proportional to the remaining distance, so the approach still contracts
/// geometrically and always terminates.
fn converge(config: &ParticleConfig, rng: &mut SmallRng, p: &mut Particle, elapsed_s: f64) {
    if !(elapsed_s > p.implosion_delay) {
        return;
    }
    let dx = p.origin_x - p.x;
    let dy = p.origin_y - p.y;
    let distance = dx.hypot(dy);
    if distance < config.implosion_epsilon {
        p.x = p.origin_x;
        p.y = p.origin_y;
        p.implosion_complete = true;
        return;
    }
    let wobble = config.implosion_wobble * distance;
    p.x += dx * config.implosion_speed + (rng.gen::<f64>() - 0.5) * wobble;
    p.y += dy * config.implosion_speed + (rng.gen::<f64>() - 0.5) * wobble;
}

fn step(config: &ParticleConfig, rng: &mut SmallRng, p: &mut Particle, pointer: Option<(f64, f64)>) {
    let dx = p.origin_x - p.x;
    let dy = p.origin_y - p.y;
    let rest = config.rest_threshold;

    if dx.abs() < rest && dy.abs() < rest && p.vx.abs() < rest && p.vy.abs() < rest {
        // Snap to kill float noise, but keep listening for the pointer.
        p.x = p.origin_x;
        p.y = p.origin_y;
        p.vx = 0.0;
        p.vy = 0.0;
        repel(config, rng, p, pointer);
        return;
    }

    p.vx += dx * config.spring;
    p.vy += dy * config.spring;

    repel(config, rng, p, pointer);

    if p.vx.abs() > config.damping_speed || p.vy.abs() > config.damping_speed {
        p.vx *= config.damping;
        p.vy *= config.damping;
    }

    p.vx *= config.friction;
    p.vy *= config.friction;

    p.x += p.vx;
    p.y += p.vy;
}

fn repel(config: &ParticleConfig, rng: &mut SmallRng, p: &mut Particle, pointer: Option<(f64, f64)>) {
    let Some((px, py)) = pointer else {
        return;
    };
    if let Some((ix, iy)) = repulsion_impulse(config, p.x, p.y, px, py) {
        p.vx += ix + (rng.gen::<f64>() - 0.5) * config.jitter;
        p.vy += iy + (rng.gen::<f64>() - 0.5) * config.jitter;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn still_config() -> ParticleConfig {
        ParticleConfig {
            implosion: false,
            ..ParticleConfig::default()
        }
    }

    fn field_with(config: ParticleConfig, origins: &[(f64, f64)]) -> ParticleField {
        let mut field = ParticleField::new(config, 7);
        field.viewport = Viewport::new(800.0, 600.0);
        let color = field.config.color_dark;
        for &(x, y) in origins {
            let p = spawn(&field.config, &mut field.rng, x, y, color);
            field.particles.push(p);
        }
        field.implosion_done = !field.config.implosion;
        field
    }

    #[test]
    fn resting_particle_still_feels_pointer() {
        let mut field = field_with(still_config(), &[(100.0, 100.0)]);
        field.tick(-1.0, -1.0, 0.0);
        assert_eq!(field.particles[0].x, 100.0);
        field.tick(110.0, 100.0, 0.1);
        let p = &field.particles[0];
        assert!(p.vx < 0.0, "pushed away from a pointer on its right");
        assert_eq!(p.x, 100.0, "position integrates on the next tick");
        field.tick(110.0, 100.0, 0.2);
        assert!(field.particles[0].x < 100.0);
    }

    #[test]
    fn nan_pointer_does_not_poison_integration() {
        let mut field = field_with(still_config(), &[(100.0, 100.0)]);
        field.particles[0].x = 140.0;
        for _ in 0..5 {
            field.tick(f64::NAN, 100.0, 0.0);
        }
        let p = &field.particles[0];
        assert!(p.x.is_finite() && p.vx.is_finite());
        assert!(p.x < 140.0);
    }

    #[test]
    fn impulse_is_strongest_at_the_pointer() {
        let cfg = ParticleConfig::default();
        let at = |d: f64| {
            repulsion_impulse(&cfg, 0.0, 0.0, d, 0.0)
                .map(|(x, y)| x.hypot(y))
                .unwrap_or(0.0)
        };
        let peak = at(0.0);
        assert!((peak - (cfg.repulsion_force + cfg.close_boost)).abs() < 1e-12);
        for i in 1..60 {
            assert!(at(f64::from(i)) <= peak);
        }
        assert_eq!(at(cfg.repulsion_radius), 0.0);
        assert!(repulsion_impulse(&cfg, 0.0, 0.0, 50.001, 0.0).is_none());
    }

    #[test]
    fn spawn_scatters_when_imploding() {
        let field = field_with(ParticleConfig::default(), &[(400.0, 300.0); 20]);
        let cfg = field.config();
        for p in field.particles() {
            let d = p.displacement();
            assert!(d >= cfg.implosion_distance * 0.8 - 1e-9);
            assert!(d <= cfg.implosion_distance * 1.2 + 1e-9);
            assert!(!p.implosion_complete);
            assert!((0.0..cfg.implosion_stagger).contains(&p.implosion_delay));
            assert!((cfg.size_min..=cfg.size_max).contains(&p.size));
        }
    }
}
