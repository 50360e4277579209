//! Tunables for every effect, passed explicitly into each component.
//!
//! JavaScript hands us an optional JSON object; anything it leaves out falls
//! back to the defaults below, which reproduce the look the site shipped with.

use serde::Deserialize;

use crate::error::{FxError, Result};
use crate::shader::programs::ShaderVariant;

/// 8-bit sRGB colour parsed from a `#rrggbb` / `#rgb` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb(pub [u8; 3]);

impl Rgb {
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(FxError::Config(format!("bad colour {hex:?}")));
        }
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_owned(),
            _ => return Err(FxError::Config(format!("bad colour {hex:?}"))),
        };
        let mut out = [0u8; 3];
        for (i, chan) in out.iter_mut().enumerate() {
            *chan = u8::from_str_radix(&expanded[i * 2..i * 2 + 2], 16)
                .map_err(|_| FxError::Config(format!("bad colour {hex:?}")))?;
        }
        Ok(Rgb(out))
    }

    /// CSS form accepted by `fillStyle`.
    pub fn to_css(self) -> String {
        let [r, g, b] = self.0;
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

impl TryFrom<String> for Rgb {
    type Error = FxError;

    fn try_from(value: String) -> Result<Self> {
        Rgb::from_hex(&value)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    pub size_min: f64,
    pub size_max: f64,
    pub color_dark: Rgb,
    pub color_light: Rgb,
    /// Sampling stride in bitmap pixels; higher means fewer particles.
    pub density: usize,

    pub spring: f64,
    pub friction: f64,
    pub damping: f64,
    /// Speed above which `damping` kicks in.
    pub damping_speed: f64,
    pub rest_threshold: f64,

    pub repulsion_radius: f64,
    pub repulsion_force: f64,
    /// Extra impulse applied inside `close_range` × radius.
    pub close_boost: f64,
    pub close_range: f64,
    pub jitter: f64,

    pub font_family: String,
    pub alpha_threshold: u8,
    pub title_size_max: f64,
    /// Title font size is `viewport_width / (chars * title_width_factor)`.
    pub title_width_factor: f64,
    pub subtitle_scale: f64,
    pub subtitle_offset: f64,

    /// Delay between mount and the first build, in milliseconds.
    pub start_delay_ms: f64,

    pub implosion: bool,
    pub implosion_distance: f64,
    pub implosion_speed: f64,
    /// Upper bound of the per-particle start delay, in seconds.
    pub implosion_stagger: f64,
    /// Sideways wobble during the implosion, as a fraction of remaining distance.
    pub implosion_wobble: f64,
    pub implosion_epsilon: f64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            size_min: 0.5,
            size_max: 1.5,
            color_dark: Rgb([0xff, 0xff, 0xff]),
            color_light: Rgb([0x33, 0x33, 0x33]),
            density: 3,
            spring: 0.015,
            friction: 0.5,
            damping: 0.9,
            damping_speed: 3.0,
            rest_threshold: 0.5,
            repulsion_radius: 50.0,
            repulsion_force: 12.0,
            close_boost: 3.0,
            close_range: 0.3,
            jitter: 0.5,
            font_family: "sans-serif".to_owned(),
            alpha_threshold: 128,
            title_size_max: 150.0,
            title_width_factor: 0.7,
            subtitle_scale: 0.3,
            subtitle_offset: 0.7,
            start_delay_ms: 100.0,
            implosion: true,
            implosion_distance: 800.0,
            implosion_speed: 0.12,
            implosion_stagger: 5.0,
            implosion_wobble: 0.02,
            implosion_epsilon: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    pub variant: ShaderVariant,
    /// Device pixel ratio is clamped to this before sizing the backing store.
    pub max_pixel_ratio: f64,
    /// Overrides the preset's render scale when set.
    pub render_scale: Option<f64>,
    /// Overrides the preset's frame-rate cap when set; 0 means uncapped.
    pub fps: Option<u32>,
    pub audio_src: Option<String>,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            variant: ShaderVariant::PaintSpin,
            max_pixel_ratio: 2.0,
            render_scale: None,
            fps: None,
            audio_src: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Frame cap for the particle text; 0 means one tick per platform frame.
    pub particle_fps: u32,
    pub resize_debounce_ms: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            particle_fps: 0,
            resize_debounce_ms: 250.0,
        }
    }
}

/// Which effects the page would like, most expensive first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectPreference {
    Shader,
    ParticleText,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub order: Vec<EffectPreference>,
    /// Devices at or below this many logical cores count as low power when
    /// they also report a mobile user agent.
    pub low_power_cores: u32,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            order: vec![EffectPreference::Shader, EffectPreference::ParticleText],
            low_power_cores: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct FxConfig {
    pub particles: ParticleConfig,
    pub shader: ShaderConfig,
    pub scheduler: SchedulerConfig,
    pub selector: SelectorConfig,
}

impl FxConfig {
    /// Parse the JS options object. An empty string means "all defaults".
    pub fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: FxConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let p = &self.particles;
        if p.density == 0 {
            return Err(FxError::Config("particles.density must be at least 1".into()));
        }
        if p.size_min > p.size_max {
            return Err(FxError::Config("particles.size_min exceeds size_max".into()));
        }
        if !(0.0..=1.0).contains(&p.friction) || !(0.0..=1.0).contains(&p.damping) {
            return Err(FxError::Config("friction and damping must lie in [0, 1]".into()));
        }
        if !(0.0..1.0).contains(&p.implosion_speed) || p.implosion_speed == 0.0 {
            return Err(FxError::Config("particles.implosion_speed must lie in (0, 1)".into()));
        }
        // Wobble below the ease factor keeps every implosion step contracting.
        if !(0.0..p.implosion_speed).contains(&p.implosion_wobble) {
            return Err(FxError::Config(
                "particles.implosion_wobble must lie in [0, implosion_speed)".into(),
            ));
        }
        if !(p.implosion_epsilon > 0.0) {
            return Err(FxError::Config("particles.implosion_epsilon must be positive".into()));
        }
        if !(self.shader.max_pixel_ratio > 0.0) {
            return Err(FxError::Config("shader.max_pixel_ratio must be positive".into()));
        }
        Ok(())
    }
}
