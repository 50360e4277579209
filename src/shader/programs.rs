//! Shader presets as data: fragment source plus the uniforms it reads.

use std::borrow::Cow;

use serde::Deserialize;

/// Pass-through vertex stage for the full-viewport quad.
pub const VERTEX_SHADER: &str = "#version 300 es
in vec2 a_position;
void main() {
    gl_Position = vec4(a_position, 0.0, 1.0);
}
";

/// Prepended to every fragment body.
pub const FRAGMENT_PREAMBLE: &str = "#version 300 es
precision highp float;
out vec4 fragColor;
";

/// Two triangles covering clip space.
#[rustfmt::skip]
pub const FULLSCREEN_QUAD: [f32; 12] = [
    -1.0, -1.0,   1.0, -1.0,  -1.0,  1.0,
    -1.0,  1.0,   1.0, -1.0,   1.0,  1.0,
];

/// What feeds a uniform each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformSource {
    /// `float`, seconds since the first tick of this mount.
    Time,
    /// `vec2`, physical backing-store pixels.
    Resolution,
    /// `sampler2D`, 8x1 single-channel float texture.
    Spectrum,
    /// `bool`.
    DarkMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformBinding {
    pub name: &'static str,
    pub source: UniformSource,
}

const fn bind(name: &'static str, source: UniformSource) -> UniformBinding {
    UniformBinding { name, source }
}

const BASIC_UNIFORMS: &[UniformBinding] = &[
    bind("iTime", UniformSource::Time),
    bind("iResolution", UniformSource::Resolution),
];

const AUDIO_UNIFORMS: &[UniformBinding] = &[
    bind("iTime", UniformSource::Time),
    bind("iResolution", UniformSource::Resolution),
    bind("iChannel0", UniformSource::Spectrum),
    bind("isDarkMode", UniformSource::DarkMode),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShaderVariant {
    /// Swirling two-tone paint.
    PaintSpin,
    Fluid,
    Blackhole,
    /// Ray-marched glass bars driven by the audio spectrum.
    Music,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShaderProgram {
    pub name: Cow<'static, str>,
    /// Fragment body without the `#version` preamble.
    pub fragment: Cow<'static, str>,
    pub uniforms: Cow<'static, [UniformBinding]>,
    /// Frame cap; 0 means every platform frame.
    pub fps: u32,
    /// Backing store size relative to the physical layout size.
    pub render_scale: f64,
}

impl ShaderProgram {
    pub fn custom(
        name: impl Into<Cow<'static, str>>,
        fragment: impl Into<Cow<'static, str>>,
        uniforms: Vec<UniformBinding>,
    ) -> Self {
        Self {
            name: name.into(),
            fragment: fragment.into(),
            uniforms: Cow::Owned(uniforms),
            fps: 0,
            render_scale: 1.0,
        }
    }

    /// Complete GLSL ES 3.00 source handed to the compiler.
    pub fn fragment_source(&self) -> String {
        let mut src = String::with_capacity(FRAGMENT_PREAMBLE.len() + self.fragment.len());
        src.push_str(FRAGMENT_PREAMBLE);
        src.push_str(&self.fragment);
        src
    }

    pub fn reads(&self, source: UniformSource) -> bool {
        self.uniforms.iter().any(|u| u.source == source)
    }

    pub fn wants_audio(&self) -> bool {
        self.reads(UniformSource::Spectrum)
    }
}

impl ShaderVariant {
    pub fn program(self) -> ShaderProgram {
        let (name, fragment, uniforms, fps, render_scale) = match self {
            ShaderVariant::PaintSpin => (
                "paint_spin",
                include_str!("glsl/paint_spin.frag"),
                BASIC_UNIFORMS,
                0,
                1.0,
            ),
            ShaderVariant::Fluid => (
                "fluid",
                include_str!("glsl/fluid.frag"),
                BASIC_UNIFORMS,
                0,
                1.0,
            ),
            ShaderVariant::Blackhole => (
                "blackhole",
                include_str!("glsl/blackhole.frag"),
                BASIC_UNIFORMS,
                0,
                1.0,
            ),
            // The ray-marcher is heavy: fewer frames, smaller backing store.
            ShaderVariant::Music => (
                "music",
                include_str!("glsl/music.frag"),
                AUDIO_UNIFORMS,
                24,
                0.75,
            ),
        };
        ShaderProgram {
            name: Cow::Borrowed(name),
            fragment: Cow::Borrowed(fragment),
            uniforms: Cow::Borrowed(uniforms),
            fps,
            render_scale,
        }
    }
}
