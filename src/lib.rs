#![cfg_attr(target_arch = "wasm32", allow(dead_code))]

//! Generative hero-section effects: a GPU fragment shader, an audio-reactive
//! shader variant and pointer-repelled particle text, plus the selector that
//! picks one for the device at hand.
//!
//! Everything outside [`wasm`] is platform independent and is exercised on
//! the host through the [`shader::GpuBackend`], [`audio::AudioGraphFactory`],
//! [`particles::raster::GlyphRasterizer`] and [`particles::DrawSurface`] seams.

pub mod audio;
pub mod config;
pub mod debounce;
pub mod effect;
pub mod error;
pub mod input;
pub mod particles;
pub mod scheduler;
pub mod selector;
pub mod shader;

pub use config::FxConfig;
pub use error::{FxError, Result};

// Browser glue only exists on wasm32.
#[cfg(target_arch = "wasm32")]
pub mod wasm;
