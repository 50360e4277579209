//! Eight-band spectrum feeding the audio-reactive shader.
//!
//! When a real analysis graph exists we fold the analyser's byte spectrum
//! into bands; otherwise a synthetic rhythm keeps the bars moving so the
//! scene is never flat.

use crate::error::{FxError, Result};

pub const BANDS: usize = 8;

/// Analyser FFT size; yields `FFT_SIZE / 2` frequency bins.
pub const FFT_SIZE: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Spectrum(pub [f32; BANDS]);

impl Spectrum {
    pub fn bands(&self) -> &[f32; BANDS] {
        &self.0
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Deterministic stand-in for real audio: layered sinusoids with a slow
    /// beat, a sharper pulse and a half-wave bump. Always in `[0, 1]`.
    pub fn synthetic(t: f64) -> Self {
        let beat = (t * 2.0).sin() * 0.5 + 0.5;
        let pulse = ((t * 0.8).sin() * 0.5 + 0.5).powi(3);
        let bump = (t * 1.2).sin().max(0.0);
        let wave = |freq: f64, phase: f64| (t * freq + phase).sin() * 0.5 + 0.5;

        let bands = [
            wave(3.0, 0.0) * 0.6 + pulse * 0.3,
            wave(3.5, 0.2) * 0.5 + bump * 0.3,
            wave(4.2, 0.4) * 0.45 + beat * 0.25,
            wave(3.2, 0.6) * 0.4 + pulse * 0.2,
            wave(3.7, 0.8) * 0.35 + bump * 0.2,
            wave(4.2, 1.0) * 0.3 + beat * 0.15,
            wave(4.8, 1.2) * 0.25 + pulse * 0.1,
            wave(5.5, 1.4) * 0.2 + bump * 0.1,
        ];
        let mut out = [0.0f32; BANDS];
        for (dst, v) in out.iter_mut().zip(bands) {
            *dst = v.clamp(0.0, 1.0) as f32;
        }
        Spectrum(out)
    }

    /// Folds analyser bytes into bands: mean level, scaled by 0.9, then
    /// shaped with exponent 0.7 to exaggerate peaks.
    pub fn from_frequency_bytes(bins: &[u8]) -> Self {
        let per_band = bins.len() / BANDS;
        let mut out = [0.0f32; BANDS];
        if per_band == 0 {
            return Spectrum(out);
        }
        for (band, dst) in out.iter_mut().enumerate() {
            let chunk = &bins[band * per_band..(band + 1) * per_band];
            let sum: u32 = chunk.iter().map(|&b| u32::from(b)).sum();
            let raw = sum as f64 / (per_band as f64 * 255.0);
            *dst = (raw * 0.9).powf(0.7).clamp(0.0, 1.0) as f32;
        }
        Spectrum(out)
    }
}

/// A live analysis graph (source → analyser → output).
pub trait AnalysisGraph {
    fn bin_count(&self) -> usize;
    /// Fills `bins` with the current byte spectrum.
    fn read_frequency_data(&mut self, bins: &mut [u8]) -> Result<()>;
    fn disconnect(&mut self) -> Result<()>;
    fn close(&mut self) -> Result<()>;
}

/// Owns the audio transport and builds the analysis graph for it.
///
/// Playback can run without a graph (a refused context still lets the
/// element play), so stopping it belongs here rather than on the graph.
pub trait AudioGraphFactory {
    type Graph: AnalysisGraph;

    fn connect(&mut self) -> Result<Self::Graph>;
    fn stop_playback(&mut self) -> Result<()>;
}

/// Which steps of teardown failed; each is attempted regardless of the others.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TeardownReport {
    pub stop_failed: bool,
    pub disconnect_failed: bool,
    pub close_failed: bool,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        !(self.stop_failed || self.disconnect_failed || self.close_failed)
    }
}

pub struct AudioSpectrumSource<F: AudioGraphFactory> {
    factory: F,
    graph: Option<F::Graph>,
    /// Set after a failed attempt so we log once instead of every click.
    failed: bool,
    bins: Vec<u8>,
    torn_down: bool,
}

impl<F: AudioGraphFactory> AudioSpectrumSource<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            graph: None,
            failed: false,
            bins: Vec::new(),
            torn_down: false,
        }
    }

    pub fn is_live(&self) -> bool {
        self.graph.is_some()
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut F {
        &mut self.factory
    }

    /// Builds the graph if there isn't one. Returns whether real audio is live.
    /// A no-op when a graph already exists.
    pub fn ensure_graph(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        if self.graph.is_some() {
            return true;
        }
        match self.factory.connect() {
            Ok(graph) => {
                self.bins = vec![0; graph.bin_count()];
                self.graph = Some(graph);
                self.failed = false;
                log::info!("audio analysis graph connected");
                true
            }
            Err(err) => {
                if !self.failed {
                    log::warn!("{err}; using synthetic spectrum");
                }
                self.failed = true;
                false
            }
        }
    }

    /// Current spectrum: real when a graph is live, synthetic otherwise.
    /// A failed read falls back to synthetic for that frame only.
    pub fn sample(&mut self, elapsed_s: f64) -> Spectrum {
        if let Some(graph) = self.graph.as_mut() {
            match graph.read_frequency_data(&mut self.bins) {
                Ok(()) => return Spectrum::from_frequency_bytes(&self.bins),
                Err(err) => log::warn!("reading analyser failed: {err}"),
            }
        }
        Spectrum::synthetic(elapsed_s)
    }

    /// Stops playback, disconnects nodes, closes the context. Every step runs
    /// even if an earlier one fails. Playback is stopped whether or not a
    /// graph was ever built. Safe to call twice.
    pub fn teardown(&mut self) -> TeardownReport {
        let mut report = TeardownReport::default();
        if self.torn_down {
            return report;
        }
        self.torn_down = true;
        if let Err(err) = self.factory.stop_playback() {
            log::warn!("stopping audio failed: {err}");
            report.stop_failed = true;
        }
        let Some(mut graph) = self.graph.take() else {
            return report;
        };
        if let Err(err) = graph.disconnect() {
            log::warn!("disconnecting audio nodes failed: {err}");
            report.disconnect_failed = true;
        }
        if let Err(err) = graph.close() {
            log::warn!("closing audio context failed: {err}");
            report.close_failed = true;
        }
        report
    }
}

/// Factory for environments without any audio facility.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAudio;

impl AnalysisGraph for std::convert::Infallible {
    fn bin_count(&self) -> usize {
        match *self {}
    }
    fn read_frequency_data(&mut self, _bins: &mut [u8]) -> Result<()> {
        match *self {}
    }
    fn disconnect(&mut self) -> Result<()> {
        match *self {}
    }
    fn close(&mut self) -> Result<()> {
        match *self {}
    }
}

impl AudioGraphFactory for NoAudio {
    type Graph = std::convert::Infallible;

    fn connect(&mut self) -> Result<Self::Graph> {
        Err(FxError::AudioInit("no audio element".into()))
    }

    fn stop_playback(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_is_bounded_and_deterministic() {
        for i in 0..500 {
            let t = f64::from(i) * 0.037;
            let s = Spectrum::synthetic(t);
            assert_eq!(s, Spectrum::synthetic(t));
            assert!(s.bands().iter().all(|v| (0.0..=1.0).contains(v)));
        }
        assert_ne!(Spectrum::synthetic(0.0), Spectrum::synthetic(1.0));
    }

    #[test]
    fn byte_bins_fold_into_bands() {
        let mut bins = [0u8; 32];
        bins[0..4].fill(255);
        let s = Spectrum::from_frequency_bytes(&bins);
        let expected = 0.9f64.powf(0.7) as f32;
        assert!((s.0[0] - expected).abs() < 1e-6);
        assert!(s.0[1..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn too_few_bins_is_silence() {
        assert_eq!(Spectrum::from_frequency_bytes(&[255; 4]), Spectrum::default());
    }

    #[test]
    fn no_audio_falls_back_to_synthetic() {
        let mut src = AudioSpectrumSource::new(NoAudio);
        assert!(!src.ensure_graph());
        assert_eq!(src.sample(2.5), Spectrum::synthetic(2.5));
        assert!(src.teardown().is_clean());
    }
}
