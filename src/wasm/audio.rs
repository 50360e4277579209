use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    AnalyserNode, AudioContext, AudioContextState, Document, HtmlAudioElement,
    MediaElementAudioSourceNode,
};

use crate::audio::{AnalysisGraph, AudioGraphFactory, FFT_SIZE};
use crate::error::{FxError, Result};

/// Owns the `<audio>` element the music shader plays and builds the
/// analysis graph for it on demand.
pub struct WebAudioFactory {
    element: HtmlAudioElement,
    // Reused for every play() promise so rejections are logged, not leaked.
    on_play_rejected: Closure<dyn FnMut(JsValue)>,
}

impl WebAudioFactory {
    pub fn new(document: &Document, src: Option<&str>) -> Result<Self> {
        let element: HtmlAudioElement = document.create_element("audio")?.unchecked_into();
        element.set_loop(true);
        element.set_preload("auto");
        element.set_cross_origin(Some("anonymous"));
        if let Some(src) = src {
            element.set_src(src);
        }
        let on_play_rejected = Closure::wrap(Box::new(|err: JsValue| {
            log::warn!("audio playback was refused: {err:?}");
        }) as Box<dyn FnMut(JsValue)>);
        Ok(Self {
            element,
            on_play_rejected,
        })
    }

    pub fn element(&self) -> &HtmlAudioElement {
        &self.element
    }

    pub fn is_playing(&self) -> bool {
        !self.element.paused()
    }

    /// Starts or pauses playback. Returns whether playback was started.
    pub fn toggle_playback(&self) -> bool {
        if self.is_playing() {
            if let Err(err) = self.element.pause() {
                log::warn!("pausing audio failed: {err:?}");
            }
            return false;
        }
        match self.element.play() {
            Ok(promise) => {
                let _ = promise.catch(&self.on_play_rejected);
                true
            }
            Err(err) => {
                log::warn!("starting audio failed: {err:?}");
                false
            }
        }
    }
}

impl AudioGraphFactory for WebAudioFactory {
    type Graph = WebAudioGraph;

    fn connect(&mut self) -> Result<WebAudioGraph> {
        let context = AudioContext::new().map_err(|e| FxError::AudioInit(format!("{e:?}")))?;
        match wire(&context, &self.element) {
            Ok((source, analyser)) => {
                if context.state() == AudioContextState::Suspended {
                    if let Err(err) = context.resume() {
                        log::debug!("resuming audio context failed: {err:?}");
                    }
                }
                Ok(WebAudioGraph {
                    context,
                    source,
                    analyser,
                })
            }
            Err(err) => {
                // A half-built graph would hold the element's source slot forever.
                let _ = context.close();
                Err(FxError::AudioInit(format!("{err:?}")))
            }
        }
    }

    fn stop_playback(&mut self) -> Result<()> {
        self.element.pause()?;
        self.element.set_src("");
        Ok(())
    }
}

fn wire(
    context: &AudioContext,
    element: &HtmlAudioElement,
) -> std::result::Result<(MediaElementAudioSourceNode, AnalyserNode), JsValue> {
    let source = context.create_media_element_source(element)?;
    let analyser = context.create_analyser()?;
    analyser.set_fft_size(FFT_SIZE);
    source.connect_with_audio_node(&analyser)?;
    analyser.connect_with_audio_node(&context.destination())?;
    Ok((source, analyser))
}

/// element → source → analyser → speakers.
pub struct WebAudioGraph {
    context: AudioContext,
    source: MediaElementAudioSourceNode,
    analyser: AnalyserNode,
}

impl AnalysisGraph for WebAudioGraph {
    fn bin_count(&self) -> usize {
        self.analyser.frequency_bin_count() as usize
    }

    fn read_frequency_data(&mut self, bins: &mut [u8]) -> Result<()> {
        self.analyser.get_byte_frequency_data(bins);
        Ok(())
    }

    fn disconnect(&mut self) -> Result<()> {
        self.source.disconnect()?;
        self.analyser.disconnect()?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.context.close()?;
        Ok(())
    }
}
