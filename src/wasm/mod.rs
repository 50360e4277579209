//! Browser glue: DOM, WebGL2, Canvas 2D and WebAudio behind the core seams.

mod audio;
mod canvas;
mod fallback;
mod listeners;
mod probe;
mod raf;
mod webgl;

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use web_sys::{Document, Event, EventTarget, HtmlCanvasElement, HtmlElement, MouseEvent, TouchEvent, Window};

use crate::config::{EffectPreference, FxConfig};
use crate::effect::{resolve_shader, ParticleEffect, ShaderEffect};
use crate::error::{FxError, Result};
use crate::input::{ListenerScope, PointerState};
use crate::particles::Viewport;
use crate::scheduler::TickOutcome;
use crate::selector::{CapabilityProfile, EffectSelector, Selection};

use audio::WebAudioFactory;
use canvas::{Canvas2dSurface, CanvasRasterizer};
use fallback::StaticHero;
use listeners::ListenerSet;
use raf::RafLoop;
use webgl::WebGlBackend;

pub use probe::probe;
pub use fallback::StaticHero;

#[wasm_bindgen(start)]
pub fn main() -> std::result::Result<(), JsValue> {
    console_error_panic_hook::set_once();
    // A second init (e.g. hot reload) is harmless.
    let _ = console_log::init_with_level(log::Level::Info);
    Ok(())
}

fn now_ms(window: &Window) -> f64 {
    window.performance().map_or(0.0, |p| p.now())
}

fn container_viewport(container: &HtmlElement) -> Viewport {
    Viewport::new(f64::from(container.client_width()), f64::from(container.client_height()))
}

fn overlay_canvas(document: &Document, container: &HtmlElement) -> Result<HtmlCanvasElement> {
    let canvas: HtmlCanvasElement = document.create_element("canvas")?.unchecked_into();
    canvas.set_attribute("style", "position:absolute;inset:0;width:100%;height:100%;display:block")?;
    container.append_child(&canvas)?;
    Ok(canvas)
}

/// Pointer position relative to the container, in CSS pixels.
fn track_pointer(container: &HtmlElement, pointer: &PointerState, client_x: f64, client_y: f64) {
    let rect = container.get_bounding_client_rect();
    pointer.set(client_x - rect.left(), client_y - rect.top());
}

struct ShaderInstance {
    effect: Rc<RefCell<ShaderEffect<WebGlBackend, WebAudioFactory>>>,
    canvas: HtmlCanvasElement,
    raf: RafLoop,
    listeners: ListenerSet,
}

impl ShaderInstance {
    fn mount(window: &Window, document: &Document, container: &HtmlElement, config: &FxConfig, dark: bool) -> Result<Self> {
        let (program, sizing) = resolve_shader(&config.shader);
        let canvas = overlay_canvas(document, container)?;
        let mounted = WebGlBackend::new(canvas.clone()).and_then(|backend| {
            let audio = if program.wants_audio() {
                Some(WebAudioFactory::new(document, config.shader.audio_src.as_deref())?)
            } else {
                None
            };
            ShaderEffect::mount(backend, &program, sizing, dark, audio, config.scheduler.resize_debounce_ms)
        });
        let effect = match mounted {
            Ok(effect) => Rc::new(RefCell::new(effect)),
            Err(err) => {
                canvas.remove();
                return Err(err);
            }
        };

        let mut listeners = ListenerSet::default();
        {
            let effect = effect.clone();
            let win = window.clone();
            listeners.listen(window, ListenerScope::Window, "resize", None, move |_: Event| {
                if let Ok(mut fx) = effect.try_borrow_mut() {
                    fx.request_resize(now_ms(&win));
                }
            })?;
        }

        let raf = {
            let effect = effect.clone();
            RafLoop::start(move |timestamp| match effect.try_borrow_mut() {
                Ok(mut fx) => fx.frame(timestamp) != TickOutcome::Stopped,
                Err(_) => true,
            })?
        };

        Ok(Self {
            effect,
            canvas,
            raf,
            listeners,
        })
    }

    /// Frame loop first, then listeners, then GPU and audio resources.
    fn dispose(&mut self) {
        self.raf.stop();
        self.listeners.detach_all();
        self.effect.borrow_mut().dispose();
        self.canvas.remove();
    }
}

struct ParticleState {
    effect: ParticleEffect,
    surface: Canvas2dSurface,
    rasterizer: CanvasRasterizer,
}

struct ParticleInstance {
    state: Rc<RefCell<ParticleState>>,
    pointer: Rc<PointerState>,
    window: Window,
    raf: RafLoop,
    listeners: ListenerSet,
}

impl ParticleInstance {
    fn mount(
        window: &Window,
        document: &Document,
        container: &HtmlElement,
        config: &FxConfig,
        text: &str,
        subtitle: &str,
        dark: bool,
    ) -> Result<Self> {
        let canvas = overlay_canvas(document, container)?;
        let parts = Canvas2dSurface::new(canvas.clone())
            .and_then(|surface| Ok((surface, CanvasRasterizer::new(document)?)));
        let (surface, rasterizer) = match parts {
            Ok(parts) => parts,
            Err(err) => {
                canvas.remove();
                return Err(err);
            }
        };
        let seed = (js_sys::Math::random() * u64::MAX as f64) as u64;
        let effect = ParticleEffect::new(
            config,
            text,
            subtitle,
            dark,
            container_viewport(container),
            seed,
            now_ms(window),
        );
        let state = Rc::new(RefCell::new(ParticleState {
            effect,
            surface,
            rasterizer,
        }));
        let pointer = Rc::new(PointerState::default());

        let mut listeners = ListenerSet::default();
        let canvas_target: &EventTarget = &canvas;
        let window_target: &EventTarget = window;
        for (target, scope) in [
            (canvas_target, ListenerScope::Element),
            (window_target, ListenerScope::Window),
        ] {
            let (c, p) = (container.clone(), pointer.clone());
            listeners.listen(target, scope, "mousemove", None, move |ev: Event| {
                if let Some(ev) = ev.dyn_ref::<MouseEvent>() {
                    track_pointer(&c, &p, f64::from(ev.client_x()), f64::from(ev.client_y()));
                }
            })?;
            for (kind, passive) in [("touchstart", None), ("touchmove", Some(false))] {
                let (c, p) = (container.clone(), pointer.clone());
                listeners.listen(target, scope, kind, passive, move |ev: Event| {
                    let Some(touch_ev) = ev.dyn_ref::<TouchEvent>() else {
                        return;
                    };
                    if let Some(touch) = touch_ev.touches().get(0) {
                        if passive == Some(false) {
                            ev.prevent_default();
                        }
                        track_pointer(&c, &p, f64::from(touch.client_x()), f64::from(touch.client_y()));
                    }
                })?;
            }
        }
        {
            let (c, s, win) = (container.clone(), state.clone(), window.clone());
            listeners.listen(window, ListenerScope::Window, "resize", None, move |_: Event| {
                if let Ok(mut st) = s.try_borrow_mut() {
                    st.effect.resize(container_viewport(&c), now_ms(&win));
                }
            })?;
        }

        let raf = {
            let (state, pointer, c) = (state.clone(), pointer.clone(), container.clone());
            RafLoop::start(move |timestamp| {
                let Ok(mut st) = state.try_borrow_mut() else {
                    return true;
                };
                let ParticleState {
                    effect,
                    surface,
                    rasterizer,
                } = &mut *st;
                if effect.is_build_pending() {
                    effect.observe_viewport(container_viewport(&c));
                }
                effect.frame(timestamp, pointer.get(), rasterizer, surface) != TickOutcome::Stopped
            })?
        };

        Ok(Self {
            state,
            pointer,
            window: window.clone(),
            raf,
            listeners,
        })
    }

    fn dispose(&mut self) {
        self.raf.stop();
        self.listeners.detach_all();
        self.pointer.park();
        let mut st = self.state.borrow_mut();
        st.effect.dispose();
        st.surface.canvas().remove();
    }
}

enum Mounted {
    Shader(ShaderInstance),
    Particles(ParticleInstance),
    Static(StaticHero),
}

impl Mounted {
    fn dispose(&mut self) {
        match self {
            Mounted::Shader(fx) => fx.dispose(),
            Mounted::Particles(fx) => fx.dispose(),
            Mounted::Static(hero) => hero.dispose(),
        }
    }
}

/// Handle to the mounted hero effect. Drop or [`EffectHandle::dispose`]
/// tears everything down.
#[wasm_bindgen]
pub struct EffectHandle {
    kind: &'static str,
    mounted: Option<Mounted>,
}

#[wasm_bindgen]
impl EffectHandle {
    /// `"shader"`, `"particle_text"` or `"static_gradient"`.
    #[wasm_bindgen(getter)]
    pub fn kind(&self) -> String {
        self.kind.to_owned()
    }

    #[wasm_bindgen(js_name = setDarkMode)]
    pub fn set_dark_mode(&mut self, dark: bool) {
        match &mut self.mounted {
            Some(Mounted::Shader(fx)) => fx.effect.borrow_mut().set_dark_mode(dark),
            Some(Mounted::Particles(fx)) => {
                let now = now_ms(&fx.window);
                fx.state.borrow_mut().effect.set_dark_mode(dark, now);
            }
            Some(Mounted::Static(hero)) => hero.set_dark_mode(dark),
            None => {}
        }
    }

    #[wasm_bindgen(js_name = setText)]
    pub fn set_text(&mut self, text: &str, subtitle: &str) {
        match &mut self.mounted {
            Some(Mounted::Particles(fx)) => {
                let now = now_ms(&fx.window);
                fx.state.borrow_mut().effect.set_text(text, subtitle, now);
            }
            Some(Mounted::Static(hero)) => hero.set_text(text, subtitle),
            Some(Mounted::Shader(_)) | None => {}
        }
    }

    /// Plays or pauses the music shader's track; the analysis graph is built
    /// on the first play. Returns whether playback was requested: the browser
    /// may still refuse it asynchronously, which `isAudioPlaying` reflects.
    #[wasm_bindgen(js_name = toggleAudio)]
    pub fn toggle_audio(&mut self) -> bool {
        let Some(Mounted::Shader(fx)) = &self.mounted else {
            return false;
        };
        let mut effect = fx.effect.borrow_mut();
        if effect.is_disposed() {
            return false;
        }
        effect.enable_audio();
        effect
            .audio()
            .is_some_and(|audio| audio.factory().toggle_playback())
    }

    /// Whether the track is playing right now.
    #[wasm_bindgen(js_name = isAudioPlaying)]
    pub fn is_audio_playing(&self) -> bool {
        let Some(Mounted::Shader(fx)) = &self.mounted else {
            return false;
        };
        let effect = fx.effect.borrow();
        !effect.is_disposed() && effect.audio().is_some_and(|audio| audio.factory().is_playing())
    }

    /// Frames actually rendered so far.
    pub fn ticks(&self) -> f64 {
        match &self.mounted {
            Some(Mounted::Shader(fx)) => fx.effect.borrow().ticks() as f64,
            Some(Mounted::Particles(fx)) => fx.state.borrow().effect.ticks() as f64,
            _ => 0.0,
        }
    }

    #[wasm_bindgen(js_name = outstandingListeners)]
    pub fn outstanding_listeners(&self) -> u32 {
        match &self.mounted {
            Some(Mounted::Shader(fx)) => fx.listeners.ledger().outstanding() as u32,
            Some(Mounted::Particles(fx)) => fx.listeners.ledger().outstanding() as u32,
            _ => 0,
        }
    }

    /// Idempotent.
    pub fn dispose(&mut self) {
        if let Some(mut mounted) = self.mounted.take() {
            mounted.dispose();
            log::info!("{} disposed", self.kind);
        }
    }
}

impl Drop for EffectHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Picks and mounts the best hero effect for this device inside `container`.
///
/// `options` is an optional JSON [`FxConfig`]; missing fields use defaults.
#[wasm_bindgen(js_name = mountEffect)]
pub fn mount_effect(
    container: HtmlElement,
    text: &str,
    subtitle: &str,
    dark: bool,
    options: Option<String>,
) -> std::result::Result<EffectHandle, JsValue> {
    let config = FxConfig::from_json(options.as_deref().unwrap_or_default())?;
    let window = web_sys::window().ok_or(FxError::CapabilityUnavailable("no window".into()))?;
    let document = window
        .document()
        .ok_or(FxError::CapabilityUnavailable("no document".into()))?;
    let profile = probe(&window, &document, config.selector.low_power_cores);

    let mut selector = EffectSelector::new();
    for preference in &config.selector.order {
        selector = match preference {
            EffectPreference::Shader => selector.candidate("shader", CapabilityProfile::can_animate, || {
                ShaderInstance::mount(&window, &document, &container, &config, dark).map(Mounted::Shader)
            }),
            EffectPreference::ParticleText => {
                selector.candidate("particle_text", CapabilityProfile::can_animate, || {
                    ParticleInstance::mount(&window, &document, &container, &config, text, subtitle, dark)
                        .map(Mounted::Particles)
                })
            }
        };
    }

    let handle = match selector.select(&profile) {
        Selection::Effect { name, effect } => EffectHandle {
            kind: name,
            mounted: Some(effect),
        },
        Selection::StaticGradient => EffectHandle {
            kind: "static_gradient",
            mounted: Some(Mounted::Static(StaticHero::mount(&document, &container, text, subtitle, dark))),
        },
    };
    Ok(handle)
}
