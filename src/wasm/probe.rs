use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlCanvasElement, Window, WebglLoseContext};

use crate::selector::CapabilityProfile;

/// Whether a throwaway canvas can get a WebGL2 context. The context is lost
/// again straight away so it does not count against the browser's limit.
fn has_webgl2(document: &Document) -> bool {
    let Some(canvas) = document
        .create_element("canvas")
        .ok()
        .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
    else {
        return false;
    };
    let Ok(Some(ctx)) = canvas.get_context("webgl2") else {
        return false;
    };
    let Ok(gl) = ctx.dyn_into::<web_sys::WebGl2RenderingContext>() else {
        return false;
    };
    if let Ok(Some(ext)) = gl.get_extension("WEBGL_lose_context") {
        ext.unchecked_into::<WebglLoseContext>().lose_context();
    }
    true
}

pub fn probe(window: &Window, document: &Document, low_power_cores: u32) -> CapabilityProfile {
    let navigator = window.navigator();
    let user_agent = navigator.user_agent().unwrap_or_default();
    let cores = navigator.hardware_concurrency();
    let cores = if cores.is_finite() && cores > 0.0 { cores as u32 } else { 0 };
    let profile = CapabilityProfile::detect(has_webgl2(document), &user_agent, cores, low_power_cores);
    log::debug!("capabilities: {profile:?} ({cores} cores)");
    profile
}
