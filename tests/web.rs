#![cfg(target_arch = "wasm32")]

use hero_fx::wasm::{mount_effect, probe, StaticHero};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn container() -> web_sys::HtmlElement {
    let window = web_sys::window().unwrap();
    let document = window.document().unwrap();
    let el: web_sys::HtmlElement = document.create_element("div").unwrap().unchecked_into();
    el.set_attribute("style", "position:relative;width:640px;height:360px").unwrap();
    document.body().unwrap().append_child(&el).unwrap();
    el
}

#[wasm_bindgen_test]
fn probe_reports_gpu() {
    let window = web_sys::window().unwrap();
    let document = window.document().unwrap();
    let profile = probe(&window, &document, 4);
    // Headless browsers without WebGL2 still get a consistent answer.
    assert_eq!(profile.can_animate(), profile.has_gpu_context && !profile.is_low_power_device);
}

#[wasm_bindgen_test]
fn default_mount_tears_down() {
    let el = container();
    let mut handle = mount_effect(el.clone(), "HI", "DEV", false, None).unwrap();
    // Default order tries the shader first.
    let kind = handle.kind();
    assert!(["shader", "particle_text", "static_gradient"].contains(&kind.as_str()), "{kind}");
    assert!(el.child_element_count() >= 1);

    handle.set_dark_mode(true);
    handle.dispose();
    handle.dispose();
    assert_eq!(handle.outstanding_listeners(), 0);
    assert_eq!(el.child_element_count(), 0);
}

#[wasm_bindgen_test]
fn shader_preference_falls_back_cleanly() {
    let el = container();
    let options = r#"{"selector":{"order":["shader","particle_text"]},"shader":{"variant":"music"}}"#;
    let mut handle = mount_effect(el.clone(), "HI", "", true, Some(options.into())).unwrap();
    let kind = handle.kind();
    assert!(["shader", "particle_text", "static_gradient"].contains(&kind.as_str()), "{kind}");
    handle.toggle_audio();
    handle.dispose();
    assert!(!handle.is_audio_playing());
    assert_eq!(el.child_element_count(), 0);
}

#[wasm_bindgen_test]
fn bad_options_are_rejected() {
    let el = container();
    assert!(mount_effect(el, "HI", "", true, Some("{not json".into())).is_err());
}

#[wasm_bindgen_test]
fn static_hero_restores_container_background() {
    let el = container();
    el.style().set_property("background", "rgb(1, 2, 3)").unwrap();
    let document = web_sys::window().unwrap().document().unwrap();

    let mut hero = StaticHero::mount(&document, &el, "HI", "DEV", true);
    assert_eq!(el.child_element_count(), 1);
    assert!(el.style().get_property_value("background").unwrap().contains("gradient"));
    hero.set_dark_mode(false);

    hero.dispose();
    assert_eq!(el.child_element_count(), 0);
    assert!(el.style().get_property_value("background").unwrap().contains("rgb(1, 2, 3)"));
}
