mod common;

use common::{AudioFaults, BlockRasterizer, FakeAudio, MockGpu, RecordingSurface};
use hero_fx::config::FxConfig;
use hero_fx::effect::{ParticleEffect, ShaderEffect};
use hero_fx::input::{ListenerLedger, ListenerScope, POINTER_PARKED};
use hero_fx::particles::Viewport;
use hero_fx::scheduler::TickOutcome;
use hero_fx::shader::programs::ShaderVariant;
use hero_fx::shader::SurfaceSizing;

#[test]
fn shader_effect_stops_ticking_after_dispose() {
    let (gpu, gpu_log) = MockGpu::new((320.0, 200.0), 1.0);
    let (audio, audio_log) = FakeAudio::new(AudioFaults::default(), 128);
    let program = ShaderVariant::Music.program();
    let mut fx = ShaderEffect::mount(gpu, &program, SurfaceSizing::default(), true, Some(audio), 250.0).unwrap();
    assert!(fx.enable_audio());

    // 24 fps: a tick every third 60 Hz frame.
    let mut ran = 0;
    for i in 0..60 {
        if fx.frame(f64::from(i) * 1000.0 / 60.0) == TickOutcome::Ran {
            ran += 1;
        }
    }
    assert!((20..=31).contains(&ran), "{ran}");
    assert_eq!(fx.ticks(), ran);
    let draws = gpu_log.borrow().draws;

    fx.dispose();
    for i in 60..120 {
        assert_eq!(fx.frame(f64::from(i) * 1000.0 / 60.0), TickOutcome::Stopped);
    }
    assert_eq!(fx.ticks(), ran);
    assert_eq!(gpu_log.borrow().draws, draws);
    assert_eq!(gpu_log.borrow().context_released, 1);

    let audio = audio_log.borrow();
    assert_eq!((audio.stops, audio.disconnects, audio.closes), (1, 1, 1));

    fx.dispose();
    assert_eq!(gpu_log.borrow().context_released, 1);
}

#[test]
fn shader_resize_is_debounced() {
    let (gpu, gpu_log) = MockGpu::new((320.0, 200.0), 1.0);
    let program = ShaderVariant::PaintSpin.program();
    let mut fx: ShaderEffect<_, FakeAudio> =
        ShaderEffect::mount(gpu, &program, SurfaceSizing::default(), true, None, 250.0).unwrap();
    assert!(fx.audio().is_none());

    gpu_log.borrow_mut().layout = (640.0, 400.0);
    for t in [0.0, 50.0, 100.0, 150.0] {
        fx.request_resize(t);
        fx.frame(t);
    }
    assert_eq!(gpu_log.borrow().backing_resizes, 1);
    fx.frame(399.0);
    assert_eq!(gpu_log.borrow().backing_resizes, 1);
    // PaintSpin is uncapped, so the first frame past the 400 ms deadline resizes.
    fx.frame(450.0);
    assert_eq!(gpu_log.borrow().backing_resizes, 2);
    assert_eq!(fx.surface().uniforms().resolution_px, (640, 400));
}

#[test]
fn particle_effect_stops_ticking_after_dispose() {
    let mut fx = ParticleEffect::new(&FxConfig::default(), "HI", "DEV", true, Viewport::new(800.0, 600.0), 9, 0.0);
    let mut raster = BlockRasterizer::default();
    let mut surface = RecordingSurface::default();
    for i in 0..30 {
        fx.frame(f64::from(i) * 16.0, POINTER_PARKED, &mut raster, &mut surface);
    }
    let ticks = fx.ticks();
    let clears = surface.clears;
    assert_eq!(ticks, 30);

    fx.resize(Viewport::new(400.0, 300.0), 480.0);
    fx.dispose();
    assert!(fx.is_disposed());
    assert!(!fx.is_build_pending());
    for i in 30..60 {
        assert_eq!(
            fx.frame(f64::from(i) * 16.0, POINTER_PARKED, &mut raster, &mut surface),
            TickOutcome::Stopped
        );
    }
    assert_eq!(fx.ticks(), ticks);
    assert_eq!(surface.clears, clears);
    assert_eq!(raster.calls, 1);
}

#[test]
fn every_registered_listener_is_removed() {
    let mut ledger = ListenerLedger::default();
    let mut ids = Vec::new();
    for scope in [ListenerScope::Element, ListenerScope::Window] {
        for kind in ["mousemove", "touchstart", "touchmove"] {
            ids.push(ledger.register(scope, kind));
        }
    }
    ids.push(ledger.register(ListenerScope::Window, "resize"));
    assert_eq!(ledger.outstanding(), 7);

    for id in ids.iter().take(3) {
        assert!(ledger.remove(*id));
    }
    // Only the element listeners are gone; the window ones would leak.
    assert_eq!(ledger.outstanding(), 4);
    assert!(ledger
        .attached()
        .iter()
        .all(|(scope, _)| *scope == ListenerScope::Window));

    for id in ids {
        ledger.remove(id);
    }
    assert_eq!(ledger.registered(), ledger.removed());
    assert!(ledger.attached().is_empty());
}
