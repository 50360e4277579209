mod common;

use common::{AudioFaults, FakeAudio};
use hero_fx::audio::{AudioSpectrumSource, Spectrum};

#[test]
fn graph_is_built_once() {
    let (factory, log) = FakeAudio::new(AudioFaults::default(), 255);
    let mut source = AudioSpectrumSource::new(factory);
    assert!(!source.is_live());
    assert!(source.ensure_graph());
    assert!(source.ensure_graph());
    assert!(source.is_live());
    assert_eq!(log.borrow().connects, 1);

    let loud = source.sample(0.0);
    assert_eq!(log.borrow().reads, 1);
    let expected = 0.9f32.powf(0.7);
    assert!(loud.bands().iter().all(|b| (b - expected).abs() < 1e-5), "{loud:?}");
}

#[test]
fn refused_audio_uses_synthetic_spectrum() {
    let faults = AudioFaults {
        connect: true,
        ..AudioFaults::default()
    };
    let (factory, log) = FakeAudio::new(faults, 255);
    let mut source = AudioSpectrumSource::new(factory);
    assert!(!source.ensure_graph());
    assert_eq!(source.sample(3.25), Spectrum::synthetic(3.25));

    // A later user gesture may succeed.
    source.factory_mut().faults.connect = false;
    assert!(source.ensure_graph());
    assert_eq!(log.borrow().connects, 2);
}

#[test]
fn read_failure_falls_back_for_that_frame() {
    let faults = AudioFaults {
        read: true,
        ..AudioFaults::default()
    };
    let (factory, _log) = FakeAudio::new(faults, 200);
    let mut source = AudioSpectrumSource::new(factory);
    assert!(source.ensure_graph());
    assert_eq!(source.sample(0.75), Spectrum::synthetic(0.75));
    assert!(source.is_live());
}

#[test]
fn teardown_runs_every_step_even_when_one_fails() {
    let faults = AudioFaults {
        stop: true,
        disconnect: true,
        ..AudioFaults::default()
    };
    let (factory, log) = FakeAudio::new(faults, 0);
    let mut source = AudioSpectrumSource::new(factory);
    assert!(source.ensure_graph());

    let report = source.teardown();
    assert!(report.stop_failed);
    assert!(report.disconnect_failed);
    assert!(!report.close_failed);
    {
        let log = log.borrow();
        assert_eq!((log.stops, log.disconnects, log.closes), (1, 1, 1));
    }

    assert!(source.teardown().is_clean());
    assert!(!source.ensure_graph(), "no graph after teardown");
    assert_eq!(log.borrow().connects, 1);
    assert_eq!(log.borrow().closes, 1);
}

#[test]
fn teardown_stops_playback_without_a_graph() {
    let faults = AudioFaults {
        connect: true,
        ..AudioFaults::default()
    };
    let (factory, log) = FakeAudio::new(faults, 255);
    let mut source = AudioSpectrumSource::new(factory);
    // The page may still have started the element even though the context was refused.
    assert!(!source.ensure_graph());

    assert!(source.teardown().is_clean());
    source.teardown();
    let log = log.borrow();
    assert_eq!(log.stops, 1);
    assert_eq!((log.disconnects, log.closes), (0, 0));
}
