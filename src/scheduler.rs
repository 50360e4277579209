//! Fixed-rate gate in front of the platform's per-frame callback.
//!
//! The browser calls us every display refresh; `FrameScheduler` decides which
//! of those refreshes actually run a tick. Skipped refreshes are simply
//! dropped, never queued.

use crate::error::Result;

/// What happened to one platform frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Callback ran and succeeded.
    Ran,
    /// Inside the frame budget; nothing ran.
    Skipped,
    /// Callback ran and failed; the error was logged and the loop continues.
    Failed,
    /// Scheduler is stopped; the platform loop should not re-arm.
    Stopped,
}

#[derive(Debug, Clone)]
pub struct FrameScheduler {
    /// Minimum milliseconds between ticks. Zero means uncapped.
    budget_ms: f64,
    last_ms: Option<f64>,
    ticks: u64,
    stopped: bool,
}

impl FrameScheduler {
    /// `target_fps == 0` runs on every platform frame.
    pub fn new(target_fps: u32) -> Self {
        let budget_ms = if target_fps == 0 {
            0.0
        } else {
            1000.0 / f64::from(target_fps)
        };
        Self {
            budget_ms,
            last_ms: None,
            ticks: 0,
            stopped: false,
        }
    }

    pub fn budget_ms(&self) -> f64 {
        self.budget_ms
    }

    /// Number of ticks that actually invoked the callback.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// After this, `poll` and `run` never invoke anything again.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// Whether a tick is due at `now_ms`. Marks the tick as taken when it is.
    pub fn poll(&mut self, now_ms: f64) -> bool {
        if self.stopped || !now_ms.is_finite() {
            return false;
        }
        let due = match self.last_ms {
            None => true,
            // Clock going backwards (tab restore, test clocks) resets the gate.
            Some(last) if now_ms < last => true,
            Some(last) => now_ms - last >= self.budget_ms,
        };
        if due {
            self.last_ms = Some(now_ms);
            self.ticks += 1;
        }
        due
    }

    /// Runs `callback` if a tick is due. Errors are caught here so one bad
    /// frame never kills the loop.
    pub fn run<F>(&mut self, now_ms: f64, callback: F) -> TickOutcome
    where
        F: FnOnce(f64) -> Result<()>,
    {
        if self.stopped {
            return TickOutcome::Stopped;
        }
        if !self.poll(now_ms) {
            return TickOutcome::Skipped;
        }
        match callback(now_ms) {
            Ok(()) => TickOutcome::Ran,
            Err(err) => {
                log::error!("frame tick failed: {err}");
                TickOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FxError;

    #[test]
    fn caps_rate() {
        let mut s = FrameScheduler::new(24);
        let mut ran = 0;
        // 60 Hz display for one second.
        for i in 0..60 {
            if s.poll(f64::from(i) * 1000.0 / 60.0) {
                ran += 1;
            }
        }
        assert!((15..=24).contains(&ran), "ran {ran} ticks");
        assert_eq!(s.ticks(), ran);
    }

    #[test]
    fn uncapped_runs_every_frame() {
        let mut s = FrameScheduler::new(0);
        for i in 0..10 {
            assert!(s.poll(f64::from(i) * 16.6));
        }
    }

    #[test]
    fn stop_freezes_counter() {
        let mut s = FrameScheduler::new(30);
        assert_eq!(s.run(0.0, |_| Ok(())), TickOutcome::Ran);
        s.stop();
        let mut invoked = false;
        assert_eq!(
            s.run(1000.0, |_| {
                invoked = true;
                Ok(())
            }),
            TickOutcome::Stopped
        );
        assert!(!invoked);
        assert_eq!(s.ticks(), 1);
    }

    #[test]
    fn failed_tick_keeps_scheduling() {
        let mut s = FrameScheduler::new(0);
        let out = s.run(0.0, |_| Err(FxError::Rasterization("boom".into())));
        assert_eq!(out, TickOutcome::Failed);
        assert_eq!(s.run(16.0, |_| Ok(())), TickOutcome::Ran);
    }

    #[test]
    fn ignores_nan_timestamps() {
        let mut s = FrameScheduler::new(0);
        assert!(!s.poll(f64::NAN));
        assert_eq!(s.ticks(), 0);
    }
}
