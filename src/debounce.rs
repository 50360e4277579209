/// Trailing-edge debounce driven by an explicit clock.
///
/// Event handlers call [`Debounce::trigger`]; the frame loop calls
/// [`Debounce::fire_if_due`] and does the expensive work when it returns
/// `true`. Every trigger pushes the deadline out by `wait_ms`, so a burst of
/// resize events results in a single rebuild once the burst settles.
#[derive(Debug, Clone)]
pub struct Debounce {
    wait_ms: f64,
    deadline: Option<f64>,
}

impl Debounce {
    pub fn new(wait_ms: f64) -> Self {
        Self {
            wait_ms: wait_ms.max(0.0),
            deadline: None,
        }
    }

    pub fn wait_ms(&self) -> f64 {
        self.wait_ms
    }

    pub fn trigger(&mut self, now_ms: f64) {
        self.deadline = Some(now_ms + self.wait_ms);
    }

    /// Arms with a one-off wait instead of the configured one.
    pub fn trigger_after(&mut self, now_ms: f64, wait_ms: f64) {
        self.deadline = Some(now_ms + wait_ms.max(0.0));
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn fire_if_due(&mut self, now_ms: f64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
