//! One-shot choice of which effect to mount.
//!
//! Candidates are tried in order; a candidate whose predicate rejects the
//! device is never constructed, and one whose constructor fails hands over to
//! the next. The static gradient at the end cannot fail.

use crate::error::Result;

/// What the environment can do, probed once at mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityProfile {
    pub has_gpu_context: bool,
    pub is_low_power_device: bool,
}

const MOBILE_MARKERS: [&str; 5] = ["Android", "iPhone", "iPad", "iPod", "Mobile"];

pub fn is_mobile_user_agent(user_agent: &str) -> bool {
    MOBILE_MARKERS.iter().any(|m| user_agent.contains(m))
}

impl CapabilityProfile {
    /// Low power means a mobile user agent *and* at most `low_power_cores`
    /// logical cores. Unknown core counts (0) count as low.
    pub fn detect(
        has_gpu_context: bool,
        user_agent: &str,
        logical_cores: u32,
        low_power_cores: u32,
    ) -> Self {
        Self {
            has_gpu_context,
            is_low_power_device: is_mobile_user_agent(user_agent) && logical_cores <= low_power_cores,
        }
    }

    /// Continuous canvas animation is worth running.
    pub fn can_animate(&self) -> bool {
        self.has_gpu_context && !self.is_low_power_device
    }
}

pub type Predicate = fn(&CapabilityProfile) -> bool;

struct Candidate<'a, T> {
    name: &'static str,
    predicate: Predicate,
    build: Box<dyn FnOnce() -> Result<T> + 'a>,
}

#[derive(Debug)]
pub enum Selection<T> {
    Effect { name: &'static str, effect: T },
    StaticGradient,
}

impl<T> Selection<T> {
    pub fn name(&self) -> &'static str {
        match self {
            Selection::Effect { name, .. } => name,
            Selection::StaticGradient => "static_gradient",
        }
    }

    pub fn is_static(&self) -> bool {
        matches!(self, Selection::StaticGradient)
    }
}

pub struct EffectSelector<'a, T> {
    candidates: Vec<Candidate<'a, T>>,
}

impl<T> Default for EffectSelector<'_, T> {
    fn default() -> Self {
        Self {
            candidates: Vec::new(),
        }
    }
}

impl<'a, T> EffectSelector<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a candidate below every one added so far.
    pub fn candidate<F>(mut self, name: &'static str, predicate: Predicate, build: F) -> Self
    where
        F: FnOnce() -> Result<T> + 'a,
    {
        self.candidates.push(Candidate {
            name,
            predicate,
            build: Box::new(build),
        });
        self
    }

    /// Consumes the selector: the decision is made exactly once.
    pub fn select(self, profile: &CapabilityProfile) -> Selection<T> {
        for candidate in self.candidates {
            if !(candidate.predicate)(profile) {
                log::debug!("{}: skipped for {profile:?}", candidate.name);
                continue;
            }
            match (candidate.build)() {
                Ok(effect) => {
                    log::info!("mounted effect {}", candidate.name);
                    return Selection::Effect {
                        name: candidate.name,
                        effect,
                    };
                }
                Err(err) if err.is_capability_signal() => {
                    log::warn!("{} unavailable, falling back: {err}", candidate.name);
                }
                Err(err) => {
                    log::error!("{} failed to mount, falling back: {err}", candidate.name);
                }
            }
        }
        log::info!("using static gradient");
        Selection::StaticGradient
    }
}

/// Background for the static path, matched to the site's hero gradient.
pub fn static_gradient_css(is_dark: bool) -> &'static str {
    if is_dark {
        "linear-gradient(to right bottom, rgba(31, 41, 55, 0.8), rgba(17, 24, 39, 0.8))"
    } else {
        "linear-gradient(to right bottom, rgba(229, 231, 235, 0.8), rgba(249, 250, 251, 0.8))"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_power_needs_both_signals() {
        let phone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Mobile/15E148";
        let desktop = "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/128.0";
        assert!(CapabilityProfile::detect(true, phone, 4, 4).is_low_power_device);
        assert!(!CapabilityProfile::detect(true, phone, 8, 4).is_low_power_device);
        assert!(!CapabilityProfile::detect(true, desktop, 2, 4).is_low_power_device);
    }

    #[test]
    fn gradient_tracks_theme() {
        assert_ne!(static_gradient_css(true), static_gradient_css(false));
    }
}
