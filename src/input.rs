//! Pointer state shared between DOM handlers and the frame loop, plus the
//! bookkeeping that proves every listener we attached was detached again.

use std::cell::Cell;

/// Latest pointer position in viewport (CSS) pixels.
///
/// Handlers write, the tick reads; last write wins.
#[derive(Debug)]
pub struct PointerState {
    pos: Cell<(f64, f64)>,
}

/// Far outside any viewport so nothing is repelled before the first move.
pub const POINTER_PARKED: (f64, f64) = (-1000.0, -1000.0);

impl Default for PointerState {
    fn default() -> Self {
        Self {
            pos: Cell::new(POINTER_PARKED),
        }
    }
}

impl PointerState {
    pub fn set(&self, x: f64, y: f64) {
        self.pos.set((x, y));
    }

    pub fn get(&self) -> (f64, f64) {
        self.pos.get()
    }

    pub fn park(&self) {
        self.pos.set(POINTER_PARKED);
    }
}

/// Where a listener was attached. Both scopes must be cleaned up on teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerScope {
    Element,
    Window,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(usize);

#[derive(Debug, Clone)]
struct Entry {
    scope: ListenerScope,
    kind: &'static str,
    attached: bool,
}

/// Registered-vs-removed accounting for DOM listeners.
#[derive(Debug, Clone, Default)]
pub struct ListenerLedger {
    entries: Vec<Entry>,
}

impl ListenerLedger {
    pub fn register(&mut self, scope: ListenerScope, kind: &'static str) -> ListenerId {
        self.entries.push(Entry {
            scope,
            kind,
            attached: true,
        });
        ListenerId(self.entries.len() - 1)
    }

    /// Returns false if the listener was already removed.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        match self.entries.get_mut(id.0) {
            Some(entry) if entry.attached => {
                entry.attached = false;
                true
            }
            _ => false,
        }
    }

    pub fn registered(&self) -> usize {
        self.entries.len()
    }

    pub fn removed(&self) -> usize {
        self.entries.iter().filter(|e| !e.attached).count()
    }

    pub fn outstanding(&self) -> usize {
        self.registered() - self.removed()
    }

    /// Still-attached listeners as `(scope, event)` pairs, for leak reports.
    pub fn attached(&self) -> Vec<(ListenerScope, &'static str)> {
        self.entries
            .iter()
            .filter(|e| e.attached)
            .map(|e| (e.scope, e.kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_balances() {
        let mut ledger = ListenerLedger::default();
        let a = ledger.register(ListenerScope::Element, "mousemove");
        let b = ledger.register(ListenerScope::Window, "mousemove");
        assert_eq!(ledger.outstanding(), 2);
        assert!(ledger.remove(a));
        assert!(!ledger.remove(a));
        assert_eq!(ledger.attached(), vec![(ListenerScope::Window, "mousemove")]);
        assert!(ledger.remove(b));
        assert_eq!(ledger.registered(), ledger.removed());
    }

    #[test]
    fn pointer_last_write_wins() {
        let p = PointerState::default();
        assert_eq!(p.get(), POINTER_PARKED);
        p.set(1.0, 2.0);
        p.set(3.0, 4.0);
        assert_eq!(p.get(), (3.0, 4.0));
    }
}
