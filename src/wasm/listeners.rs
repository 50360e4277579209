use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{AddEventListenerOptions, Event, EventTarget};

use crate::error::Result;
use crate::input::{ListenerId, ListenerLedger, ListenerScope};

struct Attached {
    target: EventTarget,
    kind: &'static str,
    handler: Closure<dyn FnMut(Event)>,
    id: ListenerId,
}

/// Every DOM listener one effect attached, so teardown can remove them all.
#[derive(Default)]
pub struct ListenerSet {
    attached: Vec<Attached>,
    ledger: ListenerLedger,
}

impl ListenerSet {
    /// `passive: Some(false)` is needed for handlers that call `preventDefault`
    /// on touch events.
    pub fn listen<F>(
        &mut self,
        target: &EventTarget,
        scope: ListenerScope,
        kind: &'static str,
        passive: Option<bool>,
        handler: F,
    ) -> Result<()>
    where
        F: FnMut(Event) + 'static,
    {
        let handler = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        let callback: &js_sys::Function = handler.as_ref().unchecked_ref();
        match passive {
            Some(passive) => {
                let options = AddEventListenerOptions::new();
                options.set_passive(passive);
                target.add_event_listener_with_callback_and_add_event_listener_options(
                    kind, callback, &options,
                )?;
            }
            None => target.add_event_listener_with_callback(kind, callback)?,
        }
        let id = self.ledger.register(scope, kind);
        self.attached.push(Attached {
            target: target.clone(),
            kind,
            handler,
            id,
        });
        Ok(())
    }

    pub fn ledger(&self) -> &ListenerLedger {
        &self.ledger
    }

    /// Removes every listener and drops its closure. Returns how many were removed.
    pub fn detach_all(&mut self) -> usize {
        let mut removed = 0;
        for entry in self.attached.drain(..) {
            if let Err(err) = entry
                .target
                .remove_event_listener_with_callback(entry.kind, entry.handler.as_ref().unchecked_ref())
            {
                log::warn!("removing {} listener failed: {err:?}", entry.kind);
            }
            if self.ledger.remove(entry.id) {
                removed += 1;
            }
        }
        if self.ledger.outstanding() > 0 {
            log::error!("listeners still attached: {:?}", self.ledger.attached());
        }
        removed
    }
}

impl Drop for ListenerSet {
    fn drop(&mut self) {
        self.detach_all();
    }
}
