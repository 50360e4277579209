use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::window;

type FrameClosure = Closure<dyn FnMut(f64)>;

/// A `requestAnimationFrame` chain that can be cancelled.
///
/// The frame closure is stored in the `Option` so that it can reschedule
/// itself; [`RafLoop::stop`] takes it out again, which also breaks the
/// reference cycle.
pub struct RafLoop {
    callback: Rc<RefCell<Option<FrameClosure>>>,
    pending: Rc<Cell<Option<i32>>>,
    stopped: Rc<Cell<bool>>,
}

fn request(callback: &FrameClosure) -> Result<i32, JsValue> {
    window()
        .ok_or("no window")?
        .request_animation_frame(callback.as_ref().unchecked_ref())
}

impl RafLoop {
    /// Runs `frame` with the rAF timestamp on every display refresh until it
    /// returns `false` or the loop is stopped.
    pub fn start<F>(mut frame: F) -> Result<Self, JsValue>
    where
        F: FnMut(f64) -> bool + 'static,
    {
        let callback: Rc<RefCell<Option<FrameClosure>>> = Rc::new(RefCell::new(None));
        let pending = Rc::new(Cell::new(None));
        let stopped = Rc::new(Cell::new(false));

        let me = callback.clone();
        let pending_in = pending.clone();
        let stopped_in = stopped.clone();
        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move |timestamp: f64| {
            pending_in.set(None);
            if stopped_in.get() {
                return;
            }
            if !frame(timestamp) {
                stopped_in.set(true);
                return;
            }
            // schedule next
            if let Some(cb) = me.borrow().as_ref() {
                match request(cb) {
                    Ok(id) => pending_in.set(Some(id)),
                    Err(err) => {
                        log::error!("requestAnimationFrame failed: {err:?}");
                        stopped_in.set(true);
                    }
                }
            }
        }) as Box<dyn FnMut(f64)>));

        let first = match callback.borrow().as_ref() {
            Some(cb) => request(cb)?,
            None => return Err("frame callback missing".into()),
        };
        pending.set(Some(first));

        Ok(Self {
            callback,
            pending,
            stopped,
        })
    }

    pub fn is_running(&self) -> bool {
        !self.stopped.get()
    }

    /// Cancels the outstanding frame request and frees the closure.
    pub fn stop(&self) {
        self.stopped.set(true);
        if let Some(id) = self.pending.take() {
            if let Some(win) = window() {
                if let Err(err) = win.cancel_animation_frame(id) {
                    log::warn!("cancelAnimationFrame failed: {err:?}");
                }
            }
        }
        self.callback.borrow_mut().take();
    }
}

impl Drop for RafLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
