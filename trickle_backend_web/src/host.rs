// Copyright 2026 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser host services.
//!
//! [`WebHost`] maps [`Host`] onto `requestAnimationFrame`, `setTimeout`, and a
//! `MutationObserver` watching the root container with `childList` and
//! `subtree`. The JS callbacks are installed by
//! [`WebThrottle`](crate::WebThrottle) once the session they feed exists.

use js_sys::Array;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Element, MutationObserver, MutationObserverInit};

use trickle_core::backend::{FrameHandle, Host, TimerHandle};
use trickle_core::time::{Duration, HostTime, Timebase};

// Direct global bindings instead of `web_sys::Window` methods, so no Window
// object has to be fetched (and unwrapped) per call.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);

    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(callback: &JsValue, delay_ms: i32) -> i32;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn clear_timeout(id: i32);
}

pub(crate) type FrameClosure = Closure<dyn FnMut(f64)>;
pub(crate) type TimerClosure = Closure<dyn FnMut()>;
pub(crate) type MutationClosure = Closure<dyn FnMut(Array, MutationObserver)>;

/// JS callbacks owned by the host.
pub(crate) struct Callbacks {
    pub(crate) frame: FrameClosure,
    pub(crate) timer: TimerClosure,
    pub(crate) mutations: MutationClosure,
}

/// Converts a timer delay to the whole milliseconds `setTimeout` takes.
pub(crate) fn timeout_ms(delay: Duration, timebase: Timebase) -> i32 {
    i32::try_from(delay.to_nanos(timebase) / 1_000_000).unwrap_or(i32::MAX)
}

/// [`Host`] implementation over browser globals.
pub struct WebHost {
    target: Option<Element>,
    observer: Option<MutationObserver>,
    callbacks: Option<Callbacks>,
    observing: bool,
}

impl core::fmt::Debug for WebHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebHost")
            .field("has_target", &self.target.is_some())
            .field("installed", &self.callbacks.is_some())
            .field("observing", &self.observing)
            .finish_non_exhaustive()
    }
}

impl WebHost {
    pub(crate) fn new(target: Option<Element>) -> Self {
        Self {
            target,
            observer: None,
            callbacks: None,
            observing: false,
        }
    }

    /// Installs the JS callbacks and creates the mutation observer.
    pub(crate) fn install(&mut self, callbacks: Callbacks) -> Result<(), JsValue> {
        let observer = MutationObserver::new(callbacks.mutations.as_ref().unchecked_ref())?;
        self.observer = Some(observer);
        self.callbacks = Some(callbacks);
        Ok(())
    }

    pub(crate) fn set_target(&mut self, target: Option<Element>) {
        self.target = target;
    }

    /// Returns `true` while the mutation observer is attached.
    #[must_use]
    pub fn is_observing(&self) -> bool {
        self.observing
    }
}

impl Host for WebHost {
    fn now(&self) -> HostTime {
        crate::now()
    }

    fn timebase(&self) -> Timebase {
        crate::timebase()
    }

    fn request_frame(&mut self) -> FrameHandle {
        match &self.callbacks {
            Some(cb) => FrameHandle(request_animation_frame(cb.frame.as_ref().unchecked_ref())),
            // Never delivered; the throttle installs callbacks before starting.
            None => FrameHandle(0),
        }
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        cancel_animation_frame(handle.0);
    }

    fn start_timer(&mut self, delay: Duration) -> TimerHandle {
        let ms = timeout_ms(delay, self.timebase());
        match &self.callbacks {
            Some(cb) => TimerHandle(set_timeout(cb.timer.as_ref().unchecked_ref(), ms)),
            None => TimerHandle(0),
        }
    }

    fn cancel_timer(&mut self, handle: TimerHandle) {
        clear_timeout(handle.0);
    }

    fn connect(&mut self) {
        let (Some(observer), Some(target)) = (&self.observer, &self.target) else {
            return;
        };
        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        // `observe` throws only for an options object that requests no
        // record types, and `childList` is always set.
        let result = observer.observe_with_options(target, &init);
        debug_assert!(result.is_ok(), "MutationObserver.observe failed: {result:?}");
        self.observing = result.is_ok();
    }

    fn disconnect(&mut self) {
        if let Some(observer) = &self.observer {
            observer.disconnect();
        }
        self.observing = false;
    }
}

impl Drop for WebHost {
    fn drop(&mut self) {
        // The observer must not call into a dropped closure.
        if let Some(observer) = &self.observer {
            observer.disconnect();
        }
    }
}
