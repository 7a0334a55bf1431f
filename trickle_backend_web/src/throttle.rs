// Copyright 2026 the Trickle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Page-level driver.
//!
//! [`WebThrottle`] owns a [`Session`] over the live DOM and wires browser
//! callbacks into it. The session sits in an `Rc<RefCell<..>>`; every JS
//! closure holds only a `Weak` to it, so dropping the throttle tears the
//! session down even while callbacks are still registered.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use js_sys::Array;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;
use web_sys::{Element, MutationObserver, MutationRecord};

use trickle_core::config::{ConfigError, ThrottleConfig};
use trickle_core::intake::IntakeRules;
use trickle_core::session::{Lifecycle, Session, SessionStats};
use trickle_core::trace::TraceSink;

use crate::host::{Callbacks, WebHost};
use crate::tree::{DomNode, DomTree};

type Shared = Rc<RefCell<Session<DomTree, WebHost>>>;

/// Errors from [`WebThrottle::new`].
#[derive(Clone, Debug)]
pub enum ThrottleError {
    /// The configuration failed validation.
    Config(ConfigError),
    /// The browser refused to create the `MutationObserver`.
    Observer(JsValue),
}

impl fmt::Display for ThrottleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "invalid configuration: {err}"),
            Self::Observer(err) => write!(f, "MutationObserver creation failed ({err:?})"),
        }
    }
}

impl core::error::Error for ThrottleError {}

impl From<ConfigError> for ThrottleError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

/// Throttled reveal of DOM insertions under one root container.
///
/// Create with [`WebThrottle::new`], then call [`start`](Self::start).
/// Dropping the throttle stops the session and reveals anything still
/// pending.
pub struct WebThrottle {
    session: Shared,
}

impl fmt::Debug for WebThrottle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.session.try_borrow() {
            Ok(session) => f
                .debug_struct("WebThrottle")
                .field("session", &*session)
                .finish(),
            Err(_) => f.debug_struct("WebThrottle").finish_non_exhaustive(),
        }
    }
}

impl WebThrottle {
    /// Creates a stopped throttle for the subtree under `root`.
    ///
    /// `root` may be `None` if the container is not mounted yet; provide it
    /// later with [`set_root`](Self::set_root).
    pub fn new(root: Option<Element>, config: ThrottleConfig) -> Result<Self, ThrottleError> {
        Self::with_rules(root, config, IntakeRules::DEFAULT)
    }

    /// Creates a stopped throttle with custom intake rules.
    pub fn with_rules(
        root: Option<Element>,
        config: ThrottleConfig,
        rules: IntakeRules,
    ) -> Result<Self, ThrottleError> {
        let tree = DomTree::new(root.clone());
        let host = WebHost::new(root);
        let session = Session::new(tree, host, config)?.with_rules(rules);
        let shared: Shared = Rc::new(RefCell::new(session));

        let callbacks = Callbacks {
            frame: frame_closure(Rc::downgrade(&shared)),
            timer: timer_closure(Rc::downgrade(&shared)),
            mutations: mutation_closure(Rc::downgrade(&shared)),
        };
        shared
            .borrow_mut()
            .host_mut()
            .install(callbacks)
            .map_err(ThrottleError::Observer)?;

        Ok(Self { session: shared })
    }

    /// Starts observing, after the configured start delay if any.
    pub fn start(&self) {
        self.session.borrow_mut().start();
    }

    /// Stops observing and reveals everything pending.
    pub fn stop(&self) {
        self.session.borrow_mut().stop();
    }

    /// Applies a new configuration.
    pub fn set_config(&self, config: ThrottleConfig) -> Result<(), ConfigError> {
        self.session.borrow_mut().set_config(config)
    }

    /// Replaces the root container.
    ///
    /// Takes effect the next time the session attaches, so a stopped
    /// throttle should be started again afterward.
    pub fn set_root(&self, root: Option<Element>) {
        let mut session = self.session.borrow_mut();
        session.tree_mut().set_root(root.clone());
        session.host_mut().set_target(root);
    }

    /// Reveals every pending node now.
    pub fn reveal_all(&self) -> u32 {
        self.session.borrow_mut().reveal_all()
    }

    /// Installs a trace sink.
    pub fn set_trace_sink(&self, sink: Box<dyn TraceSink>) {
        self.session.borrow_mut().set_trace_sink(sink);
    }

    /// Returns `true` while a flush is scheduled or running.
    #[must_use]
    pub fn is_flushing(&self) -> bool {
        self.session.borrow().is_flushing()
    }

    /// Returns the number of nodes waiting for reveal.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.session.borrow().pending_len()
    }

    /// Returns the session lifecycle.
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.session.borrow().lifecycle()
    }

    /// Returns the cumulative counters.
    #[must_use]
    pub fn stats(&self) -> SessionStats {
        self.session.borrow().stats()
    }
}

impl Drop for WebThrottle {
    fn drop(&mut self) {
        if let Ok(mut session) = self.session.try_borrow_mut() {
            session.stop();
        }
    }
}

fn frame_closure(weak: Weak<RefCell<Session<DomTree, WebHost>>>) -> Closure<dyn FnMut(f64)> {
    Closure::wrap(Box::new(move |_timestamp_ms: f64| {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let Ok(mut session) = shared.try_borrow_mut() else {
            return;
        };
        // At most one frame is outstanding, and cancelled frames never fire.
        if let Some(handle) = session.scheduled_frame() {
            session.on_frame(handle);
        }
    }) as Box<dyn FnMut(f64)>)
}

fn timer_closure(weak: Weak<RefCell<Session<DomTree, WebHost>>>) -> Closure<dyn FnMut()> {
    Closure::wrap(Box::new(move || {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let Ok(mut session) = shared.try_borrow_mut() else {
            return;
        };
        if let Some(handle) = session.start_timer() {
            session.on_timer(handle);
        }
    }) as Box<dyn FnMut()>)
}

fn mutation_closure(
    weak: Weak<RefCell<Session<DomTree, WebHost>>>,
) -> Closure<dyn FnMut(Array, MutationObserver)> {
    Closure::wrap(Box::new(move |records: Array, _observer: MutationObserver| {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let Ok(mut session) = shared.try_borrow_mut() else {
            return;
        };
        let added = added_elements(session.tree(), &records);
        session.on_mutations(added);
    }) as Box<dyn FnMut(Array, MutationObserver)>)
}

/// Collects the element nodes added across a batch of mutation records.
fn added_elements(tree: &DomTree, records: &Array) -> Vec<DomNode> {
    let mut added = Vec::new();
    for record in records.iter() {
        let record: MutationRecord = record.unchecked_into();
        let nodes = record.added_nodes();
        for i in 0..nodes.length() {
            if let Some(element) = nodes.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                added.push(tree.node_for(element));
            }
        }
    }
    added
}
