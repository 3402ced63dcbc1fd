//! Hierarchical typed event dispatch
//!
//! Targets form a parent chain (component store → scene → game). Key points:
//! - Listeners are keyed by event type and run in registration order
//! - `listen` registers the handler on the target *and* on every ancestor,
//!   so ancestor-level raises reach handlers attached further down
//! - A raise that finishes its local listeners is forwarded to the parent
//! - Listeners can `cancel` (abort dispatch, no propagation) or
//!   `stop_propagation` (finish local listeners, no propagation)
//! - Raising an event nobody listens for is a silent no-op

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

/// Typed identifier for a kind of event.
///
/// Carries the payload type at compile time and a string key at runtime;
/// two event types are the same event if their keys match. Intended to be
/// declared once as a `static` and referenced everywhere.
pub struct EventType<T> {
    key: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> EventType<T> {
    /// Declare an event type under the given key.
    #[must_use]
    pub const fn new(key: &'static str) -> Self {
        Self {
            key,
            _marker: PhantomData,
        }
    }

    /// The runtime key this event dispatches under.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.key
    }
}

impl<T> fmt::Debug for EventType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventType").field(&self.key).finish()
    }
}

impl<T> PartialEq for EventType<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T> Eq for EventType<T> {}

/// Per-raise dispatch controls handed to each listener.
pub struct EventControl {
    cancelled: Cell<bool>,
    propagate: Cell<bool>,
}

impl EventControl {
    fn new() -> Self {
        Self {
            cancelled: Cell::new(false),
            propagate: Cell::new(true),
        }
    }

    /// Abort dispatch: no further listeners on this target run and the
    /// event does not propagate to the parent.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    /// Let the remaining listeners on this target finish, but do not
    /// forward the event to the parent afterwards.
    pub fn stop_propagation(&self) {
        self.propagate.set(false);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    fn should_propagate(&self) -> bool {
        self.propagate.get() && !self.cancelled.get()
    }
}

type ErasedListener = Rc<RefCell<dyn FnMut(&dyn Any, &EventControl)>>;

struct TargetInner {
    parent: Option<EventTarget>,
    listeners: RefCell<HashMap<&'static str, Vec<ErasedListener>>>,
}

/// One node in the event hierarchy.
///
/// Cloning an `EventTarget` yields another handle to the same node, which
/// is how stores, scenes, and listeners share it.
#[derive(Clone)]
pub struct EventTarget {
    inner: Rc<TargetInner>,
}

impl EventTarget {
    /// Create a root target with no parent.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(TargetInner {
                parent: None,
                listeners: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Create a target whose raises forward to `parent`.
    #[must_use]
    pub fn with_parent(parent: &Self) -> Self {
        Self {
            inner: Rc::new(TargetInner {
                parent: Some(parent.clone()),
                listeners: RefCell::new(HashMap::new()),
            }),
        }
    }

    /// Register a listener for `event` on this target and on every
    /// ancestor up to the root.
    ///
    /// Because the registration is direct, the listener also fires when an
    /// ancestor raises a matching event itself, independent of whether this
    /// target ever forwards one upward.
    pub fn listen<T: 'static>(
        &self,
        event: &EventType<T>,
        listener: impl FnMut(&T, &EventControl) + 'static,
    ) {
        let mut listener = listener;
        let erased: ErasedListener = Rc::new(RefCell::new(
            move |data: &dyn Any, control: &EventControl| {
                if let Some(data) = data.downcast_ref::<T>() {
                    listener(data, control);
                }
            },
        ));
        self.register(event.key(), erased);
    }

    fn register(&self, key: &'static str, listener: ErasedListener) {
        if let Some(parent) = &self.inner.parent {
            parent.register(key, Rc::clone(&listener));
        }
        self.inner
            .listeners
            .borrow_mut()
            .entry(key)
            .or_default()
            .push(listener);
    }

    /// Dispatch `data` to this target's listeners for `event`, then forward
    /// to the parent unless a listener cancelled or stopped propagation.
    pub fn raise<T: 'static>(&self, event: &EventType<T>, data: &T) {
        self.dispatch(event.key(), data);
    }

    fn dispatch(&self, key: &'static str, data: &dyn Any) {
        // Snapshot so listeners may register further listeners mid-dispatch.
        let local: Vec<ErasedListener> = self
            .inner
            .listeners
            .borrow()
            .get(key)
            .cloned()
            .unwrap_or_default();

        let control = EventControl::new();
        for listener in &local {
            if control.is_cancelled() {
                return;
            }
            (listener.borrow_mut())(data, &control);
        }
        if control.should_propagate() {
            if let Some(parent) = &self.inner.parent {
                parent.dispatch(key, data);
            }
        }
    }
}

impl Default for EventTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count: usize = self
            .inner
            .listeners
            .borrow()
            .values()
            .map(Vec::len)
            .sum();
        f.debug_struct("EventTarget")
            .field("listeners", &count)
            .field("has_parent", &self.inner.parent.is_some())
            .finish()
    }
}
