use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

type Callback<E> = Rc<dyn Fn(&E)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(usize);

struct Inner<E> {
    callbacks: RefCell<Vec<(ConnectionId, Callback<E>)>>,
    next_id: Cell<usize>,
    pending: RefCell<VecDeque<E>>,
    dispatching: Cell<bool>,
    blocked: Cell<usize>,
    suppressed: RefCell<Option<E>>,
    delivered: Cell<u64>,
}

/// Synchronous notification channel for one mutable field group.
///
/// Handles are cheap to clone and share the same subscriber list. Events are
/// delivered to every connected callback before `emit` returns. An event
/// emitted while the same emitter is already dispatching is queued and
/// delivered once the running dispatch finishes, so nothing is dropped and
/// callbacks never observe nested deliveries.
pub struct EventEmitter<E> {
    inner: Rc<Inner<E>>,
}

impl<E> Clone for EventEmitter<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E> Default for EventEmitter<E> {
    fn default() -> Self {
        Self {
            inner: Rc::new(Inner {
                callbacks: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                pending: RefCell::new(VecDeque::new()),
                dispatching: Cell::new(false),
                blocked: Cell::new(0),
                suppressed: RefCell::new(None),
                delivered: Cell::new(0),
            }),
        }
    }
}

impl<E> fmt::Debug for EventEmitter<E> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("EventEmitter")
            .field("callbacks", &self.inner.callbacks.borrow().len())
            .field("blocked", &self.inner.blocked.get())
            .field("delivered", &self.inner.delivered.get())
            .finish()
    }
}

impl<E: 'static> EventEmitter<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, callback: impl Fn(&E) + 'static) -> ConnectionId {
        let id = ConnectionId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner
            .callbacks
            .borrow_mut()
            .push((id, Rc::new(callback)));
        id
    }

    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let mut callbacks = self.inner.callbacks.borrow_mut();
        let before = callbacks.len();
        callbacks.retain(|(existing, _)| *existing != id);
        callbacks.len() != before
    }

    /// Delivers `event` to every subscriber. While a blocker is held only
    /// the most recent event is kept; earlier payloads emitted during the
    /// block are discarded.
    pub fn emit(&self, event: E) {
        if self.inner.blocked.get() > 0 {
            *self.inner.suppressed.borrow_mut() = Some(event);
            return;
        }

        self.inner.pending.borrow_mut().push_back(event);
        if self.inner.dispatching.get() {
            return;
        }

        self.inner.dispatching.set(true);
        loop {
            let next = self.inner.pending.borrow_mut().pop_front();
            let Some(event) = next else {
                break;
            };
            let callbacks = self
                .inner
                .callbacks
                .borrow()
                .iter()
                .map(|(_, callback)| Rc::clone(callback))
                .collect::<Vec<_>>();
            self.inner.delivered.set(self.inner.delivered.get() + 1);
            for callback in callbacks {
                callback(&event);
            }
        }
        self.inner.dispatching.set(false);
    }

    /// Suppresses delivery until every returned guard is dropped. The last
    /// event emitted while blocked is delivered once on release.
    pub fn blocker(&self) -> EmitterBlocker<E> {
        self.inner.blocked.set(self.inner.blocked.get() + 1);
        EmitterBlocker {
            emitter: self.clone(),
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.inner.blocked.get() > 0
    }

    /// Number of events delivered so far, regardless of subscriber count.
    pub fn delivered(&self) -> u64 {
        self.inner.delivered.get()
    }
}

#[must_use = "notifications resume as soon as the blocker is dropped"]
pub struct EmitterBlocker<E: 'static> {
    emitter: EventEmitter<E>,
}

impl<E: 'static> Drop for EmitterBlocker<E> {
    fn drop(&mut self) {
        let inner = &self.emitter.inner;
        inner.blocked.set(inner.blocked.get().saturating_sub(1));
        if inner.blocked.get() == 0 {
            let suppressed = inner.suppressed.borrow_mut().take();
            if let Some(event) = suppressed {
                self.emitter.emit(event);
            }
        }
    }
}
