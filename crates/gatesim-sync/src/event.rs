//! Multi-subscriber broadcast event.
//!
//! Firing delivers the payload two ways: every thread blocked in
//! [`BroadcastEvent::wait`] wakes with it, and every subscriber callback
//! is queued on the event's [`Dispatcher`]. Callbacks therefore never run
//! on the firing thread and may be delivered in any order relative to
//! each other.
//!
//! An event can be restricted: once [`BroadcastEvent::caller`] mints the
//! single [`EventCaller`], only that handle may fire.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use indexmap::IndexMap;

use crate::awaitable::Awaitable;
use crate::error::EventError;
use crate::pool::Dispatcher;

type Handler<T> = Arc<dyn Fn(T) + Send + Sync>;

struct EventShared<T> {
    subscribers: Mutex<IndexMap<u64, Handler<T>>>,
    next_id: AtomicU64,
    awaitable: Awaitable<T>,
    caller_minted: AtomicBool,
    fired: AtomicU64,
}

impl<T: Clone + Send + 'static> EventShared<T> {
    fn lock(&self) -> MutexGuard<'_, IndexMap<u64, Handler<T>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn fire(&self, dispatcher: &Dispatcher, payload: T) -> Result<usize, EventError> {
        self.fired.fetch_add(1, Ordering::AcqRel);
        self.awaitable.notify_all(payload.clone());
        let handlers: Vec<Handler<T>> = self.lock().values().cloned().collect();
        let count = handlers.len();
        for handler in handlers {
            let payload = payload.clone();
            dispatcher.execute(move || handler(payload))?;
        }
        Ok(count)
    }
}

/// Type-erased removal hook so [`Subscription`] is not generic.
trait Unsubscribe: Send + Sync {
    fn unsubscribe(&self, id: u64);
}

impl<T: Clone + Send + 'static> Unsubscribe for EventShared<T> {
    fn unsubscribe(&self, id: u64) {
        self.lock().shift_remove(&id);
    }
}

// ── BroadcastEvent ───────────────────────────────────────────────

/// A broadcast event carrying payloads of type `T`.
///
/// Cloning yields another handle to the same event.
pub struct BroadcastEvent<T> {
    shared: Arc<EventShared<T>>,
    dispatcher: Dispatcher,
}

impl<T> Clone for BroadcastEvent<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            dispatcher: self.dispatcher.clone(),
        }
    }
}

impl<T: Clone + Send + 'static> BroadcastEvent<T> {
    /// Create an unrestricted event whose callbacks run on `dispatcher`.
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            shared: Arc::new(EventShared {
                subscribers: Mutex::new(IndexMap::new()),
                next_id: AtomicU64::new(0),
                awaitable: Awaitable::new(),
                caller_minted: AtomicBool::new(false),
                fired: AtomicU64::new(0),
            }),
            dispatcher,
        }
    }

    /// Create an event together with its firing capability.
    pub fn restricted(dispatcher: Dispatcher) -> (Self, EventCaller<T>) {
        let event = Self::new(dispatcher);
        event.shared.caller_minted.store(true, Ordering::Release);
        let caller = EventCaller {
            shared: Arc::clone(&event.shared),
            dispatcher: event.dispatcher.clone(),
        };
        (event, caller)
    }

    /// Register `handler`; it stays registered until the returned
    /// [`Subscription`] is disposed or dropped.
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        self.shared.lock().insert(id, Arc::new(handler));
        let event = Arc::downgrade(&self.shared);
        let event: Weak<dyn Unsubscribe> = event;
        Subscription {
            id,
            event,
            disposed: AtomicBool::new(false),
        }
    }

    /// Fire the event.
    ///
    /// Returns the number of subscriber callbacks queued. Fails with
    /// [`EventError::Restricted`] once a caller has been minted.
    pub fn fire(&self, payload: T) -> Result<usize, EventError> {
        if self.shared.caller_minted.load(Ordering::Acquire) {
            return Err(EventError::Restricted);
        }
        self.shared.fire(&self.dispatcher, payload)
    }

    /// Mint the single firing capability and restrict [`fire`](Self::fire).
    pub fn caller(&self) -> Result<EventCaller<T>, EventError> {
        if self.shared.caller_minted.swap(true, Ordering::AcqRel) {
            return Err(EventError::CallerAlreadyMinted);
        }
        Ok(EventCaller {
            shared: Arc::clone(&self.shared),
            dispatcher: self.dispatcher.clone(),
        })
    }

    /// Block until the next firing and return its payload.
    pub fn wait(&self) -> T {
        self.shared.awaitable.wait()
    }

    /// Block until the next firing or until `timeout` elapses.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<T> {
        self.shared.awaitable.wait_timeout(timeout)
    }

    /// Threads currently blocked in `wait*`.
    pub fn waiters(&self) -> usize {
        self.shared.awaitable.waiters()
    }

    /// Live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.shared.lock().len()
    }

    /// Total firings since creation.
    pub fn fire_count(&self) -> u64 {
        self.shared.fired.load(Ordering::Acquire)
    }

    /// Whether the firing capability has been handed out.
    pub fn is_restricted(&self) -> bool {
        self.shared.caller_minted.load(Ordering::Acquire)
    }
}

impl<T> std::fmt::Debug for BroadcastEvent<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastEvent")
            .field("fired", &self.shared.fired.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

// ── EventCaller ──────────────────────────────────────────────────

/// The sole permission to fire a restricted event.
pub struct EventCaller<T> {
    shared: Arc<EventShared<T>>,
    dispatcher: Dispatcher,
}

impl<T: Clone + Send + 'static> EventCaller<T> {
    /// Fire the event this caller was minted from.
    pub fn fire(&self, payload: T) -> Result<usize, EventError> {
        self.shared.fire(&self.dispatcher, payload)
    }
}

impl<T> std::fmt::Debug for EventCaller<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventCaller").finish_non_exhaustive()
    }
}

// ── Subscription ─────────────────────────────────────────────────

/// Handle to one registered callback.
///
/// Dropping the handle disposes it. Use [`detach`](Self::detach) to keep
/// the callback registered for the event's lifetime.
pub struct Subscription {
    id: u64,
    event: Weak<dyn Unsubscribe>,
    disposed: AtomicBool,
}

impl Subscription {
    /// Unregister the callback. Idempotent, and a no-op once the event
    /// itself is gone. Callbacks already queued may still run.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(event) = self.event.upgrade() {
            event.unsubscribe(self.id);
        }
    }

    /// Whether the callback is still registered.
    pub fn is_active(&self) -> bool {
        !self.disposed.load(Ordering::Acquire) && self.event.strong_count() > 0
    }

    /// Give up the handle without unregistering the callback.
    pub fn detach(self) {
        self.disposed.store(true, Ordering::Release);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

// Compile-time assertion: events and their handles cross threads.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<BroadcastEvent<u64>>();
    assert::<EventCaller<u64>>();
    assert::<Subscription>();
};
