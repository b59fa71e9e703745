//! Blocking wait/notify handle carrying a payload.
//!
//! [`Awaitable`] is a condition variable with the bookkeeping that a bare
//! `Condvar` leaves to the caller: spurious wake-ups never return early,
//! `notify_one` hands its payload to exactly one current waiter, and
//! `notify_all` delivers its payload to every current waiter.
//! Notifications with nobody waiting are not latched.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

struct AwaitState<T> {
    /// Threads currently blocked in `wait*`.
    waiting: usize,
    /// Bumped by every `notify_all`.
    epoch: u64,
    /// Payload of the most recent `notify_all`.
    broadcast: Option<T>,
    /// One payload per outstanding `notify_one`.
    handoffs: VecDeque<T>,
}

impl<T> AwaitState<T> {
    /// Deregister a waiter. Handoffs beyond the remaining waiters have no
    /// recipient and are dropped.
    fn leave(&mut self) {
        self.waiting -= 1;
        self.handoffs.truncate(self.waiting);
    }
}

/// Wait/notify primitive delivering a `T` to woken waiters.
pub struct Awaitable<T = ()> {
    state: Mutex<AwaitState<T>>,
    cond: Condvar,
}

impl<T: Clone> Awaitable<T> {
    /// Create an awaitable with no waiters.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(AwaitState {
                waiting: 0,
                epoch: 0,
                broadcast: None,
                handoffs: VecDeque::new(),
            }),
            cond: Condvar::new(),
        }
    }

    /// Block until the next notification and return its payload.
    pub fn wait(&self) -> T {
        loop {
            if let Some(value) = self.wait_until(None) {
                return value;
            }
        }
    }

    /// Block until the next notification or until `timeout` elapses.
    ///
    /// Returns `None` on timeout.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<T> {
        self.wait_until(Some(Instant::now() + timeout))
    }

    /// Wake one current waiter with `payload`.
    ///
    /// Returns `false` (and drops the payload) if every current waiter
    /// already has a wake-up pending.
    pub fn notify_one(&self, payload: T) -> bool {
        let mut state = self.lock();
        if state.waiting <= state.handoffs.len() {
            return false;
        }
        state.handoffs.push_back(payload);
        drop(state);
        // Waiters race for the handoff; losers go back to sleep.
        self.cond.notify_all();
        true
    }

    /// Wake every current waiter with `payload`.
    ///
    /// Supersedes any `notify_one` payload not yet taken. Returns the
    /// number of waiters woken by this call.
    pub fn notify_all(&self, payload: T) -> usize {
        let mut state = self.lock();
        let woken = state.waiting;
        state.handoffs.clear();
        state.epoch = state.epoch.wrapping_add(1);
        state.broadcast = Some(payload);
        drop(state);
        self.cond.notify_all();
        woken
    }

    /// Number of threads currently blocked in `wait*`.
    pub fn waiters(&self) -> usize {
        self.lock().waiting
    }

    fn wait_until(&self, deadline: Option<Instant>) -> Option<T> {
        let mut state = self.lock();
        let epoch = state.epoch;
        state.waiting += 1;
        loop {
            if state.epoch != epoch {
                if let Some(value) = state.broadcast.clone() {
                    state.leave();
                    return Some(value);
                }
            }
            if let Some(value) = state.handoffs.pop_front() {
                state.leave();
                return Some(value);
            }
            state = match deadline {
                None => self
                    .cond
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        state.leave();
                        return None;
                    }
                    self.cond
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }

    fn lock(&self) -> MutexGuard<'_, AwaitState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Default for Awaitable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Awaitable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Awaitable").finish_non_exhaustive()
    }
}
