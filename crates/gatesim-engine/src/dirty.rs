//! Per-gate dirty state machine.
//!
//! ```text
//!   Clean ──mark──▶ Dirty ──begin──▶ Updating ──finish──▶ Clean
//!                     ▲                  │
//!                     │                 mark
//!                     │                  ▼
//!                     └──finish── UpdatingRedirty
//! ```
//!
//! Only the `Clean → Dirty` transition enqueues the gate, so a gate has at
//! most one pending update no matter how many marks arrive. Marks during
//! an update are remembered and re-enqueue the gate when it finishes.
//! All transitions are lock-free compare-and-swap on one byte.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

const CLEAN: u8 = 0;
const DIRTY: u8 = 1;
const UPDATING: u8 = 2;
const UPDATING_REDIRTY: u8 = 3;

/// Observable scheduling state of a gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirtyState {
    /// No pending update.
    Clean,
    /// Queued (or parked for retry) awaiting an update.
    Dirty,
    /// An update is running.
    Updating,
    /// An update is running and another was requested meanwhile.
    UpdatingRedirty,
}

impl DirtyState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            CLEAN => Self::Clean,
            DIRTY => Self::Dirty,
            UPDATING => Self::Updating,
            _ => Self::UpdatingRedirty,
        }
    }
}

impl fmt::Display for DirtyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clean => write!(f, "clean"),
            Self::Dirty => write!(f, "dirty"),
            Self::Updating => write!(f, "updating"),
            Self::UpdatingRedirty => write!(f, "updating+redirty"),
        }
    }
}

/// What a mark did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mark {
    /// `Clean → Dirty`: the caller must enqueue the gate.
    Enqueue,
    /// Already pending; nothing to do.
    Collapsed,
    /// Recorded against the running update.
    Deferred,
}

/// Atomic dirty flag.
pub(crate) struct DirtyFlag(AtomicU8);

// Compile-time assertion: DirtyFlag must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<DirtyFlag>();
};

impl DirtyFlag {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(CLEAN))
    }

    pub(crate) fn state(&self) -> DirtyState {
        DirtyState::from_raw(self.0.load(Ordering::Acquire))
    }

    /// Request an update.
    pub(crate) fn mark(&self) -> Mark {
        let mut current = self.0.load(Ordering::Acquire);
        loop {
            let (next, outcome) = match current {
                CLEAN => (DIRTY, Mark::Enqueue),
                UPDATING => (UPDATING_REDIRTY, Mark::Deferred),
                _ => return Mark::Collapsed,
            };
            match self
                .0
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return outcome,
                Err(actual) => current = actual,
            }
        }
    }

    /// `Dirty → Updating`. Returns `false` for a stale queue entry.
    pub(crate) fn begin(&self) -> bool {
        self.0
            .compare_exchange(DIRTY, UPDATING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// End a successful update. Returns `true` if the gate was re-marked
    /// while running and must be enqueued again.
    pub(crate) fn finish(&self) -> bool {
        match self
            .0
            .compare_exchange(UPDATING, CLEAN, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => false,
            Err(_) => {
                // Only the scheduler leaves UPDATING_REDIRTY; marks collapse.
                self.0.store(DIRTY, Ordering::Release);
                true
            }
        }
    }

    /// End a failed update: the gate stays pending without being enqueued.
    pub(crate) fn fail(&self) {
        self.0.store(DIRTY, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn starts_clean() {
        assert_eq!(DirtyFlag::new().state(), DirtyState::Clean);
    }

    #[test]
    fn marks_collapse_while_dirty() {
        let flag = DirtyFlag::new();
        assert_eq!(flag.mark(), Mark::Enqueue);
        assert_eq!(flag.mark(), Mark::Collapsed);
        assert_eq!(flag.mark(), Mark::Collapsed);
        assert_eq!(flag.state(), DirtyState::Dirty);
    }

    #[test]
    fn begin_only_from_dirty() {
        let flag = DirtyFlag::new();
        assert!(!flag.begin());
        flag.mark();
        assert!(flag.begin());
        assert!(!flag.begin());
        assert_eq!(flag.state(), DirtyState::Updating);
    }

    #[test]
    fn clean_finish() {
        let flag = DirtyFlag::new();
        flag.mark();
        flag.begin();
        assert!(!flag.finish());
        assert_eq!(flag.state(), DirtyState::Clean);
    }

    #[test]
    fn mark_during_update_requeues() {
        let flag = DirtyFlag::new();
        flag.mark();
        flag.begin();
        assert_eq!(flag.mark(), Mark::Deferred);
        assert_eq!(flag.mark(), Mark::Collapsed);
        assert_eq!(flag.state(), DirtyState::UpdatingRedirty);
        assert!(flag.finish());
        assert_eq!(flag.state(), DirtyState::Dirty);
    }

    #[test]
    fn failure_parks_dirty() {
        let flag = DirtyFlag::new();
        flag.mark();
        flag.begin();
        flag.fail();
        assert_eq!(flag.state(), DirtyState::Dirty);
        // Parked gates are not re-enqueued by marks.
        assert_eq!(flag.mark(), Mark::Collapsed);
    }

    #[test]
    fn concurrent_marks_enqueue_once() {
        let flag = Arc::new(DirtyFlag::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let flag = Arc::clone(&flag);
                thread::spawn(move || {
                    (0..1000)
                        .filter(|_| flag.mark() == Mark::Enqueue)
                        .count()
                })
            })
            .collect();
        let enqueued: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(enqueued, 1);
    }

    #[test]
    fn display() {
        assert_eq!(DirtyState::UpdatingRedirty.to_string(), "updating+redirty");
    }
}
