//! Wave-based propagation passes.
//!
//! A pass drains the dirty queue in waves. Each wave takes every queued
//! gate, moves it `Dirty → Updating`, and runs all the updates
//! concurrently on the worker pool (or inline when the pool has zero
//! workers). Gates dirtied by those updates are queued for the next wave.
//! The pass ends when a wave finds the queue empty, or fails once
//! `max_iterations` waves have run with work still queued.
//!
//! Failed updates park their gate `Dirty` on a retry list that is
//! re-queued at the start of the next pass.

use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::Receiver;
use gatesim_core::{GateError, GateId};
use gatesim_sync::DispatchPool;
use indexmap::IndexSet;

use crate::circuit::{Circuit, GateCell};
use crate::config::FailurePolicy;
use crate::dirty::DirtyState;
use crate::error::{GateFailure, PassError};
use crate::metrics::PassMetrics;

// ── PassReport ───────────────────────────────────────────────────

/// Result of a pass that reached a fixed point.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Waves executed.
    pub iterations: usize,
    /// Gate updates invoked.
    pub updates: usize,
    /// Updates that failed under [`FailurePolicy::Isolate`]. Each failed
    /// gate is retried on the next pass.
    pub failures: Vec<GateFailure>,
    /// Timing and counters.
    pub metrics: PassMetrics,
}

impl PassReport {
    /// Whether every update in the pass succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// ── Scheduler ────────────────────────────────────────────────────

pub(crate) struct Scheduler {
    queue: Receiver<GateId>,
    retry: Vec<GateId>,
    /// `None` runs updates inline.
    pool: Option<DispatchPool>,
    max_iterations: usize,
    policy: FailurePolicy,
}

/// A pass's outcome together with its metrics, which are recorded even
/// when the pass fails.
pub(crate) struct PassOutcome {
    pub(crate) result: Result<PassReport, PassError>,
    pub(crate) metrics: PassMetrics,
}

impl Scheduler {
    pub(crate) fn new(
        queue: Receiver<GateId>,
        pool: Option<DispatchPool>,
        max_iterations: usize,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            queue,
            retry: Vec::new(),
            pool,
            max_iterations,
            policy,
        }
    }

    pub(crate) fn worker_count(&self) -> usize {
        self.pool.as_ref().map_or(0, DispatchPool::worker_count)
    }

    /// Gates parked for retry on the next pass.
    pub(crate) fn retry_len(&self) -> usize {
        self.retry.len()
    }

    /// Stop the worker pool. Returns the number of workers joined.
    pub(crate) fn shutdown(&mut self) -> usize {
        self.pool
            .as_mut()
            .map_or(0, |pool| pool.shutdown().workers_joined)
    }

    /// Run one pass to a fixed point.
    pub(crate) fn run_pass(&mut self, circuit: &Arc<Circuit>) -> PassOutcome {
        let start = Instant::now();
        let changes_before = circuit.wire_change_count();

        for id in self.retry.drain(..) {
            circuit.enqueue(id);
        }

        let mut report = PassReport::default();
        let mut skipped_stale = 0;
        let mut aborted = None;
        let mut exhausted = None;

        loop {
            if self.queue.is_empty() {
                break;
            }
            if report.iterations == self.max_iterations {
                exhausted = Some(self.requeue_pending(circuit));
                break;
            }
            report.iterations += 1;

            let mut wave: Vec<Arc<GateCell>> = Vec::new();
            for id in self.queue.try_iter() {
                match circuit.gate(id) {
                    Ok(cell) if cell.dirty.begin() => wave.push(cell),
                    _ => skipped_stale += 1,
                }
            }

            let results = self.execute_wave(circuit, &wave);
            report.updates += wave.len();

            for (cell, result) in wave.iter().zip(results) {
                match result {
                    Ok(()) => {
                        if cell.dirty.finish() {
                            circuit.enqueue(cell.id);
                        }
                    }
                    Err(error) => {
                        cell.dirty.fail();
                        self.retry.push(cell.id);
                        log::warn!("{} {} failed: {error}", cell.name(), cell.id);
                        report.failures.push(GateFailure {
                            gate: cell.id,
                            name: cell.name().to_string(),
                            error,
                        });
                    }
                }
            }

            if self.policy == FailurePolicy::AbortPass {
                if let Some(failure) = report.failures.first() {
                    aborted = Some(failure.clone());
                    break;
                }
            }
        }

        report.metrics = PassMetrics {
            total_us: start.elapsed().as_micros() as u64,
            iterations: report.iterations,
            updates: report.updates,
            failures: report.failures.len(),
            wire_changes: circuit.wire_change_count() - changes_before,
            skipped_stale,
        };
        log::debug!(
            "pass: {} waves, {} updates, {} failures, {} wire changes in {}us",
            report.iterations,
            report.updates,
            report.failures.len(),
            report.metrics.wire_changes,
            report.metrics.total_us
        );

        let metrics = report.metrics.clone();
        let result = if let Some(failure) = aborted {
            Err(PassError::Aborted { failure })
        } else if let Some(pending) = exhausted {
            log::warn!(
                "no fixed point after {} waves; {pending} gates pending",
                report.iterations
            );
            Err(PassError::NonConvergence {
                iterations: report.iterations,
                pending,
            })
        } else {
            Ok(report)
        };
        PassOutcome { result, metrics }
    }

    /// Drop stale queue entries and re-queue the gates still dirty.
    /// Returns how many were re-queued.
    fn requeue_pending(&self, circuit: &Circuit) -> usize {
        let pending: IndexSet<GateId> = self
            .queue
            .try_iter()
            .filter(|&id| {
                circuit
                    .gate(id)
                    .is_ok_and(|cell| cell.dirty.state() == DirtyState::Dirty)
            })
            .collect();
        for &id in &pending {
            circuit.enqueue(id);
        }
        pending.len()
    }

    /// Run every update in `wave`, returning results in wave order.
    fn execute_wave(
        &self,
        circuit: &Arc<Circuit>,
        wave: &[Arc<GateCell>],
    ) -> Vec<Result<(), GateError>> {
        let pool = match &self.pool {
            Some(pool) if wave.len() > 1 => pool,
            _ => return wave.iter().map(|cell| circuit.run_update(cell)).collect(),
        };

        let (reply_tx, reply_rx) = crossbeam_channel::bounded(wave.len());
        for (slot, cell) in wave.iter().enumerate() {
            let job_circuit = Arc::clone(circuit);
            let job_cell = Arc::clone(cell);
            let reply = reply_tx.clone();
            let queued = pool.execute(move || {
                let _ = reply.send((slot, job_circuit.run_update(&job_cell)));
            });
            if queued.is_err() {
                let _ = reply_tx.send((slot, circuit.run_update(cell)));
            }
        }
        drop(reply_tx);

        let mut results: Vec<Option<Result<(), GateError>>> = vec![None; wave.len()];
        for (slot, result) in reply_rx.iter() {
            results[slot] = Some(result);
        }
        results
            .into_iter()
            .map(|r| {
                r.unwrap_or_else(|| {
                    Err(GateError::ExecutionFailed {
                        reason: "update was dropped by the worker pool".into(),
                    })
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::WireChange;
    use gatesim_sync::BroadcastEvent;
    use gatesim_test_utils::CountingGate;
    use gatesim_wire::{ResolveMode, ResolverChain};

    fn harness(max_iterations: usize) -> (DispatchPool, Arc<Circuit>, Scheduler) {
        let events = DispatchPool::new("scheduler-test", 1).unwrap();
        let (_, caller) = BroadcastEvent::<WireChange>::restricted(events.dispatcher());
        let (tx, rx) = crossbeam_channel::unbounded();
        let circuit = Arc::new(Circuit::new(
            ResolverChain::new(),
            ResolveMode::Exact,
            tx,
            caller,
        ));
        let scheduler = Scheduler::new(rx, None, max_iterations, FailurePolicy::Isolate);
        (events, circuit, scheduler)
    }

    #[test]
    fn pending_count_ignores_removed_gates() {
        let (_events, circuit, mut scheduler) = harness(1);
        let live = circuit.add_gate(Box::new(CountingGate::new(0))).unwrap();
        let removed = circuit.add_gate(Box::new(CountingGate::new(0))).unwrap();
        circuit.remove_gate(removed).unwrap();

        assert_eq!(scheduler.requeue_pending(&circuit), 1);
        // The live gate is still queued and runs on the next pass.
        let report = scheduler.run_pass(&circuit).result.unwrap();
        assert_eq!(report.updates, 1);
        assert_eq!(report.metrics.skipped_stale, 0);
        assert_eq!(circuit.gate_state(live), Ok(DirtyState::Clean));
    }
}
