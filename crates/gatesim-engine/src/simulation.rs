//! The simulation session.
//!
//! [`Simulation`] owns the circuit graph, the resolver chain, the update
//! worker pool, the event pool and the event channels. It is created from
//! a [`SimulationConfig`] and torn down by [`shutdown()`](Simulation::shutdown)
//! or on drop.
//!
//! # Threading
//!
//! `Simulation` is `Send + Sync`. Graph edits, pin writes and reads may
//! come from any thread at any time, including while a pass is running;
//! [`step()`](Simulation::step) calls are serialized.
//!
//! # Example
//!
//! ```ignore
//! let sim = Simulation::new(SimulationConfig::default())?;
//! let a = sim.add_wire();
//! let gate = sim.add_gate(Box::new(my_gate))?;
//! sim.bind(gate.pin(0), a)?;
//! let report = sim.step()?;
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use gatesim_core::{DrivenValue, Gate, GateId, PinId, PropertyStore, PropertyValue, WireId};
use gatesim_sync::{BroadcastEvent, DispatchPool, EventCaller, Subscription};

use crate::circuit::Circuit;
use crate::config::{ConfigError, SimulationConfig};
use crate::dirty::DirtyState;
use crate::error::{CircuitError, PassError};
use crate::events::{PassSummary, WireChange};
use crate::metrics::PassMetrics;
use crate::scheduler::{PassReport, Scheduler};

// Compile-time assertion: Simulation must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Simulation>();
};

// ── ShutdownReport ───────────────────────────────────────────────

/// Report from [`Simulation::shutdown`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Update worker threads joined.
    pub workers_joined: usize,
    /// Event worker threads joined.
    pub event_workers_joined: usize,
}

// ── Simulation ───────────────────────────────────────────────────

/// A digital-logic simulation session.
pub struct Simulation {
    circuit: Arc<Circuit>,
    scheduler: Mutex<Scheduler>,
    event_pool: Mutex<DispatchPool>,
    wire_events: BroadcastEvent<WireChange>,
    pass_events: BroadcastEvent<PassSummary>,
    pass_caller: EventCaller<PassSummary>,
    last_metrics: Mutex<PassMetrics>,
    passes: AtomicU64,
    closed: AtomicBool,
    config: SimulationConfig,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Simulation {
    /// Validate `config` and start the worker pools.
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let chain = config.resolver_chain()?;

        let event_pool =
            DispatchPool::new("gatesim-event", config.event_workers).map_err(|e| {
                ConfigError::ThreadSpawnFailed {
                    reason: e.to_string(),
                }
            })?;
        let workers = config.resolved_worker_count();
        let update_pool = if workers == 0 {
            None
        } else {
            Some(
                DispatchPool::new("gatesim-worker", workers).map_err(|e| {
                    ConfigError::ThreadSpawnFailed {
                        reason: e.to_string(),
                    }
                })?,
            )
        };

        let (wire_events, wire_caller) = BroadcastEvent::restricted(event_pool.dispatcher());
        let (pass_events, pass_caller) = BroadcastEvent::restricted(event_pool.dispatcher());

        let (queue_tx, queue_rx) = crossbeam_channel::unbounded();
        let circuit = Arc::new(Circuit::new(
            chain,
            config.resolve_mode,
            queue_tx,
            wire_caller,
        ));
        let scheduler = Scheduler::new(
            queue_rx,
            update_pool,
            config.max_iterations,
            config.failure_policy,
        );

        log::debug!(
            "simulation started: {workers} update workers, {} event workers, resolvers {:?}",
            config.event_workers,
            config.resolvers
        );

        Ok(Self {
            circuit,
            scheduler: Mutex::new(scheduler),
            event_pool: Mutex::new(event_pool),
            wire_events,
            pass_events,
            pass_caller,
            last_metrics: Mutex::new(PassMetrics::default()),
            passes: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            config,
        })
    }

    /// The configuration this simulation was built from.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    // ── graph edits ──────────────────────────────────────────────

    /// Create an undriven wire.
    pub fn add_wire(&self) -> WireId {
        self.circuit.add_wire()
    }

    /// Insert a gate. New gates start dirty.
    ///
    /// Fails with [`CircuitError::TooManyPins`] if the gate declares more
    /// than [`MAX_PINS`](gatesim_core::MAX_PINS) pins.
    pub fn add_gate(&self, gate: Box<dyn Gate>) -> Result<GateId, CircuitError> {
        self.circuit.add_gate(gate)
    }

    /// Remove a wire. Every bound pin is detached and its gate marked dirty.
    pub fn remove_wire(&self, wire: WireId) -> Result<(), CircuitError> {
        self.circuit.remove_wire(wire)
    }

    /// Remove a gate, withdrawing all of its pins' contributions.
    ///
    /// The gate is removed even on [`CircuitError::ShortCircuit`], which
    /// reports that the remaining drivers of one of its wires conflict.
    pub fn remove_gate(&self, gate: GateId) -> Result<(), CircuitError> {
        self.circuit.remove_gate(gate)
    }

    /// Bind a pin to a wire, moving it off any previous wire. Marks the
    /// pin's gate dirty.
    pub fn bind(&self, pin: PinId, wire: WireId) -> Result<(), CircuitError> {
        self.circuit.bind(pin, wire)
    }

    /// Unbind a pin, withdrawing its contribution. Marks the pin's gate
    /// dirty. Unbinding an unbound pin only marks the gate.
    pub fn unbind(&self, pin: PinId) -> Result<(), CircuitError> {
        self.circuit.unbind(pin)
    }

    /// Register (or replace) a resolver. Applies to every later recompute.
    pub fn register_resolver<F>(&self, name: impl Into<String>, resolver: F)
    where
        F: Fn(&DrivenValue, &DrivenValue) -> Option<DrivenValue> + Send + Sync + 'static,
    {
        self.circuit.register_resolver(name.into(), resolver);
    }

    /// Names in the resolver chain, in order.
    pub fn resolvers(&self) -> Vec<String> {
        self.circuit.resolver_names()
    }

    // ── pins and wires ───────────────────────────────────────────

    /// Drive `value` from `pin` onto its wire, replacing the pin's
    /// previous contribution. No-op for an unbound pin. Driving the
    /// sentinel withdraws the contribution.
    pub fn write_pin(&self, pin: PinId, value: DrivenValue) -> Result<(), CircuitError> {
        self.circuit.write_pin(pin, value)
    }

    /// Current winner of the pin's wire, or the sentinel if unbound.
    pub fn read_pin(&self, pin: PinId) -> Result<DrivenValue, CircuitError> {
        self.circuit.read_pin(pin)
    }

    /// Current winner of a wire.
    pub fn read_wire(&self, wire: WireId) -> Result<DrivenValue, CircuitError> {
        self.circuit.read_wire(wire)
    }

    /// The wire a pin is bound to.
    pub fn binding(&self, pin: PinId) -> Result<Option<WireId>, CircuitError> {
        self.circuit.binding(pin)
    }

    /// Pins bound to a wire, in binding order.
    pub fn wire_pins(&self, wire: WireId) -> Result<Vec<PinId>, CircuitError> {
        self.circuit.wire_pins(wire)
    }

    /// Live gate ids.
    pub fn gates(&self) -> Vec<GateId> {
        self.circuit.gate_ids()
    }

    /// Live wire ids.
    pub fn wires(&self) -> Vec<WireId> {
        self.circuit.wire_ids()
    }

    /// Number of live gates.
    pub fn gate_count(&self) -> usize {
        self.circuit.gate_count()
    }

    /// Number of live wires.
    pub fn wire_count(&self) -> usize {
        self.circuit.wire_count()
    }

    // ── properties ───────────────────────────────────────────────

    /// Look up one of a gate's properties.
    pub fn property(&self, gate: GateId, key: &str) -> Result<PropertyValue, CircuitError> {
        self.circuit.property(gate, key)
    }

    /// Snapshot of a gate's properties.
    pub fn properties(&self, gate: GateId) -> Result<PropertyStore, CircuitError> {
        self.circuit.properties(gate)
    }

    /// Set a property on a configurable gate and mark it dirty.
    pub fn set_property(
        &self,
        gate: GateId,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Result<(), CircuitError> {
        self.circuit.set_property(gate, key.into(), value.into())
    }

    // ── scheduling ───────────────────────────────────────────────

    /// Request an update of `gate` on the next pass.
    pub fn mark_dirty(&self, gate: GateId) -> Result<(), CircuitError> {
        self.circuit.mark_id(gate)
    }

    /// Scheduling state of a gate.
    pub fn gate_state(&self, gate: GateId) -> Result<DirtyState, CircuitError> {
        self.circuit.gate_state(gate)
    }

    /// Gates that failed and will be retried on the next pass.
    pub fn pending_retries(&self) -> usize {
        lock(&self.scheduler).retry_len()
    }

    /// Update worker threads (zero when updates run inline).
    pub fn worker_count(&self) -> usize {
        lock(&self.scheduler).worker_count()
    }

    /// Propagate until no gate is dirty.
    ///
    /// Returns [`PassError::NonConvergence`] if work remains after
    /// `max_iterations` waves, and [`PassError::Aborted`] on the first
    /// failure under [`FailurePolicy::AbortPass`](crate::FailurePolicy).
    /// Every pass, successful or not, publishes a [`PassSummary`].
    pub fn step(&self) -> Result<PassReport, PassError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PassError::ShuttingDown);
        }
        let mut scheduler = lock(&self.scheduler);
        if self.closed.load(Ordering::Acquire) {
            return Err(PassError::ShuttingDown);
        }
        let outcome = scheduler.run_pass(&self.circuit);
        drop(scheduler);

        let pass = self.passes.fetch_add(1, Ordering::AcqRel) + 1;
        *lock(&self.last_metrics) = outcome.metrics.clone();
        let summary = PassSummary {
            pass,
            iterations: outcome.metrics.iterations,
            updates: outcome.metrics.updates,
            failures: outcome.metrics.failures,
            converged: matches!(outcome.result, Ok(_)),
        };
        if let Err(e) = self.pass_caller.fire(summary) {
            log::warn!("pass {pass} summary not delivered: {e}");
        }
        outcome.result
    }

    /// Passes run so far.
    pub fn pass_count(&self) -> u64 {
        self.passes.load(Ordering::Acquire)
    }

    /// Metrics from the most recent pass.
    pub fn last_metrics(&self) -> PassMetrics {
        lock(&self.last_metrics).clone()
    }

    // ── events ───────────────────────────────────────────────────

    /// Call `handler` on the event pool for every wire winner change.
    pub fn subscribe_wire_changes<F>(&self, handler: F) -> Subscription
    where
        F: Fn(WireChange) + Send + Sync + 'static,
    {
        self.wire_events.subscribe(handler)
    }

    /// Call `handler` on the event pool at the end of every pass.
    pub fn subscribe_passes<F>(&self, handler: F) -> Subscription
    where
        F: Fn(PassSummary) + Send + Sync + 'static,
    {
        self.pass_events.subscribe(handler)
    }

    /// Block until the next wire winner change, or until `timeout`.
    pub fn wait_for_wire_change(&self, timeout: Duration) -> Option<WireChange> {
        self.wire_events.wait_timeout(timeout)
    }

    /// Block until the next pass ends, or until `timeout`.
    pub fn wait_for_pass(&self, timeout: Duration) -> Option<PassSummary> {
        self.pass_events.wait_timeout(timeout)
    }

    /// The wire change event, for waiting and subscribing.
    pub fn wire_events(&self) -> &BroadcastEvent<WireChange> {
        &self.wire_events
    }

    /// The pass summary event, for waiting and subscribing.
    pub fn pass_events(&self) -> &BroadcastEvent<PassSummary> {
        &self.pass_events
    }

    // ── diagnostics ──────────────────────────────────────────────

    /// Multi-line summary of a gate: state, pins, bindings, properties.
    pub fn describe_gate(&self, gate: GateId) -> Result<String, CircuitError> {
        self.circuit.describe_gate(gate)
    }

    /// Multi-line summary of a wire: winner, drivers, bound pins.
    pub fn describe_wire(&self, wire: WireId) -> Result<String, CircuitError> {
        self.circuit.describe_wire(wire)
    }

    // ── lifecycle ────────────────────────────────────────────────

    /// Whether [`shutdown`](Self::shutdown) has run.
    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stop both worker pools after draining their queues.
    ///
    /// Idempotent. Later passes fail with [`PassError::ShuttingDown`];
    /// graph edits keep working but event callbacks are no longer
    /// delivered.
    pub fn shutdown(&self) -> ShutdownReport {
        if self.closed.swap(true, Ordering::AcqRel) {
            return ShutdownReport::default();
        }
        let workers_joined = lock(&self.scheduler).shutdown();
        let event_workers_joined = lock(&self.event_pool).shutdown().workers_joined;
        log::debug!(
            "simulation shut down: {workers_joined} update workers, {event_workers_joined} event workers joined"
        );
        ShutdownReport {
            workers_joined,
            event_workers_joined,
        }
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("gates", &self.gate_count())
            .field("wires", &self.wire_count())
            .field("passes", &self.pass_count())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}
