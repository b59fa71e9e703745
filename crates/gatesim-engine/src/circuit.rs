//! The circuit graph: wires, gates, pins and their bindings.
//!
//! Wires and gates live in generational arenas behind `RwLock`s and are
//! handed out as `Arc`s, so no arena lock is held while an entity lock
//! is taken. Per-entity locks are always acquired in the order
//!
//! 1. pin binding
//! 2. wire pin set
//! 3. wire state
//!
//! A pin write replaces the pin's previous contribution on its wire in
//! one step. When the wire's winner changes, every gate with a
//! non-output pin on the wire is marked dirty and a [`WireChange`] is
//! published.

use std::fmt::Write as _;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard};

use crossbeam_channel::Sender;
use gatesim_core::{
    DrivenValue, Gate, GateError, GateId, PinAccess, PinId, PinRole, PropertyStore, PropertyValue,
    ShortCircuit, WireId, MAX_PINS,
};
use gatesim_sync::EventCaller;
use gatesim_wire::{ResolveMode, ResolverChain, WinnerChange, WireState};
use indexmap::IndexMap;

use crate::arena::Slots;
use crate::dirty::{DirtyFlag, DirtyState, Mark};
use crate::error::CircuitError;
use crate::events::WireChange;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Entities ─────────────────────────────────────────────────────

pub(crate) struct WireCell {
    id: WireId,
    /// Bound pins and their roles, in binding order.
    pins: Mutex<IndexMap<PinId, PinRole>>,
    state: Mutex<WireState>,
    /// Set once the wire leaves the arena; guarded by `pins`.
    retired: AtomicBool,
}

#[derive(Default)]
struct Binding {
    wire: Option<Arc<WireCell>>,
    /// What this pin currently has pushed on `wire`.
    contribution: Option<DrivenValue>,
}

pub(crate) struct PinCell {
    role: PinRole,
    binding: Mutex<Binding>,
}

pub(crate) struct GateCell {
    pub(crate) id: GateId,
    gate: Box<dyn Gate>,
    pins: Vec<PinCell>,
    pub(crate) dirty: DirtyFlag,
    properties: RwLock<PropertyStore>,
}

impl GateCell {
    pub(crate) fn name(&self) -> &str {
        self.gate.name()
    }

    fn pin(&self, index: usize) -> Result<&PinCell, GateError> {
        self.pins.get(index).ok_or(GateError::PinOutOfRange {
            index,
            count: self.pins.len(),
        })
    }

    fn pin_by_id(&self, pin: PinId) -> Result<&PinCell, CircuitError> {
        self.pins
            .get(pin.index as usize)
            .ok_or(CircuitError::UnknownPin { pin })
    }

    fn read_properties(&self) -> RwLockReadGuard<'_, PropertyStore> {
        self.properties
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Circuit ──────────────────────────────────────────────────────

/// Shared graph state. Owned by the simulation behind an `Arc` so that
/// update jobs on worker threads can reach it.
pub(crate) struct Circuit {
    wires: RwLock<Slots<Arc<WireCell>>>,
    gates: RwLock<Slots<Arc<GateCell>>>,
    /// Copy-on-write: recomputes take a snapshot, registration swaps it.
    resolvers: RwLock<Arc<ResolverChain>>,
    mode: ResolveMode,
    queue: Sender<GateId>,
    wire_events: EventCaller<WireChange>,
    wire_changes: AtomicU64,
}

impl Circuit {
    pub(crate) fn new(
        chain: ResolverChain,
        mode: ResolveMode,
        queue: Sender<GateId>,
        wire_events: EventCaller<WireChange>,
    ) -> Self {
        Self {
            wires: RwLock::new(Slots::new()),
            gates: RwLock::new(Slots::new()),
            resolvers: RwLock::new(Arc::new(chain)),
            mode,
            queue,
            wire_events,
            wire_changes: AtomicU64::new(0),
        }
    }

    // ── resolvers ────────────────────────────────────────────────

    fn chain(&self) -> Arc<ResolverChain> {
        Arc::clone(&self.resolvers.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub(crate) fn register_resolver<F>(&self, name: String, resolver: F)
    where
        F: Fn(&DrivenValue, &DrivenValue) -> Option<DrivenValue> + Send + Sync + 'static,
    {
        let mut guard = self.resolvers.write().unwrap_or_else(PoisonError::into_inner);
        Arc::make_mut(&mut guard).register(name, resolver);
    }

    pub(crate) fn resolver_names(&self) -> Vec<String> {
        self.chain().names().map(str::to_string).collect()
    }

    // ── lookup ───────────────────────────────────────────────────

    pub(crate) fn gate(&self, id: GateId) -> Result<Arc<GateCell>, CircuitError> {
        self.gates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id.index(), id.generation())
            .cloned()
            .ok_or(CircuitError::UnknownGate { gate: id })
    }

    fn wire(&self, id: WireId) -> Result<Arc<WireCell>, CircuitError> {
        self.wires
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id.index(), id.generation())
            .cloned()
            .ok_or(CircuitError::UnknownWire { wire: id })
    }

    pub(crate) fn gate_count(&self) -> usize {
        self.gates.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub(crate) fn wire_count(&self) -> usize {
        self.wires.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub(crate) fn gate_ids(&self) -> Vec<GateId> {
        self.gates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|cell| cell.id)
            .collect()
    }

    pub(crate) fn wire_ids(&self) -> Vec<WireId> {
        self.wires
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|cell| cell.id)
            .collect()
    }

    pub(crate) fn wire_change_count(&self) -> u64 {
        self.wire_changes.load(Ordering::Acquire)
    }

    // ── construction ─────────────────────────────────────────────

    pub(crate) fn add_wire(&self) -> WireId {
        let mode = self.mode;
        let (index, generation) = self
            .wires
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert_with(|index, generation| {
                let id = WireId::new(index, generation);
                Arc::new(WireCell {
                    id,
                    pins: Mutex::new(IndexMap::new()),
                    state: Mutex::new(WireState::new(id, mode)),
                    retired: AtomicBool::new(false),
                })
            });
        WireId::new(index, generation)
    }

    /// Insert a gate. It starts dirty so the next pass evaluates it.
    pub(crate) fn add_gate(&self, gate: Box<dyn Gate>) -> Result<GateId, CircuitError> {
        let layout = gate.pins();
        if layout.len() > MAX_PINS {
            return Err(CircuitError::TooManyPins {
                count: layout.len(),
            });
        }
        let properties = gate.default_properties();
        let (index, generation) = self
            .gates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert_with(|index, generation| {
                Arc::new(GateCell {
                    id: GateId::new(index, generation),
                    pins: layout
                        .iter()
                        .map(|&role| PinCell {
                            role,
                            binding: Mutex::new(Binding::default()),
                        })
                        .collect(),
                    gate,
                    dirty: DirtyFlag::new(),
                    properties: RwLock::new(properties),
                })
            });
        let id = GateId::new(index, generation);
        if let Ok(cell) = self.gate(id) {
            log::debug!("added {} {id} with {} pins", cell.name(), cell.pins.len());
            self.mark(&cell);
        }
        Ok(id)
    }

    /// Remove a wire, detaching every pin bound to it.
    pub(crate) fn remove_wire(&self, id: WireId) -> Result<(), CircuitError> {
        let wire = self
            .wires
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id.index(), id.generation())
            .ok_or(CircuitError::UnknownWire { wire: id })?;

        let bound: Vec<PinId> = {
            let mut pins = lock(&wire.pins);
            wire.retired.store(true, Ordering::Release);
            pins.drain(..).map(|(pin, _)| pin).collect()
        };
        for pin_id in bound {
            let Ok(gate) = self.gate(pin_id.gate) else {
                continue;
            };
            if let Ok(pin) = gate.pin_by_id(pin_id) {
                let mut binding = lock(&pin.binding);
                if binding
                    .wire
                    .as_ref()
                    .is_some_and(|w| Arc::ptr_eq(w, &wire))
                {
                    *binding = Binding::default();
                }
            }
            self.mark(&gate);
        }

        let change = lock(&wire.state).clear();
        if let Some(change) = change {
            self.publish(id, change);
        }
        log::debug!("removed {id}");
        Ok(())
    }

    /// Remove a gate, withdrawing every contribution its pins made.
    ///
    /// The gate is gone even when an error is returned; the error reports
    /// a short circuit exposed on a wire it used to drive.
    pub(crate) fn remove_gate(&self, id: GateId) -> Result<(), CircuitError> {
        let gate = self
            .gates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id.index(), id.generation())
            .ok_or(CircuitError::UnknownGate { gate: id })?;

        let mut first_error = None;
        for (index, pin) in (0..=u16::MAX).zip(gate.pins.iter()) {
            if let Err(e) = self.detach(id.pin(index), pin) {
                first_error.get_or_insert(e);
            }
        }
        log::debug!("removed {} {id}", gate.name());
        first_error.map_or(Ok(()), |e| Err(CircuitError::ShortCircuit(e)))
    }

    // ── binding ──────────────────────────────────────────────────

    /// Attach `pin_id` to `wire_id`, detaching it from any previous wire.
    pub(crate) fn bind(&self, pin_id: PinId, wire_id: WireId) -> Result<(), CircuitError> {
        let gate = self.gate(pin_id.gate)?;
        let pin = gate.pin_by_id(pin_id)?;
        let wire = self.wire(wire_id)?;

        let mut binding = lock(&pin.binding);
        if binding
            .wire
            .as_ref()
            .is_some_and(|w| Arc::ptr_eq(w, &wire))
        {
            return Ok(());
        }

        let mut released = None;
        if let Some(old) = binding.wire.take() {
            lock(&old.pins).shift_remove(&pin_id);
            if let Some(contribution) = binding.contribution.take() {
                released = Some((Arc::clone(&old), self.withdraw(&old, &contribution)));
            }
        }

        let attached = {
            let mut pins = lock(&wire.pins);
            if wire.retired.load(Ordering::Acquire) {
                false
            } else {
                pins.insert(pin_id, pin.role);
                true
            }
        };
        if attached {
            binding.wire = Some(Arc::clone(&wire));
        }
        drop(binding);

        let mut result = Ok(());
        if let Some((old, (change, error))) = released {
            if let Some(change) = change {
                self.propagate(&old, change);
            }
            if let Some(e) = error {
                result = Err(CircuitError::ShortCircuit(e));
            }
        }
        self.mark(&gate);
        if !attached {
            return Err(CircuitError::UnknownWire { wire: wire_id });
        }
        log::trace!("bound {pin_id} to {wire_id}");
        result
    }

    /// Detach `pin_id` from its wire, withdrawing its contribution.
    ///
    /// The pin is unbound even when a short circuit is returned: the error
    /// reports that the wire's remaining drivers conflict.
    pub(crate) fn unbind(&self, pin_id: PinId) -> Result<(), CircuitError> {
        let gate = self.gate(pin_id.gate)?;
        let pin = gate.pin_by_id(pin_id)?;
        let result = self.detach(pin_id, pin);
        self.mark(&gate);
        result.map_err(CircuitError::ShortCircuit)
    }

    fn detach(&self, pin_id: PinId, pin: &PinCell) -> Result<(), ShortCircuit> {
        let mut binding = lock(&pin.binding);
        let Some(wire) = binding.wire.take() else {
            return Ok(());
        };
        lock(&wire.pins).shift_remove(&pin_id);
        let (change, error) = match binding.contribution.take() {
            Some(contribution) => self.withdraw(&wire, &contribution),
            None => (None, None),
        };
        drop(binding);

        if let Some(change) = change {
            self.propagate(&wire, change);
        }
        error.map_or(Ok(()), Err)
    }

    /// Pop `value` from `wire`, reporting the winner change even when the
    /// remaining drivers short-circuit.
    fn withdraw(
        &self,
        wire: &WireCell,
        value: &DrivenValue,
    ) -> (Option<WinnerChange>, Option<ShortCircuit>) {
        let chain = self.chain();
        let mut state = lock(&wire.state);
        let previous = state.winner().clone();
        let result = state.pop(value, &chain);
        let current = state.winner().clone();
        drop(state);

        let error = result.err();
        if let Some(e) = &error {
            log::warn!("{e}");
        }
        let change = (previous != current).then_some(WinnerChange { previous, current });
        (change, error)
    }

    // ── pin access ───────────────────────────────────────────────

    /// Replace the pin's contribution on its wire. No-op when unbound.
    fn drive(&self, pin: &PinCell, value: DrivenValue) -> Result<(), ShortCircuit> {
        let mut binding = lock(&pin.binding);
        let Some(wire) = binding.wire.clone() else {
            return Ok(());
        };
        let chain = self.chain();
        let outcome = lock(&wire.state).replace(binding.contribution.as_ref(), value.clone(), &chain);
        match outcome {
            Ok(change) => {
                binding.contribution = (!value.is_none()).then_some(value);
                drop(binding);
                if let Some(change) = change {
                    self.propagate(&wire, change);
                }
                Ok(())
            }
            Err(e) => {
                log::warn!("{e}");
                Err(e)
            }
        }
    }

    fn sample(&self, pin: &PinCell) -> DrivenValue {
        let binding = lock(&pin.binding);
        match &binding.wire {
            Some(wire) => lock(&wire.state).winner().clone(),
            None => DrivenValue::none(),
        }
    }

    pub(crate) fn write_pin(&self, pin_id: PinId, value: DrivenValue) -> Result<(), CircuitError> {
        let gate = self.gate(pin_id.gate)?;
        let pin = gate.pin_by_id(pin_id)?;
        Ok(self.drive(pin, value)?)
    }

    pub(crate) fn read_pin(&self, pin_id: PinId) -> Result<DrivenValue, CircuitError> {
        let gate = self.gate(pin_id.gate)?;
        let pin = gate.pin_by_id(pin_id)?;
        Ok(self.sample(pin))
    }

    pub(crate) fn read_wire(&self, id: WireId) -> Result<DrivenValue, CircuitError> {
        let wire = self.wire(id)?;
        let winner = lock(&wire.state).winner().clone();
        Ok(winner)
    }

    /// Wire the pin is bound to, if any.
    pub(crate) fn binding(&self, pin_id: PinId) -> Result<Option<WireId>, CircuitError> {
        let gate = self.gate(pin_id.gate)?;
        let pin = gate.pin_by_id(pin_id)?;
        let binding = lock(&pin.binding);
        Ok(binding.wire.as_ref().map(|w| w.id))
    }

    /// Pins bound to the wire, in binding order.
    pub(crate) fn wire_pins(&self, id: WireId) -> Result<Vec<PinId>, CircuitError> {
        let wire = self.wire(id)?;
        let pins = lock(&wire.pins);
        Ok(pins.keys().copied().collect())
    }

    // ── dirty marking ────────────────────────────────────────────

    /// Mark every gate with a non-output pin on `wire` and publish.
    fn propagate(&self, wire: &WireCell, change: WinnerChange) {
        let sensitive: Vec<GateId> = lock(&wire.pins)
            .iter()
            .filter(|(_, role)| role.is_sensitive())
            .map(|(pin, _)| pin.gate)
            .collect();
        for gate in sensitive {
            if let Ok(cell) = self.gate(gate) {
                self.mark(&cell);
            }
        }
        self.publish(wire.id, change);
    }

    fn publish(&self, wire: WireId, change: WinnerChange) {
        self.wire_changes.fetch_add(1, Ordering::AcqRel);
        log::debug!("{wire}: {} -> {}", change.previous, change.current);
        let event = WireChange {
            wire,
            previous: change.previous,
            current: change.current,
        };
        if let Err(e) = self.wire_events.fire(event) {
            log::warn!("wire change on {wire} not delivered: {e}");
        }
    }

    pub(crate) fn mark(&self, cell: &GateCell) {
        match cell.dirty.mark() {
            Mark::Enqueue => {
                log::trace!("{} dirty", cell.id);
                self.enqueue(cell.id);
            }
            Mark::Deferred => log::trace!("{} re-dirtied during update", cell.id),
            Mark::Collapsed => {}
        }
    }

    pub(crate) fn mark_id(&self, id: GateId) -> Result<(), CircuitError> {
        let cell = self.gate(id)?;
        self.mark(&cell);
        Ok(())
    }

    pub(crate) fn enqueue(&self, id: GateId) {
        // The receiver lives as long as the simulation that owns us.
        let _ = self.queue.send(id);
    }

    pub(crate) fn gate_state(&self, id: GateId) -> Result<DirtyState, CircuitError> {
        Ok(self.gate(id)?.dirty.state())
    }

    // ── properties ───────────────────────────────────────────────

    pub(crate) fn property(&self, id: GateId, key: &str) -> Result<PropertyValue, CircuitError> {
        let cell = self.gate(id)?;
        let properties = cell.read_properties();
        let value = properties.get(key)?.clone();
        Ok(value)
    }

    pub(crate) fn properties(&self, id: GateId) -> Result<PropertyStore, CircuitError> {
        let cell = self.gate(id)?;
        let properties = cell.read_properties().clone();
        Ok(properties)
    }

    /// Change a property and mark the gate dirty.
    ///
    /// Blocks while the gate's update is running.
    pub(crate) fn set_property(
        &self,
        id: GateId,
        key: String,
        value: PropertyValue,
    ) -> Result<(), CircuitError> {
        let cell = self.gate(id)?;
        if !cell.gate.is_configurable() {
            return Err(CircuitError::NotConfigurable { gate: id });
        }
        cell.properties
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set(key, value);
        self.mark(&cell);
        Ok(())
    }

    // ── update ───────────────────────────────────────────────────

    /// Run the gate's update. A panic is reported as a failure.
    pub(crate) fn run_update(&self, cell: &GateCell) -> Result<(), GateError> {
        panic::catch_unwind(AssertUnwindSafe(|| {
            let properties = cell.read_properties();
            let mut context = PinContext {
                circuit: self,
                cell,
                properties: &properties,
            };
            cell.gate.update(&mut context)
        }))
        .unwrap_or_else(|_| {
            Err(GateError::ExecutionFailed {
                reason: "update panicked".into(),
            })
        })
    }

    // ── diagnostics ──────────────────────────────────────────────

    pub(crate) fn describe_gate(&self, id: GateId) -> Result<String, CircuitError> {
        let cell = self.gate(id)?;
        let mut out = format!("{} {id} [{}]", cell.name(), cell.dirty.state());
        for (index, pin) in cell.pins.iter().enumerate() {
            let binding = lock(&pin.binding);
            let _ = write!(out, "\n  pin{index} {}: ", pin.role);
            match &binding.wire {
                Some(wire) => {
                    let winner = lock(&wire.state).winner().clone();
                    let _ = write!(out, "{} = {winner}", wire.id);
                }
                None => out.push_str("unbound"),
            }
            if let Some(contribution) = &binding.contribution {
                let _ = write!(out, " (driving {contribution})");
            }
        }
        let properties = cell.read_properties();
        if !properties.is_empty() {
            let _ = write!(out, "\n  properties {properties}");
        }
        Ok(out)
    }

    pub(crate) fn describe_wire(&self, id: WireId) -> Result<String, CircuitError> {
        let wire = self.wire(id)?;
        let pins: Vec<String> = lock(&wire.pins)
            .iter()
            .map(|(pin, role)| format!("{pin} ({role})"))
            .collect();
        let state = lock(&wire.state);
        let drivers: Vec<String> = state.active().iter().map(ToString::to_string).collect();
        Ok(format!(
            "{id} = {}\n  drivers [{}]\n  pins [{}]",
            state.winner(),
            drivers.join(", "),
            pins.join(", ")
        ))
    }
}

// ── PinContext ───────────────────────────────────────────────────

/// [`PinAccess`] handed to a gate's update.
struct PinContext<'a> {
    circuit: &'a Circuit,
    cell: &'a GateCell,
    properties: &'a PropertyStore,
}

impl PinAccess for PinContext<'_> {
    fn pin_count(&self) -> usize {
        self.cell.pins.len()
    }

    fn role(&self, index: usize) -> Result<PinRole, GateError> {
        Ok(self.cell.pin(index)?.role)
    }

    fn read(&self, index: usize) -> Result<DrivenValue, GateError> {
        let pin = self.cell.pin(index)?;
        Ok(self.circuit.sample(pin))
    }

    fn write(&mut self, index: usize, value: DrivenValue) -> Result<(), GateError> {
        let pin = self.cell.pin(index)?;
        if !pin.role.can_drive() {
            return Err(GateError::PinRoleViolation { index });
        }
        Ok(self.circuit.drive(pin, value)?)
    }

    fn properties(&self) -> &PropertyStore {
        self.properties
    }
}

// Compile-time assertion: the graph is shared with worker threads.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Circuit>();
    assert::<GateCell>();
};
