//! Graph edits, stale ids, wire resolution through the simulation, and
//! diagnostics.

use gatesim_core::{DrivenValue, Gate, GateId, PinId, Strength, WireId, MAX_PINS};
use gatesim_engine::{CircuitError, ConfigError, DirtyState, Simulation, SimulationConfig};
use gatesim_test_utils::{init_logging, CountingGate, DriverGate, SourceGate};

fn sim(config: SimulationConfig) -> Simulation {
    init_logging();
    Simulation::new(config).unwrap()
}

fn byte(strength: u8, value: u8) -> DrivenValue {
    DrivenValue::byte(Strength(strength), value)
}

fn place(sim: &Simulation, gate: impl Gate, wires: &[WireId]) -> GateId {
    let id = sim.add_gate(Box::new(gate)).unwrap();
    for (i, wire) in wires.iter().enumerate() {
        sim.bind(id.pin(i as u16), *wire).unwrap();
    }
    id
}

fn driver(sim: &Simulation, wire: WireId) -> PinId {
    place(sim, DriverGate::new(1), &[wire]).pin(0)
}

#[test]
fn strongest_driver_wins_in_any_order() {
    for flip in [false, true] {
        let sim = sim(SimulationConfig::default());
        let wire = sim.add_wire();
        let (p, q) = (driver(&sim, wire), driver(&sim, wire));
        let (strong, weak) = (byte(0, 1), byte(5, 2));
        if flip {
            sim.write_pin(q, weak).unwrap();
            sim.write_pin(p, strong.clone()).unwrap();
        } else {
            sim.write_pin(p, strong.clone()).unwrap();
            sim.write_pin(q, weak).unwrap();
        }
        assert_eq!(sim.read_wire(wire).unwrap(), strong);
    }
}

#[test]
fn unbinding_withdraws_the_contribution() {
    let sim = sim(SimulationConfig::default());
    let wire = sim.add_wire();
    let (p, q) = (driver(&sim, wire), driver(&sim, wire));
    sim.write_pin(q, byte(5, 2)).unwrap();
    let before = sim.read_wire(wire).unwrap();
    sim.write_pin(p, byte(0, 1)).unwrap();
    assert_eq!(sim.read_wire(wire).unwrap(), byte(0, 1));

    sim.unbind(p).unwrap();
    assert_eq!(sim.read_wire(wire).unwrap(), before);
    assert_eq!(sim.binding(p).unwrap(), None);
    assert!(sim.read_pin(p).unwrap().is_none());
    assert_eq!(sim.wire_pins(wire).unwrap(), vec![q]);

    // Unbound pins accept writes and ignore them.
    sim.write_pin(p, byte(0, 9)).unwrap();
    assert_eq!(sim.read_wire(wire).unwrap(), before);
    // Unbinding twice is harmless.
    sim.unbind(p).unwrap();
}

#[test]
fn unbinding_marks_the_gate_dirty() {
    let sim = sim(SimulationConfig::default());
    let wire = sim.add_wire();
    let gate = CountingGate::new(1);
    let probe = gate.probe();
    let id = place(&sim, gate, &[wire]);
    sim.step().unwrap();

    sim.unbind(id.pin(0)).unwrap();
    assert_eq!(sim.gate_state(id).unwrap(), DirtyState::Dirty);
    sim.step().unwrap();
    assert_eq!(probe.calls(), 2);
    assert_eq!(probe.last_inputs(), vec![DrivenValue::none()]);
}

#[test]
fn rebinding_moves_a_pin_between_wires() {
    let sim = sim(SimulationConfig::default());
    let (w1, w2) = (sim.add_wire(), sim.add_wire());
    let pin = driver(&sim, w1);
    sim.write_pin(pin, byte(0, 7)).unwrap();

    sim.bind(pin, w2).unwrap();
    assert!(sim.read_wire(w1).unwrap().is_none());
    assert!(sim.read_wire(w2).unwrap().is_none());
    assert_eq!(sim.binding(pin).unwrap(), Some(w2));
    assert!(sim.wire_pins(w1).unwrap().is_empty());
    assert_eq!(sim.wire_pins(w2).unwrap(), vec![pin]);

    sim.write_pin(pin, byte(0, 8)).unwrap();
    assert_eq!(sim.read_wire(w2).unwrap(), byte(0, 8));
    // Binding to the current wire keeps the contribution.
    sim.bind(pin, w2).unwrap();
    assert_eq!(sim.read_wire(w2).unwrap(), byte(0, 8));
}

#[test]
fn equal_strength_conflict_is_a_short_circuit() {
    let sim = sim(SimulationConfig::default());
    let wire = sim.add_wire();
    let (p, q) = (driver(&sim, wire), driver(&sim, wire));
    sim.write_pin(p, byte(0, 1)).unwrap();

    match sim.write_pin(q, byte(0, 2)) {
        Err(CircuitError::ShortCircuit(sc)) => assert_eq!(sc.wire, wire),
        other => panic!("expected ShortCircuit, got {other:?}"),
    }
    assert_eq!(sim.read_wire(wire).unwrap(), byte(0, 1));

    // Without a resolver even agreeing drivers conflict.
    assert!(matches!(
        sim.write_pin(q, byte(0, 1)),
        Err(CircuitError::ShortCircuit(_))
    ));
}

#[test]
fn identical_resolver_lets_agreeing_drivers_share_a_wire() {
    let sim = sim(SimulationConfig::default().with_resolvers(&["identical"]));
    let wire = sim.add_wire();
    let (p, q) = (driver(&sim, wire), driver(&sim, wire));
    sim.write_pin(p, byte(0, 1)).unwrap();
    sim.write_pin(q, byte(0, 1)).unwrap();
    assert_eq!(sim.read_wire(wire).unwrap(), byte(0, 1));
    assert_eq!(sim.resolvers(), vec!["identical".to_string()]);
}

#[test]
fn resolvers_registered_at_runtime_apply_to_later_writes() {
    let sim = sim(SimulationConfig::default());
    let wire = sim.add_wire();
    let (p, q) = (driver(&sim, wire), driver(&sim, wire));
    sim.write_pin(p, byte(0, 0b0011)).unwrap();
    assert!(sim.write_pin(q, byte(0, 0b0101)).is_err());

    sim.register_resolver("bitwise_or", |a: &DrivenValue, b: &DrivenValue| {
        let merged = a.as_byte().ok()? | b.as_byte().ok()?;
        Some(DrivenValue::byte(a.strength(), merged))
    });
    sim.write_pin(q, byte(0, 0b0101)).unwrap();
    assert_eq!(sim.read_wire(wire).unwrap(), byte(0, 0b0111));
}

#[test]
fn unknown_resolver_name_is_rejected() {
    init_logging();
    let err = Simulation::new(SimulationConfig::default().with_resolvers(&["majority"]))
        .unwrap_err();
    assert!(matches!(err, ConfigError::UnknownResolver(_)));
}

#[test]
fn removing_a_wire_detaches_its_pins() {
    let sim = sim(SimulationConfig::default());
    let wire = sim.add_wire();
    let reader = place(&sim, CountingGate::new(1), &[wire]);
    let pin = driver(&sim, wire);
    sim.write_pin(pin, byte(0, 3)).unwrap();
    sim.step().unwrap();

    sim.remove_wire(wire).unwrap();
    assert_eq!(sim.wire_count(), 0);
    assert_eq!(sim.binding(reader.pin(0)).unwrap(), None);
    assert_eq!(sim.binding(pin).unwrap(), None);
    assert_eq!(sim.gate_state(reader).unwrap(), DirtyState::Dirty);
    assert_eq!(
        sim.read_wire(wire),
        Err(CircuitError::UnknownWire { wire })
    );
    assert_eq!(
        sim.bind(pin, wire),
        Err(CircuitError::UnknownWire { wire })
    );
    assert_eq!(
        sim.remove_wire(wire),
        Err(CircuitError::UnknownWire { wire })
    );
}

#[test]
fn removing_a_gate_withdraws_its_outputs_and_wakes_readers() {
    let sim = sim(SimulationConfig::default());
    let wire = sim.add_wire();
    let source = place(&sim, SourceGate::new(byte(0, 4)), &[wire]);
    let reader = CountingGate::new(1);
    let probe = reader.probe();
    place(&sim, reader, &[wire]);
    sim.step().unwrap();
    assert_eq!(sim.read_wire(wire).unwrap(), byte(0, 4));

    sim.remove_gate(source).unwrap();
    assert!(sim.read_wire(wire).unwrap().is_none());
    assert_eq!(sim.gate_count(), 1);
    sim.step().unwrap();
    assert_eq!(probe.last_inputs(), vec![DrivenValue::none()]);
}

#[test]
fn stale_ids_are_rejected_after_slot_reuse() {
    let sim = sim(SimulationConfig::default());
    let old = sim.add_gate(Box::new(CountingGate::new(1))).unwrap();
    sim.remove_gate(old).unwrap();
    let new = sim.add_gate(Box::new(CountingGate::new(1))).unwrap();
    assert_eq!(new.index(), old.index());
    assert_ne!(new.generation(), old.generation());

    assert_eq!(sim.gate_state(old), Err(CircuitError::UnknownGate { gate: old }));
    assert_eq!(sim.remove_gate(old), Err(CircuitError::UnknownGate { gate: old }));
    assert_eq!(sim.mark_dirty(old), Err(CircuitError::UnknownGate { gate: old }));
    assert!(sim.gate_state(new).is_ok());
    assert_eq!(sim.gates(), vec![new]);

    let wire = sim.add_wire();
    sim.remove_wire(wire).unwrap();
    let reused = sim.add_wire();
    assert_ne!(reused, wire);
    assert_eq!(sim.wires(), vec![reused]);
}

#[test]
fn pin_outside_the_layout_is_unknown() {
    let sim = sim(SimulationConfig::default());
    let wire = sim.add_wire();
    let gate = sim.add_gate(Box::new(CountingGate::new(2))).unwrap();
    let pin = gate.pin(2);
    assert_eq!(sim.bind(pin, wire), Err(CircuitError::UnknownPin { pin }));
    assert_eq!(sim.read_pin(pin), Err(CircuitError::UnknownPin { pin }));
}

#[test]
fn layout_wider_than_pin_ordinals_is_rejected() {
    let sim = sim(SimulationConfig::default());
    assert_eq!(
        sim.add_gate(Box::new(CountingGate::new(MAX_PINS + 1))),
        Err(CircuitError::TooManyPins {
            count: MAX_PINS + 1
        })
    );
    assert_eq!(sim.gate_count(), 0);

    let wire = sim.add_wire();
    let widest = sim.add_gate(Box::new(CountingGate::new(MAX_PINS))).unwrap();
    let last = widest.pin(u16::MAX);
    sim.bind(last, wire).unwrap();
    assert_eq!(sim.binding(last), Ok(Some(wire)));
    sim.remove_gate(widest).unwrap();
    assert!(sim.wire_pins(wire).unwrap().is_empty());
}

#[test]
fn properties_are_per_gate() {
    let sim = sim(SimulationConfig::default());
    let gate = sim.add_gate(Box::new(CountingGate::new(0))).unwrap();
    assert!(sim.properties(gate).unwrap().is_empty());
    assert!(matches!(
        sim.property(gate, "missing"),
        Err(CircuitError::Property(_))
    ));
    assert_eq!(
        sim.set_property(gate, "anything", 1u8),
        Err(CircuitError::NotConfigurable { gate })
    );
}

#[test]
fn descriptions_name_pins_drivers_and_state() {
    let sim = sim(SimulationConfig::default());
    let wire = sim.add_wire();
    let pin = driver(&sim, wire);
    sim.write_pin(pin, byte(0, 5)).unwrap();

    let gate = sim.describe_gate(pin.gate).unwrap();
    assert!(gate.starts_with(&format!("driver {} [dirty]", pin.gate)), "{gate}");
    assert!(gate.contains(&format!("pin0 out: {wire}")), "{gate}");
    assert!(gate.contains("driving"), "{gate}");

    let description = sim.describe_wire(wire).unwrap();
    assert!(description.starts_with(&format!("{wire} = ")), "{description}");
    assert!(description.contains(&format!("{pin} (out)")), "{description}");
}
