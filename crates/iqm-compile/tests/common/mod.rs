//! Shared architectures and circuits for the integration tests.

#![allow(dead_code)]

use iqm_compile::{MoveGateValidationMode, transpile_remove_moves, validate_circuit_instructions};
use iqm_ir::{
    Circuit, DynamicQuantumArchitecture, GateInfo, Instruction, QubitMapping, locus,
};
use uuid::Uuid;

pub const CALIBRATION_SET: &str = "26c5e70f-bea0-43af-bd37-6212ec7d04cb";

fn calibration_set_id() -> Uuid {
    Uuid::parse_str(CALIBRATION_SET).unwrap()
}

/// Helper: three qubits, no resonators.
pub fn sample_dynamic_architecture() -> DynamicQuantumArchitecture {
    DynamicQuantumArchitecture::new(calibration_set_id(), ["QB1", "QB2", "QB3"], Vec::<String>::new())
        .with_gate(
            "prx",
            GateInfo::new("drag_gaussian")
                .with_implementation(
                    "drag_gaussian",
                    vec![locus(["QB1"]), locus(["QB2"]), locus(["QB3"])],
                )
                .with_implementation("drag_crf", vec![locus(["QB1"]), locus(["QB3"])])
                .with_override(locus(["QB3"]), "drag_crf"),
        )
        .with_gate(
            "cz",
            GateInfo::new("tgss")
                .with_implementation("tgss", vec![locus(["QB1", "QB2"]), locus(["QB1", "QB3"])])
                .with_implementation("crf", vec![locus(["QB1", "QB2"])]),
        )
        .with_gate(
            "measure",
            GateInfo::new("constant")
                .with_implementation("constant", vec![locus(["QB1"]), locus(["QB2"])]),
        )
}

/// Helper: star with `COMP_R` and `COMP_R2`. CZ on `(QB1|QB2, COMP_R)`, MOVE only on
/// `(QB3, COMP_R)`; `COMP_R2` has no calibrated gates.
pub fn sample_move_architecture() -> DynamicQuantumArchitecture {
    DynamicQuantumArchitecture::new(calibration_set_id(), ["QB1", "QB2", "QB3"], ["COMP_R", "COMP_R2"])
        .with_gate(
            "prx",
            GateInfo::new("drag_gaussian").with_implementation(
                "drag_gaussian",
                vec![locus(["QB1"]), locus(["QB2"]), locus(["QB3"])],
            ),
        )
        .with_gate(
            "cz",
            GateInfo::new("tgss").with_implementation(
                "tgss",
                vec![locus(["QB1", "COMP_R"]), locus(["QB2", "COMP_R"])],
            ),
        )
        .with_gate(
            "move",
            GateInfo::new("tgss_crf")
                .with_implementation("tgss_crf", vec![locus(["QB3", "COMP_R"])]),
        )
        .with_gate(
            "measure",
            GateInfo::new("constant").with_implementation(
                "constant",
                vec![locus(["QB1"]), locus(["QB2"]), locus(["QB3"])],
            ),
        )
}

/// Helper: add loci to the default implementation of a gate.
pub fn extend_default_loci(arch: &mut DynamicQuantumArchitecture, gate: &str, loci: Vec<Vec<String>>) {
    let info = arch.gates.get_mut(gate).unwrap();
    let default = info.default_implementation.clone();
    info.implementations
        .get_mut(&default)
        .unwrap()
        .loci
        .extend(loci);
}

pub fn prx(qubit: &str) -> Instruction {
    Instruction::prx(qubit, -0.2, 0.3)
}

/// Helper: untranspiled two-qubit circuit on `QB1`, `QB2`.
pub fn sample_circuit() -> Circuit {
    Circuit::new(
        "The circuit",
        vec![
            Instruction::cz("QB1", "QB2"),
            Instruction::prx("QB1", 0.25, 0.7)
                .with_implementation("drag_gaussian")
                .unwrap(),
            prx("QB1"),
            Instruction::measure(["QB1"], "A"),
            Instruction::measure(["QB2"], "B"),
        ],
    )
    .unwrap()
}

/// Helper: partially transpiled circuit with a valid MOVE sandwich.
pub fn safe_circuit() -> Circuit {
    Circuit::new(
        "safe",
        vec![
            prx("QB1"),
            Instruction::cz("QB1", "COMP_R"),
            Instruction::move_to("QB3", "COMP_R"),
            Instruction::cz("QB2", "COMP_R"),
            Instruction::move_to("QB3", "COMP_R"),
            Instruction::cz("QB3", "QB1"),
        ],
    )
    .unwrap()
}

/// Helper: MOVE sandwich around a PRX on the moved qubit.
pub fn unsafe_circuit() -> Circuit {
    Circuit::new(
        "unsafe",
        vec![
            prx("QB1"),
            Instruction::move_to("QB3", "COMP_R"),
            prx("QB3"),
            Instruction::move_to("QB3", "COMP_R"),
        ],
    )
    .unwrap()
}

/// Helper: a single MOVE that is never undone.
pub fn ambiguous_circuit() -> Circuit {
    Circuit::new(
        "ambiguous",
        vec![
            prx("QB1"),
            Instruction::cz("QB1", "COMP_R"),
            Instruction::move_to("QB3", "COMP_R"),
            Instruction::cz("QB2", "COMP_R"),
            Instruction::cz("QB3", "QB1"),
        ],
    )
    .unwrap()
}

/// Helper: circuit without MOVEs that needs one for its last CZ.
pub fn simple_circuit() -> Circuit {
    Circuit::new(
        "simple",
        vec![
            prx("QB1"),
            Instruction::cz("QB1", "COMP_R"),
            Instruction::cz("QB2", "COMP_R"),
            Instruction::cz("QB3", "QB1"),
            prx("QB3"),
        ],
    )
    .unwrap()
}

/// Helper: circuit on logical names with its mapping.
pub fn mapped_circuit() -> (Circuit, QubitMapping) {
    let circuit = Circuit::new("mapped", vec![prx("A"), Instruction::cz("A", "B")]).unwrap();
    let mapping = QubitMapping::from_iter([
        ("A".to_string(), "QB3".to_string()),
        ("B".to_string(), "QB1".to_string()),
    ]);
    (circuit, mapping)
}

/// Helper: MOVE instructions of a circuit in order.
pub fn moves_of(circuit: &Circuit) -> Vec<Instruction> {
    circuit
        .instructions()
        .iter()
        .filter(|i| i.is_move())
        .cloned()
        .collect()
}

/// Helper: check that `moves` occur in `circuit` as a subsequence.
pub fn contains_moves_in_order(circuit: &Circuit, moves: &[Instruction]) -> bool {
    let mut idx = 0;
    for instruction in circuit.instructions() {
        if idx < moves.len() && moves[idx] == *instruction {
            idx += 1;
        }
    }
    idx == moves.len()
}

/// Helper: compare two circuits after removing their MOVEs. CZ loci may be reversed.
pub fn equivalent_without_moves(c1: &Circuit, c2: &Circuit) -> bool {
    let c1 = transpile_remove_moves(c1).unwrap();
    let c2 = transpile_remove_moves(c2).unwrap();
    if c1.instructions().len() != c2.instructions().len() {
        return false;
    }
    c1.instructions().iter().zip(c2.instructions()).all(|(i1, i2)| {
        if i1.name() != i2.name() || i1.args() != i2.args() {
            return false;
        }
        if i1.qubits() == i2.qubits() {
            return true;
        }
        i1.is_cz() && i1.qubits().iter().eq(i2.qubits().iter().rev())
    })
}

/// Helper: strict validation, with the mapping completed by identity entries.
pub fn assert_valid(arch: &DynamicQuantumArchitecture, circuit: &Circuit, mapping: Option<&QubitMapping>) {
    let completed = mapping.map(|m| {
        let mut m = m.clone();
        for component in arch.components() {
            if !m.values().any(|p| *p == component) {
                m.insert(component.clone(), component);
            }
        }
        m
    });
    validate_circuit_instructions(
        arch,
        std::slice::from_ref(circuit),
        completed.as_ref(),
        MoveGateValidationMode::Strict,
    )
    .unwrap();
}
