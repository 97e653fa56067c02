//! Built-in circuits and architectures.

use anyhow::{Result, ensure};
use iqm_ir::{Circuit, DynamicQuantumArchitecture, GateInfo, Instruction, Locus, locus};
use uuid::Uuid;

/// Name of the resonator in [`star_architecture`].
pub const RESONATOR: &str = "CR1";

/// Qubit names `QB1..=QBn`.
pub fn qubit_names(num_qubits: usize) -> Vec<String> {
    (1..=num_qubits).map(|i| format!("QB{i}")).collect()
}

/// Star architecture: every qubit couples to one computational resonator with
/// CZ and MOVE, and has PRX and measurement.
pub fn star_architecture(num_qubits: usize) -> DynamicQuantumArchitecture {
    let qubits = qubit_names(num_qubits);
    let single: Vec<Locus> = qubits.iter().map(|q| locus([q.as_str()])).collect();
    let coupled: Vec<Locus> = qubits.iter().map(|q| locus([q.as_str(), RESONATOR])).collect();

    DynamicQuantumArchitecture::new(Uuid::nil(), qubits, [RESONATOR])
        .with_gate(
            "prx",
            GateInfo::new("drag_gaussian").with_implementation("drag_gaussian", single.clone()),
        )
        .with_gate(
            "cz",
            GateInfo::new("tgss").with_implementation("tgss", coupled.clone()),
        )
        .with_gate(
            "move",
            GateInfo::new("tgss_crf").with_implementation("tgss_crf", coupled),
        )
        .with_gate(
            "measure",
            GateInfo::new("constant").with_implementation("constant", single),
        )
}

/// GHZ state preparation in native gates, written as if all qubits were
/// coupled to `QB1`.
pub fn ghz_circuit(num_qubits: usize) -> Result<Circuit> {
    ensure!(num_qubits > 0, "A GHZ circuit needs at least one qubit");
    let qubits = qubit_names(num_qubits);
    let mut instructions = vec![Instruction::prx(&qubits[0], 0.25, 0.25)];
    for target in &qubits[1..] {
        instructions.push(Instruction::prx(target, 0.25, 0.25));
        instructions.push(Instruction::cz(&qubits[0], target));
        instructions.push(Instruction::prx(target, -0.25, 0.25));
    }
    instructions.push(Instruction::measure(&qubits, "m"));
    Ok(Circuit::new(format!("ghz_{num_qubits}"), instructions)?)
}
