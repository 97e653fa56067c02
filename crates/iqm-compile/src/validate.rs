//! Instruction, locus and MOVE sandwich validation against a dynamic architecture.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use iqm_ir::operation::{self, BARRIER, LocusCheck, PRX};
use iqm_ir::{Circuit, DynamicQuantumArchitecture, Instruction, Locus, QubitMapping};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{CompileError, CompileResult};

/// Which gates may act on a qubit while its state is held in a resonator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveGateValidationMode {
    /// Only barriers.
    #[default]
    Strict,
    /// Barriers and PRX gates.
    AllowPrx,
    /// MOVE sandwiches are not validated at all.
    None,
}

impl MoveGateValidationMode {
    /// Wire name of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            MoveGateValidationMode::Strict => "strict",
            MoveGateValidationMode::AllowPrx => "allow_prx",
            MoveGateValidationMode::None => "none",
        }
    }

    fn allowed_gates(self) -> &'static [&'static str] {
        match self {
            MoveGateValidationMode::AllowPrx => &[BARRIER, PRX],
            _ => &[BARRIER],
        }
    }
}

impl fmt::Display for MoveGateValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MoveGateValidationMode {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(MoveGateValidationMode::Strict),
            "allow_prx" => Ok(MoveGateValidationMode::AllowPrx),
            "none" => Ok(MoveGateValidationMode::None),
            other => Err(CompileError::Configuration(format!(
                "Unknown MOVE gate validation mode '{other}'"
            ))),
        }
    }
}

/// Map a logical locus to physical names. Without a mapping the locus is used as is.
pub(crate) fn map_locus(qubits: &[String], mapping: Option<&QubitMapping>) -> CompileResult<Locus> {
    let Some(mapping) = mapping else {
        return Ok(qubits.to_vec());
    };
    qubits
        .iter()
        .map(|q| {
            mapping.get(q).cloned().ok_or_else(|| {
                CompileError::Validation(format!("Qubit {q} is not found in the qubit mapping."))
            })
        })
        .collect()
}

/// Check that an instruction can run on the architecture.
///
/// The locus is mapped to physical names first when a mapping is given. Barriers only
/// need existing components; measurements need every component to be measurable;
/// other instructions need an exact calibrated locus (either orientation when the
/// instruction is undirected). An explicitly requested implementation narrows the
/// allowed loci to the ones calibrated for it.
pub fn validate_instruction(
    architecture: &DynamicQuantumArchitecture,
    instruction: &Instruction,
    mapping: Option<&QubitMapping>,
) -> CompileResult<()> {
    let name = instruction.name();
    let op = operation::lookup(name).ok_or_else(|| {
        CompileError::Validation(format!("Unknown instruction '{name}'."))
    })?;
    let mapped = map_locus(instruction.qubits(), mapping)?;
    let describe = || {
        if mapping.is_some() {
            format!("{:?} = {mapped:?}", instruction.qubits())
        } else {
            format!("{mapped:?}")
        }
    };

    if op.locus_check == LocusCheck::Skip {
        for (logical, physical) in instruction.qubits().iter().zip(&mapped) {
            if !architecture.has_component(physical) {
                let component = if mapping.is_some() {
                    format!("{logical} = {physical}")
                } else {
                    physical.clone()
                };
                return Err(CompileError::Validation(format!(
                    "{component} does not exist on the QPU."
                )));
            }
        }
        return Ok(());
    }

    let gate = architecture.gates.get(name).ok_or_else(|| {
        CompileError::Validation(format!(
            "Operation '{name}' is not supported by the dynamic quantum architecture."
        ))
    })?;

    let (allowed, reported) = match instruction.implementation() {
        Some(implementation) => {
            let info = gate.implementations.get(implementation).ok_or_else(|| {
                CompileError::Validation(format!(
                    "Operation '{name}' implementation '{implementation}' is not supported by the dynamic quantum architecture."
                ))
            })?;
            (info.loci.clone(), format!("{name}.{implementation}"))
        }
        None => (gate.loci(), name.to_string()),
    };

    let permitted = match op.locus_check {
        LocusCheck::AnyCombination => {
            let components: FxHashSet<&str> =
                allowed.iter().flatten().map(String::as_str).collect();
            mapped.iter().all(|c| components.contains(c.as_str()))
        }
        _ if op.directed => allowed.contains(&mapped),
        _ => {
            let mut key = mapped.clone();
            key.sort();
            allowed.iter().any(|locus| {
                let mut sorted = locus.clone();
                sorted.sort();
                sorted == key
            })
        }
    };

    if permitted {
        Ok(())
    } else {
        Err(CompileError::Validation(format!(
            "{} is not allowed as locus for '{reported}'",
            describe()
        )))
    }
}

/// Check that the MOVE instructions of a circuit form valid sandwiches.
///
/// Every MOVE goes from a qubit to a resonator, a resonator holds at most one state,
/// a state lives in at most one resonator, only the occupant can leave an occupied
/// resonator and no state is left in a resonator at the end. While states are held in
/// resonators, instructions touching those qubits are rejected unless the mode allows
/// them. Names in the circuit are logical when a mapping is given.
pub fn validate_circuit_moves(
    architecture: &DynamicQuantumArchitecture,
    circuit: &Circuit,
    mapping: Option<&QubitMapping>,
    mode: MoveGateValidationMode,
) -> CompileResult<()> {
    if mode == MoveGateValidationMode::None {
        return Ok(());
    }
    if !architecture.supports_move() {
        if circuit.contains_moves() {
            return Err(CompileError::Validation(
                "MOVE instruction is not supported by the given device architecture.".into(),
            ));
        }
        return Ok(());
    }

    let reverse: FxHashMap<&str, &str> = mapping
        .map(|m| m.iter().map(|(l, p)| (p.as_str(), l.as_str())).collect())
        .unwrap_or_default();
    let logical = |c: &String| reverse.get(c.as_str()).copied().unwrap_or(c.as_str()).to_string();
    let resonators: FxHashSet<String> = architecture
        .computational_resonators
        .iter()
        .map(logical)
        .collect();
    let qubits: FxHashSet<String> = architecture.qubits.iter().map(logical).collect();
    let allowed = mode.allowed_gates();

    let mut occupation: BTreeMap<&str, &str> = BTreeMap::new();
    let mut moved: BTreeSet<&str> = BTreeSet::new();

    for instruction in circuit.instructions() {
        let locus = instruction.qubits();
        if instruction.is_move() {
            let [qubit, resonator] = locus else {
                continue;
            };
            if !(qubits.contains(qubit) && resonators.contains(resonator)) {
                return Err(CompileError::Validation(format!(
                    "MOVE instructions are only allowed between qubit and resonator, not {locus:?}."
                )));
            }
            match occupation.get(resonator.as_str()).copied() {
                None => {
                    if moved.contains(qubit.as_str()) {
                        return Err(CompileError::Validation(format!(
                            "MOVE instruction {locus:?}: state of {qubit} is in another resonator: {occupation:?}"
                        )));
                    }
                    occupation.insert(resonator.as_str(), qubit.as_str());
                    moved.insert(qubit.as_str());
                }
                Some(occupant) if occupant != qubit => {
                    return Err(CompileError::Validation(format!(
                        "MOVE instruction {locus:?} to an already occupied resonator: {occupation:?}"
                    )));
                }
                Some(_) => {
                    occupation.remove(resonator.as_str());
                    moved.remove(qubit.as_str());
                }
            }
        } else if !moved.is_empty() && !allowed.contains(&instruction.name()) {
            let overlap: Vec<&str> = locus
                .iter()
                .map(String::as_str)
                .filter(|q| moved.contains(q))
                .collect();
            if !overlap.is_empty() {
                return Err(CompileError::Validation(format!(
                    "Instruction {} acts on {locus:?} while the state(s) of {overlap:?} are in a resonator. Current resonator occupation: {occupation:?}.",
                    instruction.name()
                )));
            }
        }
    }

    if !occupation.is_empty() {
        return Err(CompileError::Validation(format!(
            "Circuit ends while qubit state(s) are still in a resonator: {occupation:?}."
        )));
    }
    Ok(())
}

/// Validate every instruction of every circuit, the uniqueness of measurement keys
/// within each circuit and the MOVE sandwiches.
pub fn validate_circuit_instructions(
    architecture: &DynamicQuantumArchitecture,
    circuits: &[Circuit],
    mapping: Option<&QubitMapping>,
    mode: MoveGateValidationMode,
) -> CompileResult<()> {
    for circuit in circuits {
        let mut keys = FxHashSet::default();
        for instruction in circuit.instructions() {
            validate_instruction(architecture, instruction, mapping)?;
            if let Some(key) = instruction.measurement_key() {
                if !keys.insert(key) {
                    return Err(CompileError::Validation(format!(
                        "Circuit \"{}\": {} {:?} has a non-unique measurement key \"{key}\"",
                        circuit.name(),
                        instruction.name(),
                        instruction.qubits()
                    )));
                }
            }
        }
        validate_circuit_moves(architecture, circuit, mapping, mode)?;
    }
    Ok(())
}
