//! MOVE gate insertion and removal.
//!
//! On a star architecture two-qubit gates act between a qubit and a computational
//! resonator, and a second qubit takes part by having its state moved into the
//! resonator first. [`transpile_insert_moves`] rewrites a circuit written against the
//! simplified (resonator-free) view into one that runs on the real architecture;
//! [`transpile_remove_moves`] goes the other way.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use iqm_ir::{Circuit, DynamicQuantumArchitecture, Instruction, QubitMapping};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CompileError, CompileResult};
use crate::resonator::{NameMap, ResonatorStateTracker};
use crate::validate::{MoveGateValidationMode, validate_circuit_moves, validate_instruction};

/// How MOVE instructions already present in a circuit are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExistingMoveHandling {
    /// Validate the existing MOVEs strictly and add more as needed.
    Keep,
    /// Keep the existing MOVEs without validating them and add more as needed.
    Trust,
    /// Remove the existing MOVEs and insert new ones.
    Remove,
}

impl ExistingMoveHandling {
    /// Wire name of the option.
    pub fn as_str(self) -> &'static str {
        match self {
            ExistingMoveHandling::Keep => "keep",
            ExistingMoveHandling::Trust => "trust",
            ExistingMoveHandling::Remove => "remove",
        }
    }
}

impl fmt::Display for ExistingMoveHandling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExistingMoveHandling {
    type Err = CompileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keep" => Ok(ExistingMoveHandling::Keep),
            "trust" => Ok(ExistingMoveHandling::Trust),
            "remove" => Ok(ExistingMoveHandling::Remove),
            other => Err(CompileError::Configuration(format!(
                "Unknown existing MOVE handling option '{other}'"
            ))),
        }
    }
}

fn transpilation_failed(err: &CompileError) -> CompileError {
    CompileError::Transpilation(format!(
        "Unable to transpile the circuit after validation error: {err}"
    ))
}

/// Insert the MOVE instructions a circuit needs to run on `architecture`.
///
/// `mapping` maps the logical names used by the circuit to physical components and is
/// extended with an identity entry for every component it does not target. The result
/// uses the circuit's own names and leaves every resonator empty at the end.
///
/// With `existing_moves` unspecified, MOVEs already in the circuit are removed (with a
/// warning). On an architecture without MOVE gates a circuit without MOVEs is returned
/// unchanged, an explicit `Remove` strips them and anything else is a configuration
/// error.
pub fn transpile_insert_moves(
    circuit: &Circuit,
    architecture: &DynamicQuantumArchitecture,
    existing_moves: Option<ExistingMoveHandling>,
    mapping: Option<&QubitMapping>,
) -> CompileResult<Circuit> {
    let mut tracker = ResonatorStateTracker::from_dynamic_architecture(architecture);

    let mut mapping: QubitMapping = mapping.cloned().unwrap_or_default();
    let targeted: FxHashSet<String> = mapping.values().cloned().collect();
    for component in architecture.components() {
        if !targeted.contains(&component) {
            mapping.entry(component.clone()).or_insert(component);
        }
    }

    let has_moves = circuit.contains_moves();
    let mut existing_moves = existing_moves;
    if existing_moves.is_none() && has_moves {
        warn!(
            circuit = circuit.name(),
            "Circuit already contains MOVE instructions, removing them before transpiling."
        );
        existing_moves = Some(ExistingMoveHandling::Remove);
    }

    if !tracker.supports_move() {
        if !has_moves {
            return Ok(circuit.clone());
        }
        if existing_moves == Some(ExistingMoveHandling::Remove) {
            return transpile_remove_moves(circuit);
        }
        return Err(CompileError::Configuration(
            "Circuit contains MOVE instructions, but device does not support them".into(),
        ));
    }

    let source: Cow<'_, Circuit> = match existing_moves {
        None | Some(ExistingMoveHandling::Remove) => Cow::Owned(transpile_remove_moves(circuit)?),
        Some(ExistingMoveHandling::Keep) => {
            validate_circuit_moves(
                architecture,
                circuit,
                Some(&mapping),
                MoveGateValidationMode::Strict,
            )
            .map_err(|e| transpilation_failed(&e))?;
            Cow::Borrowed(circuit)
        }
        Some(ExistingMoveHandling::Trust) => Cow::Borrowed(circuit),
    };

    let reverse: NameMap = mapping
        .iter()
        .map(|(logical, physical)| (physical.clone(), logical.clone()))
        .collect();

    let mut instructions = insert_moves(
        source.instructions(),
        &mut tracker,
        architecture,
        &mapping,
        &reverse,
    )?;
    instructions.extend(tracker.reset_as_move_instructions(None, Some(&reverse))?);

    debug!(
        circuit = circuit.name(),
        before = circuit.instructions().len(),
        after = instructions.len(),
        "inserted MOVE instructions"
    );
    Ok(source.with_instructions(instructions)?)
}

fn to_physical(instruction: &Instruction, mapping: &QubitMapping) -> CompileResult<Instruction> {
    let qubits = instruction
        .qubits()
        .iter()
        .map(|q| {
            mapping.get(q).cloned().ok_or_else(|| {
                CompileError::Transpilation(format!(
                    "Unable to transpile the circuit: qubit {q} is not in the qubit mapping."
                ))
            })
        })
        .collect::<CompileResult<Vec<_>>>()?;
    Ok(instruction.with_qubits(qubits))
}

/// Rewrite pass: walk the instructions, keep what validates, move states out of
/// resonators before other gates touch them and repair CZ gates through a resonator.
fn insert_moves(
    instructions: &[Instruction],
    tracker: &mut ResonatorStateTracker,
    architecture: &DynamicQuantumArchitecture,
    mapping: &QubitMapping,
    reverse: &NameMap,
) -> CompileResult<Vec<Instruction>> {
    let physical = instructions
        .iter()
        .map(|i| to_physical(i, mapping))
        .collect::<CompileResult<Vec<_>>>()?;
    let logical = |c: &str| reverse.get(c).cloned().unwrap_or_else(|| c.to_string());

    let mut out = Vec::with_capacity(instructions.len());
    for (idx, (instruction, mapped)) in instructions.iter().zip(&physical).enumerate() {
        let qubits = mapped.qubits();
        let held = tracker.resonators_holding_qubits(qubits);

        if !held.is_empty() && !instruction.is_cz() && !instruction.is_move() {
            out.extend(tracker.reset_as_move_instructions(Some(held.as_slice()), Some(reverse))?);
            out.push(instruction.clone());
            continue;
        }

        let err = match validate_instruction(architecture, instruction, Some(mapping)) {
            Ok(()) => {
                out.push(instruction.clone());
                if instruction.is_move() {
                    if let [qubit, resonator] = qubits {
                        tracker.apply_move(qubit, resonator)?;
                    }
                }
                continue;
            }
            Err(err) => err,
        };
        if !instruction.is_cz() {
            return Err(transpilation_failed(&err));
        }

        let sources: Vec<String> = if held.is_empty() {
            qubits.to_vec()
        } else {
            held.iter()
                .filter_map(|r| tracker.owner(r).map(str::to_string))
                .collect()
        };
        let candidates = tracker.choose_move_pair(&sources, &physical[idx..])?;

        let mut chosen = None;
        for (resonator, moved) in candidates {
            let Some(partner) = qubits.iter().find(|q| **q != moved) else {
                continue;
            };
            let rewritten = Instruction::cz(logical(partner), logical(&resonator));
            if validate_instruction(architecture, &rewritten, Some(mapping)).is_ok() {
                chosen = Some((resonator, moved, rewritten));
                break;
            }
        }
        let Some((resonator, moved, rewritten)) = chosen else {
            return Err(CompileError::Transpilation(
                "Unable to find a valid resonator-qubit pair for a MOVE gate to enable this CZ gate."
                    .into(),
            ));
        };

        let others: Vec<String> = held.into_iter().filter(|r| *r != resonator).collect();
        out.extend(tracker.reset_as_move_instructions(Some(others.as_slice()), Some(reverse))?);
        if tracker.owner(&resonator) != Some(moved.as_str()) {
            out.extend(tracker.create_move_instructions(&moved, &resonator, Some(reverse))?);
        }
        out.push(rewritten);
    }
    Ok(out)
}

/// First component of the locus that is a tracked resonator holding no qubit state.
fn empty_resonator_in<'a>(tracker: &ResonatorStateTracker, locus: &'a [String]) -> Option<&'a str> {
    locus
        .iter()
        .find(|c| tracker.owner(c) == Some(c.as_str()))
        .map(String::as_str)
}

/// Remove the MOVE instructions of a circuit.
///
/// Resonators in the loci of the remaining instructions are replaced by the qubit whose
/// state they hold at that point. An instruction that uses a resonator while it holds
/// no state keeps the resonator name and a warning is logged; use
/// [`check_remove_moves_precondition`] to reject such circuits instead. A circuit with
/// nothing but MOVEs is a transpilation error.
pub fn transpile_remove_moves(circuit: &Circuit) -> CompileResult<Circuit> {
    let mut tracker = ResonatorStateTracker::from_circuit(circuit);
    let mut out = Vec::with_capacity(circuit.instructions().len());

    for instruction in circuit.instructions() {
        if instruction.is_move() {
            if let [qubit, resonator] = instruction.qubits() {
                tracker.apply_move(qubit, resonator)?;
            }
            continue;
        }
        if let Some(resonator) = empty_resonator_in(&tracker, instruction.qubits()) {
            warn!(
                circuit = circuit.name(),
                instruction = instruction.name(),
                resonator,
                "instruction uses a resonator that holds no qubit state"
            );
        }
        let locus = tracker.map_resonators_in_locus(instruction.qubits());
        if locus == instruction.qubits() {
            out.push(instruction.clone());
        } else {
            // the implementation was calibrated for the resonator locus
            out.push(instruction.with_qubits(locus).without_implementation());
        }
    }

    if out.is_empty() {
        return Err(CompileError::Transpilation(format!(
            "Circuit '{}' contains only MOVE instructions and is empty without them.",
            circuit.name()
        )));
    }
    Ok(circuit.with_instructions(out)?)
}

/// Check that every resonator a circuit uses holds a qubit state when it is used.
///
/// This is the condition under which [`transpile_remove_moves`] preserves the meaning
/// of the circuit.
pub fn check_remove_moves_precondition(circuit: &Circuit) -> CompileResult<()> {
    let mut tracker = ResonatorStateTracker::from_circuit(circuit);
    for instruction in circuit.instructions() {
        if instruction.is_move() {
            if let [qubit, resonator] = instruction.qubits() {
                tracker.apply_move(qubit, resonator)?;
            }
            continue;
        }
        if let Some(resonator) = empty_resonator_in(&tracker, instruction.qubits()) {
            return Err(CompileError::Validation(format!(
                "Instruction {} acts on {:?} while resonator {resonator} holds no qubit state.",
                instruction.name(),
                instruction.qubits()
            )));
        }
    }
    Ok(())
}
