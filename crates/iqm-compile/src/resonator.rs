//! Resonator state tracking.
//!
//! A computational resonator can hold the state of at most one qubit at a time, moved
//! there and back with MOVE gates. [`ResonatorStateTracker`] records which component
//! currently holds the state of each resonator: the resonator itself when it is empty,
//! or the qubit whose state was moved in.
//!
//! Methods taking `&mut self` change the tracked state; methods taking `&self` only
//! answer queries or plan moves.

use iqm_ir::operation::MOVE;
use iqm_ir::{Circuit, DynamicQuantumArchitecture, Instruction, Locus};
use rustc_hash::FxHashMap;

use crate::error::{CompileError, CompileResult};

/// Alternative names for components, e.g. physical to logical.
pub type NameMap = FxHashMap<String, String>;

fn rename(name: &str, alt_names: Option<&NameMap>) -> String {
    alt_names
        .and_then(|names| names.get(name))
        .map_or_else(|| name.to_string(), Clone::clone)
}

/// Number of CZ gates on `qubit` before the first other instruction acting on it.
fn consecutive_cz_score(qubit: &str, lookahead: &[Instruction]) -> usize {
    let mut score = 0;
    for instruction in lookahead {
        if instruction.qubits().iter().any(|q| q == qubit) {
            if !instruction.is_cz() {
                return score;
            }
            score += 1;
        }
    }
    score
}

/// Tracks which qubit state each resonator holds while MOVE gates are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResonatorStateTracker {
    resonators: Vec<String>,
    available_moves: FxHashMap<String, Vec<String>>,
    owners: FxHashMap<String, String>,
}

impl ResonatorStateTracker {
    /// Create a tracker from `(resonator, qubits with a MOVE to it)` pairs.
    ///
    /// All resonators start empty.
    pub fn new(available_moves: impl IntoIterator<Item = (String, Vec<String>)>) -> Self {
        let mut resonators = Vec::new();
        let mut moves: FxHashMap<String, Vec<String>> = FxHashMap::default();
        for (resonator, qubits) in available_moves {
            match moves.get_mut(&resonator) {
                Some(existing) => {
                    for q in qubits {
                        if !existing.contains(&q) {
                            existing.push(q);
                        }
                    }
                }
                None => {
                    resonators.push(resonator.clone());
                    moves.insert(resonator, qubits);
                }
            }
        }
        let owners = resonators.iter().map(|r| (r.clone(), r.clone())).collect();
        Self {
            resonators,
            available_moves: moves,
            owners,
        }
    }

    /// Build from the calibrated MOVE loci of an architecture.
    ///
    /// Every resonator is tracked; one without a calibrated MOVE gets no qubits.
    pub fn from_dynamic_architecture(architecture: &DynamicQuantumArchitecture) -> Self {
        let move_loci = architecture.gate_loci(MOVE).unwrap_or_default();
        Self::new(architecture.computational_resonators.iter().map(|r| {
            let qubits = move_loci
                .iter()
                .filter_map(|locus| match locus.as_slice() {
                    [q, r2] if r2 == r => Some(q.clone()),
                    _ => None,
                })
                .collect();
            (r.clone(), qubits)
        }))
    }

    /// Build from the MOVE instructions that occur in an instruction sequence.
    pub fn from_instructions<'a>(instructions: impl IntoIterator<Item = &'a Instruction>) -> Self {
        Self::new(
            instructions
                .into_iter()
                .filter(|i| i.is_move())
                .filter_map(|i| match i.qubits() {
                    [q, r] => Some((r.clone(), vec![q.clone()])),
                    _ => None,
                }),
        )
    }

    /// Build from the MOVE instructions of a circuit.
    pub fn from_circuit(circuit: &Circuit) -> Self {
        Self::from_instructions(circuit.instructions())
    }

    /// Tracked resonators in order.
    pub fn resonators(&self) -> &[String] {
        &self.resonators
    }

    /// Check if the component is a tracked resonator.
    pub fn is_resonator(&self, component: &str) -> bool {
        self.owners.contains_key(component)
    }

    /// Qubits with a MOVE to the resonator.
    pub fn available_moves(&self, resonator: &str) -> &[String] {
        self.available_moves
            .get(resonator)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Component currently holding the state of the resonator.
    pub fn owner(&self, resonator: &str) -> Option<&str> {
        self.owners.get(resonator).map(String::as_str)
    }

    /// Check if any MOVE is possible.
    pub fn supports_move(&self) -> bool {
        self.available_moves.values().any(|qubits| !qubits.is_empty())
    }

    /// Record a MOVE between `qubit` and `resonator`.
    ///
    /// The resonator must be tracked, the MOVE must be available and the resonator must
    /// either be empty or hold the state of `qubit`. A state already held by another
    /// resonator cannot be moved in. Ownership toggles between the two.
    pub fn apply_move(&mut self, qubit: &str, resonator: &str) -> CompileResult<()> {
        let available = self
            .available_moves
            .get(resonator)
            .is_some_and(|qubits| qubits.iter().any(|q| q == qubit));
        let held_elsewhere = self
            .owners
            .iter()
            .any(|(r, owner)| r != resonator && owner == qubit);
        if held_elsewhere {
            return Err(Self::not_allowed());
        }
        let Some(owner) = self.owners.get_mut(resonator) else {
            return Err(Self::not_allowed());
        };
        if !available || (*owner != qubit && *owner != resonator) {
            return Err(Self::not_allowed());
        }
        *owner = if *owner == resonator {
            qubit.to_string()
        } else {
            resonator.to_string()
        };
        Ok(())
    }

    fn not_allowed() -> CompileError {
        CompileError::Transpilation("Attempted move is not allowed.".into())
    }

    /// MOVEs needed to bring the state of `qubit` into `resonator`, without applying them.
    ///
    /// If the resonator holds another qubit's state, that state is moved out first.
    pub fn planned_moves(&self, qubit: &str, resonator: &str) -> Vec<(String, String)> {
        let mut moves = Vec::with_capacity(2);
        if let Some(owner) = self.owner(resonator) {
            if owner != qubit && owner != resonator {
                moves.push((owner.to_string(), resonator.to_string()));
            }
        }
        moves.push((qubit.to_string(), resonator.to_string()));
        moves
    }

    /// Apply the planned MOVEs for `qubit` and `resonator` and return them as instructions.
    ///
    /// Component names in the instructions are translated through `alt_names` when given.
    pub fn create_move_instructions(
        &mut self,
        qubit: &str,
        resonator: &str,
        alt_names: Option<&NameMap>,
    ) -> CompileResult<Vec<Instruction>> {
        let mut instructions = Vec::with_capacity(2);
        for (q, r) in self.planned_moves(qubit, resonator) {
            self.apply_move(&q, &r)?;
            instructions.push(Instruction::move_to(
                rename(&q, alt_names),
                rename(&r, alt_names),
            ));
        }
        Ok(instructions)
    }

    /// Move every held state in the given resonators (all if `None`) back to its qubit.
    pub fn reset_as_move_instructions(
        &mut self,
        resonators: Option<&[String]>,
        alt_names: Option<&NameMap>,
    ) -> CompileResult<Vec<Instruction>> {
        let occupied: Vec<(String, String)> = self
            .resonators
            .iter()
            .filter(|r| resonators.is_none_or(|scope| scope.contains(*r)))
            .filter_map(|r| {
                let owner = self.owners.get(r)?;
                (owner != r).then(|| (owner.clone(), r.clone()))
            })
            .collect();

        let mut instructions = Vec::new();
        for (qubit, resonator) in occupied {
            instructions.extend(self.create_move_instructions(&qubit, &resonator, alt_names)?);
        }
        Ok(instructions)
    }

    /// For each distinct qubit, the resonators it has a MOVE to.
    pub fn available_resonators_to_move(&self, qubits: &[String]) -> Vec<(String, Vec<String>)> {
        let mut out: Vec<(String, Vec<String>)> = Vec::with_capacity(qubits.len());
        for qubit in qubits {
            if out.iter().any(|(q, _)| q == qubit) {
                continue;
            }
            let resonators = self
                .resonators
                .iter()
                .filter(|r| self.available_moves(r).contains(qubit))
                .cloned()
                .collect();
            out.push((qubit.clone(), resonators));
        }
        out
    }

    /// Resonators currently holding the state of one of the given qubits.
    pub fn resonators_holding_qubits(&self, qubits: &[String]) -> Vec<String> {
        self.resonators
            .iter()
            .filter(|r| {
                self.owners
                    .get(*r)
                    .is_some_and(|owner| qubits.contains(owner) && !self.is_resonator(owner))
            })
            .cloned()
            .collect()
    }

    /// Rank `(resonator, qubit)` pairs for hosting an upcoming two-qubit gate.
    ///
    /// Pairs are scored by how many CZ gates act on the qubit in `lookahead` before any
    /// other instruction acts on it, highest first. Equal scores keep candidate order.
    pub fn choose_move_pair(
        &self,
        qubits: &[String],
        lookahead: &[Instruction],
    ) -> CompileResult<Vec<(String, String)>> {
        let mut candidates: Vec<(String, String)> = self
            .available_resonators_to_move(qubits)
            .into_iter()
            .flat_map(|(q, rs)| rs.into_iter().map(move |r| (r, q.clone())))
            .collect();
        if candidates.is_empty() {
            return Err(CompileError::Transpilation(format!(
                "Unable to insert MOVE gates because none of the qubits {qubits:?} share a resonator. \
                 This can be resolved by routing the circuit first without resonators."
            )));
        }
        candidates.sort_by_key(|(_, q)| std::cmp::Reverse(consecutive_cz_score(q, lookahead)));
        Ok(candidates)
    }

    /// Replace each resonator in the locus by the component holding its state.
    pub fn map_resonators_in_locus(&self, locus: &[String]) -> Locus {
        locus
            .iter()
            .map(|c| self.owners.get(c).unwrap_or(c).clone())
            .collect()
    }
}
