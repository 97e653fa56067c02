//! Resonator-free view of a star architecture.

use std::collections::BTreeMap;

use iqm_ir::locus::sort_loci;
use iqm_ir::operation::MOVE;
use iqm_ir::{DynamicQuantumArchitecture, GateImplementationInfo, GateInfo, Locus};

use crate::resonator::ResonatorStateTracker;

/// Loci replacing `locus` once resonators are abstracted away.
///
/// A two-component locus with a resonator `r` becomes one locus per qubit `q2` that
/// has a MOVE to `r`, with `q2` in the place of `r`. Other loci touching a resonator
/// disappear.
fn simplify_locus(
    architecture: &DynamicQuantumArchitecture,
    tracker: &ResonatorStateTracker,
    locus: &Locus,
) -> Vec<Locus> {
    if !locus.iter().any(|c| architecture.is_resonator(c)) {
        return vec![locus.clone()];
    }
    let [first, second] = locus.as_slice() else {
        return Vec::new();
    };
    let (qubit, resonator, resonator_first) = if architecture.is_resonator(second) {
        (first, second, false)
    } else {
        (second, first, true)
    };
    if architecture.is_resonator(qubit) {
        return Vec::new();
    }
    tracker
        .available_moves(resonator)
        .iter()
        .filter(|q2| *q2 != qubit)
        .map(|q2| {
            if resonator_first {
                vec![q2.clone(), qubit.clone()]
            } else {
                vec![qubit.clone(), q2.clone()]
            }
        })
        .collect()
}

/// Architecture with computational resonators removed.
///
/// A gate `G(q1, r)` together with `MOVE(q2, r)` realizes `G(q1, q2)`, so every
/// qubit-resonator locus is replaced by the qubit-qubit loci it enables. The MOVE gate,
/// resonator-only loci, overrides on resonator loci and implementations left without
/// loci are dropped. An architecture without resonators is returned unchanged.
pub fn simplified_architecture(architecture: &DynamicQuantumArchitecture) -> DynamicQuantumArchitecture {
    if architecture.computational_resonators.is_empty() {
        return architecture.clone();
    }
    let tracker = ResonatorStateTracker::from_dynamic_architecture(architecture);

    let mut gates = BTreeMap::new();
    for (name, gate) in &architecture.gates {
        if name == MOVE {
            continue;
        }
        let mut implementations = BTreeMap::new();
        for (implementation, info) in &gate.implementations {
            let mut loci: Vec<Locus> = info
                .loci
                .iter()
                .flat_map(|locus| simplify_locus(architecture, &tracker, locus))
                .collect();
            sort_loci(&mut loci);
            if !loci.is_empty() {
                implementations.insert(implementation.clone(), GateImplementationInfo { loci });
            }
        }
        let Some(first) = implementations.keys().next().cloned() else {
            continue;
        };
        let default_implementation = if implementations.contains_key(&gate.default_implementation) {
            gate.default_implementation.clone()
        } else {
            first
        };
        let override_default_implementation = gate
            .override_default_implementation
            .iter()
            .filter(|(locus, _)| !locus.iter().any(|c| architecture.is_resonator(c)))
            .map(|(locus, implementation)| (locus.clone(), implementation.clone()))
            .collect();
        gates.insert(
            name.clone(),
            GateInfo {
                implementations,
                default_implementation,
                override_default_implementation,
            },
        );
    }

    DynamicQuantumArchitecture {
        calibration_set_id: architecture.calibration_set_id,
        qubits: architecture.qubits.clone(),
        computational_resonators: Vec::new(),
        gates,
    }
}
