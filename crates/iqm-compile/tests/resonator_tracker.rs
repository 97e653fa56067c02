//! Property tests for the resonator state tracker and the MOVE round trip.

mod common;

use common::{assert_valid, equivalent_without_moves};
use iqm_compile::{ExistingMoveHandling, ResonatorStateTracker, transpile_insert_moves, transpile_remove_moves};
use iqm_ir::{Circuit, DynamicQuantumArchitecture, GateInfo, Instruction, locus};
use proptest::prelude::*;
use rustc_hash::FxHashSet;

const QUBITS: [&str; 3] = ["QB1", "QB2", "QB3"];
const RESONATORS: [&str; 3] = ["R1", "R2", "R3"];

/// Helper: every resonator reaches two of the three qubits.
fn triangle_tracker() -> ResonatorStateTracker {
    let moves = |qs: [&str; 2]| qs.iter().map(|q| q.to_string()).collect::<Vec<_>>();
    ResonatorStateTracker::new([
        ("R1".to_string(), moves(["QB1", "QB2"])),
        ("R2".to_string(), moves(["QB2", "QB3"])),
        ("R3".to_string(), moves(["QB1", "QB3"])),
    ])
}

/// Helper: one resonator `R` with CZ and MOVE calibrated for every qubit.
fn full_star() -> DynamicQuantumArchitecture {
    let with_r = || QUBITS.iter().map(|q| locus([*q, "R"])).collect::<Vec<_>>();
    DynamicQuantumArchitecture::new(Default::default(), QUBITS, ["R"])
        .with_gate(
            "prx",
            GateInfo::new("drag_gaussian")
                .with_implementation("drag_gaussian", QUBITS.iter().map(|q| locus([*q])).collect()),
        )
        .with_gate("cz", GateInfo::new("tgss").with_implementation("tgss", with_r()))
        .with_gate("move", GateInfo::new("tgss_crf").with_implementation("tgss_crf", with_r()))
}

fn check_tracker_invariant(tracker: &ResonatorStateTracker) -> Result<(), TestCaseError> {
    let mut owners = FxHashSet::default();
    for resonator in tracker.resonators() {
        let owner = tracker.owner(resonator).unwrap_or_default();
        if owner == resonator.as_str() {
            continue;
        }
        prop_assert!(tracker.available_moves(resonator).iter().any(|q| q == owner));
        prop_assert!(owners.insert(owner.to_string()), "{owner} held twice");
    }
    Ok(())
}

fn arb_move() -> impl Strategy<Value = (usize, usize)> {
    (0..QUBITS.len(), 0..RESONATORS.len())
}

fn arb_simplified_instruction() -> impl Strategy<Value = Instruction> {
    prop_oneof![
        (0..3usize).prop_map(|q| Instruction::prx(QUBITS[q], 0.5, 0.0)),
        (0..3usize, 1..3usize).prop_map(|(a, d)| Instruction::cz(QUBITS[a], QUBITS[(a + d) % 3])),
    ]
}

fn arb_simplified_circuit() -> impl Strategy<Value = Circuit> {
    prop::collection::vec(arb_simplified_instruction(), 1..20)
        .prop_map(|instructions| Circuit::new("random", instructions).unwrap())
}

// ============================================================================
// Tracker invariants
// ============================================================================

proptest! {
    #[test]
    fn prop_tracker_owners_stay_consistent(moves in prop::collection::vec(arb_move(), 0..40)) {
        let mut tracker = triangle_tracker();
        for (q, r) in moves {
            let before = tracker.clone();
            if tracker.apply_move(QUBITS[q], RESONATORS[r]).is_err() {
                prop_assert_eq!(&tracker, &before);
            }
            check_tracker_invariant(&tracker)?;
        }
    }

    #[test]
    fn prop_reset_empties_every_resonator(moves in prop::collection::vec(arb_move(), 0..40)) {
        let mut tracker = triangle_tracker();
        for (q, r) in moves {
            let _ = tracker.apply_move(QUBITS[q], RESONATORS[r]);
        }
        tracker.reset_as_move_instructions(None, None).unwrap();
        for resonator in RESONATORS {
            prop_assert_eq!(tracker.owner(resonator), Some(resonator));
        }
    }
}

// ============================================================================
// Insert / remove round trip
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_insert_then_remove_is_equivalent(circuit in arb_simplified_circuit()) {
        let arch = full_star();
        let inserted = transpile_insert_moves(&circuit, &arch, None, None).unwrap();
        assert_valid(&arch, &inserted, None);
        prop_assert!(equivalent_without_moves(&inserted, &circuit));

        let removed = transpile_remove_moves(&inserted).unwrap();
        let again = transpile_insert_moves(&removed, &arch, Some(ExistingMoveHandling::Trust), None).unwrap();
        prop_assert!(equivalent_without_moves(&again, &removed));
    }
}
