//! Integration tests for MOVE insertion and removal on star architectures.

mod common;

use common::*;
use iqm_compile::{
    CompileError, ExistingMoveHandling, simplified_architecture, transpile_insert_moves,
    transpile_remove_moves,
};
use iqm_ir::{Circuit, DynamicQuantumArchitecture, GateInfo, Instruction, QubitMapping, locus};

const ALL_OPTIONS: [ExistingMoveHandling; 3] = [
    ExistingMoveHandling::Keep,
    ExistingMoveHandling::Trust,
    ExistingMoveHandling::Remove,
];

fn insert(circuit: &Circuit, option: Option<ExistingMoveHandling>) -> Result<Circuit, CompileError> {
    transpile_insert_moves(circuit, &sample_move_architecture(), option, None)
}

// ============================================================================
// Architectures without resonators
// ============================================================================

#[test]
fn test_no_moves_supported() {
    let arch = sample_dynamic_architecture();
    for option in ALL_OPTIONS {
        let c1 = transpile_insert_moves(&simple_circuit(), &arch, Some(option), None).unwrap();
        assert_eq!(c1, simple_circuit());

        let result = transpile_insert_moves(&safe_circuit(), &arch, Some(option), None);
        if option == ExistingMoveHandling::Remove {
            let c2 = result.unwrap();
            assert!(!c2.contains_moves());
            assert!(equivalent_without_moves(&safe_circuit(), &c2));
        } else {
            assert!(matches!(result, Err(CompileError::Configuration(_))));
        }
    }
}

#[test]
fn test_simplified_architecture_without_resonators_is_unchanged() {
    let arch = sample_dynamic_architecture();
    assert_eq!(simplified_architecture(&arch), arch);
}

// ============================================================================
// Existing MOVE handling
// ============================================================================

#[test]
fn test_unspecified_inserts_moves() {
    let c1 = insert(&simple_circuit(), None).unwrap();
    assert_valid(&sample_move_architecture(), &c1, None);
    assert!(equivalent_without_moves(&c1, &simple_circuit()));
    assert_eq!(
        c1.instructions(),
        [
            prx("QB1"),
            Instruction::cz("QB1", "COMP_R"),
            Instruction::cz("QB2", "COMP_R"),
            Instruction::move_to("QB3", "COMP_R"),
            Instruction::cz("QB1", "COMP_R"),
            Instruction::move_to("QB3", "COMP_R"),
            prx("QB3"),
        ]
    );
}

#[test]
fn test_unspecified_removes_existing_moves() {
    let c2 = insert(&safe_circuit(), None).unwrap();
    assert!(equivalent_without_moves(&c2, &safe_circuit()));
    assert_eq!(c2, insert(&safe_circuit(), Some(ExistingMoveHandling::Remove)).unwrap());
}

#[test]
fn test_normal_usage() {
    for option in ALL_OPTIONS {
        let c1 = insert(&simple_circuit(), Some(option)).unwrap();
        assert_valid(&sample_move_architecture(), &c1, None);
        assert!(equivalent_without_moves(&c1, &simple_circuit()));

        // QB1 and QB2 share no resonator
        let err = insert(&sample_circuit(), Some(option)).unwrap_err();
        assert!(err.is_transpilation(), "{option}: {err}");
    }
}

#[test]
fn test_keep() {
    let c1 = insert(&safe_circuit(), Some(ExistingMoveHandling::Keep)).unwrap();
    assert_valid(&sample_move_architecture(), &c1, None);
    assert!(contains_moves_in_order(&c1, &moves_of(&safe_circuit())));

    let err = insert(&unsafe_circuit(), Some(ExistingMoveHandling::Keep)).unwrap_err();
    assert!(err.is_transpilation());
    assert!(err.to_string().contains("after validation error"));

    let err = insert(&ambiguous_circuit(), Some(ExistingMoveHandling::Keep)).unwrap_err();
    assert!(err.is_transpilation());
}

#[test]
fn test_trust() {
    for circuit in [safe_circuit(), unsafe_circuit(), ambiguous_circuit()] {
        let c1 = insert(&circuit, Some(ExistingMoveHandling::Trust)).unwrap();
        assert_valid(&sample_move_architecture(), &c1, None);
        assert!(contains_moves_in_order(&c1, &moves_of(&circuit)), "{}", circuit.name());
    }
}

#[test]
fn test_trust_resets_before_single_qubit_gate() {
    let c = insert(&unsafe_circuit(), Some(ExistingMoveHandling::Trust)).unwrap();
    assert_eq!(
        c.instructions(),
        [
            prx("QB1"),
            Instruction::move_to("QB3", "COMP_R"),
            Instruction::move_to("QB3", "COMP_R"),
            prx("QB3"),
            Instruction::move_to("QB3", "COMP_R"),
            Instruction::move_to("QB3", "COMP_R"),
        ]
    );
}

#[test]
fn test_remove() {
    for circuit in [safe_circuit(), unsafe_circuit(), ambiguous_circuit()] {
        let moves = moves_of(&circuit);
        let c1 = transpile_remove_moves(&circuit).unwrap();
        assert!(!c1.contains_moves());
        assert!(!contains_moves_in_order(&c1, &moves));

        let with = insert(&c1, Some(ExistingMoveHandling::Remove)).unwrap();
        let direct = insert(&circuit, Some(ExistingMoveHandling::Remove)).unwrap();
        assert_eq!(with, direct);
        assert!(equivalent_without_moves(&c1, &with));
        assert!(equivalent_without_moves(&c1, &direct));
    }
}

#[test]
fn test_only_moves_is_transpilation_error() {
    let circuit = Circuit::new(
        "only_moves",
        vec![
            Instruction::move_to("QB3", "COMP_R"),
            Instruction::move_to("QB3", "COMP_R"),
        ],
    )
    .unwrap();

    for option in [None, Some(ExistingMoveHandling::Remove)] {
        let err = insert(&circuit, option).unwrap_err();
        assert!(matches!(err, CompileError::Transpilation(_)));
        assert_eq!(
            err.to_string(),
            "Circuit 'only_moves' contains only MOVE instructions and is empty without them."
        );
    }
    assert!(matches!(
        transpile_remove_moves(&circuit),
        Err(CompileError::Transpilation(_))
    ));
    assert_eq!(insert(&circuit, Some(ExistingMoveHandling::Trust)).unwrap(), circuit);
}

#[test]
fn test_remove_insert_remove_is_stable() {
    for circuit in [safe_circuit(), unsafe_circuit(), ambiguous_circuit(), simple_circuit()] {
        let removed = transpile_remove_moves(&circuit).unwrap();
        for option in [ExistingMoveHandling::Trust, ExistingMoveHandling::Remove] {
            let inserted = insert(&removed, Some(option)).unwrap();
            let again = transpile_remove_moves(&inserted).unwrap();
            assert!(equivalent_without_moves(&again, &removed), "{}", circuit.name());
        }
    }
}

// ============================================================================
// Qubit mapping and broken input
// ============================================================================

#[test]
fn test_with_qubit_map() {
    let (circuit, mapping) = mapped_circuit();
    for option in ALL_OPTIONS {
        let c1 = transpile_insert_moves(&circuit, &sample_move_architecture(), Some(option), Some(&mapping))
            .unwrap();
        assert_valid(&sample_move_architecture(), &c1, Some(&mapping));
        assert!(equivalent_without_moves(&c1, &circuit));
        assert_eq!(
            c1.instructions(),
            [
                prx("A"),
                Instruction::move_to("A", "COMP_R"),
                Instruction::cz("B", "COMP_R"),
                Instruction::move_to("A", "COMP_R"),
            ]
        );
    }
}

#[test]
fn test_circuit_on_nonexisting_qubit() {
    let circuit = Circuit::new("QB5 does not exist", vec![prx("QB5")]).unwrap();
    let mapping = QubitMapping::from_iter([("QB5".to_string(), "QB5".to_string())]);
    let err = transpile_insert_moves(&circuit, &sample_move_architecture(), None, Some(&mapping))
        .unwrap_err();
    assert!(err.is_transpilation());
}

#[test]
fn test_unmapped_qubit_is_transpilation_error() {
    let (circuit, _) = mapped_circuit();
    let mapping = QubitMapping::from_iter([("A".to_string(), "QB3".to_string())]);
    let err = transpile_insert_moves(&circuit, &sample_move_architecture(), None, Some(&mapping))
        .unwrap_err();
    assert_eq!(
        err,
        CompileError::Transpilation(
            "Unable to transpile the circuit: qubit B is not in the qubit mapping.".into()
        )
    );
}

// ============================================================================
// Multiple resonators and CZ orientation
// ============================================================================

#[test]
fn test_multiple_resonators() {
    let mut arch = sample_move_architecture();
    extend_default_loci(&mut arch, "move", vec![locus(["QB1", "COMP_R2"])]);
    let circuit = Circuit::new(
        "multi resonators",
        vec![
            Instruction::cz("QB1", "QB2"),
            Instruction::cz("QB2", "QB3"),
            Instruction::cz("QB1", "QB3"),
        ],
    )
    .unwrap();

    // QB1 can reach COMP_R2, but no CZ is calibrated there
    let err = transpile_insert_moves(&circuit, &arch, None, None).unwrap_err();
    assert!(err.is_transpilation());

    let extra = arch.components().into_iter().map(|c| locus([c, "COMP_R2".to_string()])).collect();
    extend_default_loci(&mut arch, "cz", extra);
    let transpiled = transpile_insert_moves(&circuit, &arch, None, None).unwrap();
    assert_valid(&arch, &transpiled, None);
    assert!(equivalent_without_moves(&circuit, &transpiled));
    assert_eq!(
        transpiled.instructions(),
        [
            Instruction::move_to("QB1", "COMP_R2"),
            Instruction::cz("QB2", "COMP_R2"),
            Instruction::move_to("QB3", "COMP_R"),
            Instruction::cz("QB2", "COMP_R"),
            Instruction::move_to("QB1", "COMP_R2"),
            Instruction::cz("QB1", "COMP_R"),
            Instruction::move_to("QB3", "COMP_R"),
        ]
    );
}

/// Helper: two qubits that can both be moved into `COMP_R`, CZ only on `(QB2, COMP_R)`.
fn unavailable_cz_architecture() -> DynamicQuantumArchitecture {
    DynamicQuantumArchitecture::new(
        uuid::Uuid::parse_str("0c5a5624-2faf-4885-888c-805af891479c").unwrap(),
        ["QB1", "QB2"],
        ["COMP_R"],
    )
    .with_gate(
        "prx",
        GateInfo::new("drag_gaussian")
            .with_implementation("drag_gaussian", vec![locus(["QB1"]), locus(["QB2"])]),
    )
    .with_gate(
        "cz",
        GateInfo::new("tgss").with_implementation("tgss", vec![locus(["QB2", "COMP_R"])]),
    )
    .with_gate(
        "move",
        GateInfo::new("tgss_crf").with_implementation(
            "tgss_crf",
            vec![locus(["QB1", "COMP_R"]), locus(["QB2", "COMP_R"])],
        ),
    )
    .with_gate(
        "measure",
        GateInfo::new("constant").with_implementation("constant", vec![locus(["QB1"]), locus(["QB2"])]),
    )
}

#[test]
fn test_unavailable_cz_either_orientation() {
    let arch = unavailable_cz_architecture();
    for (a, b) in [("QB1", "QB2"), ("QB2", "QB1")] {
        let circuit = Circuit::new(
            "bell",
            vec![prx("QB1"), prx("QB2"), Instruction::cz(a, b), prx("QB2")],
        )
        .unwrap();
        let transpiled = transpile_insert_moves(&circuit, &arch, None, None).unwrap();
        assert_valid(&arch, &transpiled, None);
        assert_eq!(
            transpiled.instructions(),
            [
                prx("QB1"),
                prx("QB2"),
                Instruction::move_to("QB1", "COMP_R"),
                Instruction::cz("QB2", "COMP_R"),
                prx("QB2"),
                Instruction::move_to("QB1", "COMP_R"),
            ]
        );
    }
}

#[test]
fn test_single_cz_through_resonator() {
    let arch = DynamicQuantumArchitecture::new(Default::default(), ["QB1", "QB2", "QB3"], ["R"])
        .with_gate(
            "cz",
            GateInfo::new("tgss").with_implementation(
                "tgss",
                vec![locus(["QB1", "R"]), locus(["QB2", "R"]), locus(["QB3", "R"])],
            ),
        )
        .with_gate(
            "move",
            GateInfo::new("tgss_crf")
                .with_implementation("tgss_crf", vec![locus(["QB1", "R"]), locus(["QB2", "R"])]),
        );
    let circuit = Circuit::new("cz", vec![Instruction::cz("QB1", "QB2")]).unwrap();

    let transpiled = transpile_insert_moves(&circuit, &arch, None, None).unwrap();
    assert_valid(&arch, &transpiled, None);
    assert_eq!(
        transpiled.instructions(),
        [
            Instruction::move_to("QB1", "R"),
            Instruction::cz("QB2", "R"),
            Instruction::move_to("QB1", "R"),
        ]
    );
    assert_eq!(transpile_remove_moves(&transpiled).unwrap().instructions(), [Instruction::cz("QB2", "QB1")]);
}

#[test]
fn test_metadata_survives_transpilation() {
    let circuit = simple_circuit().with_metadata(serde_json::json!({"experiment": "ghz"}));
    let transpiled = insert(&circuit, None).unwrap();
    assert_eq!(transpiled.name(), "simple");
    assert_eq!(transpiled.metadata(), circuit.metadata());
}
