//! IQM circuit validation and MOVE gate transpilation
//!
//! This crate checks native circuits against a calibrated architecture and rewrites
//! them for star architectures, where two-qubit gates go through a computational
//! resonator and qubit states are moved in and out with MOVE gates.
//!
//! # Overview
//!
//! ```text
//! Circuit (simplified view, no resonators)
//!       │
//!       ▼
//! transpile_insert_moves ◄── DynamicQuantumArchitecture + qubit mapping
//!       │
//!       ├── existing MOVEs: keep / trust / remove
//!       ├── CZ(q1, q2) ──► MOVE(q2, R) · CZ(q1, R) · ... · MOVE(q2, R)
//!       │
//!       ▼
//! Circuit (runs on the real architecture)
//!       │
//!       ▼
//! validate_circuit_instructions  (loci, measurement keys, MOVE sandwiches)
//! ```
//!
//! # Example
//!
//! ```rust
//! use iqm_compile::{transpile_insert_moves, transpile_remove_moves};
//! use iqm_ir::{Circuit, DynamicQuantumArchitecture, GateInfo, Instruction, locus};
//!
//! let arch = DynamicQuantumArchitecture::new(Default::default(), ["QB1", "QB2"], ["R"])
//!     .with_gate(
//!         "cz",
//!         GateInfo::new("tgss").with_implementation("tgss", vec![locus(["QB1", "R"])]),
//!     )
//!     .with_gate(
//!         "move",
//!         GateInfo::new("tgss_crf").with_implementation("tgss_crf", vec![locus(["QB2", "R"])]),
//!     );
//!
//! let circuit = Circuit::new("c", vec![Instruction::cz("QB1", "QB2")]).unwrap();
//! let native = transpile_insert_moves(&circuit, &arch, None, None).unwrap();
//! assert_eq!(
//!     native.instructions(),
//!     [
//!         Instruction::move_to("QB2", "R"),
//!         Instruction::cz("QB1", "R"),
//!         Instruction::move_to("QB2", "R"),
//!     ]
//! );
//! assert_eq!(transpile_remove_moves(&native).unwrap(), circuit);
//! ```
//!
//! # MOVE Validation Modes
//!
//! | Mode | Allowed on a qubit whose state is in a resonator |
//! |------|--------------------------------------------------|
//! | `strict` | barrier |
//! | `allow_prx` | barrier, prx |
//! | `none` | anything (no MOVE checks) |

pub mod error;
pub mod resonator;
pub mod simplify;
pub mod transpile;
pub mod validate;

pub use error::{CompileError, CompileResult};
pub use resonator::{NameMap, ResonatorStateTracker};
pub use simplify::simplified_architecture;
pub use transpile::{
    ExistingMoveHandling, check_remove_moves_precondition, transpile_insert_moves,
    transpile_remove_moves,
};
pub use validate::{
    MoveGateValidationMode, validate_circuit_instructions, validate_circuit_moves,
    validate_instruction,
};
