//! IQM native circuit model
//!
//! This crate provides the data model shared by the transpiler and the job client:
//! native instructions, circuits, loci and the architecture descriptions returned by
//! the server.
//!
//! # Core Components
//!
//! - **Instruction table**: [`operation`] describes every supported instruction
//!   (arity, arguments, directedness, locus check) in one static table
//! - **Instructions**: [`Instruction`] is a validated, immutable native operation
//! - **Circuits**: [`Circuit`] is a named, non-empty instruction sequence
//! - **Loci**: [`Locus`] and natural component ordering (`QB2 < QB10`)
//! - **Architectures**: [`DynamicQuantumArchitecture`] (calibrated gates and loci) and
//!   [`QuantumArchitectureSpecification`] (static operation table)
//!
//! # Example
//!
//! ```rust
//! use iqm_ir::{Circuit, Instruction};
//!
//! let circuit = Circuit::new(
//!     "bell",
//!     vec![
//!         Instruction::prx("QB1", 0.25, 0.0),
//!         Instruction::cz("QB1", "QB2"),
//!         Instruction::measure(["QB1", "QB2"], "m"),
//!     ],
//! )
//! .unwrap();
//!
//! assert_eq!(circuit.all_qubits().len(), 2);
//! assert!(!circuit.contains_moves());
//! ```
//!
//! # Supported Instructions
//!
//! | Name | Qubits | Arguments | Locus check |
//! |------|--------|-----------|-------------|
//! | `prx` | 1 | `angle_t`, `phase_t` | exact |
//! | `cz` | 2 | none | exact, either orientation |
//! | `move` | 2 | none | exact, qubit then resonator |
//! | `measure` | any | `key` | any combination |
//! | `barrier` | any | none | components must exist |

pub mod architecture;
pub mod circuit;
pub mod error;
pub mod instruction;
pub mod locus;
pub mod operation;

pub use architecture::{
    DynamicQuantumArchitecture, GateImplementationInfo, GateInfo, QuantumArchitecture,
    QuantumArchitectureSpecification,
};
pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use instruction::Instruction;
pub use locus::{Locus, locus, natural_cmp};
pub use operation::{ArgType, LocusCheck, NativeOperation};

/// Mapping from logical qubit names to physical component names.
pub type QubitMapping = rustc_hash::FxHashMap<String, String>;
