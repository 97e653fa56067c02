//! The native instruction table.
//!
//! Every instruction accepted by the server is described by one [`NativeOperation`]
//! row: its arity, argument signature, directedness and how its locus is checked
//! against an architecture. Deprecated names carry the name they were renamed to and
//! are canonicalized when an [`Instruction`](crate::Instruction) is built.

use serde_json::Value;

/// Name of the MOVE instruction.
pub const MOVE: &str = "move";
/// Name of the CZ instruction.
pub const CZ: &str = "cz";
/// Name of the PRX instruction.
pub const PRX: &str = "prx";
/// Name of the measurement instruction.
pub const MEASURE: &str = "measure";
/// Name of the barrier instruction.
pub const BARRIER: &str = "barrier";

/// How the locus of an instruction is checked against an architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocusCheck {
    /// No calibration needed; every component only has to exist on the QPU.
    Skip,
    /// Each component must appear in some allowed locus, in any combination.
    AnyCombination,
    /// The locus must match an allowed locus (in either orientation if undirected).
    Exact,
}

/// Type of an instruction argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    /// JSON string.
    Str,
    /// JSON number (integer or float).
    Number,
}

impl ArgType {
    /// Check whether a JSON value has this type.
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ArgType::Str => value.is_string(),
            ArgType::Number => value.is_number(),
        }
    }

    /// Human readable type name.
    pub fn as_str(self) -> &'static str {
        match self {
            ArgType::Str => "string",
            ArgType::Number => "number",
        }
    }
}

/// One row of the instruction table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeOperation {
    /// Instruction name.
    pub name: &'static str,
    /// Fixed number of qubits, or `None` for any number.
    pub arity: Option<usize>,
    /// Argument names and their types.
    pub args: &'static [(&'static str, ArgType)],
    /// Whether the architecture loci are direction sensitive.
    pub directed: bool,
    /// Locus checking policy.
    pub locus_check: LocusCheck,
    /// Current name if this name is deprecated.
    pub renamed_to: Option<&'static str>,
}

const NO_ARGS: &[(&str, ArgType)] = &[];
const MEASURE_ARGS: &[(&str, ArgType)] = &[("key", ArgType::Str)];
const PRX_ARGS: &[(&str, ArgType)] = &[("angle_t", ArgType::Number), ("phase_t", ArgType::Number)];

/// All supported native instructions, in table order.
pub const SUPPORTED_OPERATIONS: &[NativeOperation] = &[
    NativeOperation {
        name: BARRIER,
        arity: None,
        args: NO_ARGS,
        directed: false,
        locus_check: LocusCheck::Skip,
        renamed_to: None,
    },
    NativeOperation {
        name: CZ,
        arity: Some(2),
        args: NO_ARGS,
        directed: false,
        locus_check: LocusCheck::Exact,
        renamed_to: None,
    },
    NativeOperation {
        name: MOVE,
        arity: Some(2),
        args: NO_ARGS,
        directed: true,
        locus_check: LocusCheck::Exact,
        renamed_to: None,
    },
    NativeOperation {
        name: MEASURE,
        arity: None,
        args: MEASURE_ARGS,
        directed: false,
        locus_check: LocusCheck::AnyCombination,
        renamed_to: None,
    },
    NativeOperation {
        name: "measurement",
        arity: None,
        args: MEASURE_ARGS,
        directed: false,
        locus_check: LocusCheck::AnyCombination,
        renamed_to: Some(MEASURE),
    },
    NativeOperation {
        name: PRX,
        arity: Some(1),
        args: PRX_ARGS,
        directed: false,
        locus_check: LocusCheck::Exact,
        renamed_to: None,
    },
    NativeOperation {
        name: "phased_rx",
        arity: Some(1),
        args: PRX_ARGS,
        directed: false,
        locus_check: LocusCheck::Exact,
        renamed_to: Some(PRX),
    },
];

/// Look up a table row by name (deprecated names included).
pub fn lookup(name: &str) -> Option<&'static NativeOperation> {
    SUPPORTED_OPERATIONS.iter().find(|op| op.name == name)
}

/// Return the current name for a possibly deprecated instruction name.
///
/// Unknown names are returned unchanged.
pub fn current_name(name: &str) -> &str {
    match lookup(name).and_then(|op| op.renamed_to) {
        Some(renamed) => renamed,
        None => name,
    }
}

/// Check if the instruction acts on more than one qubit.
pub fn is_multi_qubit(name: &str) -> bool {
    lookup(name).is_some_and(|op| op.arity.is_some_and(|a| a > 1))
}

/// Check if the architecture loci of the instruction are direction sensitive.
pub fn is_directed(name: &str) -> bool {
    lookup(name).is_some_and(|op| op.directed)
}

/// Comma separated list of all supported names.
pub(crate) fn supported_names() -> String {
    SUPPORTED_OPERATIONS
        .iter()
        .map(|op| op.name)
        .collect::<Vec<_>>()
        .join(", ")
}
