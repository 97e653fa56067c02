//! Quantum architecture models.
//!
//! Two descriptions of a QPU exist:
//!
//! - [`DynamicQuantumArchitecture`] (DQA): the calibrated view returned for a
//!   calibration set. It lists qubits, computational resonators and, for every gate,
//!   the loci each implementation has been calibrated for. All validation and
//!   transpilation runs against this view.
//! - [`QuantumArchitectureSpecification`]: the static description with an
//!   operation → loci table and qubit connectivity.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{IrError, IrResult};
use crate::locus::{Locus, locus_keyed, sort_components, sort_loci};
use crate::operation::{self, MOVE};

/// Calibrated loci of one gate implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateImplementationInfo {
    /// Loci for which this implementation has been calibrated.
    pub loci: Vec<Locus>,
}

/// A gate and its calibrated implementations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateInfo {
    /// Implementation name → calibrated loci.
    pub implementations: BTreeMap<String, GateImplementationInfo>,
    /// Implementation used unless overridden for a locus or requested explicitly.
    pub default_implementation: String,
    /// Per-locus overrides of the default implementation.
    #[serde(default, with = "locus_keyed")]
    pub override_default_implementation: BTreeMap<Locus, String>,
}

impl GateInfo {
    /// A gate with no implementations yet.
    pub fn new(default_implementation: impl Into<String>) -> Self {
        Self {
            implementations: BTreeMap::new(),
            default_implementation: default_implementation.into(),
            override_default_implementation: BTreeMap::new(),
        }
    }

    /// Add an implementation calibrated for the given loci.
    pub fn with_implementation(mut self, name: impl Into<String>, loci: Vec<Locus>) -> Self {
        self.implementations
            .insert(name.into(), GateImplementationInfo { loci });
        self
    }

    /// Override the default implementation for one locus.
    pub fn with_override(mut self, locus: Locus, implementation: impl Into<String>) -> Self {
        self.override_default_implementation
            .insert(locus, implementation.into());
        self
    }

    /// Union of the loci of all implementations, deduplicated and naturally sorted.
    pub fn loci(&self) -> Vec<Locus> {
        let mut loci: Vec<Locus> = self
            .implementations
            .values()
            .flat_map(|info| info.loci.iter().cloned())
            .collect();
        sort_loci(&mut loci);
        loci
    }

    /// Implementation used for a locus when none is requested.
    pub fn implementation_for(&self, locus: &[String]) -> &str {
        self.override_default_implementation
            .get(locus)
            .unwrap_or(&self.default_implementation)
    }
}

/// Calibrated view of a QPU for one calibration set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicQuantumArchitecture {
    /// Calibration set this view was generated from.
    pub calibration_set_id: Uuid,
    /// Qubits that appear in at least one gate locus.
    pub qubits: Vec<String>,
    /// Computational resonators that appear in at least one gate locus.
    pub computational_resonators: Vec<String>,
    /// Gate name → gate information.
    pub gates: BTreeMap<String, GateInfo>,
}

impl DynamicQuantumArchitecture {
    /// An architecture with no gates.
    pub fn new(
        calibration_set_id: Uuid,
        qubits: impl IntoIterator<Item = impl Into<String>>,
        computational_resonators: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            calibration_set_id,
            qubits: qubits.into_iter().map(Into::into).collect(),
            computational_resonators: computational_resonators.into_iter().map(Into::into).collect(),
            gates: BTreeMap::new(),
        }
    }

    /// Add or replace a gate.
    pub fn with_gate(mut self, name: impl Into<String>, gate: GateInfo) -> Self {
        self.gates.insert(name.into(), gate);
        self
    }

    /// All qubits and resonators in natural order.
    pub fn components(&self) -> Vec<String> {
        let mut components: Vec<String> = self
            .qubits
            .iter()
            .chain(&self.computational_resonators)
            .cloned()
            .collect();
        sort_components(&mut components);
        components
    }

    /// Check if the component is a computational resonator.
    pub fn is_resonator(&self, component: &str) -> bool {
        self.computational_resonators.iter().any(|r| r == component)
    }

    /// Check if the component is a qubit.
    pub fn is_qubit(&self, component: &str) -> bool {
        self.qubits.iter().any(|q| q == component)
    }

    /// Check if the component exists on the QPU.
    pub fn has_component(&self, component: &str) -> bool {
        self.is_qubit(component) || self.is_resonator(component)
    }

    /// All loci of a gate, if the gate is calibrated.
    pub fn gate_loci(&self, name: &str) -> Option<Vec<Locus>> {
        self.gates.get(name).map(GateInfo::loci)
    }

    /// Check if MOVE is calibrated on this architecture.
    pub fn supports_move(&self) -> bool {
        self.gates.contains_key(MOVE)
    }

    /// Check internal consistency: qubits and resonators are disjoint and every gate
    /// locus only uses known components.
    pub fn check(&self) -> IrResult<()> {
        if let Some(shared) = self.qubits.iter().find(|q| self.is_resonator(q)) {
            return Err(IrError::InvalidArchitecture(format!(
                "{shared} is listed both as a qubit and as a computational resonator"
            )));
        }
        for (name, gate) in &self.gates {
            for (implementation, info) in &gate.implementations {
                for locus in &info.loci {
                    if let Some(unknown) = locus.iter().find(|c| !self.has_component(c)) {
                        return Err(IrError::InvalidArchitecture(format!(
                            "locus {locus:?} of {name}.{implementation} uses unknown component {unknown}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Static quantum architecture description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawArchitectureSpecification")]
pub struct QuantumArchitectureSpecification {
    /// Architecture name.
    pub name: String,
    /// Operation name → allowed loci.
    pub operations: BTreeMap<String, Vec<Locus>>,
    /// Qubit names.
    pub qubits: Vec<String>,
    /// Qubit pairs that are coupled.
    pub qubit_connectivity: Vec<Locus>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOperations {
    Loci(BTreeMap<String, Vec<Locus>>),
    Names(Vec<String>),
}

#[derive(Deserialize)]
struct RawArchitectureSpecification {
    name: String,
    operations: RawOperations,
    qubits: Vec<String>,
    qubit_connectivity: Vec<Locus>,
}

impl TryFrom<RawArchitectureSpecification> for QuantumArchitectureSpecification {
    type Error = IrError;

    fn try_from(raw: RawArchitectureSpecification) -> IrResult<Self> {
        let operations = match raw.operations {
            RawOperations::Loci(ops) => ops
                .into_iter()
                .map(|(name, loci)| (operation::current_name(&name).to_string(), loci))
                .collect(),
            RawOperations::Names(names) => names
                .iter()
                .map(|name| {
                    let name = operation::current_name(name);
                    let loci = if operation::is_multi_qubit(name) {
                        raw.qubit_connectivity.clone()
                    } else {
                        raw.qubits.iter().map(|q| vec![q.clone()]).collect()
                    };
                    (name.to_string(), loci)
                })
                .collect(),
        };
        if raw.name.is_empty() {
            return Err(IrError::InvalidArchitecture(
                "architecture name must not be empty".into(),
            ));
        }
        Ok(Self {
            name: raw.name,
            operations,
            qubits: raw.qubits,
            qubit_connectivity: raw.qubit_connectivity,
        })
    }
}

impl QuantumArchitectureSpecification {
    /// Check if both architectures support the same operations on the same loci.
    pub fn has_equivalent_operations(&self, other: &Self) -> bool {
        Self::compare_operations(&self.operations, &other.operations)
    }

    /// Compare two operation tables.
    ///
    /// Multi-qubit loci are compared as multisets, with undirected loci normalized so
    /// that `(a, b)` and `(b, a)` are the same. Other loci are compared as sets.
    pub fn compare_operations(
        ops1: &BTreeMap<String, Vec<Locus>>,
        ops2: &BTreeMap<String, Vec<Locus>>,
    ) -> bool {
        if !ops1.keys().eq(ops2.keys()) {
            return false;
        }
        ops1.iter().all(|(name, loci1)| {
            let Some(loci2) = ops2.get(name) else {
                return false;
            };
            if operation::is_multi_qubit(name) {
                let directed = operation::is_directed(name);
                normalized_loci(loci1, directed) == normalized_loci(loci2, directed)
            } else {
                loci1.iter().collect::<BTreeSet<_>>() == loci2.iter().collect::<BTreeSet<_>>()
            }
        })
    }
}

fn normalized_loci(loci: &[Locus], directed: bool) -> Vec<Locus> {
    let mut out: Vec<Locus> = loci
        .iter()
        .map(|locus| {
            let mut locus = locus.clone();
            if !directed {
                locus.sort();
            }
            locus
        })
        .collect();
    out.sort();
    out
}

/// Static architecture as returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantumArchitecture {
    /// The architecture details.
    pub quantum_architecture: QuantumArchitectureSpecification,
}
