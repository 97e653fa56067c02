//! Named circuits of native instructions.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{IrError, IrResult};
use crate::instruction::Instruction;

/// A named, non-empty sequence of native instructions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCircuit", into = "RawCircuit")]
pub struct Circuit {
    name: String,
    instructions: Vec<Instruction>,
    metadata: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawCircuit {
    name: String,
    instructions: Vec<Instruction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<Value>,
}

impl TryFrom<RawCircuit> for Circuit {
    type Error = IrError;

    fn try_from(raw: RawCircuit) -> IrResult<Self> {
        let circuit = Circuit::new(raw.name, raw.instructions)?;
        Ok(match raw.metadata {
            Some(metadata) => circuit.with_metadata(metadata),
            None => circuit,
        })
    }
}

impl From<Circuit> for RawCircuit {
    fn from(circuit: Circuit) -> Self {
        Self {
            name: circuit.name,
            instructions: circuit.instructions,
            metadata: circuit.metadata,
        }
    }
}

impl Circuit {
    /// Create a circuit. The name must be non-empty and there must be at least one instruction.
    pub fn new(name: impl Into<String>, instructions: Vec<Instruction>) -> IrResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(IrError::EmptyCircuitName);
        }
        if instructions.is_empty() {
            return Err(IrError::EmptyCircuit);
        }
        Ok(Self {
            name,
            instructions,
            metadata: None,
        })
    }

    /// Attach arbitrary metadata.
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Same name and metadata, different instructions.
    pub fn with_instructions(&self, instructions: Vec<Instruction>) -> IrResult<Self> {
        let mut circuit = Circuit::new(self.name.clone(), instructions)?;
        circuit.metadata = self.metadata.clone();
        Ok(circuit)
    }

    /// Circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instructions in order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Metadata, if any.
    pub fn metadata(&self) -> Option<&Value> {
        self.metadata.as_ref()
    }

    /// All component names used by the circuit.
    pub fn all_qubits(&self) -> BTreeSet<String> {
        self.instructions
            .iter()
            .flat_map(|inst| inst.qubits().iter().cloned())
            .collect()
    }

    /// Check if any instruction is a MOVE.
    pub fn contains_moves(&self) -> bool {
        self.instructions.iter().any(Instruction::is_move)
    }
}
