//! Native instructions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{IrError, IrResult};
use crate::locus::Locus;
use crate::operation::{self, BARRIER, CZ, MEASURE, MOVE, PRX};

/// A native instruction acting on named QPU components.
///
/// Instructions are validated against the instruction table on construction:
/// unknown names, wrong arity and malformed arguments are rejected, and
/// deprecated names are replaced by their current name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawInstruction", into = "RawInstruction")]
pub struct Instruction {
    name: String,
    implementation: Option<String>,
    qubits: Locus,
    args: BTreeMap<String, Value>,
}

/// Unvalidated wire form of an instruction.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawInstruction {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    implementation: Option<String>,
    qubits: Vec<String>,
    #[serde(default)]
    args: BTreeMap<String, Value>,
}

impl TryFrom<RawInstruction> for Instruction {
    type Error = IrError;

    fn try_from(raw: RawInstruction) -> IrResult<Self> {
        Instruction::new(raw.name, raw.implementation, raw.qubits, raw.args)
    }
}

impl From<Instruction> for RawInstruction {
    fn from(inst: Instruction) -> Self {
        Self {
            name: inst.name,
            implementation: inst.implementation,
            qubits: inst.qubits,
            args: inst.args,
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn name_list<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let joined = names.into_iter().collect::<Vec<_>>().join(", ");
    if joined.is_empty() { "no".into() } else { joined }
}

impl Instruction {
    /// Build and validate an instruction.
    pub fn new(
        name: impl Into<String>,
        implementation: Option<String>,
        qubits: impl IntoIterator<Item = impl Into<String>>,
        args: BTreeMap<String, Value>,
    ) -> IrResult<Self> {
        let name = name.into();
        let qubits: Locus = qubits.into_iter().map(Into::into).collect();

        let op = operation::lookup(&name).ok_or_else(|| IrError::UnknownInstruction {
            name: name.clone(),
            supported: operation::supported_names(),
        })?;

        if implementation.as_deref() == Some("") {
            return Err(IrError::EmptyImplementation);
        }

        if let Some(arity) = op.arity {
            if qubits.len() != arity {
                return Err(IrError::ArityMismatch {
                    name,
                    arity,
                    given: qubits.len(),
                    qubits,
                });
            }
        }

        let names_match = args.len() == op.args.len()
            && op.args.iter().all(|(arg, _)| args.contains_key(*arg));
        if !names_match {
            return Err(IrError::ArgumentNames {
                name,
                expected: name_list(op.args.iter().map(|(arg, _)| *arg)),
                given: name_list(args.keys().map(String::as_str)),
            });
        }

        for (arg, ty) in op.args {
            if let Some(value) = args.get(*arg) {
                if !ty.accepts(value) {
                    return Err(IrError::ArgumentType {
                        argument: (*arg).to_string(),
                        expected: ty.as_str(),
                        given: json_type(value),
                    });
                }
            }
        }

        let name = op.renamed_to.unwrap_or(op.name).to_string();
        Ok(Self {
            name,
            implementation,
            qubits,
            args,
        })
    }

    fn known(name: &str, qubits: Locus, args: BTreeMap<String, Value>) -> Self {
        Self {
            name: name.to_string(),
            implementation: None,
            qubits,
            args,
        }
    }

    /// Phased x-rotation. Angles are in full turns.
    pub fn prx(qubit: impl Into<String>, angle_t: f64, phase_t: f64) -> Self {
        let args = BTreeMap::from([
            ("angle_t".to_string(), Value::from(angle_t)),
            ("phase_t".to_string(), Value::from(phase_t)),
        ]);
        Self::known(PRX, vec![qubit.into()], args)
    }

    /// Controlled-Z between two components.
    pub fn cz(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::known(CZ, vec![a.into(), b.into()], BTreeMap::new())
    }

    /// MOVE the state of `qubit` into (or back out of) `resonator`.
    pub fn move_to(qubit: impl Into<String>, resonator: impl Into<String>) -> Self {
        Self::known(MOVE, vec![qubit.into(), resonator.into()], BTreeMap::new())
    }

    /// Measure the given qubits under a measurement key.
    pub fn measure(
        qubits: impl IntoIterator<Item = impl Into<String>>,
        key: impl Into<String>,
    ) -> Self {
        let args = BTreeMap::from([("key".to_string(), Value::from(key.into()))]);
        Self::known(MEASURE, qubits.into_iter().map(Into::into).collect(), args)
    }

    /// Barrier across the given components.
    pub fn barrier(qubits: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::known(BARRIER, qubits.into_iter().map(Into::into).collect(), BTreeMap::new())
    }

    /// Select a specific gate implementation.
    pub fn with_implementation(mut self, implementation: impl Into<String>) -> IrResult<Self> {
        let implementation = implementation.into();
        if implementation.is_empty() {
            return Err(IrError::EmptyImplementation);
        }
        self.implementation = Some(implementation);
        Ok(self)
    }

    /// Drop the requested implementation so the default one is used.
    pub fn without_implementation(mut self) -> Self {
        self.implementation = None;
        self
    }

    /// Copy of this instruction acting on a different locus of the same length.
    pub fn with_qubits(&self, qubits: Locus) -> Self {
        debug_assert_eq!(qubits.len(), self.qubits.len());
        Self {
            name: self.name.clone(),
            implementation: self.implementation.clone(),
            qubits,
            args: self.args.clone(),
        }
    }

    /// Instruction name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Requested implementation, if any.
    pub fn implementation(&self) -> Option<&str> {
        self.implementation.as_deref()
    }

    /// Components the instruction acts on.
    pub fn qubits(&self) -> &[String] {
        &self.qubits
    }

    /// Instruction arguments.
    pub fn args(&self) -> &BTreeMap<String, Value> {
        &self.args
    }

    /// Check if this is a MOVE.
    pub fn is_move(&self) -> bool {
        self.name == MOVE
    }

    /// Check if this is a CZ.
    pub fn is_cz(&self) -> bool {
        self.name == CZ
    }

    /// Measurement key, if this is a measurement.
    pub fn measurement_key(&self) -> Option<&str> {
        if self.name != MEASURE {
            return None;
        }
        self.args.get("key").and_then(Value::as_str)
    }
}
