//! Job lifecycle types.
//!
//! A submitted job moves through these states on the server:
//!
//! ```text
//!   submit ──→ pending compilation ──→ pending execution ──→ ready
//!                     │                       │
//!                     ├───────────────────────┴──→ failed
//!                     └───────────────────────┴──→ aborted
//!
//!   ready | failed | aborted ──→ pending deletion ──→ deleted
//!                                       └──→ deletion failed
//! ```
//!
//! [`RunStatus`] is the light-weight status answer, [`RunResult`] the full
//! answer including measurements and the [`RunRequest`] echoed back as
//! metadata.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use iqm_compile::{MoveGateValidationMode, validate_circuit_instructions};
use iqm_ir::{Circuit, DynamicQuantumArchitecture, QubitMapping};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::error::{HalError, HalResult};
use crate::options::{HeraldingMode, MoveGateFrameTrackingMode, SubmitOptions};

/// Unique identifier for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    /// Create a job ID from a UUID.
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for JobId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Waiting to be compiled.
    #[serde(rename = "pending compilation")]
    PendingCompilation,
    /// Compiled, waiting to be executed.
    #[serde(rename = "pending execution")]
    PendingExecution,
    /// Finished, measurements are available.
    #[serde(rename = "ready")]
    Ready,
    /// Failed, the message says why.
    #[serde(rename = "failed")]
    Failed,
    /// Aborted by the user.
    #[serde(rename = "aborted")]
    Aborted,
    /// Marked for deletion.
    #[serde(rename = "pending deletion")]
    PendingDeletion,
    /// Deletion failed.
    #[serde(rename = "deletion failed")]
    DeletionFailed,
    /// Deleted.
    #[serde(rename = "deleted")]
    Deleted,
}

impl Status {
    /// Wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Status::PendingCompilation => "pending compilation",
            Status::PendingExecution => "pending execution",
            Status::Ready => "ready",
            Status::Failed => "failed",
            Status::Aborted => "aborted",
            Status::PendingDeletion => "pending deletion",
            Status::DeletionFailed => "deletion failed",
            Status::Deleted => "deleted",
        }
    }

    /// Check if the job still waits for compilation or execution.
    pub fn is_pending(self) -> bool {
        matches!(self, Status::PendingCompilation | Status::PendingExecution)
    }

    /// Check if the job has finished running, successfully or not.
    pub fn is_terminal(self) -> bool {
        !self.is_pending()
    }

    /// Check if the job completed successfully.
    pub fn is_success(self) -> bool {
        matches!(self, Status::Ready)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a serialized qubit mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleQubitMapping {
    /// Name used in the circuits.
    pub logical_name: String,
    /// Name of the component on the QPU.
    pub physical_name: String,
}

/// Serialize a qubit mapping, ordered by logical name.
pub fn serialize_qubit_mapping(mapping: &QubitMapping) -> Vec<SingleQubitMapping> {
    let mut entries: Vec<SingleQubitMapping> = mapping
        .iter()
        .map(|(logical, physical)| SingleQubitMapping {
            logical_name: logical.clone(),
            physical_name: physical.clone(),
        })
        .collect();
    entries.sort_by(|a, b| a.logical_name.cmp(&b.logical_name));
    entries
}

/// Request to run a batch of circuits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    /// Circuits to execute.
    pub circuits: Vec<Circuit>,
    /// Overrides for hardware settings and calibration data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_settings: Option<Value>,
    /// Calibration set to use, or `None` for the latest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibration_set_id: Option<Uuid>,
    /// Logical to physical qubit names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qubit_mapping: Option<Vec<SingleQubitMapping>>,
    /// Executions per circuit.
    pub shots: u32,
    /// Duration limit relative to T2.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_circuit_duration_over_t2: Option<f64>,
    /// Heralding mode.
    #[serde(default)]
    pub heralding_mode: HeraldingMode,
    /// MOVE gate validation on the server.
    #[serde(default)]
    pub move_validation_mode: MoveGateValidationMode,
    /// MOVE gate frame tracking on the server.
    #[serde(default)]
    pub move_gate_frame_tracking_mode: MoveGateFrameTrackingMode,
}

impl RunRequest {
    /// Validate a circuit batch against the architecture and build the request.
    ///
    /// Runs [`SubmitOptions::check`], validates every instruction with the
    /// requested MOVE validation mode and fills in default compilation options.
    pub fn prepare(
        circuits: &[Circuit],
        architecture: &DynamicQuantumArchitecture,
        options: &SubmitOptions,
    ) -> HalResult<Self> {
        options.check(circuits)?;

        let compilation = options
            .compilation
            .validate_and_fill_in(architecture.gates.contains_key("move"), circuits);
        let move_validation_mode = compilation.move_gate_validation.unwrap_or_default();

        validate_circuit_instructions(
            architecture,
            circuits,
            options.qubit_mapping.as_ref(),
            move_validation_mode,
        )
        .map_err(|e| HalError::CircuitValidation(e.to_string()))?;

        Ok(Self {
            circuits: circuits.to_vec(),
            custom_settings: options.custom_settings.clone(),
            calibration_set_id: options.calibration_set_id,
            qubit_mapping: options.qubit_mapping.as_ref().map(serialize_qubit_mapping),
            shots: options.shots,
            max_circuit_duration_over_t2: compilation.max_circuit_duration_over_t2,
            heralding_mode: compilation.heralding_mode.unwrap_or_default(),
            move_validation_mode,
            move_gate_frame_tracking_mode: compilation.move_gate_frame_tracking.unwrap_or_default(),
        })
    }
}

/// Measurement results of one circuit: for each measurement key, one row per
/// shot with one entry per measured qubit.
pub type CircuitMeasurementResults = BTreeMap<String, Vec<Vec<i64>>>;

/// Job metadata returned with the results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Calibration set the job ran with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calibration_set_id: Option<Uuid>,
    /// Copy of the submitted request.
    pub request: RunRequest,
    /// Server software version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cocos_version: Option<String>,
    /// Progress timestamps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamps: Option<BTreeMap<String, String>>,
}

/// Status and, once ready, the results of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Current status.
    pub status: Status,
    /// Per-circuit results, present iff the status is `ready`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurements: Option<Vec<CircuitMeasurementResults>>,
    /// Failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Job metadata.
    pub metadata: Metadata,
    /// Warnings raised by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

impl RunResult {
    /// Log the server warnings and turn a failed job into an error.
    pub fn into_checked(self) -> HalResult<Self> {
        log_warnings(self.warnings.as_deref());
        if self.status == Status::Failed {
            return Err(HalError::CircuitExecution(
                self.message.unwrap_or_default(),
            ));
        }
        Ok(self)
    }
}

/// Status of a job without its results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStatus {
    /// Current status.
    pub status: Status,
    /// Failure reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Warnings raised by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

impl RunStatus {
    /// Create a status without message or warnings.
    pub fn new(status: Status) -> Self {
        Self {
            status,
            message: None,
            warnings: None,
        }
    }

    /// Log the server warnings.
    pub fn log_warnings(&self) {
        log_warnings(self.warnings.as_deref());
    }
}

fn log_warnings(warnings: Option<&[String]>) {
    for warning in warnings.unwrap_or_default() {
        warn!("{}", warning);
    }
}
