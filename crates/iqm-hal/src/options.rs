//! Circuit compilation and submission options.

use std::fmt;

use iqm_compile::MoveGateValidationMode;
use iqm_ir::{Circuit, QubitMapping};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::error::{HalError, HalResult};

/// Heralding measurement done before each shot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeraldingMode {
    /// No heralding.
    #[default]
    None,
    /// Measure after initialization and keep only all-zero shots. Fewer shots
    /// than requested may be returned.
    Zeros,
}

/// How the server compensates phases picked up by MOVE gates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveGateFrameTrackingMode {
    /// Complete frame tracking.
    #[default]
    Full,
    /// Frame tracking without the detuning phase corrections.
    NoDetuningCorrection,
    /// No frame tracking at all.
    None,
}

impl fmt::Display for HeraldingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeraldingMode::None => write!(f, "none"),
            HeraldingMode::Zeros => write!(f, "zeros"),
        }
    }
}

impl fmt::Display for MoveGateFrameTrackingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveGateFrameTrackingMode::Full => write!(f, "full"),
            MoveGateFrameTrackingMode::NoDetuningCorrection => write!(f, "no_detuning_correction"),
            MoveGateFrameTrackingMode::None => write!(f, "none"),
        }
    }
}

/// Options for compiling circuits to pulse schedules on the server.
///
/// Unset options take the server defaults when the request is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CircuitCompilationOptions {
    /// Circuits longer than this ratio of the qubits' T2 are disqualified.
    /// `0.0` disables the check, `None` uses the server default.
    pub max_circuit_duration_over_t2: Option<f64>,
    /// Heralding mode.
    pub heralding_mode: Option<HeraldingMode>,
    /// MOVE gate validation mode.
    pub move_gate_validation: Option<MoveGateValidationMode>,
    /// MOVE gate frame tracking mode.
    pub move_gate_frame_tracking: Option<MoveGateFrameTrackingMode>,
}

impl CircuitCompilationOptions {
    /// Create options with everything unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duration limit relative to T2.
    pub fn with_max_circuit_duration_over_t2(mut self, ratio: f64) -> Self {
        self.max_circuit_duration_over_t2 = Some(ratio);
        self
    }

    /// Set the heralding mode.
    pub fn with_heralding_mode(mut self, mode: HeraldingMode) -> Self {
        self.heralding_mode = Some(mode);
        self
    }

    /// Set the MOVE gate validation mode.
    pub fn with_move_gate_validation(mut self, mode: MoveGateValidationMode) -> Self {
        self.move_gate_validation = Some(mode);
        self
    }

    /// Set the MOVE gate frame tracking mode.
    pub fn with_move_gate_frame_tracking(mut self, mode: MoveGateFrameTrackingMode) -> Self {
        self.move_gate_frame_tracking = Some(mode);
        self
    }

    /// Check that the options can be combined.
    pub fn check(&self) -> HalResult<()> {
        let full_tracking = self.move_gate_frame_tracking == Some(MoveGateFrameTrackingMode::Full);
        let unvalidated = self.move_gate_validation == Some(MoveGateValidationMode::None);
        if full_tracking && unvalidated {
            return Err(HalError::ClientConfiguration(
                "Unable to perform full MOVE gate frame tracking if MOVE gate validation is not \
                 \"strict\" or \"allow_prx\"."
                    .into(),
            ));
        }
        Ok(())
    }

    /// Fill unset options with their defaults.
    ///
    /// MOVE options that have no effect, because the architecture has no MOVE
    /// gate or the circuits contain none, are reported with a warning.
    pub fn validate_and_fill_in(&self, architecture_supports_move: bool, circuits: &[Circuit]) -> Self {
        let ignored_reason = if !architecture_supports_move {
            Some("is not supported by the architecture")
        } else if !circuits.iter().any(Circuit::contains_moves) {
            Some("is only relevant for circuits with MOVE gates")
        } else {
            None
        };
        if let Some(reason) = ignored_reason {
            if self.move_gate_validation.is_some() {
                warn!("MOVE gate validation {reason}. Ignoring the option.");
            } else if self.move_gate_frame_tracking.is_some() {
                warn!("MOVE gate frame tracking {reason}. Ignoring the option.");
            }
        }

        Self {
            max_circuit_duration_over_t2: self.max_circuit_duration_over_t2,
            heralding_mode: Some(self.heralding_mode.unwrap_or_default()),
            move_gate_validation: Some(self.move_gate_validation.unwrap_or_default()),
            move_gate_frame_tracking: Some(self.move_gate_frame_tracking.unwrap_or_default()),
        }
    }
}

/// Everything besides the circuits that goes into a submission.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOptions {
    /// Logical to physical qubit names, or `None` if the circuits use physical names.
    pub qubit_mapping: Option<QubitMapping>,
    /// Overrides for hardware settings and calibration data. Normally `None`.
    pub custom_settings: Option<Value>,
    /// Calibration set to run with, or `None` for the latest one.
    pub calibration_set_id: Option<Uuid>,
    /// Number of times each circuit is executed.
    pub shots: u32,
    /// Compilation options.
    pub compilation: CircuitCompilationOptions,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            qubit_mapping: None,
            custom_settings: None,
            calibration_set_id: None,
            shots: 1,
            compilation: CircuitCompilationOptions::default(),
        }
    }
}

impl SubmitOptions {
    /// Create options for the given number of shots.
    pub fn new(shots: u32) -> Self {
        Self {
            shots,
            ..Self::default()
        }
    }

    /// Set the qubit mapping.
    pub fn with_qubit_mapping(mut self, mapping: QubitMapping) -> Self {
        self.qubit_mapping = Some(mapping);
        self
    }

    /// Set the calibration set.
    pub fn with_calibration_set_id(mut self, id: Uuid) -> Self {
        self.calibration_set_id = Some(id);
        self
    }

    /// Set the compilation options.
    pub fn with_compilation(mut self, options: CircuitCompilationOptions) -> Self {
        self.compilation = options;
        self
    }

    /// Check the options against the circuits before anything is sent.
    ///
    /// Shots must be positive, the compilation options must be compatible,
    /// and a qubit mapping must be injective and cover every qubit of every
    /// circuit.
    pub fn check(&self, circuits: &[Circuit]) -> HalResult<()> {
        if self.shots == 0 {
            return Err(HalError::ClientConfiguration(
                "Number of shots must be greater than zero.".into(),
            ));
        }
        self.compilation.check()?;

        let Some(mapping) = &self.qubit_mapping else {
            return Ok(());
        };

        let targets: FxHashSet<&String> = mapping.values().collect();
        if targets.len() != mapping.len() {
            return Err(HalError::CircuitValidation(
                "Multiple logical qubits map to the same physical qubit.".into(),
            ));
        }

        for (i, circuit) in circuits.iter().enumerate() {
            let mut missing = circuit.all_qubits();
            missing.retain(|q| !mapping.contains_key(q));
            if !missing.is_empty() {
                return Err(HalError::CircuitValidation(format!(
                    "The qubits {:?} in circuit '{}' at index {} are not found in the provided qubit mapping.",
                    missing,
                    circuit.name(),
                    i
                )));
            }
        }
        Ok(())
    }
}
