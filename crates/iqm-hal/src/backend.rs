//! Job client trait.
//!
//! The [`JobClient`] trait defines the lifecycle of a circuit batch on an IQM
//! server:
//!
//! ```text
//!   dynamic_quantum_architecture() ──→ submit_circuits() ──→ status() ──→ result()
//!                                         (validates)          (poll)     (fetch)
//! ```
//!
//! ## Method table
//!
//! | Method | Required | Returns |
//! |--------|----------|---------|
//! | `quantum_architecture()` | yes | `HalResult<QuantumArchitectureSpecification>` |
//! | `dynamic_quantum_architecture()` | yes | `HalResult<DynamicQuantumArchitecture>` |
//! | `submit()` | yes | `HalResult<JobId>` |
//! | `status()` | yes | `HalResult<RunStatus>` |
//! | `result()` | yes | `HalResult<RunResult>` |
//! | `abort()` | yes | `HalResult<()>` |
//! | `poll_interval()` | provided | `Duration` |
//! | `submit_circuits()` | provided | `HalResult<JobId>` |
//! | `wait_for_compilation()` | provided | `HalResult<RunResult>` |
//! | `wait_for_results()` | provided | `HalResult<RunResult>` |

use std::time::Duration;

use async_trait::async_trait;
use iqm_ir::{Circuit, DynamicQuantumArchitecture, QuantumArchitectureSpecification};
use tokio::time::{Instant, sleep};
use tracing::debug;
use uuid::Uuid;

use crate::error::{HalError, HalResult};
use crate::job::{JobId, RunRequest, RunResult, RunStatus, Status};
use crate::options::SubmitOptions;

/// Pause between polls unless the client says otherwise.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Client for running circuit batches on an IQM server.
#[async_trait]
pub trait JobClient: Send + Sync {
    /// Get the static quantum architecture of the server.
    async fn quantum_architecture(&self) -> HalResult<QuantumArchitectureSpecification>;

    /// Get the calibrated gates of a calibration set, or of the default set.
    async fn dynamic_quantum_architecture(
        &self,
        calibration_set_id: Option<Uuid>,
    ) -> HalResult<DynamicQuantumArchitecture>;

    /// Send a prepared request.
    async fn submit(&self, request: &RunRequest) -> HalResult<JobId>;

    /// Get the status of a job.
    async fn status(&self, job_id: &JobId) -> HalResult<RunStatus>;

    /// Get the status and results of a job.
    ///
    /// A failed job is a [`HalError::CircuitExecution`] error.
    async fn result(&self, job_id: &JobId) -> HalResult<RunResult>;

    /// Abort a job.
    async fn abort(&self, job_id: &JobId) -> HalResult<()>;

    /// Pause between two polls of the wait helpers.
    fn poll_interval(&self) -> Duration {
        DEFAULT_POLL_INTERVAL
    }

    /// Validate a circuit batch against the calibrated gates and submit it.
    async fn submit_circuits(
        &self,
        circuits: &[Circuit],
        options: &SubmitOptions,
    ) -> HalResult<JobId> {
        options.check(circuits)?;
        let architecture = self
            .dynamic_quantum_architecture(options.calibration_set_id)
            .await?;
        let request = RunRequest::prepare(circuits, &architecture, options)?;
        self.submit(&request).await
    }

    /// Poll until the job has left compilation, then fetch its result.
    async fn wait_for_compilation(&self, job_id: &JobId, timeout: Duration) -> HalResult<RunResult> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            let status = self.status(job_id).await?.status;
            if status != Status::PendingCompilation {
                return self.result(job_id).await;
            }
            debug!("Job {} is {}", job_id, status);
            sleep(self.poll_interval()).await;
        }
        Err(HalError::ApiTimeout(format!(
            "The job compilation didn't finish in {} seconds.",
            timeout.as_secs_f64()
        )))
    }

    /// Poll until the job is no longer pending, then fetch its result.
    async fn wait_for_results(&self, job_id: &JobId, timeout: Duration) -> HalResult<RunResult> {
        let start = Instant::now();
        while start.elapsed() < timeout {
            let status = self.status(job_id).await?.status;
            if !status.is_pending() {
                return self.result(job_id).await;
            }
            debug!("Job {} is {}", job_id, status);
            sleep(self.poll_interval()).await;
        }
        Err(HalError::ApiTimeout(format!(
            "The job didn't finish in {} seconds.",
            timeout.as_secs_f64()
        )))
    }
}
