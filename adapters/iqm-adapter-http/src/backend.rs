//! [`JobClient`] implementation over the REST API.

use std::time::Duration;

use async_trait::async_trait;
use iqm_hal::{HalResult, JobClient, JobId, RunRequest, RunResult, RunStatus};
use iqm_ir::{DynamicQuantumArchitecture, QuantumArchitectureSpecification};
use uuid::Uuid;

use crate::api::IqmClient;

#[async_trait]
impl JobClient for IqmClient {
    async fn quantum_architecture(&self) -> HalResult<QuantumArchitectureSpecification> {
        self.get_quantum_architecture().await
    }

    async fn dynamic_quantum_architecture(
        &self,
        calibration_set_id: Option<Uuid>,
    ) -> HalResult<DynamicQuantumArchitecture> {
        self.get_dynamic_quantum_architecture(calibration_set_id).await
    }

    async fn submit(&self, request: &RunRequest) -> HalResult<JobId> {
        self.submit_job(request).await
    }

    async fn status(&self, job_id: &JobId) -> HalResult<RunStatus> {
        self.get_run_status(job_id).await
    }

    async fn result(&self, job_id: &JobId) -> HalResult<RunResult> {
        self.get_run(job_id).await
    }

    async fn abort(&self, job_id: &JobId) -> HalResult<()> {
        self.abort_job(job_id).await
    }

    fn poll_interval(&self) -> Duration {
        self.config().poll_interval()
    }
}
