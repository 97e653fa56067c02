//! IQM Hardware Abstraction Layer
//!
//! Everything a client needs to run circuits on an IQM server, minus the
//! transport: authentication, the job and result models, compilation options
//! and the [`JobClient`] trait that HTTP clients implement.
//!
//! # Overview
//!
//! ```text
//!   ┌────────────────┐    ┌──────────────┐    ┌─────────────────┐
//!   │  TokenManager  │───→│  JobClient   │───→│ RunStatus /     │
//!   │  (auth)        │    │  (backend)   │    │ RunResult (job) │
//!   └────────────────┘    └──────────────┘    └─────────────────┘
//!                               ↑
//!                  SubmitOptions, CircuitCompilationOptions
//! ```
//!
//! # Example
//!
//! ```ignore
//! use iqm_hal::{JobClient, SubmitOptions};
//!
//! let job_id = client.submit_circuits(&circuits, &SubmitOptions::new(1000)).await?;
//! let result = client.wait_for_results(&job_id, Duration::from_secs(900)).await?;
//! for counts in result.measurements.unwrap_or_default() {
//!     println!("{counts:?}");
//! }
//! ```

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod job;
pub mod options;

pub use auth::{
    AuthParameters, ExternalToken, TokenClient, TokenManager, TokenProvider, TokensFileReader,
    time_left_seconds,
};
pub use backend::JobClient;
pub use config::ClientConfig;
pub use error::{HalError, HalResult};
pub use job::{
    CircuitMeasurementResults, JobId, Metadata, RunRequest, RunResult, RunStatus,
    SingleQubitMapping, Status,
};
pub use options::{
    CircuitCompilationOptions, HeraldingMode, MoveGateFrameTrackingMode, SubmitOptions,
};
