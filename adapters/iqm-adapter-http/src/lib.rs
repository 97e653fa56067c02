//! HTTP client for IQM quantum computers.
//!
//! [`IqmClient`] talks to the REST API of an IQM server and implements
//! [`JobClient`], so circuit batches are validated locally before they are
//! sent.
//!
//! # Example
//!
//! ```ignore
//! use iqm_adapter_http::IqmClient;
//! use iqm_hal::{JobClient, SubmitOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads IQM_TOKEN, IQM_TOKENS_FILE or IQM_AUTH_* from the environment
//!     let client = IqmClient::from_env("https://cocos.resonance.meetiqm.com/garnet")?;
//!
//!     let job_id = client.submit_circuits(&circuits, &SubmitOptions::new(1000)).await?;
//!     let result = client
//!         .wait_for_results(&job_id, client.config().wait_timeout())
//!         .await?;
//!     println!("Results: {:?}", result.measurements);
//!
//!     client.close_auth_session().await?;
//!     Ok(())
//! }
//! ```

mod api;
mod backend;

pub use api::IqmClient;

// Re-export common types
pub use iqm_hal::{ClientConfig, HalError, HalResult, JobClient};
