//! IQM server REST API client.
//!
//! Endpoints, relative to the server URL:
//!
//! | Method | Path | Answer |
//! |--------|------|--------|
//! | `POST` | `jobs` | `{"id": "<uuid>"}` |
//! | `GET` | `jobs/{id}` | `RunResult` |
//! | `GET` | `jobs/{id}/status` | `RunStatus` |
//! | `POST` | `jobs/{id}/abort` | empty, or `{"detail": "..."}` on failure |
//! | `GET` | `quantum-architecture` | `QuantumArchitecture` |
//! | `GET` | `api/v1/calibration/{id or "default"}/gates` | `DynamicQuantumArchitecture` |
//!
//! Every request is repeated while the server answers `502 Bad Gateway`.

use iqm_hal::{
    AuthParameters, ClientConfig, HalError, HalResult, JobId, RunRequest, RunResult, RunStatus,
    TokenManager,
};
use iqm_ir::{DynamicQuantumArchitecture, QuantumArchitecture, QuantumArchitectureSpecification};
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Method, Response, StatusCode};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    detail: String,
}

/// HTTP client for one IQM server.
#[derive(Debug)]
pub struct IqmClient {
    /// HTTP client.
    client: Client,
    /// Server base URL, without trailing slash.
    base_url: String,
    /// `User-Agent` header value.
    signature: String,
    config: ClientConfig,
    tokens: TokenManager,
    /// Calibrated gates of explicitly requested calibration sets.
    architectures: Mutex<FxHashMap<Uuid, DynamicQuantumArchitecture>>,
}

impl IqmClient {
    /// Create a client authenticating with the given parameters, or with the
    /// `IQM_*` environment variables when the parameters are empty.
    pub fn new(url: &str, config: ClientConfig, auth: AuthParameters) -> HalResult<Self> {
        let tokens = TokenManager::with_requests_timeout(auth, config.requests_timeout())?;
        Self::with_token_manager(url, config, tokens)
    }

    /// Create a client configured entirely from the environment.
    pub fn from_env(url: &str) -> HalResult<Self> {
        Self::new(url, ClientConfig::from_env()?, AuthParameters::new())
    }

    /// Create a client around an existing token manager.
    pub fn with_token_manager(
        url: &str,
        config: ClientConfig,
        tokens: TokenManager,
    ) -> HalResult<Self> {
        if !(url.starts_with("http:") || url.starts_with("https:")) {
            return Err(HalError::ClientConfiguration(format!(
                "The URL schema has to be http or https. Incorrect schema in URL: {url}"
            )));
        }

        let client = Client::builder()
            .timeout(config.requests_timeout())
            .build()
            .map_err(|e| {
                HalError::ClientConfiguration(format!("Failed to create HTTP client: {}", e))
            })?;

        let mut signature = format!(
            "{}-{}, iqm-client {}",
            std::env::consts::OS,
            std::env::consts::ARCH,
            env!("CARGO_PKG_VERSION")
        );
        if let Some(extra) = config.client_signature.as_deref().filter(|s| !s.is_empty()) {
            signature.push_str(", ");
            signature.push_str(extra);
        }

        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            signature,
            config,
            tokens,
            architectures: Mutex::new(FxHashMap::default()),
        })
    }

    /// Value sent as `User-Agent`.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Submit a prepared run request.
    #[instrument(skip(self, request))]
    pub async fn submit_job(&self, request: &RunRequest) -> HalResult<JobId> {
        let response = self.send(Method::POST, "jobs", Some(request)).await?;
        let submitted: SubmitResponse = self.handle_response(response).await?;
        Uuid::parse_str(&submitted.id).map(JobId::new).map_err(|e| {
            HalError::CircuitExecution(format!("Invalid response: {}, {e}", submitted.id))
        })
    }

    /// Get the status and results of a job. A failed job is an error.
    #[instrument(skip(self))]
    pub async fn get_run(&self, job_id: &JobId) -> HalResult<RunResult> {
        let response = self.send(Method::GET, &format!("jobs/{job_id}"), None).await?;
        let result: RunResult = self.handle_response(response).await?;
        result.into_checked()
    }

    /// Get the status of a job.
    #[instrument(skip(self))]
    pub async fn get_run_status(&self, job_id: &JobId) -> HalResult<RunStatus> {
        let response = self
            .send(Method::GET, &format!("jobs/{job_id}/status"), None)
            .await?;
        let status: RunStatus = self.handle_response(response).await?;
        status.log_warnings();
        Ok(status)
    }

    /// Abort a job.
    #[instrument(skip(self))]
    pub async fn abort_job(&self, job_id: &JobId) -> HalResult<()> {
        let response = self
            .send(Method::POST, &format!("jobs/{job_id}/abort"), None)
            .await?;
        if response.status() == StatusCode::OK {
            return Ok(());
        }

        let text = response.text().await?;
        let detail = serde_json::from_str::<ErrorDetail>(&text)
            .map(|e| e.detail)
            .unwrap_or(text);
        Err(HalError::JobAbortion(detail))
    }

    /// Get the static quantum architecture.
    #[instrument(skip(self))]
    pub async fn get_quantum_architecture(&self) -> HalResult<QuantumArchitectureSpecification> {
        let response = self.send(Method::GET, "quantum-architecture", None).await?;
        let architecture: QuantumArchitecture = self.handle_response(response).await?;
        Ok(architecture.quantum_architecture)
    }

    /// Get the calibrated gates of a calibration set, or of the default set.
    ///
    /// Explicitly requested calibration sets never change and are cached.
    #[instrument(skip(self))]
    pub async fn get_dynamic_quantum_architecture(
        &self,
        calibration_set_id: Option<Uuid>,
    ) -> HalResult<DynamicQuantumArchitecture> {
        if let Some(id) = calibration_set_id {
            if let Some(cached) = self.architectures.lock().await.get(&id) {
                return Ok(cached.clone());
            }
        }

        let set = calibration_set_id.map_or_else(|| "default".to_string(), |id| id.to_string());
        let response = self
            .send(Method::GET, &format!("api/v1/calibration/{set}/gates"), None)
            .await?;
        let architecture: DynamicQuantumArchitecture = self.handle_response(response).await?;

        self.architectures
            .lock()
            .await
            .insert(architecture.calibration_set_id, architecture.clone());
        Ok(architecture)
    }

    /// Close the authentication session. Returns `false` when there was none.
    pub async fn close_auth_session(&self) -> HalResult<bool> {
        self.tokens.close().await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&RunRequest>,
    ) -> HalResult<Response> {
        let url = format!("{}/{}", self.base_url, path);
        let bearer = self.tokens.get_bearer_token().await?;

        loop {
            debug!("{} {}", method, url);
            let mut request = self
                .client
                .request(method.clone(), &url)
                .header(USER_AGENT, &self.signature);
            if let Some(bearer) = &bearer {
                request = request.header(AUTHORIZATION, bearer);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;
            if response.status() != StatusCode::BAD_GATEWAY {
                return Ok(response);
            }
            warn!("{} {} answered 502, retrying", method, url);
            tokio::time::sleep(self.config.poll_interval()).await;
        }
    }

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> HalResult<T> {
        let status = response.status();
        let text = response.text().await?;

        if status == StatusCode::UNAUTHORIZED {
            return Err(HalError::ClientAuthentication(format!(
                "Authentication failed: {text}"
            )));
        }
        if !status.is_success() {
            return Err(HalError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| HalError::CircuitExecution(format!("Invalid response: {text}, {e}")))
    }
}
