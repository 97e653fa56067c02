//! Authentication for IQM servers.
//!
//! A [`TokenManager`] owns at most one [`TokenProvider`] and turns the access
//! tokens it produces into `Authorization` header values:
//!
//! ```text
//!   AuthParameters ──→ TokenManager ──┬──→ ExternalToken     { token }
//!   (args or env)                     ├──→ TokensFileReader  { tokens_file }
//!                                     └──→ TokenClient       { auth_server_url, username, password }
//! ```
//!
//! Parameters come either from explicit arguments or from the `IQM_TOKEN`,
//! `IQM_TOKENS_FILE`, `IQM_AUTH_SERVER`, `IQM_AUTH_USERNAME` and
//! `IQM_AUTH_PASSWORD` environment variables, never from both. Without any
//! parameters the manager is unauthenticated and hands out no token.
//!
//! # Example
//!
//! ```ignore
//! use iqm_hal::auth::{AuthParameters, TokenManager};
//!
//! let manager = TokenManager::new(AuthParameters::new().with_tokens_file("tokens.json"))?;
//! if let Some(bearer) = manager.get_bearer_token().await? {
//!     request = request.header("Authorization", bearer);
//! }
//! ```

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::DEFAULT_REQUESTS_TIMEOUT_SECS;
use crate::error::{HalError, HalResult};

/// Client id presented to the auth server.
pub const AUTH_CLIENT_ID: &str = "iqm_client";

/// Realm on the auth server.
pub const AUTH_REALM: &str = "cortex";

/// Tokens with less time left than this are refreshed before use.
pub const REFRESH_MARGIN_SECONDS: i64 = 60;

const ENV_TOKEN: &str = "IQM_TOKEN";
const ENV_TOKENS_FILE: &str = "IQM_TOKENS_FILE";
const ENV_AUTH_SERVER: &str = "IQM_AUTH_SERVER";
const ENV_AUTH_USERNAME: &str = "IQM_AUTH_USERNAME";
const ENV_AUTH_PASSWORD: &str = "IQM_AUTH_PASSWORD";

/// Seconds until a JWT expires, floored at zero.
///
/// Reads the `exp` claim from the token body. Anything that is not a
/// well-formed token counts as expired.
pub fn time_left_seconds(token: &str) -> i64 {
    token_expiry(token).map_or(0, |exp| (exp - chrono::Utc::now().timestamp()).max(0))
}

fn token_expiry(token: &str) -> Option<i64> {
    let mut parts = token.splitn(3, '.');
    let (_header, body, _signature) = (parts.next()?, parts.next()?, parts.next()?);

    let padding = (4 - body.len() % 4) % 4;
    let padded = format!("{body}{}", "=".repeat(padding));
    let bytes = STANDARD
        .decode(&padded)
        .or_else(|_| URL_SAFE.decode(&padded))
        .ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;

    match claims.get("exp") {
        None => Some(0),
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(_) => None,
    }
}

/// Authentication parameters from one source.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthParameters {
    /// Long-lived token in plain text.
    pub token: Option<String>,
    /// JSON file holding an `access_token`.
    pub tokens_file: Option<PathBuf>,
    /// Base URL of the auth server.
    pub auth_server_url: Option<String>,
    /// Username on the auth server.
    pub username: Option<String>,
    /// Password on the auth server.
    pub password: Option<String>,
}

impl fmt::Debug for AuthParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthParameters")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("tokens_file", &self.tokens_file)
            .field("auth_server_url", &self.auth_server_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl AuthParameters {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the external token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the tokens file.
    pub fn with_tokens_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.tokens_file = Some(path.into());
        self
    }

    /// Set the auth server and the credentials to log in with.
    pub fn with_credentials(
        mut self,
        auth_server_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.auth_server_url = Some(auth_server_url.into());
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Read the parameters from the `IQM_*` environment variables.
    ///
    /// Empty variables count as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());
        Self {
            token: get(ENV_TOKEN),
            tokens_file: get(ENV_TOKENS_FILE).map(PathBuf::from),
            auth_server_url: get(ENV_AUTH_SERVER),
            username: get(ENV_AUTH_USERNAME),
            password: get(ENV_AUTH_PASSWORD),
        }
    }

    /// Check if no parameter is set.
    pub fn is_empty(&self) -> bool {
        self.given().is_empty()
    }

    /// Names of the parameters that are set.
    fn given(&self) -> Vec<&'static str> {
        let set = |value: Option<&str>| value.is_some_and(|v| !v.is_empty());
        let mut names = Vec::new();
        if set(self.token.as_deref()) {
            names.push("token");
        }
        if self
            .tokens_file
            .as_ref()
            .is_some_and(|p| !p.as_os_str().is_empty())
        {
            names.push("tokens_file");
        }
        if set(self.auth_server_url.as_deref()) {
            names.push("auth_server_url");
        }
        if set(self.username.as_deref()) {
            names.push("username");
        }
        if set(self.password.as_deref()) {
            names.push("password");
        }
        names
    }

    /// Environment variable names of the parameters that are set.
    fn given_env_names(&self) -> Vec<&'static str> {
        self.given()
            .into_iter()
            .map(|name| match name {
                "token" => ENV_TOKEN,
                "tokens_file" => ENV_TOKENS_FILE,
                "auth_server_url" => ENV_AUTH_SERVER,
                "username" => ENV_AUTH_USERNAME,
                _ => ENV_AUTH_PASSWORD,
            })
            .collect()
    }
}

fn quoted(names: &[&str]) -> String {
    names
        .iter()
        .map(|name| format!("\"{name}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Source of access tokens.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Get a valid access token.
    async fn get_token(&self) -> HalResult<String>;

    /// Close the authentication session.
    async fn close(&self) -> HalResult<()>;
}

struct TokenState {
    provider: Option<Box<dyn TokenProvider>>,
    access_token: Option<String>,
}

/// Hands out bearer tokens from the configured provider.
pub struct TokenManager {
    state: Mutex<TokenState>,
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenManager").finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Create a token manager from explicit parameters or, if none are given,
    /// from the environment.
    pub fn new(params: AuthParameters) -> HalResult<Self> {
        Self::with_requests_timeout(params, Duration::from_secs(DEFAULT_REQUESTS_TIMEOUT_SECS))
    }

    /// Create a token manager whose auth server requests use the given timeout.
    pub fn with_requests_timeout(params: AuthParameters, timeout: Duration) -> HalResult<Self> {
        Self::from_sources(params, AuthParameters::from_env(), timeout)
    }

    /// Create a token manager around an existing provider.
    pub fn with_provider(provider: impl TokenProvider + 'static) -> Self {
        Self::from_provider(Some(Box::new(provider)))
    }

    /// Create a token manager that hands out no tokens.
    pub fn unauthenticated() -> Self {
        Self::from_provider(None)
    }

    fn from_provider(provider: Option<Box<dyn TokenProvider>>) -> Self {
        Self {
            state: Mutex::new(TokenState {
                provider,
                access_token: None,
            }),
        }
    }

    fn from_sources(
        init: AuthParameters,
        env: AuthParameters,
        timeout: Duration,
    ) -> HalResult<Self> {
        let init_given = init.given();
        let env_given = env.given_env_names();

        if !init_given.is_empty() && !env_given.is_empty() {
            return Err(HalError::ClientConfiguration(format!(
                "Authentication parameters given both as initialisation args and as environment variables: \
                 initialisation args {}, environment variables {}. Parameter sources must not be mixed.",
                quoted(&init_given),
                quoted(&env_given)
            )));
        }

        let params = if env_given.is_empty() { init } else { env };
        Ok(Self::from_provider(build_provider(params, timeout)?))
    }

    /// Check if a provider is configured.
    pub async fn has_provider(&self) -> bool {
        self.state.lock().await.provider.is_some()
    }

    /// Get an `Authorization` header value, or `None` when unauthenticated.
    ///
    /// A failed authentication is retried once.
    pub async fn get_bearer_token(&self) -> HalResult<Option<String>> {
        self.get_bearer_token_with_retries(1).await
    }

    /// Get an `Authorization` header value, retrying authentication failures
    /// up to `retries` times.
    pub async fn get_bearer_token_with_retries(&self, retries: u32) -> HalResult<Option<String>> {
        let mut state = self.state.lock().await;
        let TokenState {
            provider,
            access_token,
        } = &mut *state;
        let Some(provider) = provider.as_ref() else {
            return Ok(None);
        };

        if let Some(token) = access_token.as_deref() {
            if time_left_seconds(token) > REFRESH_MARGIN_SECONDS {
                return Ok(Some(format!("Bearer {token}")));
            }
        }

        let mut retries_left = retries;
        loop {
            match provider.get_token().await {
                Ok(token) => {
                    let bearer = format!("Bearer {token}");
                    *access_token = Some(token);
                    return Ok(Some(bearer));
                }
                Err(HalError::ClientAuthentication(message)) if retries_left > 0 => {
                    debug!("Getting access token failed, retrying: {}", message);
                    retries_left -= 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Close the provider.
    ///
    /// Returns `false` when there was nothing to close. A provider that fails
    /// to close stays in place.
    pub async fn close(&self) -> HalResult<bool> {
        let mut state = self.state.lock().await;
        let Some(provider) = state.provider.as_ref() else {
            return Ok(false);
        };
        provider.close().await?;
        state.provider = None;
        state.access_token = None;
        Ok(true)
    }
}

fn build_provider(
    params: AuthParameters,
    timeout: Duration,
) -> HalResult<Option<Box<dyn TokenProvider>>> {
    let given = params.given();
    match given.as_slice() {
        [] => Ok(None),
        ["token"] => Ok(Some(Box::new(ExternalToken::new(
            params.token.unwrap_or_default(),
        )))),
        ["tokens_file"] => Ok(Some(Box::new(TokensFileReader::new(
            params.tokens_file.unwrap_or_default(),
        )))),
        ["auth_server_url", "username", "password"] => {
            let client = TokenClient::with_timeout(
                &params.auth_server_url.unwrap_or_default(),
                AUTH_REALM,
                params.username.unwrap_or_default(),
                params.password.unwrap_or_default(),
                timeout,
            )?;
            Ok(Some(Box::new(client)))
        }
        _ => Err(HalError::ClientConfiguration(format!(
            "Invalid combination of authentication parameters specified: {given:?}"
        ))),
    }
}

/// Externally managed token, handed out as is.
pub struct ExternalToken {
    token: Mutex<Option<String>>,
}

impl ExternalToken {
    /// Create a provider for a fixed token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl TokenProvider for ExternalToken {
    async fn get_token(&self) -> HalResult<String> {
        self.token
            .lock()
            .await
            .clone()
            .ok_or_else(|| HalError::ClientAuthentication("No external token available".into()))
    }

    async fn close(&self) -> HalResult<()> {
        self.token.lock().await.take();
        Err(HalError::ClientAuthentication(
            "Can not close externally managed auth session".into(),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct TokensFile {
    access_token: Option<String>,
}

/// Reads the access token from a JSON tokens file on every request.
pub struct TokensFileReader {
    path: Mutex<Option<PathBuf>>,
}

impl TokensFileReader {
    /// Create a provider for the given tokens file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Mutex::new(Some(path.into())),
        }
    }
}

#[async_trait]
impl TokenProvider for TokensFileReader {
    async fn get_token(&self) -> HalResult<String> {
        let path = self
            .path
            .lock()
            .await
            .clone()
            .ok_or_else(|| HalError::ClientAuthentication("No tokens file available".into()))?;

        let read_failed = |e: &dyn fmt::Display| {
            HalError::ClientAuthentication(format!(
                "Failed to read access token from file '{}': {e}",
                path.display()
            ))
        };
        let raw = std::fs::read_to_string(&path).map_err(|e| read_failed(&e))?;
        let tokens: TokensFile = serde_json::from_str(&raw).map_err(|e| read_failed(&e))?;

        match tokens.access_token {
            Some(token) if time_left_seconds(&token) > 0 => Ok(token),
            _ => Err(HalError::ClientAuthentication(
                "Access token in file has expired or is not valid".into(),
            )),
        }
    }

    async fn close(&self) -> HalResult<()> {
        self.path.lock().await.take();
        Err(HalError::ClientAuthentication(
            "Can not close externally managed auth session".into(),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grant {
    Password,
    RefreshToken,
}

/// Logs in to an OpenID Connect auth server with username and password and
/// keeps the session alive with refresh tokens.
pub struct TokenClient {
    token_url: String,
    logout_url: String,
    username: String,
    password: String,
    refresh_token: Mutex<Option<String>>,
    client: reqwest::Client,
}

impl fmt::Debug for TokenClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenClient")
            .field("token_url", &self.token_url)
            .field("logout_url", &self.logout_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl TokenClient {
    /// Create a client for the given auth server and realm.
    pub fn new(
        auth_server_url: &str,
        realm: &str,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> HalResult<Self> {
        Self::with_timeout(
            auth_server_url,
            realm,
            username,
            password,
            Duration::from_secs(DEFAULT_REQUESTS_TIMEOUT_SECS),
        )
    }

    /// Create a client whose requests use the given timeout.
    pub fn with_timeout(
        auth_server_url: &str,
        realm: &str,
        username: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> HalResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                HalError::ClientConfiguration(format!("Failed to create HTTP client: {}", e))
            })?;

        let base = format!(
            "{}/realms/{}/protocol/openid-connect",
            auth_server_url.trim_end_matches('/'),
            realm
        );
        Ok(Self {
            token_url: format!("{base}/token"),
            logout_url: format!("{base}/logout"),
            username: username.into(),
            password: password.into(),
            refresh_token: Mutex::new(None),
            client,
        })
    }

    /// URL access tokens are requested from.
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Request new tokens. Updates the refresh token and returns the access
    /// token if the server answered with usable tokens.
    async fn request_tokens(
        &self,
        grant: Grant,
        refresh_token: &mut Option<String>,
    ) -> HalResult<Option<String>> {
        let current_refresh = refresh_token.clone().unwrap_or_default();
        let form: Vec<(&str, &str)> = match grant {
            Grant::RefreshToken => vec![
                ("client_id", AUTH_CLIENT_ID),
                ("grant_type", "refresh_token"),
                ("refresh_token", current_refresh.as_str()),
            ],
            Grant::Password => vec![
                ("client_id", AUTH_CLIENT_ID),
                ("grant_type", "password"),
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ],
        };

        debug!("Requesting tokens ({:?} grant) from {}", grant, self.token_url);
        let response = self.client.post(&self.token_url).form(&form).send().await?;
        if response.status() != reqwest::StatusCode::OK {
            debug!("Token request rejected with {}", response.status());
            return Ok(None);
        }

        let tokens: TokenResponse = response.json().await?;
        *refresh_token = tokens
            .refresh_token
            .filter(|token| time_left_seconds(token) > 0);
        Ok(tokens
            .access_token
            .filter(|token| time_left_seconds(token) > 0))
    }
}

#[async_trait]
impl TokenProvider for TokenClient {
    async fn get_token(&self) -> HalResult<String> {
        let mut refresh_token = self.refresh_token.lock().await;

        let mut access_token = None;
        let refresh_left = refresh_token.as_deref().map_or(0, time_left_seconds);
        if refresh_left > REFRESH_MARGIN_SECONDS {
            access_token = self
                .request_tokens(Grant::RefreshToken, &mut refresh_token)
                .await?;
        }
        if access_token.is_none() {
            access_token = self
                .request_tokens(Grant::Password, &mut refresh_token)
                .await?;
        }

        access_token.ok_or_else(|| {
            warn!("Auth server at {} did not issue an access token", self.token_url);
            HalError::ClientAuthentication("Getting access token from auth server failed".into())
        })
    }

    async fn close(&self) -> HalResult<()> {
        let refresh_token = self
            .refresh_token
            .lock()
            .await
            .take()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| HalError::ClientAuthentication("No auth session active".into()))?;

        let form = [
            ("client_id", AUTH_CLIENT_ID),
            ("refresh_token", refresh_token.as_str()),
        ];
        let response = self.client.post(&self.logout_url).form(&form).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::OK || status == reqwest::StatusCode::NO_CONTENT {
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        Err(HalError::ClientAuthentication(format!(
            "Logout failed, {}",
            text
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn jwt(seconds_left: i64) -> String {
        let exp = chrono::Utc::now().timestamp() + seconds_left;
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp},"sub":"alice"}}"#));
        format!("{header}.{body}.c2lnbmF0dXJl")
    }

    struct ScriptedProvider {
        tokens: std::sync::Mutex<VecDeque<HalResult<String>>>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(tokens: Vec<HalResult<String>>) -> Self {
            Self {
                tokens: std::sync::Mutex::new(tokens.into()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TokenProvider for std::sync::Arc<ScriptedProvider> {
        async fn get_token(&self) -> HalResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.tokens.lock().unwrap().pop_front().unwrap()
        }

        async fn close(&self) -> HalResult<()> {
            Ok(())
        }
    }

    fn from_init(params: AuthParameters) -> HalResult<TokenManager> {
        TokenManager::from_sources(params, AuthParameters::new(), Duration::from_secs(5))
    }

    #[test]
    fn test_time_left_seconds() {
        let left = time_left_seconds(&jwt(3600));
        assert!((3590..=3600).contains(&left));
        assert_eq!(time_left_seconds(&jwt(-100)), 0);
    }

    #[test]
    fn test_time_left_seconds_malformed() {
        assert_eq!(time_left_seconds(""), 0);
        assert_eq!(time_left_seconds("not a token"), 0);
        assert_eq!(time_left_seconds("a.b"), 0);
        assert_eq!(time_left_seconds("a.!!!!.c"), 0);
        let not_json = URL_SAFE_NO_PAD.encode("exp=5");
        assert_eq!(time_left_seconds(&format!("h.{not_json}.s")), 0);
        let no_exp = URL_SAFE_NO_PAD.encode(r#"{"sub":"alice"}"#);
        assert_eq!(time_left_seconds(&format!("h.{no_exp}.s")), 0);
    }

    #[test]
    fn test_time_left_seconds_string_exp() {
        let exp = chrono::Utc::now().timestamp() + 1000;
        let body = STANDARD.encode(format!(r#"{{"exp":"{exp}"}}"#));
        let token = format!("h.{}.s", body.trim_end_matches('='));
        assert!(time_left_seconds(&token) > 900);
    }

    #[test]
    fn test_auth_parameters_debug_redacts_secrets() {
        let params = AuthParameters::new()
            .with_token("secret-token")
            .with_credentials("https://auth.example.com", "alice", "hunter2");
        let debug = format!("{params:?}");
        assert!(!debug.contains("secret-token"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("alice"));
    }

    #[test]
    fn test_auth_parameters_from_lookup_skips_empty() {
        let params = AuthParameters::from_lookup(|name| match name {
            "IQM_TOKEN" => Some(String::new()),
            "IQM_TOKENS_FILE" => Some("/tmp/tokens.json".into()),
            _ => None,
        });
        assert_eq!(params.token, None);
        assert_eq!(params.tokens_file, Some(PathBuf::from("/tmp/tokens.json")));
        assert_eq!(params.given(), vec!["tokens_file"]);
    }

    #[tokio::test]
    async fn test_no_parameters_is_unauthenticated() {
        let manager = from_init(AuthParameters::new()).unwrap();
        assert!(!manager.has_provider().await);
        assert_eq!(manager.get_bearer_token().await.unwrap(), None);
        assert!(!manager.close().await.unwrap());
    }

    #[test]
    fn test_mixed_sources_rejected() {
        let env = AuthParameters::from_lookup(|name| {
            (name == "IQM_AUTH_USERNAME" || name == "IQM_AUTH_PASSWORD").then(|| "x".to_string())
        });
        let err = TokenManager::from_sources(
            AuthParameters::new().with_token("abc"),
            env,
            Duration::from_secs(5),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Authentication parameters given both as initialisation args and as environment variables: \
             initialisation args \"token\", environment variables \"IQM_AUTH_USERNAME\", \"IQM_AUTH_PASSWORD\". \
             Parameter sources must not be mixed."
        );
    }

    #[test]
    fn test_invalid_combination_rejected() {
        let params = AuthParameters {
            token: Some("abc".into()),
            username: Some("alice".into()),
            ..Default::default()
        };
        let err = from_init(params).unwrap_err();
        assert!(matches!(err, HalError::ClientConfiguration(_)));
        assert_eq!(
            err.to_string(),
            "Invalid combination of authentication parameters specified: [\"token\", \"username\"]"
        );

        let params = AuthParameters {
            auth_server_url: Some("https://auth.example.com".into()),
            username: Some("alice".into()),
            ..Default::default()
        };
        assert!(from_init(params).is_err());
    }

    #[tokio::test]
    async fn test_environment_is_used_without_init_args() {
        let env = AuthParameters::from_lookup(|name| (name == "IQM_TOKEN").then(|| "env-token".to_string()));
        let manager =
            TokenManager::from_sources(AuthParameters::new(), env, Duration::from_secs(5)).unwrap();
        assert_eq!(
            manager.get_bearer_token().await.unwrap(),
            Some("Bearer env-token".to_string())
        );
    }

    #[tokio::test]
    async fn test_external_token() {
        let manager = from_init(AuthParameters::new().with_token("opaque")).unwrap();
        assert_eq!(
            manager.get_bearer_token().await.unwrap(),
            Some("Bearer opaque".to_string())
        );

        let err = manager.close().await.unwrap_err();
        assert_eq!(err.to_string(), "Can not close externally managed auth session");
        assert!(manager.has_provider().await);
    }

    #[tokio::test]
    async fn test_valid_access_token_is_reused() {
        let provider = std::sync::Arc::new(ScriptedProvider::new(vec![Ok(jwt(3600))]));
        let manager = TokenManager::with_provider(provider.clone());

        let first = manager.get_bearer_token().await.unwrap();
        let second = manager.get_bearer_token().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expiring_access_token_is_replaced() {
        let fresh = jwt(3600);
        let provider = std::sync::Arc::new(ScriptedProvider::new(vec![Ok(jwt(30)), Ok(fresh.clone())]));
        let manager = TokenManager::with_provider(provider.clone());

        manager.get_bearer_token().await.unwrap();
        let second = manager.get_bearer_token().await.unwrap();
        assert_eq!(second, Some(format!("Bearer {fresh}")));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_authentication_failure_is_retried_once() {
        let provider = std::sync::Arc::new(ScriptedProvider::new(vec![
            Err(HalError::ClientAuthentication("flaky".into())),
            Ok("token".into()),
        ]));
        let manager = TokenManager::with_provider(provider.clone());
        assert_eq!(
            manager.get_bearer_token().await.unwrap(),
            Some("Bearer token".to_string())
        );
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);

        let provider = std::sync::Arc::new(ScriptedProvider::new(vec![
            Err(HalError::ClientAuthentication("first".into())),
            Err(HalError::ClientAuthentication("second".into())),
        ]));
        let manager = TokenManager::with_provider(provider.clone());
        let err = manager.get_bearer_token().await.unwrap_err();
        assert_eq!(err.to_string(), "second");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_other_failures_are_not_retried() {
        let provider = std::sync::Arc::new(ScriptedProvider::new(vec![Err(
            HalError::ClientConfiguration("broken".into()),
        )]));
        let manager = TokenManager::with_provider(provider.clone());
        assert!(manager.get_bearer_token().await.is_err());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_close_drops_provider() {
        let provider = std::sync::Arc::new(ScriptedProvider::new(vec![]));
        let manager = TokenManager::with_provider(provider);
        assert!(manager.close().await.unwrap());
        assert!(!manager.has_provider().await);
        assert_eq!(manager.get_bearer_token().await.unwrap(), None);
        assert!(!manager.close().await.unwrap());
    }

    #[tokio::test]
    async fn test_tokens_file_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let token = jwt(3600);
        std::fs::write(&path, format!(r#"{{"access_token": "{token}", "refresh_token": "r"}}"#)).unwrap();

        let reader = TokensFileReader::new(&path);
        assert_eq!(reader.get_token().await.unwrap(), token);
    }

    #[tokio::test]
    async fn test_tokens_file_reader_expired_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, format!(r#"{{"access_token": "{}"}}"#, jwt(-10))).unwrap();

        let err = TokensFileReader::new(&path).get_token().await.unwrap_err();
        assert_eq!(err.to_string(), "Access token in file has expired or is not valid");

        std::fs::write(&path, "{}").unwrap();
        let err = TokensFileReader::new(&path).get_token().await.unwrap_err();
        assert!(err.is_authentication());
    }

    #[tokio::test]
    async fn test_tokens_file_reader_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let err = TokensFileReader::new(&missing).get_token().await.unwrap_err();
        assert!(
            err.to_string()
                .starts_with(&format!("Failed to read access token from file '{}':", missing.display()))
        );

        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, "not json").unwrap();
        let err = TokensFileReader::new(&garbage).get_token().await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to read access token from file"));
    }

    #[tokio::test]
    async fn test_tokens_file_reader_cannot_be_closed() {
        let reader = TokensFileReader::new("tokens.json");
        assert!(reader.close().await.is_err());
        let err = reader.get_token().await.unwrap_err();
        assert_eq!(err.to_string(), "No tokens file available");
    }

    #[test]
    fn test_token_client_urls() {
        let client = TokenClient::new("https://auth.example.com/", AUTH_REALM, "alice", "pw").unwrap();
        assert_eq!(
            client.token_url(),
            "https://auth.example.com/realms/cortex/protocol/openid-connect/token"
        );
        assert_eq!(
            client.logout_url,
            "https://auth.example.com/realms/cortex/protocol/openid-connect/logout"
        );
        assert!(!format!("{client:?}").contains("\"pw\""));
    }
}
