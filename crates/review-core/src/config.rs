//! Run configuration.
//!
//! Everything the engine needs is carried by an explicit [`RunConfig`] value
//! that the binary builds once and hands down. Nothing in the library reads
//! the process environment.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

/// Default model used for analysis requests.
pub const DEFAULT_MODEL: &str = "gemini-3.1-pro-preview";

/// Default inference API endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default host that task repositories are cloned from.
pub const DEFAULT_REPO_BASE_URL: &str = "https://github.com/mercor-code-envs";

/// Default cap on concurrently in-flight analysis requests.
pub const DEFAULT_MAX_CONCURRENCY: usize = 50;

/// Default number of attempts per analysis request.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default per-attempt request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Default connect timeout for each attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Default timeout for a single git operation.
pub const DEFAULT_GIT_TIMEOUT: Duration = Duration::from_secs(300);

/// Opaque API credential. `Debug` and `Display` never print the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw secret, for building request headers only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Configuration for one review run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Credential sent with every analysis request.
    pub api_key: ApiKey,

    /// Model identifier.
    pub model: String,

    /// Base URL of the inference API.
    pub api_base_url: String,

    /// Global cap on in-flight analysis requests, shared by every task.
    pub max_concurrency: usize,

    /// Total attempts per analysis request (first try included).
    pub max_retries: u32,

    /// Wall-clock timeout for one request attempt.
    pub request_timeout: Duration,

    /// Connect timeout for one request attempt.
    pub connect_timeout: Duration,

    /// Timeout for each git invocation during preparation.
    pub git_timeout: Duration,

    /// Host prefix that task repositories are cloned from.
    pub repo_base_url: String,

    /// Directory that holds cloned task repositories.
    pub workspace_dir: PathBuf,

    /// Directory that reports are written to.
    pub output_dir: PathBuf,
}

impl RunConfig {
    /// Create a config with defaults for everything except the credential.
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_retries: DEFAULT_MAX_RETRIES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            git_timeout: DEFAULT_GIT_TIMEOUT,
            repo_base_url: DEFAULT_REPO_BASE_URL.to_string(),
            workspace_dir: PathBuf::from("."),
            output_dir: PathBuf::from("./reports"),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_workspace_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workspace_dir = dir.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::MissingCredential);
        }
        if self.max_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.max_retries == 0 {
            return Err(ConfigError::ZeroRetries);
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("request"));
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("connect"));
        }
        if self.git_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout("git"));
        }
        Ok(())
    }
}
