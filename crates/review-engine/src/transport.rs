//! Inference transport: the one place that talks to the remote service.
//!
//! The dispatcher only sees [`InferenceTransport`]. [`GeminiTransport`] is the
//! production implementation over `reqwest`; tests substitute scripted fakes.

use review_core::RunConfig;
use serde_json::{json, Value};

use crate::error::{EngineError, EngineResult};

/// Raw HTTP-level answer of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Failure below the HTTP status layer.
///
/// `Display` is the text reported in place of a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Error: Request timed out.")]
    Timeout,

    #[error("Request Failed: {0}")]
    Connection(String),

    /// The request could not be built or sent at all. Not retried.
    #[error("Request Failed: {0}")]
    Other(String),
}

impl TransportError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Timeout | TransportError::Connection(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_builder() {
            TransportError::Other(err.to_string())
        } else {
            TransportError::Connection(err.to_string())
        }
    }
}

/// Pull `candidates[0].content.parts[0].text` out of a generateContent body.
pub fn generate_content_text(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Sends one analysis request.
#[async_trait::async_trait]
pub trait InferenceTransport: Send + Sync {
    /// Send `input` under the system `instruction` and return the raw answer.
    async fn send(&self, instruction: &str, input: &str)
        -> Result<TransportResponse, TransportError>;

    /// Extract generated text from a successful body, `None` when malformed.
    fn extract_text(&self, body: &str) -> Option<String> {
        generate_content_text(body)
    }
}

/// generateContent client for the Gemini API.
pub struct GeminiTransport {
    client: reqwest::Client,
    url: String,
    api_key: String,
}

impl GeminiTransport {
    pub fn new(config: &RunConfig) -> EngineResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("task-review/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.max_concurrency)
            .build()
            .map_err(|e| EngineError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url: Self::endpoint(&config.api_base_url, &config.model),
            api_key: config.api_key.expose().to_string(),
        })
    }

    pub fn endpoint(base_url: &str, model: &str) -> String {
        format!(
            "{}/v1beta/models/{model}:generateContent",
            base_url.trim_end_matches('/')
        )
    }

    fn payload(instruction: &str, input: &str) -> Value {
        json!({
            "system_instruction": {"parts": [{"text": instruction}]},
            "contents": [{"role": "user", "parts": [{"text": input}]}],
        })
    }
}

#[async_trait::async_trait]
impl InferenceTransport for GeminiTransport {
    async fn send(
        &self,
        instruction: &str,
        input: &str,
    ) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .post(&self.url)
            .header("X-goog-api-key", &self.api_key)
            .json(&Self::payload(instruction, input))
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(TransportResponse { status, body })
    }
}
