//! Minimal Ollama generate API client.
//!
//! This crate provides a focused client for Ollama's `/api/generate`
//! endpoint with:
//! - Non-streaming completions (the `stream` flag is always false)
//! - Opaque conversation context echoing for multi-turn coherence
//! - A distinct error kind for each failure point in a call

use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_MODEL: &str = "llama3.2";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur when calling the generate endpoint.
///
/// Every kind is fatal from the client's point of view: there are no
/// retries, and a failed call leaves the caller's state untouched.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to build request payload: {0}")]
    RequestBuild(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to read response body: {0}")]
    ResponseRead(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Service returned an empty response")]
    EmptyResponse,
}

/// Opaque conversation state returned by the service and echoed back on the
/// next call.
///
/// The token values carry no meaning to callers; the only supported queries
/// are length and emptiness. Echoing the latest context verbatim is what
/// keeps a multi-turn exchange coherent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(Vec<i64>);

impl Context {
    /// An empty context, used for the first call of an exchange.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Number of tokens in the context.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<i64>> for Context {
    fn from(tokens: Vec<i64>) -> Self {
        Self(tokens)
    }
}

/// Ollama generate API client.
#[derive(Clone)]
pub struct Ollama {
    client: reqwest::Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl Ollama {
    /// Create a client pointed at the default local service.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the base URL of the service.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the default model for this client.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the per-request deadline. Elapsing it surfaces [`Error::Timeout`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send a generate request and return the full response.
    ///
    /// The call is a single POST with no retries; the response body is read
    /// in full and decoded as the generate envelope. A syntactically valid
    /// envelope whose text is empty is an error, not a valid completion.
    pub async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, Error> {
        let api_request = self.build_api_request(request);
        let body =
            serde_json::to_vec(&api_request).map_err(|e| Error::RequestBuild(e.to_string()))?;

        debug!(
            model = %api_request.model,
            prompt_len = api_request.prompt.len(),
            context_len = api_request.context.len(),
            "sending generate request"
        );

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(self.timeout)
                } else {
                    Error::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            warn!(status, "generate request rejected");
            return Err(Error::Api { status, message });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(self.timeout)
            } else {
                Error::ResponseRead(e.to_string())
            }
        })?;

        decode_response(&body)
    }

    fn build_api_request(&self, request: GenerateRequest) -> ApiRequest {
        ApiRequest {
            model: request.model.unwrap_or_else(|| self.model.clone()),
            system: request.system,
            prompt: request.prompt,
            stream: false,
            context: request.context,
        }
    }
}

impl Default for Ollama {
    fn default() -> Self {
        Self::new()
    }
}

/// A generate request to send to the service.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Model override; the client's default model when `None`.
    pub model: Option<String>,
    /// System prompt sent alongside the user prompt.
    pub system: Option<String>,
    /// The user prompt. Must be non-empty for a meaningful completion.
    pub prompt: String,
    /// Conversation context from the previous response; empty on the first
    /// call of an exchange.
    pub context: Context,
}

impl GenerateRequest {
    /// Create a new request with the given prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            model: None,
            system: None,
            prompt: prompt.into(),
            context: Context::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }
}

/// A generate response from the service.
#[derive(Debug, Clone)]
pub struct GenerateResponse {
    /// The generated text. Guaranteed non-empty.
    pub response: String,
    /// Replacement conversation context to echo on the next call.
    pub context: Context,
}

fn decode_response(body: &str) -> Result<GenerateResponse, Error> {
    let api_response: ApiResponse =
        serde_json::from_str(body).map_err(|e| Error::Decode(e.to_string()))?;

    if api_response.response.is_empty() {
        return Err(Error::EmptyResponse);
    }

    Ok(GenerateResponse {
        response: api_response.response,
        context: api_response.context,
    })
}

// ============================================================================
// Internal API types
// ============================================================================

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    prompt: String,
    stream: bool,
    #[serde(skip_serializing_if = "Context::is_empty")]
    context: Context,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    response: String,
    #[serde(default)]
    context: Context,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = Ollama::new();
        assert_eq!(client.model, DEFAULT_MODEL);
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
        assert_eq!(client.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_client_builders() {
        let client = Ollama::new()
            .with_model("mistral")
            .with_base_url("http://localhost:9999")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(client.model, "mistral");
        assert_eq!(client.base_url, "http://localhost:9999");
        assert_eq!(client.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_request_omits_empty_context() {
        let client = Ollama::new();
        let request = client.build_api_request(
            GenerateRequest::new("hello").with_system("be brief"),
        );
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "llama3.2");
        assert_eq!(json["system"], "be brief");
        assert_eq!(json["prompt"], "hello");
        assert_eq!(json["stream"], false);
        assert!(json.get("context").is_none());
    }

    #[test]
    fn test_request_carries_context_verbatim() {
        let client = Ollama::new();
        let request = client.build_api_request(
            GenerateRequest::new("hello").with_context(vec![1, 2, 3].into()),
        );
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["context"], serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn test_request_omits_missing_system() {
        let client = Ollama::new();
        let request = client.build_api_request(GenerateRequest::new("hello"));
        let json = serde_json::to_value(&request).unwrap();

        assert!(json.get("system").is_none());
    }

    #[test]
    fn test_request_model_override() {
        let client = Ollama::new();
        let request =
            client.build_api_request(GenerateRequest::new("hello").with_model("phi3"));
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "phi3");
    }

    #[test]
    fn test_decode_response() {
        let body = r#"{"model":"llama3.2","created_at":"2024-01-01T00:00:00Z","response":"You see a clearing.","done":true,"context":[1,2,3]}"#;
        let response = decode_response(body).unwrap();
        assert_eq!(response.response, "You see a clearing.");
        assert_eq!(response.context, Context::from(vec![1, 2, 3]));
    }

    #[test]
    fn test_decode_missing_context_defaults_empty() {
        let body = r#"{"response":"You see a clearing."}"#;
        let response = decode_response(body).unwrap();
        assert!(response.context.is_empty());
    }

    #[test]
    fn test_decode_malformed_body() {
        let err = decode_response("not json at all").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_decode_empty_response_is_error() {
        let body = r#"{"response":"","context":[1,2,3]}"#;
        let err = decode_response(body).unwrap_err();
        assert!(matches!(err, Error::EmptyResponse));
    }

    #[test]
    fn test_context_length_queries() {
        let empty = Context::new();
        assert!(empty.is_empty());
        assert_eq!(empty.len(), 0);

        let context: Context = vec![5, 6, 7].into();
        assert!(!context.is_empty());
        assert_eq!(context.len(), 3);
    }
}
