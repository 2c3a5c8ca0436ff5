/// LLM Client: the single point of entry for all text-generation calls.
///
/// ARCHITECTURAL RULE: No other module may call the OpenAI API directly.
/// All LLM interactions MUST go through this module.
///
/// The client is an owned handle built from the key and base URL in
/// `Config`; nothing is cached globally.
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const MAX_RETRIES: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_secs(1);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Models the user may pick for either generation call.
pub const SUPPORTED_MODELS: &[&str] = &["gpt-5.1", "gpt-5", "gpt-5-mini", "gpt-4.1", "gpt-4o"];

/// Models that accept `temperature` and `top_p`. Others reject the request
/// when these are present.
pub const MODELS_WITH_SAMPLING: &[&str] = &["gpt-5.1"];

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("OPENAI_API_KEY environment variable is required")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

/// One generation call: a system message plus a single user message.
///
/// `temperature` and `top_p` are sent only when set and only to models in
/// `MODELS_WITH_SAMPLING`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub system: &'a str,
    pub prompt: &'a str,
    pub max_output_tokens: u32,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    max_output_tokens: u32,
    input: Vec<InputMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Serialize)]
struct InputMessage<'a> {
    role: &'a str,
    content: &'a str,
}

impl<'a> ResponsesRequest<'a> {
    fn from_completion(req: &CompletionRequest<'a>) -> Self {
        let sampling = supports_sampling(req.model);
        Self {
            model: req.model,
            max_output_tokens: req.max_output_tokens,
            input: vec![
                InputMessage {
                    role: "system",
                    content: req.system,
                },
                InputMessage {
                    role: "user",
                    content: req.prompt,
                },
            ],
            temperature: req.temperature.filter(|_| sampling),
            top_p: req.top_p.filter(|_| sampling),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    #[serde(default)]
    pub output: Vec<OutputItem>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct OutputItem {
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Concatenates every `output_text` block of every `message` item.
    /// Reasoning items and other block types are skipped.
    pub fn output_text(&self) -> String {
        self.output
            .iter()
            .filter(|item| item.item_type == "message")
            .flat_map(|item| &item.content)
            .filter(|block| block.block_type == "output_text")
            .filter_map(|block| block.text.as_deref())
            .collect()
    }
}

impl LlmError {
    /// Transport failures, rate limits and server errors are worth retrying.
    fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

pub fn supports_sampling(model: &str) -> bool {
    MODELS_WITH_SAMPLING.contains(&model)
}

// ────────────────────────────────────────────────────────────────────────────
// Client
// ────────────────────────────────────────────────────────────────────────────

/// Wraps the OpenAI Responses API with retry logic.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    endpoint: String,
    backoff: Duration,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl LlmClient {
    /// Builds a handle for `api_key`. An empty key is rejected here rather
    /// than on the first request.
    pub fn new(api_key: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::MissingApiKey);
        }
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key,
            endpoint: responses_url(OPENAI_BASE_URL),
            backoff: RETRY_BACKOFF,
        })
    }

    /// Points the handle at another OpenAI-compatible server, e.g. a proxy
    /// set through `OPENAI_BASE_URL`.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.endpoint = responses_url(base_url);
        self
    }

    /// Makes a raw call, returning the full response object.
    /// Retries on transport errors, 429 and 5xx with exponential backoff
    /// (1s, then 2s). The last attempt's error is returned.
    pub async fn call(&self, request: &CompletionRequest<'_>) -> Result<LlmResponse, LlmError> {
        let request_body = ResponsesRequest::from_completion(request);

        let mut attempt = 1;
        loop {
            match self.send(&request_body).await {
                Ok(llm_response) => {
                    if let Some(usage) = &llm_response.usage {
                        debug!(
                            "LLM call succeeded: model={}, input_tokens={}, output_tokens={}",
                            request.model, usage.input_tokens, usage.output_tokens
                        );
                    }
                    return Ok(llm_response);
                }
                Err(e) if e.is_retryable() && attempt < MAX_RETRIES => {
                    let delay = self.backoff * (1 << (attempt - 1));
                    warn!(
                        "LLM call attempt {} failed ({}), retrying after {}ms...",
                        attempt,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One HTTP round trip.
    async fn send(&self, request_body: &ResponsesRequest<'_>) -> Result<LlmResponse, LlmError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!("LLM API returned {}: {}", status, body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: api_error_message(body),
            });
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// Calls the model and returns its trimmed text output.
    pub async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, LlmError> {
        let response = self.call(request).await?;
        let text = response.output_text();
        let text = text.trim();
        if text.is_empty() {
            return Err(LlmError::EmptyContent);
        }
        Ok(text.to_string())
    }
}

fn responses_url(base_url: &str) -> String {
    format!("{}/responses", base_url.trim_end_matches('/'))
}

/// Pulls `error.message` out of an OpenAI error body, or returns the body.
fn api_error_message(body: String) -> String {
    serde_json::from_str::<OpenAiError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;

    fn request(model: &str) -> CompletionRequest<'_> {
        CompletionRequest {
            model,
            system: "sys",
            prompt: "hello",
            max_output_tokens: 1200,
            temperature: Some(0.3),
            top_p: Some(0.95),
        }
    }

    #[test]
    fn test_sampling_params_only_for_supported_models() {
        let body = serde_json::to_value(ResponsesRequest::from_completion(&request("gpt-5.1")))
            .unwrap();
        assert!((body["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
        assert!((body["top_p"].as_f64().unwrap() - 0.95).abs() < 1e-6);

        let body =
            serde_json::to_value(ResponsesRequest::from_completion(&request("gpt-5"))).unwrap();
        assert!(body.get("temperature").is_none(), "gpt-5 must not get temperature");
        assert!(body.get("top_p").is_none());
        assert_eq!(body["max_output_tokens"], 1200);
    }

    #[test]
    fn test_unset_sampling_params_are_omitted_for_sampling_models() {
        let req = CompletionRequest {
            temperature: None,
            top_p: None,
            ..request("gpt-5.1")
        };
        let body = serde_json::to_value(ResponsesRequest::from_completion(&req)).unwrap();
        assert!(body.get("temperature").is_none());
        assert!(body.get("top_p").is_none());
    }

    #[test]
    fn test_request_carries_system_then_user_message() {
        let body = serde_json::to_value(ResponsesRequest::from_completion(&request("gpt-5.1")))
            .unwrap();
        assert_eq!(body["input"][0]["role"], "system");
        assert_eq!(body["input"][0]["content"], "sys");
        assert_eq!(body["input"][1]["role"], "user");
        assert_eq!(body["input"][1]["content"], "hello");
    }

    #[test]
    fn test_output_text_joins_message_blocks() {
        let raw = r#"{
            "output": [
                {"type": "reasoning", "content": []},
                {"type": "message", "content": [
                    {"type": "output_text", "text": "Dear Hiring Manager,\n"},
                    {"type": "refusal", "text": "ignored"},
                    {"type": "output_text", "text": "I am writing..."}
                ]}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 5, "total_tokens": 15}
        }"#;
        let response: LlmResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.output_text(), "Dear Hiring Manager,\nI am writing...");
        assert_eq!(response.usage.unwrap().output_tokens, 5);
    }

    #[test]
    fn test_output_text_empty_without_message_items() {
        let response: LlmResponse = serde_json::from_str(r#"{"output": []}"#).unwrap();
        assert_eq!(response.output_text(), "");
    }

    #[test]
    fn test_api_error_message_prefers_error_field() {
        let body = r#"{"error": {"message": "Invalid API key", "type": "auth"}}"#.to_string();
        assert_eq!(api_error_message(body), "Invalid API key");
        assert_eq!(api_error_message("gateway timeout".to_string()), "gateway timeout");
    }

    #[test]
    fn test_empty_api_key_is_rejected() {
        assert!(matches!(LlmClient::new("  "), Err(LlmError::MissingApiKey)));
        assert!(LlmClient::new("sk-test").is_ok());
    }

    #[test]
    fn test_base_url_maps_to_responses_endpoint() {
        let client = LlmClient::new("sk-test").unwrap();
        assert_eq!(client.endpoint, "https://api.openai.com/v1/responses");
        let client = client.with_base_url("http://localhost:8080/v1/");
        assert_eq!(client.endpoint, "http://localhost:8080/v1/responses");
    }

    // ────────────────────────────────────────────────────────────────────────
    // Retry behaviour against a local server
    // ────────────────────────────────────────────────────────────────────────

    const OK_BODY: &str = r#"{"output": [{"type": "message", "content": [{"type": "output_text", "text": " Dear team, "}]}]}"#;

    /// Serves one scripted `(status, body)` per connection and counts the
    /// requests it answered. Returns the base URL.
    async fn scripted_server(
        script: Vec<(u16, &'static str)>,
    ) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            for (status, body) in script {
                let (mut stream, _) = listener.accept().await.unwrap();
                read_request(&mut stream).await;
                counter.fetch_add(1, Ordering::SeqCst);
                let response = format!(
                    "HTTP/1.1 {status} Scripted\r\ncontent-type: application/json\r\n\
                     content-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.ok();
            }
        });

        (format!("http://{addr}/v1"), hits)
    }

    /// Reads headers and a `content-length` body.
    async fn read_request(stream: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let Some(head_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();
            let body_len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + body_len {
                return;
            }
        }
    }

    fn client_for(base_url: &str) -> LlmClient {
        LlmClient {
            backoff: Duration::from_millis(5),
            ..LlmClient::new("sk-test").unwrap().with_base_url(base_url)
        }
    }

    #[tokio::test]
    async fn test_server_errors_are_retried_until_success() {
        let (url, hits) =
            scripted_server(vec![(503, "busy"), (502, "bad gateway"), (200, OK_BODY)]).await;
        let text = client_for(&url).complete(&request("gpt-5")).await.unwrap();
        assert_eq!(text, "Dear team,");
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let (url, hits) = scripted_server(vec![
            (400, r#"{"error": {"message": "Unsupported parameter: temperature"}}"#),
            (200, OK_BODY),
        ])
        .await;
        let err = client_for(&url).call(&request("gpt-5")).await.unwrap_err();
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Unsupported parameter: temperature");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_gives_up_after_three_attempts() {
        let (url, hits) = scripted_server(vec![
            (429, r#"{"error": {"message": "Rate limit reached"}}"#),
            (429, r#"{"error": {"message": "Rate limit reached"}}"#),
            (429, r#"{"error": {"message": "Rate limit reached"}}"#),
            (200, OK_BODY),
        ])
        .await;
        let err = client_for(&url).call(&request("gpt-5")).await.unwrap_err();
        assert!(
            matches!(&err, LlmError::Api { status: 429, message } if message == "Rate limit reached"),
            "got {err:?}"
        );
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_blank_output_is_empty_content() {
        let (url, _) = scripted_server(vec![(200, r#"{"output": []}"#)]).await;
        let err = client_for(&url).complete(&request("gpt-5")).await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }

    #[test]
    fn test_supported_models_include_sampling_models() {
        for model in MODELS_WITH_SAMPLING {
            assert!(SUPPORTED_MODELS.contains(model));
        }
    }
}
