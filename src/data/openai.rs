//! OpenAI chat completions client for VLSFO price estimates
//!
//! Asks an OpenAI-compatible model for the monthly average Singapore VLSFO
//! price and hands back the raw JSON text it produced.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::{Period, PriceSource, SourceError};

/// Default base URL for the OpenAI API
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Backoff step between retries; attempt `n` waits `n` steps
const RETRY_BACKOFF: Duration = Duration::from_millis(250);

const SYSTEM_PROMPT: &str = "You are a marine fuel market analyst. \
Report the known monthly average price of Very Low Sulfur Fuel Oil (VLSFO, 0.5% sulfur) \
bunkered at Singapore, in US dollars per metric ton. \
Respond only with a JSON object of the form {\"price\": number}.";

/// Settings for [`OpenAiClient`]
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Bearer token; `None` means the client is unconfigured
    pub api_key: Option<String>,
    /// Chat model name
    pub model: String,
    /// API base URL without a trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retries after a timeout, HTTP 429 or HTTP 5xx
    pub max_retries: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 1,
        }
    }
}

/// Client for the chat completions endpoint
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    /// Creates a client with its own timeout-bounded HTTP client
    pub fn new(config: OpenAiConfig) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Create a new OpenAiClient with a custom HTTP client
    pub fn with_client(client: Client, config: OpenAiConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn request_body(&self, period: &Period) -> serde_json::Value {
        json!({
            "model": self.config.model,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": format!(
                        "What was the average VLSFO price in Singapore for {} {}?",
                        period.month_name(),
                        period.year()
                    )
                }
            ]
        })
    }

    /// Sends a single request and extracts the assistant message content
    async fn send_once(
        &self,
        api_key: &str,
        body: &serde_json::Value,
    ) -> Result<String, SourceError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletion = response.json().await.map_err(classify_request_error)?;
        extract_content(completion)
    }
}

#[async_trait]
impl PriceSource for OpenAiClient {
    fn has_credential(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    async fn request_price(&self, period: &Period) -> Result<String, SourceError> {
        let api_key = match self.config.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => key,
            _ => return Err(SourceError::MissingCredential),
        };
        let body = self.request_body(period);

        let mut attempt = 0u32;
        loop {
            match self.send_once(api_key, &body).await {
                Ok(content) => {
                    debug!(%period, attempt, "received price estimate");
                    return Ok(content);
                }
                Err(e) if is_retryable(&e) && attempt < self.config.max_retries => {
                    attempt += 1;
                    warn!(%period, attempt, error = %e, "retrying price estimate request");
                    sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn classify_request_error(e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout
    } else {
        SourceError::Request(e)
    }
}

fn is_retryable(e: &SourceError) -> bool {
    match e {
        SourceError::Timeout => true,
        SourceError::HttpStatus { status, .. } => {
            StatusCode::from_u16(*status)
                .map(|s| s == StatusCode::TOO_MANY_REQUESTS || s.is_server_error())
                .unwrap_or(false)
        }
        _ => false,
    }
}

fn extract_content(completion: ChatCompletion) -> Result<String, SourceError> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(SourceError::MissingContent)
}

/// Chat completions response structure
#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}
