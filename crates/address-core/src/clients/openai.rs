//! OpenAI-compatible chat completions client

use crate::config::OpenAIConfig;
use crate::error::{Result, ScannerError};
use reqwest::Client as HttpClient;
use serde_json::{json, Value};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Sampling options for a single completion request
#[derive(Debug, Clone, Default)]
pub struct CompletionOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

pub struct OpenAIClient {
    api_key: String,
    base_url: String,
    http_client: HttpClient,
}

impl OpenAIClient {
    pub fn new(config: &OpenAIConfig) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| ScannerError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_key: config.api_key.clone(),
            base_url,
            http_client,
        })
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Run one chat completion and return the text of the first choice
    pub async fn chat_completion(
        &self,
        model: &str,
        messages: Vec<Value>,
        options: &CompletionOptions,
    ) -> Result<String> {
        let body = build_request_body(model, messages, options);
        let url = self.completions_url();

        log::debug!("Sending chat completion request to {} (model {})", url, model);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let detail = upstream_error_message(&error_text)
                .map(|msg| format!(" - {}", msg))
                .unwrap_or_default();

            log::error!("OpenAI API error: {} {}", status, error_text);
            return Err(ScannerError::ServiceUnavailable(format!(
                "OpenAI API error: {}{}",
                status, detail
            )));
        }

        let result: Value = response.json().await?;
        first_choice_content(&result)
    }
}

fn build_request_body(model: &str, messages: Vec<Value>, options: &CompletionOptions) -> Value {
    let mut body = json!({
        "model": model,
        "messages": messages,
    });

    if let Some(max_tokens) = options.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }
    if let Some(temperature) = options.temperature {
        body["temperature"] = json!(temperature);
    }

    body
}

/// `error.message` from an OpenAI error body, if present
fn upstream_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value["error"]["message"].as_str().map(str::to_string)
}

fn first_choice_content(result: &Value) -> Result<String> {
    result["choices"][0]["message"]["content"]
        .as_str()
        .filter(|content| !content.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| ScannerError::Processing("No response from OpenAI API".to_string()))
}
