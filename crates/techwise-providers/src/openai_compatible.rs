use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use techwise_core::{GenerationParams, OracleError, TextGenerator};

use crate::config::OracleConfig;

/// Oracle backed by any OpenAI-compatible `/chat/completions` endpoint
/// (OpenAI, OpenRouter, Ollama, vLLM, llama.cpp server)
#[derive(Debug, Clone)]
pub struct OpenAICompatibleGenerator {
    pub name: String,
    api_key: Option<String>,
    base_url: String,
    model: String,
    headers: HashMap<String, String>,
    http_client: reqwest::Client,
}

impl OpenAICompatibleGenerator {
    pub fn new(
        name: impl Into<String>,
        api_key: Option<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            headers: HashMap::new(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Build from configuration, with a request timeout
    pub fn from_config(config: &OracleConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            name: format!("openai-compatible:{}", config.model),
            api_key: config.api_key(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            headers: config.headers.clone(),
            http_client,
        })
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request(&self, prompt: &str, params: &GenerationParams) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: Some(params.max_new_tokens),
            // Greedy decoding when sampling is off
            temperature: Some(if params.sample { params.temperature } else { 0.0 }),
            top_p: params.sample.then_some(params.top_p),
            frequency_penalty: frequency_penalty(params.repetition_penalty),
        }
    }
}

/// Map a multiplicative repetition penalty (1.0 = off) onto the additive
/// `frequency_penalty` range `[-2, 2]`
fn frequency_penalty(repetition_penalty: f64) -> Option<f64> {
    let penalty = repetition_penalty - 1.0;
    (penalty.abs() > f64::EPSILON).then(|| penalty.clamp(-2.0, 2.0))
}

/// Classify a non-success HTTP status
fn status_error(status: StatusCode, body: &str) -> OracleError {
    let message = format!("{}: {}", status, body.trim());
    match status {
        StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE => {
            OracleError::ResourceExhausted(message)
        }
        _ => OracleError::Inference(message),
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    total_tokens: Option<u32>,
}

#[async_trait::async_trait]
impl TextGenerator for OpenAICompatibleGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> std::result::Result<String, OracleError> {
        let request = self.build_request(prompt, params);

        let mut builder = self
            .http_client
            .post(self.endpoint())
            .header("Content-Type", "application/json");

        if let Some(api_key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", api_key));
        }

        for (key, value) in &self.headers {
            builder = builder.header(key, value);
        }

        let response = builder
            .json(&request)
            .send()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &error_text));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Inference(format!("malformed response: {}", e)))?;

        if let Some(tokens) = completion.usage.as_ref().and_then(|u| u.total_tokens) {
            tracing::debug!("{} used {} tokens", self.name, tokens);
        }

        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(OracleError::EmptyResponse);
        }

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> OpenAICompatibleGenerator {
        OpenAICompatibleGenerator::new("test", None, "http://localhost:8080/v1/", "tiny")
    }

    #[test]
    fn test_endpoint_trims_slash() {
        assert_eq!(
            generator().endpoint(),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_for_beam_search_is_greedy() {
        let request = generator().build_request("hello", &GenerationParams::extraction());
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "tiny");
        assert_eq!(json["messages"][0]["content"], "hello");
        assert_eq!(json["max_tokens"], 250);
        assert_eq!(json["temperature"], 0.0);
        assert!(json.get("top_p").is_none());
    }

    #[test]
    fn test_request_for_sampling() {
        let params = GenerationParams::expansion().with_repetition_penalty(1.0);
        let json = serde_json::to_value(generator().build_request("p", &params)).unwrap();

        assert_eq!(json["temperature"], 0.7);
        assert_eq!(json["top_p"], 0.95);
        assert!(json.get("frequency_penalty").is_none());
    }

    #[test]
    fn test_frequency_penalty_mapping() {
        assert_eq!(frequency_penalty(1.0), None);
        assert!((frequency_penalty(1.2).unwrap() - 0.2).abs() < 1e-9);
        assert_eq!(frequency_penalty(4.0), Some(2.0));
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            OracleError::ResourceExhausted(_)
        ));
        assert!(matches!(
            status_error(StatusCode::SERVICE_UNAVAILABLE, ""),
            OracleError::ResourceExhausted(_)
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_REQUEST, "bad"),
            OracleError::Inference(_)
        ));
    }

    #[test]
    fn test_from_config_uses_model_name() {
        let config = OracleConfig::default().with_model("phi3").with_header("X-A", "1");
        let generator = OpenAICompatibleGenerator::from_config(&config).unwrap();
        assert_eq!(generator.name(), "openai-compatible:phi3");
        assert_eq!(generator.headers["X-A"], "1");
    }
}
