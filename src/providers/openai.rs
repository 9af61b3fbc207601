use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error};

use super::{ChatRequest, ChatResponse, Provider, ProviderClient, Usage};
use crate::error::{NeoxError, NeoxResult};

/// Any OpenAI-compatible chat completions endpoint.
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAIClient {
    pub fn new(api_key: String, base_url: &str, model: &str, timeout: Duration) -> NeoxResult<Self> {
        if api_key.trim().is_empty() {
            return Err(NeoxError::provider("OpenAI API key is empty"));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl ProviderClient for OpenAIClient {
    async fn chat_completion(&self, request: &ChatRequest) -> NeoxResult<ChatResponse> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let payload = json!({
            "model": request.model.as_deref().unwrap_or(self.get_default_model()),
            "messages": request.messages,
            "temperature": request.temperature.unwrap_or(0.7),
            "max_tokens": request.max_tokens.unwrap_or(1000),
        });

        debug!("Sending request to OpenAI: {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!("OpenAI API error ({}): {}", status, error_text);
            return Err(NeoxError::provider(format!("OpenAI API error ({}): {}", status, error_text)));
        }

        let response_json: serde_json::Value = response.json().await?;

        let content = response_json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| NeoxError::provider("OpenAI response contained no message content"))?
            .to_string();

        let model = response_json["model"]
            .as_str()
            .unwrap_or(self.get_default_model())
            .to_string();

        let usage = response_json.get("usage").map(|usage_data| Usage {
            prompt_tokens: usage_data["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            completion_tokens: usage_data["completion_tokens"].as_u64().unwrap_or(0) as u32,
            total_tokens: usage_data["total_tokens"].as_u64().unwrap_or(0) as u32,
        });

        Ok(ChatResponse {
            content,
            model,
            provider: Provider::OpenAI,
            usage,
        })
    }

    async fn health_check(&self) -> NeoxResult<bool> {
        let url = format!("{}/v1/models", self.base_url);

        match self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
        {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn get_provider(&self) -> Provider {
        Provider::OpenAI
    }

    fn get_default_model(&self) -> &str {
        &self.model
    }
}
