use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error};

use super::{ChatRequest, ChatResponse, Provider, ProviderClient, Usage};
use crate::error::{NeoxError, NeoxResult};

pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> NeoxResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl ProviderClient for OllamaClient {
    async fn chat_completion(&self, request: &ChatRequest) -> NeoxResult<ChatResponse> {
        let url = format!("{}/api/chat", self.base_url);

        let payload = json!({
            "model": request.model.as_deref().unwrap_or(self.get_default_model()),
            "messages": request.messages,
            "stream": false,
            "options": {
                "temperature": request.temperature.unwrap_or(0.7),
                "num_predict": request.max_tokens.unwrap_or(1000),
            }
        });

        debug!("Sending request to Ollama: {}", url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!("Ollama API error: {}", error_text);
            return Err(NeoxError::provider(format!("Ollama API error: {}", error_text)));
        }

        let response_json: serde_json::Value = response.json().await?;

        let content = response_json["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string();

        let model = response_json["model"]
            .as_str()
            .unwrap_or(self.get_default_model())
            .to_string();

        // Only eval counts are reported
        let usage = match (
            response_json["prompt_eval_count"].as_u64(),
            response_json["eval_count"].as_u64(),
        ) {
            (Some(prompt), Some(completion)) => Some(Usage {
                prompt_tokens: prompt as u32,
                completion_tokens: completion as u32,
                total_tokens: (prompt + completion) as u32,
            }),
            _ => None,
        };

        Ok(ChatResponse {
            content,
            model,
            provider: Provider::Ollama,
            usage,
        })
    }

    async fn health_check(&self) -> NeoxResult<bool> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn get_provider(&self) -> Provider {
        Provider::Ollama
    }

    fn get_default_model(&self) -> &str {
        &self.model
    }
}
