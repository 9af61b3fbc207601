use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::LlmConfig;
use crate::error::{NeoxError, NeoxResult};

pub mod ollama;
pub mod openai;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    OpenAI,
    Ollama,
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::OpenAI => write!(f, "openai"),
            Provider::Ollama => write!(f, "ollama"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProviderHealth {
    pub provider: Provider,
    pub is_healthy: bool,
    pub last_check: Instant,
    pub response_time: Duration,
    pub error_rate: f32,
}

impl ProviderHealth {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            is_healthy: true,
            last_check: Instant::now(),
            response_time: Duration::from_millis(0),
            error_rate: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system<T: Into<String>>(content: T) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user<T: Into<String>>(content: T) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    pub model: String,
    pub provider: Provider,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[async_trait]
pub trait ProviderClient: Send + Sync {
    async fn chat_completion(&self, request: &ChatRequest) -> NeoxResult<ChatResponse>;
    async fn health_check(&self) -> NeoxResult<bool>;
    fn get_provider(&self) -> Provider;
    fn get_default_model(&self) -> &str;
}

struct Registration {
    client: Arc<dyn ProviderClient>,
    priority: u8,
}

/// Registered LLM clients tried in priority order, each retried before falling back.
pub struct ProviderManager {
    providers: RwLock<HashMap<Provider, Registration>>,
    health: RwLock<HashMap<Provider, ProviderHealth>>,
    max_retries: u32,
}

impl ProviderManager {
    pub fn new(max_retries: u32) -> Self {
        Self {
            providers: RwLock::new(HashMap::new()),
            health: RwLock::new(HashMap::new()),
            max_retries,
        }
    }

    /// Registers whichever providers the configuration enables; may register none.
    pub async fn from_config(config: &LlmConfig) -> NeoxResult<Self> {
        let manager = Self::new(config.max_retries);
        let timeout = Duration::from_secs(config.timeout_secs);

        if let Some(api_key) = &config.api_key {
            let client = openai::OpenAIClient::new(api_key.clone(), &config.base_url, &config.model, timeout)?;
            manager.register_provider(Arc::new(client), 8).await;
        }

        if let Some(url) = &config.ollama_url {
            let client = ollama::OllamaClient::new(url, &config.ollama_model, timeout)?;
            manager.register_provider(Arc::new(client), 5).await;
        }

        Ok(manager)
    }

    pub async fn register_provider(&self, client: Arc<dyn ProviderClient>, priority: u8) {
        let provider = client.get_provider();
        debug!("Registering provider: {} (priority {})", provider, priority);

        let mut providers = self.providers.write().await;
        providers.insert(provider, Registration { client, priority });

        let mut health = self.health.write().await;
        health.insert(provider, ProviderHealth::new(provider));
    }

    pub async fn has_providers(&self) -> bool {
        !self.providers.read().await.is_empty()
    }

    /// Providers ordered by priority, with unhealthy ones pushed to the back.
    pub async fn ordered_providers(&self) -> Vec<Provider> {
        let providers = self.providers.read().await;
        let health = self.health.read().await;

        let mut scored: Vec<(Provider, f32)> = providers
            .iter()
            .map(|(provider, registration)| {
                let mut score = registration.priority as f32;
                if let Some(provider_health) = health.get(provider) {
                    if !provider_health.is_healthy {
                        score *= 0.1;
                    }
                    score *= 1.0 - provider_health.error_rate;
                }
                (*provider, score)
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().map(|(provider, _)| provider).collect()
    }

    pub async fn chat_completion(&self, request: &ChatRequest) -> NeoxResult<ChatResponse> {
        let order = self.ordered_providers().await;
        if order.is_empty() {
            return Err(NeoxError::provider("No LLM provider configured"));
        }

        for provider in order {
            let Some(client) = self.get_provider_client(provider).await else {
                continue;
            };

            for attempt in 0..=self.max_retries {
                let start_time = Instant::now();

                match client.chat_completion(request).await {
                    Ok(response) => {
                        self.update_health(provider, true, start_time.elapsed()).await;
                        return Ok(response);
                    }
                    Err(e) => {
                        self.update_health(provider, false, start_time.elapsed()).await;
                        warn!("Provider {} failed (attempt {}): {}", provider, attempt + 1, e);
                    }
                }
            }
        }

        Err(NeoxError::provider("All providers failed"))
    }

    pub async fn health_check_all(&self) -> Vec<(Provider, bool)> {
        let clients: Vec<Arc<dyn ProviderClient>> = {
            let providers = self.providers.read().await;
            providers.values().map(|r| r.client.clone()).collect()
        };

        let mut results = Vec::new();
        for client in clients {
            let provider = client.get_provider();
            let start_time = Instant::now();
            let healthy = client.health_check().await.unwrap_or(false);
            self.update_health(provider, healthy, start_time.elapsed()).await;
            info!("🩺 Provider {} healthy: {}", provider, healthy);
            results.push((provider, healthy));
        }
        results
    }

    async fn get_provider_client(&self, provider: Provider) -> Option<Arc<dyn ProviderClient>> {
        let providers = self.providers.read().await;
        providers.get(&provider).map(|r| r.client.clone())
    }

    async fn update_health(&self, provider: Provider, is_healthy: bool, response_time: Duration) {
        let mut health = self.health.write().await;

        if let Some(provider_health) = health.get_mut(&provider) {
            provider_health.is_healthy = is_healthy;
            provider_health.last_check = Instant::now();
            provider_health.response_time = response_time;

            // Exponential moving average
            let error_value = if is_healthy { 0.0 } else { 1.0 };
            provider_health.error_rate = provider_health.error_rate * 0.9 + error_value * 0.1;
        }
    }

    pub async fn get_provider_status(&self) -> Vec<(Provider, ProviderHealth)> {
        let health = self.health.read().await;
        health.iter().map(|(p, h)| (*p, h.clone())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Scripted {
        provider: Provider,
        failures_before_success: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl ProviderClient for Scripted {
        async fn chat_completion(&self, _request: &ChatRequest) -> NeoxResult<ChatResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                return Err(NeoxError::provider("scripted failure"));
            }
            Ok(ChatResponse {
                content: format!("from {}", self.provider),
                model: "test".to_string(),
                provider: self.provider,
                usage: None,
            })
        }

        async fn health_check(&self) -> NeoxResult<bool> {
            Ok(true)
        }

        fn get_provider(&self) -> Provider {
            self.provider
        }

        fn get_default_model(&self) -> &str {
            "test"
        }
    }

    fn scripted(provider: Provider, failures: u32) -> Arc<Scripted> {
        Arc::new(Scripted {
            provider,
            failures_before_success: failures,
            calls: AtomicU32::new(0),
        })
    }

    #[tokio::test]
    async fn retries_before_succeeding() {
        let manager = ProviderManager::new(2);
        let client = scripted(Provider::OpenAI, 2);
        manager.register_provider(client.clone(), 8).await;

        let response = manager.chat_completion(&ChatRequest::new(vec![ChatMessage::user("hi")])).await.unwrap();
        assert_eq!(response.provider, Provider::OpenAI);
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn falls_back_to_the_next_provider() {
        let manager = ProviderManager::new(1);
        let primary = scripted(Provider::OpenAI, u32::MAX);
        let fallback = scripted(Provider::Ollama, 0);
        manager.register_provider(primary.clone(), 8).await;
        manager.register_provider(fallback, 5).await;

        let response = manager.chat_completion(&ChatRequest::new(vec![ChatMessage::user("hi")])).await.unwrap();
        assert_eq!(response.provider, Provider::Ollama);
        assert_eq!(primary.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn reports_when_every_provider_fails() {
        let manager = ProviderManager::new(0);
        manager.register_provider(scripted(Provider::OpenAI, u32::MAX), 8).await;

        let err = manager.chat_completion(&ChatRequest::new(vec![ChatMessage::user("hi")])).await.unwrap_err();
        assert!(err.to_string().contains("All providers failed"));

        let status = manager.get_provider_status().await;
        assert!(!status[0].1.is_healthy);
        assert!(status[0].1.error_rate > 0.0);
    }

    #[tokio::test]
    async fn empty_manager_reports_missing_configuration() {
        let manager = ProviderManager::new(2);
        assert!(!manager.has_providers().await);
        assert!(manager.chat_completion(&ChatRequest::new(vec![])).await.is_err());
    }
}
