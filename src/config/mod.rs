// Configuration: defaults, optional TOML file, then environment overrides
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::error::{NeoxError, NeoxResult};
use crate::neo::Network;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_GOPLUS_BASE_URL: &str = "https://api.gopluslabs.io";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NeoxConfig {
    pub demo_mode: bool,
    pub llm: LlmConfig,
    pub neo: NeoConfig,
    pub security: SecurityConfig,
    pub prices: PriceConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub ollama_url: Option<String>,
    pub ollama_model: String,
    pub max_retries: u32,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NeoConfig {
    pub network: Network,
    pub rpc_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub goplus_app_key: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    pub enable_checks: bool,
    pub require_confirmation: bool,
    pub max_transfer_amount: Decimal,
    pub token_chain_id: String,
    pub blocklist: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceConfig {
    pub poll_interval_secs: u64,
    pub cache_secs: u64,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub enable_banner: bool,
    pub enable_colors: bool,
}

impl Default for NeoxConfig {
    fn default() -> Self {
        Self {
            demo_mode: true,
            llm: LlmConfig::default(),
            neo: NeoConfig::default(),
            security: SecurityConfig::default(),
            prices: PriceConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_OPENAI_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            ollama_url: None,
            ollama_model: "llama3.2".to_string(),
            max_retries: 2,
            temperature: 0.7,
            max_tokens: 1000,
            timeout_secs: 30,
        }
    }
}

impl Default for NeoConfig {
    fn default() -> Self {
        Self {
            network: Network::Testnet,
            rpc_url: None,
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            goplus_app_key: None,
            base_url: DEFAULT_GOPLUS_BASE_URL.to_string(),
            timeout_secs: 10,
            enable_checks: true,
            require_confirmation: true,
            max_transfer_amount: Decimal::from(1000),
            token_chain_id: "1".to_string(),
            blocklist: Vec::new(),
        }
    }
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            cache_secs: 60,
            base_url: "https://api.coingecko.com/api/v3".to_string(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            enable_banner: true,
            enable_colors: true,
        }
    }
}

impl NeoxConfig {
    pub fn from_toml_str(text: &str) -> NeoxResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Applies environment overrides through `lookup`, so callers and tests
    /// can supply something other than the process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = non_empty(lookup("OPENAI_API_KEY")) {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = non_empty(lookup("OPENAI_MODEL")) {
            self.llm.model = model;
        }
        if let Some(url) = non_empty(lookup("OPENAI_BASE_URL")) {
            self.llm.base_url = url;
        }
        if let Some(url) = non_empty(lookup("OLLAMA_URL")) {
            self.llm.ollama_url = Some(url);
        }

        if let Some(network) = non_empty(lookup("NEO_NETWORK")) {
            match Network::from_str(&network) {
                Ok(parsed) => self.neo.network = parsed,
                Err(_) => warn!("Ignoring unknown NEO_NETWORK value '{}'", network),
            }
        }
        if let Some(url) = non_empty(lookup("NEO_RPC_URL")) {
            self.neo.rpc_url = Some(url);
        }
        if let Some(value) = lookup("NEO_TIMEOUT") {
            self.neo.timeout_secs = parse_or("NEO_TIMEOUT", &value, self.neo.timeout_secs);
        }

        if let Some(key) = non_empty(lookup("GO_PLUS_LABS_APP_KEY")) {
            self.security.goplus_app_key = Some(key);
        }
        if let Some(url) = non_empty(lookup("GO_PLUS_LABS_BASE_URL")) {
            self.security.base_url = url;
        }
        if let Some(value) = lookup("GO_PLUS_LABS_TIMEOUT") {
            self.security.timeout_secs = parse_or("GO_PLUS_LABS_TIMEOUT", &value, self.security.timeout_secs);
        }
        if let Some(value) = lookup("ENABLE_SECURITY_CHECKS") {
            self.security.enable_checks = parse_bool(&value);
        }
        if let Some(value) = lookup("REQUIRE_CONFIRMATION") {
            self.security.require_confirmation = parse_bool(&value);
        }
        if let Some(value) = lookup("MAX_TRANSFER_AMOUNT") {
            self.security.max_transfer_amount =
                parse_or("MAX_TRANSFER_AMOUNT", &value, self.security.max_transfer_amount);
        }

        if let Some(value) = lookup("DEMO_MODE") {
            self.demo_mode = parse_bool(&value);
        }
        if let Some(value) = lookup("ENABLE_BANNER") {
            self.ui.enable_banner = parse_bool(&value);
        }
    }

    pub fn explorer_url(&self) -> String {
        self.neo
            .rpc_url
            .clone()
            .unwrap_or_else(|| self.neo.network.default_explorer_url().to_string())
    }

    pub fn llm_configured(&self) -> bool {
        self.llm.api_key.is_some() || self.llm.ollama_url.is_some()
    }

    pub fn status(&self) -> ConfigStatus {
        let mut missing = Vec::new();
        if !self.llm_configured() {
            missing.push("OPENAI_API_KEY");
        }
        if self.security.goplus_app_key.is_none() {
            missing.push("GO_PLUS_LABS_APP_KEY");
        }

        ConfigStatus {
            openai_configured: self.llm.api_key.is_some(),
            ollama_configured: self.llm.ollama_url.is_some(),
            goplus_configured: self.security.goplus_app_key.is_some(),
            network: self.neo.network,
            explorer_url: self.explorer_url(),
            demo_mode: self.demo_mode,
            security_checks: self.security.enable_checks,
            require_confirmation: self.security.require_confirmation,
            max_transfer_amount: self.security.max_transfer_amount,
            missing,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigStatus {
    pub openai_configured: bool,
    pub ollama_configured: bool,
    pub goplus_configured: bool,
    pub network: Network,
    pub explorer_url: String,
    pub demo_mode: bool,
    pub security_checks: bool,
    pub require_confirmation: bool,
    pub max_transfer_amount: Decimal,
    pub missing: Vec<&'static str>,
}

impl ConfigStatus {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

pub fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

fn parse_or<T: FromStr + Copy>(name: &str, value: &str, fallback: T) -> T {
    match value.trim().parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            warn!("Invalid value '{}' for {}, keeping default", value, name);
            fallback
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Self {
        let path = std::env::var("NEOX_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path());
        Self { path }
    }

    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("neoxbridge")
            .join("config.toml")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File (if present) layered with the process environment.
    pub async fn load_config(&self) -> NeoxResult<NeoxConfig> {
        self.load_config_with(|key| std::env::var(key).ok()).await
    }

    pub async fn load_config_with<F>(&self, lookup: F) -> NeoxResult<NeoxConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => {
                info!("📄 Loading config from {}", self.path.display());
                NeoxConfig::from_toml_str(&text).map_err(|e| {
                    NeoxError::config(format!("{}: {}", self.path.display(), e))
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config file at {}, using defaults", self.path.display());
                NeoxConfig::default()
            }
            Err(e) => return Err(e.into()),
        };

        config.apply_env(lookup);
        Ok(config)
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_safe() {
        let config = NeoxConfig::default();
        assert!(config.demo_mode);
        assert!(config.security.enable_checks);
        assert!(config.security.require_confirmation);
        assert_eq!(config.neo.network, Network::Testnet);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.security.max_transfer_amount, Decimal::from(1000));
    }

    #[test]
    fn parses_boolean_spellings() {
        for yes in ["true", "1", "YES", " on "] {
            assert!(parse_bool(yes), "{}", yes);
        }
        for no in ["false", "0", "off", "maybe", ""] {
            assert!(!parse_bool(no), "{}", no);
        }
    }

    #[test]
    fn env_overrides_defaults() {
        let mut config = NeoxConfig::default();
        config.apply_env(lookup(&[
            ("NEO_NETWORK", "mainnet"),
            ("DEMO_MODE", "false"),
            ("MAX_TRANSFER_AMOUNT", "25.5"),
            ("OPENAI_API_KEY", "sk-test"),
        ]));

        assert_eq!(config.neo.network, Network::Mainnet);
        assert!(!config.demo_mode);
        assert_eq!(config.security.max_transfer_amount, Decimal::new(255, 1));
        assert_eq!(config.explorer_url(), "https://explorer.onegate.space/api");
        assert!(config.status().missing.contains(&"GO_PLUS_LABS_APP_KEY"));
        assert!(!config.status().missing.contains(&"OPENAI_API_KEY"));
    }

    #[test]
    fn bad_numbers_keep_the_previous_value() {
        let mut config = NeoxConfig::default();
        config.apply_env(lookup(&[("NEO_TIMEOUT", "soon"), ("NEO_NETWORK", "devnet")]));
        assert_eq!(config.neo.timeout_secs, 30);
        assert_eq!(config.neo.network, Network::Testnet);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config = NeoxConfig::from_toml_str(
            r#"
            demo_mode = false

            [neo]
            network = "mainnet"
            "#,
        )
        .unwrap();
        assert!(!config.demo_mode);
        assert_eq!(config.neo.network, Network::Mainnet);
        assert_eq!(config.security.timeout_secs, 10);
    }
}
