use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

use super::{CheckResult, SecurityReport, SecurityScanner, SecurityTarget};
use crate::config::SecurityConfig;
use crate::error::{NeoxError, NeoxResult};

pub const MALICIOUS_ADDRESS_FLAGS: [&str; 12] = [
    "blacklist_doubt",
    "blackmail_activities",
    "cybercrime",
    "darkweb_transactions",
    "financial_crime",
    "fake_token",
    "honeypot_related_address",
    "malicious_mining_activities",
    "mixer",
    "money_laundering",
    "phishing_activities",
    "stealing_attack",
];

/// Highest acceptable buy or sell tax, in percent.
const MAX_TAX_PERCENT: f64 = 10.0;

#[derive(Debug, Clone, Serialize)]
pub struct TokenAnalysis {
    pub contract: String,
    pub symbol: String,
    pub name: String,
    pub is_honeypot: bool,
    pub can_sell: bool,
    pub buy_tax_percent: f64,
    pub sell_tax_percent: f64,
    pub is_proxy: bool,
    pub is_mintable: bool,
    pub hidden_owner: bool,
}

impl TokenAnalysis {
    pub fn is_safe(&self) -> bool {
        !self.is_honeypot
            && self.can_sell
            && self.buy_tax_percent < MAX_TAX_PERCENT
            && self.sell_tax_percent < MAX_TAX_PERCENT
    }
}

/// GoPlus Labs security API.
pub struct GoPlusClient {
    client: Client,
    base_url: String,
    app_key: Option<String>,
    chain_id: String,
}

impl GoPlusClient {
    pub fn new(base_url: &str, app_key: Option<String>, chain_id: &str, timeout: Duration) -> NeoxResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            app_key,
            chain_id: chain_id.to_string(),
        })
    }

    pub fn from_config(config: &SecurityConfig) -> NeoxResult<Self> {
        Self::new(
            &config.base_url,
            config.goplus_app_key.clone(),
            &config.token_chain_id,
            Duration::from_secs(config.timeout_secs),
        )
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> NeoxResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GoPlus request: {}", url);

        let mut request = self.client.get(&url).query(query);
        if let Some(key) = &self.app_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            error!("GoPlus API returned status {}", status);
            return Err(NeoxError::security(format!("GoPlus API request failed with status {}", status)));
        }

        let mut body: Value = response.json().await?;
        match body.get_mut("result").map(Value::take) {
            Some(result) if !result.is_null() => Ok(result),
            _ => {
                let message = body["message"].as_str().unwrap_or("no result").to_string();
                Err(NeoxError::security(format!("GoPlus API: {}", message)))
            }
        }
    }

    /// Names of the malicious indicators set for `address`.
    pub async fn address_flags(&self, address: &str) -> NeoxResult<Vec<String>> {
        let result = self.get(&format!("/api/v1/address_security/{}", address), &[]).await?;

        Ok(MALICIOUS_ADDRESS_FLAGS
            .iter()
            .filter(|flag| is_set(&result[**flag]))
            .map(|flag| flag.to_string())
            .collect())
    }

    pub async fn token_security(&self, contract: &str) -> NeoxResult<TokenAnalysis> {
        let path = format!("/api/v1/token_security/{}", self.chain_id);
        let result = self.get(&path, &[("contract_addresses", contract)]).await?;

        let data = &result[contract.to_lowercase().as_str()];
        if data.is_null() {
            return Err(NeoxError::security(format!("No token data for {}", contract)));
        }

        let sell_tax = tax_percent(&data["sell_tax"]);
        Ok(TokenAnalysis {
            contract: contract.to_string(),
            symbol: data["token_symbol"].as_str().unwrap_or("UNKNOWN").to_string(),
            name: data["token_name"].as_str().unwrap_or("Unknown Token").to_string(),
            is_honeypot: is_set(&data["is_honeypot"]),
            can_sell: sell_tax < 100.0 && !is_set(&data["cannot_sell_all"]),
            buy_tax_percent: tax_percent(&data["buy_tax"]),
            sell_tax_percent: sell_tax,
            is_proxy: is_set(&data["is_proxy"]),
            is_mintable: is_set(&data["is_mintable"]),
            hidden_owner: is_set(&data["hidden_owner"]),
        })
    }

    pub async fn dapp_security(&self, url: &str) -> NeoxResult<Value> {
        self.get("/api/v1/dapp_security", &[("url", url)]).await
    }

    pub async fn phishing_site(&self, url: &str) -> NeoxResult<Value> {
        self.get("/api/v1/phishing_site", &[("url", url)]).await
    }
}

/// GoPlus encodes flags as `"1"` or `1`.
fn is_set(value: &Value) -> bool {
    value.as_str() == Some("1") || value.as_u64() == Some(1)
}

/// Taxes arrive as fractions ("0.05" is 5%).
fn tax_percent(value: &Value) -> f64 {
    let fraction = value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .unwrap_or(0.0);
    fraction * 100.0
}

#[async_trait]
impl SecurityScanner for GoPlusClient {
    async fn scan(&self, target: &SecurityTarget) -> NeoxResult<SecurityReport> {
        match target {
            SecurityTarget::Address(address) => {
                let flags = self.address_flags(address).await?;
                let detail = if flags.is_empty() {
                    "No malicious activity reported".to_string()
                } else {
                    format!("Flagged: {}", flags.join(", "))
                };
                let check = CheckResult::new("address_security", flags.is_empty(), detail);
                Ok(SecurityReport::aggregate(target, vec![check], flags))
            }
            SecurityTarget::Token(contract) => {
                let analysis = self.token_security(contract).await?;
                let detail = format!(
                    "{} ({}): honeypot={}, sellable={}, buy tax {:.1}%, sell tax {:.1}%",
                    analysis.name,
                    analysis.symbol,
                    analysis.is_honeypot,
                    analysis.can_sell,
                    analysis.buy_tax_percent,
                    analysis.sell_tax_percent
                );
                let check = CheckResult::new("token_security", analysis.is_safe(), detail);
                Ok(SecurityReport::aggregate(target, vec![check], Vec::new()))
            }
            SecurityTarget::Url(url) => {
                let dapp = self.dapp_security(url).await?;
                let phishing = self.phishing_site(url).await?;

                let dapp_safe = !is_set(&dapp["malicious_activity"]);
                let phishing_safe = !is_set(&phishing["phishing_site"]);

                let checks = vec![
                    CheckResult::new(
                        "dapp_security",
                        dapp_safe,
                        if dapp_safe { "No malicious activity reported" } else { "Malicious activity reported" },
                    ),
                    CheckResult::new(
                        "phishing_site",
                        phishing_safe,
                        if phishing_safe { "Not a known phishing site" } else { "Known phishing site" },
                    ),
                ];
                Ok(SecurityReport::aggregate(target, checks, Vec::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flags_accept_strings_and_numbers() {
        assert!(is_set(&json!("1")));
        assert!(is_set(&json!(1)));
        assert!(!is_set(&json!("0")));
        assert!(!is_set(&json!(null)));
    }

    #[test]
    fn token_taxes_are_percentages() {
        assert!((tax_percent(&json!("0.05")) - 5.0).abs() < 1e-9);
        assert_eq!(tax_percent(&json!(null)), 0.0);

        let mut analysis = TokenAnalysis {
            contract: "0x00".to_string(),
            symbol: "T".to_string(),
            name: "Test".to_string(),
            is_honeypot: false,
            can_sell: true,
            buy_tax_percent: 2.0,
            sell_tax_percent: 9.9,
            is_proxy: false,
            is_mintable: false,
            hidden_owner: false,
        };
        assert!(analysis.is_safe());
        analysis.sell_tax_percent = 10.0;
        assert!(!analysis.is_safe());
    }
}
