use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, error};

use super::PriceFeed;
use crate::config::PriceConfig;
use crate::error::{NeoxError, NeoxResult};

/// CoinGecko coin id for a ticker symbol.
pub fn coin_id(symbol: &str) -> Option<&'static str> {
    match symbol.trim().to_uppercase().as_str() {
        "NEO" => Some("neo"),
        "GAS" => Some("gas"),
        "BTC" | "BITCOIN" => Some("bitcoin"),
        "ETH" | "ETHEREUM" => Some("ethereum"),
        _ => None,
    }
}

pub struct CoinGeckoFeed {
    client: Client,
    base_url: String,
    cache_ttl: Duration,
    cache: RwLock<HashMap<&'static str, (Decimal, Instant)>>,
}

impl CoinGeckoFeed {
    pub fn new(base_url: &str, cache_ttl: Duration) -> NeoxResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache_ttl,
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn from_config(config: &PriceConfig) -> NeoxResult<Self> {
        Self::new(&config.base_url, Duration::from_secs(config.cache_secs))
    }

    async fn cached(&self, id: &str) -> Option<Decimal> {
        let cache = self.cache.read().await;
        cache
            .get(id)
            .filter(|(_, fetched_at)| fetched_at.elapsed() < self.cache_ttl)
            .map(|(price, _)| *price)
    }
}

#[async_trait]
impl PriceFeed for CoinGeckoFeed {
    async fn price(&self, symbol: &str) -> NeoxResult<Option<Decimal>> {
        let Some(id) = coin_id(symbol) else {
            return Ok(None);
        };

        if let Some(price) = self.cached(id).await {
            debug!("Price cache hit for {}", id);
            return Ok(Some(price));
        }

        let url = format!("{}/simple/price", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("ids", id), ("vs_currencies", "usd")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            error!("CoinGecko API returned status {}", status);
            return Err(NeoxError::provider(format!("CoinGecko API error: {}", status)));
        }

        let body: Value = response.json().await?;
        let price = body[id]["usd"]
            .as_f64()
            .and_then(Decimal::from_f64_retain)
            .map(|p| p.round_dp(8).normalize());

        if let Some(price) = price {
            self.cache.write().await.insert(id, (price, Instant::now()));
        }
        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_common_symbols() {
        assert_eq!(coin_id("neo"), Some("neo"));
        assert_eq!(coin_id("GAS"), Some("gas"));
        assert_eq!(coin_id("Bitcoin"), Some("bitcoin"));
        assert_eq!(coin_id("eth"), Some("ethereum"));
        assert_eq!(coin_id("DOGE"), None);
    }
}
