// Price quotes and in-memory price alerts
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{NeoxError, NeoxResult};

pub mod coingecko;

pub use coingecko::CoinGeckoFeed;

#[async_trait]
pub trait PriceFeed: Send + Sync {
    /// USD price, or `None` when the symbol is unknown to the feed.
    async fn price(&self, symbol: &str) -> NeoxResult<Option<Decimal>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertCondition {
    Above,
    Below,
}

impl AlertCondition {
    pub fn is_met(&self, price: Decimal, threshold: Decimal) -> bool {
        match self {
            AlertCondition::Above => price >= threshold,
            AlertCondition::Below => price <= threshold,
        }
    }
}

impl std::fmt::Display for AlertCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertCondition::Above => write!(f, "above"),
            AlertCondition::Below => write!(f, "below"),
        }
    }
}

impl std::str::FromStr for AlertCondition {
    type Err = NeoxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "above" | "over" | ">" => Ok(AlertCondition::Above),
            "below" | "under" | "<" => Ok(AlertCondition::Below),
            other => Err(NeoxError::invalid_input(format!("Unknown alert condition '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceAlert {
    pub id: Uuid,
    pub symbol: String,
    pub condition: AlertCondition,
    pub threshold: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub triggered_at: Option<DateTime<Utc>>,
    pub triggered_price: Option<Decimal>,
}

impl PriceAlert {
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }
}

#[derive(Debug, Default)]
pub struct AlertBook {
    alerts: Vec<PriceAlert>,
}

impl AlertBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, symbol: &str, condition: AlertCondition, threshold: Decimal) -> NeoxResult<PriceAlert> {
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(NeoxError::invalid_input("Alert symbol cannot be empty"));
        }
        if threshold <= Decimal::ZERO {
            return Err(NeoxError::invalid_input("Alert threshold must be positive"));
        }

        let alert = PriceAlert {
            id: Uuid::new_v4(),
            symbol,
            condition,
            threshold,
            active: true,
            created_at: Utc::now(),
            triggered_at: None,
            triggered_price: None,
        };

        info!("🔔 Created price alert: {} {} {}", alert.symbol, alert.condition, alert.threshold);
        self.alerts.push(alert.clone());
        Ok(alert)
    }

    pub fn active(&self) -> Vec<PriceAlert> {
        self.alerts.iter().filter(|a| a.active).cloned().collect()
    }

    pub fn all(&self) -> &[PriceAlert] {
        &self.alerts
    }

    /// Removes by full id or by the 8-character short id shown to users.
    pub fn remove(&mut self, id: &str) -> Option<PriceAlert> {
        let id = id.trim().to_lowercase();
        let position = self.alerts.iter().position(|a| {
            let full = a.id.to_string();
            full == id || (id.len() >= 8 && a.id.simple().to_string().starts_with(&id))
        })?;
        Some(self.alerts.remove(position))
    }

    /// Evaluates active alerts against `feed`; triggered alerts are deactivated and returned.
    pub async fn check(&mut self, feed: &dyn PriceFeed) -> Vec<PriceAlert> {
        let mut triggered = Vec::new();

        for alert in self.alerts.iter_mut().filter(|a| a.active) {
            let price = match feed.price(&alert.symbol).await {
                Ok(Some(price)) => price,
                Ok(None) => {
                    debug!("No price for {}, skipping alert", alert.symbol);
                    continue;
                }
                Err(e) => {
                    debug!("Price lookup for {} failed, skipping alert: {}", alert.symbol, e);
                    continue;
                }
            };

            if alert.condition.is_met(price, alert.threshold) {
                alert.active = false;
                alert.triggered_at = Some(Utc::now());
                alert.triggered_price = Some(price);
                info!("🚨 Price alert triggered: {} is {} (threshold {})", alert.symbol, price, alert.threshold);
                triggered.push(alert.clone());
            }
        }

        triggered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FixedFeed(HashMap<&'static str, Decimal>);

    #[async_trait]
    impl PriceFeed for FixedFeed {
        async fn price(&self, symbol: &str) -> NeoxResult<Option<Decimal>> {
            Ok(self.0.get(symbol).copied())
        }
    }

    #[test]
    fn rejects_non_positive_thresholds() {
        let mut book = AlertBook::new();
        assert!(book.create("NEO", AlertCondition::Above, Decimal::ZERO).is_err());
        assert!(book.create(" ", AlertCondition::Above, Decimal::ONE).is_err());
        assert!(book.all().is_empty());
    }

    #[test]
    fn removes_by_short_id() {
        let mut book = AlertBook::new();
        let alert = book.create("gas", AlertCondition::Below, Decimal::new(5, 0)).unwrap();
        assert_eq!(alert.symbol, "GAS");

        assert!(book.remove("abc").is_none());
        let removed = book.remove(&alert.short_id()).unwrap();
        assert_eq!(removed.id, alert.id);
        assert!(book.active().is_empty());
    }

    #[tokio::test]
    async fn triggers_on_threshold_boundaries() {
        let mut book = AlertBook::new();
        book.create("NEO", AlertCondition::Above, Decimal::new(15, 0)).unwrap();
        book.create("GAS", AlertCondition::Below, Decimal::new(3, 0)).unwrap();
        book.create("BTC", AlertCondition::Above, Decimal::new(1, 0)).unwrap();

        let feed = FixedFeed(HashMap::from([
            ("NEO", Decimal::new(15, 0)),
            ("GAS", Decimal::new(4, 0)),
        ]));

        let triggered = book.check(&feed).await;
        assert_eq!(triggered.len(), 1);
        assert_eq!(triggered[0].symbol, "NEO");
        assert!(triggered[0].triggered_at.is_some());

        let active: Vec<String> = book.active().into_iter().map(|a| a.symbol).collect();
        assert_eq!(active, vec!["GAS".to_string(), "BTC".to_string()]);

        // Already triggered alerts stay quiet.
        assert!(book.check(&feed).await.is_empty());
    }
}
