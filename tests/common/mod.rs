// Test doubles shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use neoxbridge::agents::{PendingTransfer, TransferExecutor, TransferReceipt};
use neoxbridge::chain::{
    AssetBalance, BlockSummary, ChainClient, CommitteeMember, NftHolding, TransactionStatus, TransferRecord,
};
use neoxbridge::neo::amount::{GAS_CONTRACT, NEO_CONTRACT};
use neoxbridge::neo::{Address, Network, ScriptHash};
use neoxbridge::prices::PriceFeed;
use neoxbridge::security::{CheckResult, SecurityGate, SecurityReport, SecurityScanner, SecurityTarget};
use neoxbridge::wallet::PrivateKey;
use neoxbridge::{Agent, NeoxConfig, NeoxError, NeoxResult, Services};

pub const KEY_HEX: &str = "c7134d6fd8e73d819e82755c64c93788d8db0961929e025a53363c4cc02a6962";

pub fn address(seed: u8) -> String {
    ScriptHash([seed; 20]).to_address().to_string()
}

pub fn wallet_address() -> String {
    PrivateKey::parse(KEY_HEX).unwrap().address().unwrap().to_string()
}

/// Same shape as `address(seed)` but with a broken checksum.
pub fn corrupted_address(seed: u8) -> String {
    let mut text = address(seed);
    let last = text.pop().unwrap();
    text.push(if last == 'a' { 'b' } else { 'a' });
    text
}

pub fn balance(symbol: &str, contract: &str, decimals: u32, amount: Decimal) -> AssetBalance {
    AssetBalance {
        symbol: symbol.to_string(),
        contract_hash: contract.to_string(),
        decimals,
        raw_amount: (amount * Decimal::from(10u64.pow(decimals))).normalize().to_string(),
        amount,
    }
}

pub struct MockChain {
    pub assets: Vec<AssetBalance>,
    pub fail: bool,
    pub reject: bool,
    pub calls: AtomicU32,
}

impl MockChain {
    pub fn with_balances(neo: i64, gas: Decimal) -> Self {
        Self {
            assets: vec![
                balance("NEO", NEO_CONTRACT, 0, Decimal::from(neo)),
                balance("GAS", GAS_CONTRACT, 8, gas),
            ],
            fail: false,
            reject: false,
            calls: AtomicU32::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            assets: Vec::new(),
            fail: true,
            reject: false,
            calls: AtomicU32::new(0),
        }
    }

    /// Answers every call with an input error instead of an outage.
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::with_balances(0, Decimal::ZERO)
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) -> NeoxResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(NeoxError::chain("explorer unavailable"))
        } else if self.reject {
            Err(NeoxError::invalid_input("malformed explorer request"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn network(&self) -> Network {
        Network::Testnet
    }

    fn endpoint(&self) -> &str {
        "mock://onegate"
    }

    async fn assets_held(&self, _address: &Address) -> NeoxResult<Vec<AssetBalance>> {
        self.hit()?;
        Ok(self.assets.clone())
    }

    async fn block_height(&self) -> NeoxResult<u64> {
        self.hit()?;
        Ok(4_321_987)
    }

    async fn recent_blocks(&self, limit: usize) -> NeoxResult<Vec<BlockSummary>> {
        self.hit()?;
        Ok((0..limit as u64)
            .map(|i| BlockSummary {
                index: 4_321_987 - i,
                hash: format!("0x{:064x}", i),
                transaction_count: i,
                timestamp: None,
            })
            .collect())
    }

    async fn asset_count(&self) -> NeoxResult<u64> {
        self.hit()?;
        Ok(842)
    }

    async fn nfts_owned(&self, _address: &Address) -> NeoxResult<Vec<NftHolding>> {
        self.hit()?;
        Ok(vec![
            NftHolding { contract: "0xaaaa".to_string(), token_id: "1".to_string() },
            NftHolding { contract: "0xaaaa".to_string(), token_id: "2".to_string() },
        ])
    }

    async fn transfers(&self, _address: &Address) -> NeoxResult<Vec<TransferRecord>> {
        self.hit()?;
        Ok(Vec::new())
    }

    async fn committee(&self) -> NeoxResult<Vec<CommitteeMember>> {
        self.hit()?;
        Ok(vec![CommitteeMember { candidate: "02ab".to_string(), votes: "100".to_string() }; 21])
    }

    async fn candidate_count(&self) -> NeoxResult<u64> {
        self.hit()?;
        Ok(95)
    }

    async fn transaction_status(&self, tx_hash: &str) -> NeoxResult<TransactionStatus> {
        self.hit()?;
        Ok(TransactionStatus {
            tx_hash: tx_hash.to_string(),
            vm_state: "HALT".to_string(),
            gas_consumed: Some(Decimal::new(997_775, 8)),
            block_hash: None,
        })
    }
}

#[derive(Default)]
pub struct FixedPrices {
    prices: Mutex<HashMap<String, Decimal>>,
}

impl FixedPrices {
    pub fn set(&self, symbol: &str, price: Decimal) {
        self.prices.lock().unwrap().insert(symbol.to_string(), price);
    }
}

#[async_trait]
impl PriceFeed for FixedPrices {
    async fn price(&self, symbol: &str) -> NeoxResult<Option<Decimal>> {
        Ok(self.prices.lock().unwrap().get(&symbol.to_uppercase()).copied())
    }
}

/// Scanner that flags every address in `flagged`.
pub struct ListScanner {
    pub flagged: Vec<String>,
    pub calls: AtomicU32,
}

impl ListScanner {
    pub fn new(flagged: Vec<String>) -> Self {
        Self { flagged, calls: AtomicU32::new(0) }
    }
}

#[async_trait]
impl SecurityScanner for ListScanner {
    async fn scan(&self, target: &SecurityTarget) -> NeoxResult<SecurityReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let flagged = self.flagged.iter().any(|f| f == target.value());
        let flags = if flagged { vec!["phishing_activities".to_string()] } else { Vec::new() };
        let check = CheckResult::new("address_security", !flagged, if flagged { "Flagged" } else { "Clean" });
        Ok(SecurityReport::aggregate(target, vec![check], flags))
    }
}

/// Executor that only counts how often it was asked to run.
pub struct CountingExecutor {
    pub calls: Arc<AtomicU32>,
}

#[async_trait]
impl TransferExecutor for CountingExecutor {
    async fn execute(
        &self,
        _transfer: &PendingTransfer,
        _wallet: &neoxbridge::WalletSession,
    ) -> NeoxResult<TransferReceipt> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(NeoxError::unsupported("counting executor"))
    }
}

pub fn test_config() -> NeoxConfig {
    let mut config = NeoxConfig::default();
    config.ui.enable_banner = false;
    config
}

pub fn agent_with(
    config: NeoxConfig,
    chain: Arc<MockChain>,
    scanner: Option<Arc<dyn SecurityScanner>>,
    prices: Arc<FixedPrices>,
) -> Agent {
    let security = SecurityGate::new(scanner, &config.security.blocklist);
    let services = Services {
        chain,
        security,
        prices,
        providers: None,
    };
    Agent::new(config, services)
}

pub fn default_agent(chain: Arc<MockChain>) -> Agent {
    agent_with(test_config(), chain, None, Arc::new(FixedPrices::default()))
}
