// Chain data access - read-only queries against a Neo N3 data endpoint
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::NeoxResult;
use crate::neo::{Address, Asset, Network};

pub mod onegate;

pub use onegate::OneGateClient;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetBalance {
    pub symbol: String,
    pub contract_hash: String,
    pub decimals: u32,
    pub raw_amount: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSummary {
    pub index: u64,
    pub hash: String,
    pub transaction_count: u64,
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NftHolding {
    pub contract: String,
    pub token_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub tx_hash: String,
    pub contract: String,
    pub from: Option<String>,
    pub to: Option<String>,
    pub raw_value: String,
    pub timestamp: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitteeMember {
    pub candidate: String,
    pub votes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionStatus {
    pub tx_hash: String,
    pub vm_state: String,
    pub gas_consumed: Option<Decimal>,
    pub block_hash: Option<String>,
}

impl TransactionStatus {
    pub fn succeeded(&self) -> bool {
        self.vm_state.eq_ignore_ascii_case("HALT")
    }
}

/// NEO and GAS amounts pulled out of a full asset listing; missing assets read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct NativeBalances {
    pub neo: Decimal,
    pub gas: Decimal,
}

impl NativeBalances {
    pub fn from_assets(assets: &[AssetBalance]) -> Self {
        let mut balances = Self::default();
        for asset in assets {
            if asset.contract_hash.eq_ignore_ascii_case(Asset::Neo.contract_hash()) {
                balances.neo = asset.amount;
            } else if asset.contract_hash.eq_ignore_ascii_case(Asset::Gas.contract_hash()) {
                balances.gas = asset.amount;
            }
        }
        balances
    }

    pub fn get(&self, asset: Asset) -> Decimal {
        match asset {
            Asset::Neo => self.neo,
            Asset::Gas => self.gas,
        }
    }
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    fn network(&self) -> Network;
    fn endpoint(&self) -> &str;

    async fn assets_held(&self, address: &Address) -> NeoxResult<Vec<AssetBalance>>;
    async fn block_height(&self) -> NeoxResult<u64>;
    async fn recent_blocks(&self, limit: usize) -> NeoxResult<Vec<BlockSummary>>;
    async fn asset_count(&self) -> NeoxResult<u64>;
    async fn nfts_owned(&self, address: &Address) -> NeoxResult<Vec<NftHolding>>;
    async fn transfers(&self, address: &Address) -> NeoxResult<Vec<TransferRecord>>;
    async fn committee(&self) -> NeoxResult<Vec<CommitteeMember>>;
    async fn candidate_count(&self) -> NeoxResult<u64>;
    async fn transaction_status(&self, tx_hash: &str) -> NeoxResult<TransactionStatus>;

    async fn native_balances(&self, address: &Address) -> NeoxResult<NativeBalances> {
        let assets = self.assets_held(address).await?;
        Ok(NativeBalances::from_assets(&assets))
    }
}
