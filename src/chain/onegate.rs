use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use super::{AssetBalance, BlockSummary, ChainClient, CommitteeMember, NftHolding, TransactionStatus, TransferRecord};
use crate::config::NeoxConfig;
use crate::error::{NeoxError, NeoxResult};
use crate::neo::amount::{from_raw, GAS_CONTRACT, NEO_CONTRACT};
use crate::neo::{Address, Network};

#[derive(Debug, Clone)]
struct AssetMeta {
    symbol: String,
    decimals: u32,
}

/// JSON-RPC client for the OneGate explorer API.
pub struct OneGateClient {
    client: Client,
    url: String,
    network: Network,
    max_retries: u32,
    assets: RwLock<HashMap<String, AssetMeta>>,
}

impl OneGateClient {
    pub fn new(url: &str, network: Network, timeout: Duration, max_retries: u32) -> NeoxResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        let mut assets = HashMap::new();
        assets.insert(NEO_CONTRACT.to_string(), AssetMeta { symbol: "NEO".to_string(), decimals: 0 });
        assets.insert(GAS_CONTRACT.to_string(), AssetMeta { symbol: "GAS".to_string(), decimals: 8 });

        Ok(Self {
            client,
            url: url.to_string(),
            network,
            max_retries,
            assets: RwLock::new(assets),
        })
    }

    pub fn from_config(config: &NeoxConfig) -> NeoxResult<Self> {
        Self::new(
            &config.explorer_url(),
            config.neo.network,
            Duration::from_secs(config.neo.timeout_secs),
            config.neo.max_retries,
        )
    }

    /// Sends one RPC call, retrying transport failures only.
    async fn call(&self, method: &str, params: Value) -> NeoxResult<Value> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let mut attempt = 0;
        let response = loop {
            debug!("OneGate {} (attempt {})", method, attempt + 1);
            match self.client.post(&self.url).json(&payload).send().await {
                Ok(response) => break response,
                Err(e) if attempt < self.max_retries => {
                    warn!("OneGate {} failed, retrying: {}", method, e);
                    attempt += 1;
                }
                Err(e) => {
                    error!("OneGate {} failed: {}", method, e);
                    return Err(e.into());
                }
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!("OneGate API error ({}): {}", status, error_text);
            return Err(NeoxError::chain(format!("{} returned HTTP {}: {}", method, status, error_text)));
        }

        let mut body: Value = response.json().await?;

        if let Some(rpc_error) = body.get("error").filter(|e| !e.is_null()) {
            let message = rpc_error["message"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| rpc_error.to_string());
            return Err(NeoxError::chain(format!("{}: {}", method, message)));
        }

        Ok(body.get_mut("result").map(Value::take).unwrap_or(Value::Null))
    }

    async fn asset_meta(&self, contract_hash: &str) -> NeoxResult<AssetMeta> {
        let key = contract_hash.to_lowercase();
        if let Some(meta) = self.assets.read().await.get(&key) {
            return Ok(meta.clone());
        }

        let info = self
            .call("GetAssetInfoByContractHash", json!({ "ContractHash": contract_hash }))
            .await?;

        let symbol = info["symbol"]
            .as_str()
            .ok_or_else(|| NeoxError::chain(format!("No asset info for {}", contract_hash)))?
            .to_string();
        let decimals = lenient_u64(&info["decimals"]).unwrap_or(0) as u32;

        let meta = AssetMeta { symbol, decimals };
        self.assets.write().await.insert(key, meta.clone());
        Ok(meta)
    }

    async fn count(&self, method: &str) -> NeoxResult<u64> {
        let result = self.call(method, json!({})).await?;
        lenient_u64(&result["total counts"])
            .ok_or_else(|| NeoxError::chain(format!("{} returned no count", method)))
    }
}

/// Explorer list results come either bare or wrapped as `{ "result": [...], "totalCount": n }`.
fn list_items(value: &Value) -> Vec<Value> {
    value
        .as_array()
        .or_else(|| value["result"].as_array())
        .cloned()
        .unwrap_or_default()
}

fn lenient_u64(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

fn lenient_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_string(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| lenient_string(&item[*key]))
}

#[async_trait]
impl ChainClient for OneGateClient {
    fn network(&self) -> Network {
        self.network
    }

    fn endpoint(&self) -> &str {
        &self.url
    }

    async fn assets_held(&self, address: &Address) -> NeoxResult<Vec<AssetBalance>> {
        let script_hash = address.script_hash().to_string();
        let result = self
            .call("GetAssetsHeldByAddress", json!({ "Address": script_hash }))
            .await?;

        let mut balances = Vec::new();
        for item in list_items(&result) {
            let Some(contract_hash) = item["asset"].as_str() else {
                continue;
            };
            let raw_amount = lenient_string(&item["balance"]).unwrap_or_else(|| "0".to_string());

            let meta = match self.asset_meta(contract_hash).await {
                Ok(meta) => meta,
                Err(e) => {
                    warn!("Skipping asset {}: {}", contract_hash, e);
                    continue;
                }
            };

            let amount = from_raw(&raw_amount, meta.decimals).unwrap_or_else(|e| {
                warn!("Unreadable {} balance '{}', showing 0: {}", meta.symbol, raw_amount, e);
                Decimal::ZERO
            });

            balances.push(AssetBalance {
                symbol: meta.symbol,
                contract_hash: contract_hash.to_lowercase(),
                decimals: meta.decimals,
                amount,
                raw_amount,
            });
        }

        debug!("{} holds {} assets", address, balances.len());
        Ok(balances)
    }

    async fn block_height(&self) -> NeoxResult<u64> {
        let result = self.call("GetBlockCount", json!({})).await?;
        lenient_u64(&result["index"]).ok_or_else(|| NeoxError::chain("GetBlockCount returned no index"))
    }

    async fn recent_blocks(&self, limit: usize) -> NeoxResult<Vec<BlockSummary>> {
        let result = self.call("GetBlockInfoList", json!({ "Limit": limit, "Skip": 0 })).await?;

        Ok(list_items(&result)
            .iter()
            .filter_map(|item| {
                Some(BlockSummary {
                    index: lenient_u64(&item["index"])?,
                    hash: item["hash"].as_str().unwrap_or_default().to_string(),
                    transaction_count: lenient_u64(&item["transactioncount"]).unwrap_or(0),
                    timestamp: item["timestamp"].as_i64(),
                })
            })
            .take(limit)
            .collect())
    }

    async fn asset_count(&self) -> NeoxResult<u64> {
        self.count("GetAssetCount").await
    }

    async fn nfts_owned(&self, address: &Address) -> NeoxResult<Vec<NftHolding>> {
        let script_hash = address.script_hash().to_string();
        let result = self
            .call("GetNep11OwnedByAddress", json!({ "Address": script_hash }))
            .await?;

        Ok(list_items(&result)
            .iter()
            .filter_map(|item| {
                Some(NftHolding {
                    contract: first_string(item, &["asset", "contract"])?,
                    token_id: first_string(item, &["tokenid", "tokenId"]).unwrap_or_default(),
                })
            })
            .collect())
    }

    async fn transfers(&self, address: &Address) -> NeoxResult<Vec<TransferRecord>> {
        let script_hash = address.script_hash().to_string();
        let result = self
            .call("GetNep17TransferByAddress", json!({ "Address": script_hash }))
            .await?;

        Ok(list_items(&result)
            .iter()
            .map(|item| TransferRecord {
                tx_hash: first_string(item, &["txid", "hash"]).unwrap_or_default(),
                contract: first_string(item, &["contract", "asset"]).unwrap_or_default(),
                from: item["from"].as_str().map(str::to_string),
                to: item["to"].as_str().map(str::to_string),
                raw_value: lenient_string(&item["value"]).unwrap_or_else(|| "0".to_string()),
                timestamp: item["timestamp"].as_i64(),
            })
            .collect())
    }

    async fn committee(&self) -> NeoxResult<Vec<CommitteeMember>> {
        let result = self.call("GetCommittee", json!({})).await?;

        Ok(list_items(&result)
            .iter()
            .filter_map(|item| {
                Some(CommitteeMember {
                    candidate: first_string(item, &["candidate", "publickey"])?,
                    votes: first_string(item, &["votesOfCandidate", "votes"]).unwrap_or_else(|| "0".to_string()),
                })
            })
            .collect())
    }

    async fn candidate_count(&self) -> NeoxResult<u64> {
        self.count("GetCandidateCount").await
    }

    async fn transaction_status(&self, tx_hash: &str) -> NeoxResult<TransactionStatus> {
        let result = self
            .call("GetApplicationLogByTransactionHash", json!({ "TransactionHash": tx_hash }))
            .await?;

        if result.is_null() {
            return Err(NeoxError::chain(format!("Transaction {} not found", tx_hash)));
        }

        // The execution details sit either at the top level or in the first execution.
        let execution = result["executions"]
            .as_array()
            .and_then(|executions| executions.first())
            .unwrap_or(&result);

        let vm_state = first_string(execution, &["vmstate", "vmState"]).unwrap_or_else(|| "UNKNOWN".to_string());
        let gas_consumed = first_string(execution, &["gasconsumed", "gasConsumed"])
            .and_then(|raw| from_raw(&raw, 8).ok());

        Ok(TransactionStatus {
            tx_hash: tx_hash.to_string(),
            vm_state,
            gas_consumed,
            block_hash: first_string(&result, &["blockhash", "blockHash"]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwraps_both_list_shapes() {
        let bare = json!([{ "index": 1 }, { "index": 2 }]);
        let wrapped = json!({ "result": [{ "index": 1 }], "totalCount": 1 });
        assert_eq!(list_items(&bare).len(), 2);
        assert_eq!(list_items(&wrapped).len(), 1);
        assert!(list_items(&json!(null)).is_empty());
    }

    #[test]
    fn reads_numbers_from_strings_and_numbers() {
        assert_eq!(lenient_u64(&json!("8")), Some(8));
        assert_eq!(lenient_u64(&json!(8)), Some(8));
        assert_eq!(lenient_u64(&json!(null)), None);
        assert_eq!(lenient_string(&json!(100)), Some("100".to_string()));
    }
}
