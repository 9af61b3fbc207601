// Two-step NEO/GAS transfer flow with pluggable executors
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::chain::NativeBalances;
use crate::error::{NeoxError, NeoxResult};
use crate::neo::amount::{format_decimal, parse_amount};
use crate::neo::{Address, Asset};
use crate::security::{RiskLevel, SecurityReport};
use crate::wallet::WalletSession;

/// Flat network fee charged in GAS for every transfer.
pub const NETWORK_FEE: Decimal = Decimal::from_parts(5, 0, 0, false, 1);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferRequest {
    pub amount: Decimal,
    pub asset: Asset,
    pub recipient: Address,
}

impl TransferRequest {
    /// Checks recipient, amount/asset and the configured maximum, in that order.
    pub fn validate(amount: &str, asset: &str, recipient: &str, max_amount: Decimal) -> NeoxResult<Self> {
        let recipient = Address::parse(recipient)?;
        let amount = parse_amount(amount)?;
        if amount <= Decimal::ZERO {
            return Err(NeoxError::invalid_input("Amount must be positive"));
        }
        let asset: Asset = asset.parse()?;
        asset.check_amount(amount)?;

        if amount > max_amount {
            return Err(NeoxError::invalid_input(format!(
                "Amount {} {} exceeds the maximum transfer amount of {}",
                format_decimal(amount),
                asset,
                format_decimal(max_amount)
            )));
        }

        Ok(Self { amount, asset, recipient })
    }

    /// Rejects the request unless the balances cover the amount and the GAS fee.
    pub fn check_balance(&self, balances: &NativeBalances) -> NeoxResult<()> {
        let (required, available) = match self.asset {
            Asset::Gas => (self.amount + NETWORK_FEE, balances.gas),
            Asset::Neo => (self.amount, balances.neo),
        };
        if available < required {
            return Err(NeoxError::InsufficientBalance {
                asset: self.asset.symbol().to_string(),
                required,
                available,
            });
        }

        if self.asset == Asset::Neo && balances.gas < NETWORK_FEE {
            return Err(NeoxError::InsufficientBalance {
                asset: Asset::Gas.symbol().to_string(),
                required: NETWORK_FEE,
                available: balances.gas,
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SecurityVerdict {
    pub is_safe: bool,
    pub risk_level: RiskLevel,
    pub summary: String,
}

impl From<&SecurityReport> for SecurityVerdict {
    fn from(report: &SecurityReport) -> Self {
        let summary = report
            .checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.detail.clone())
            .collect::<Vec<_>>()
            .join("; ");

        Self {
            is_safe: report.is_safe,
            risk_level: report.risk_level,
            summary,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingTransfer {
    pub from: Address,
    pub to: Address,
    pub amount: Decimal,
    pub asset: Asset,
    pub network_fee: Decimal,
    pub security: Option<SecurityVerdict>,
    /// Set when the security scan could not run.
    pub security_note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PendingTransfer {
    pub fn new(from: Address, request: TransferRequest) -> Self {
        Self {
            from,
            to: request.recipient,
            amount: request.amount,
            asset: request.asset,
            network_fee: NETWORK_FEE,
            security: None,
            security_note: None,
            created_at: Utc::now(),
        }
    }

    pub fn has_security_warning(&self) -> bool {
        self.security.as_ref().is_some_and(|v| !v.is_safe) || self.security_note.is_some()
    }
}

#[derive(Debug, Default)]
pub enum TransferState {
    #[default]
    Idle,
    AwaitingConfirmation(PendingTransfer),
}

impl TransferState {
    pub fn pending(&self) -> Option<&PendingTransfer> {
        match self {
            TransferState::Idle => None,
            TransferState::AwaitingConfirmation(pending) => Some(pending),
        }
    }

    /// Leaves the state idle and returns whatever was pending.
    pub fn take(&mut self) -> Option<PendingTransfer> {
        match std::mem::take(self) {
            TransferState::Idle => None,
            TransferState::AwaitingConfirmation(pending) => Some(pending),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferReceipt {
    pub tx_hash: String,
    pub from: Address,
    pub to: Address,
    pub amount: Decimal,
    pub asset: Asset,
    pub network_fee: Decimal,
    pub simulated: bool,
    pub executed_at: DateTime<Utc>,
}

#[async_trait]
pub trait TransferExecutor: Send + Sync {
    async fn execute(&self, transfer: &PendingTransfer, wallet: &WalletSession) -> NeoxResult<TransferReceipt>;
}

#[derive(Debug, Default)]
pub struct SimulatedExecutor;

impl SimulatedExecutor {
    /// Hash over the transfer's fields, so the same transfer always maps to the same id.
    pub fn transaction_hash(transfer: &PendingTransfer) -> String {
        let mut hasher = Sha256::new();
        hasher.update(transfer.from.as_str().as_bytes());
        hasher.update(transfer.to.as_str().as_bytes());
        hasher.update(transfer.amount.normalize().to_string().as_bytes());
        hasher.update(transfer.asset.symbol().as_bytes());
        hasher.update(transfer.created_at.timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
        format!("0x{}", hex::encode(hasher.finalize()))
    }
}

#[async_trait]
impl TransferExecutor for SimulatedExecutor {
    async fn execute(&self, transfer: &PendingTransfer, wallet: &WalletSession) -> NeoxResult<TransferReceipt> {
        if wallet.key().address()? != transfer.from {
            return Err(NeoxError::invalid_key("The loaded wallet does not own the sending address"));
        }

        let tx_hash = Self::transaction_hash(transfer);
        info!(
            "🧪 Simulated transfer of {} {} to {}: {}",
            format_decimal(transfer.amount),
            transfer.asset,
            transfer.to,
            tx_hash
        );

        Ok(TransferReceipt {
            tx_hash,
            from: transfer.from.clone(),
            to: transfer.to.clone(),
            amount: transfer.amount,
            asset: transfer.asset,
            network_fee: transfer.network_fee,
            simulated: true,
            executed_at: Utc::now(),
        })
    }
}

/// Live execution is not available; transactions are never signed or broadcast.
#[derive(Debug, Default)]
pub struct LiveExecutor;

#[async_trait]
impl TransferExecutor for LiveExecutor {
    async fn execute(&self, _transfer: &PendingTransfer, _wallet: &WalletSession) -> NeoxResult<TransferReceipt> {
        Err(NeoxError::unsupported(
            "Live transfers are not supported. Enable DEMO_MODE to simulate transfers.",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neo::ScriptHash;

    fn recipient() -> String {
        ScriptHash([5u8; 20]).to_address().to_string()
    }

    fn balances(neo: i64, gas: Decimal) -> NativeBalances {
        NativeBalances { neo: Decimal::from(neo), gas }
    }

    #[test]
    fn network_fee_is_half_a_gas() {
        assert_eq!(NETWORK_FEE.to_string(), "0.5");
    }

    #[test]
    fn validation_order() {
        let max = Decimal::from(1000);
        assert!(matches!(
            TransferRequest::validate("5", "NEO", "Nbad", max),
            Err(NeoxError::InvalidAddress(_))
        ));
        assert!(TransferRequest::validate("0", "GAS", &recipient(), max).is_err());
        assert!(TransferRequest::validate("1", "BTC", &recipient(), max).is_err());
        assert!(TransferRequest::validate("1.5", "NEO", &recipient(), max).is_err());
        assert!(TransferRequest::validate("1001", "NEO", &recipient(), max).is_err());

        let request = TransferRequest::validate("2.5", "gas", &recipient(), max).unwrap();
        assert_eq!(request.asset, Asset::Gas);
        assert_eq!(request.amount, Decimal::new(25, 1));
    }

    #[test]
    fn gas_transfers_include_the_fee() {
        let request = TransferRequest::validate("10", "GAS", &recipient(), Decimal::from(1000)).unwrap();
        assert!(request.check_balance(&balances(0, Decimal::new(105, 1))).is_ok());

        match request.check_balance(&balances(0, Decimal::new(104, 1))) {
            Err(NeoxError::InsufficientBalance { required, .. }) => assert_eq!(required, Decimal::new(105, 1)),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn neo_transfers_need_gas_for_the_fee() {
        let request = TransferRequest::validate("5", "NEO", &recipient(), Decimal::from(1000)).unwrap();
        assert!(request.check_balance(&balances(5, Decimal::ONE)).is_ok());
        assert!(request.check_balance(&balances(4, Decimal::ONE)).is_err());
        match request.check_balance(&balances(5, Decimal::new(1, 1))) {
            Err(NeoxError::InsufficientBalance { asset, .. }) => assert_eq!(asset, "GAS"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn state_take_returns_to_idle() {
        let request = TransferRequest::validate("1", "NEO", &recipient(), Decimal::from(10)).unwrap();
        let pending = PendingTransfer::new(ScriptHash([6u8; 20]).to_address(), request);

        let mut state = TransferState::AwaitingConfirmation(pending);
        assert!(state.pending().is_some());
        assert!(state.take().is_some());
        assert!(state.pending().is_none());
        assert!(state.take().is_none());
    }

    #[tokio::test]
    async fn simulated_execution_requires_the_sending_wallet() {
        let wallet = WalletSession::from_text(
            "c7134d6fd8e73d819e82755c64c93788d8db0961929e025a53363c4cc02a6962",
            crate::neo::Network::Testnet,
        )
        .unwrap();
        let request = TransferRequest::validate("1", "GAS", &recipient(), Decimal::from(10)).unwrap();

        let owned = PendingTransfer::new(wallet.address().clone(), request.clone());
        let receipt = SimulatedExecutor.execute(&owned, &wallet).await.unwrap();
        assert!(receipt.simulated);
        assert_eq!(receipt.tx_hash, SimulatedExecutor::transaction_hash(&owned));

        let foreign = PendingTransfer::new(ScriptHash([6u8; 20]).to_address(), request);
        assert!(matches!(
            SimulatedExecutor.execute(&foreign, &wallet).await,
            Err(NeoxError::InvalidKey(_))
        ));
        assert!(matches!(LiveExecutor.execute(&owned, &wallet).await, Err(NeoxError::Unsupported(_))));
    }

    #[test]
    fn simulated_hash_is_deterministic() {
        let request = TransferRequest::validate("1", "GAS", &recipient(), Decimal::from(10)).unwrap();
        let pending = PendingTransfer::new(ScriptHash([6u8; 20]).to_address(), request);

        let first = SimulatedExecutor::transaction_hash(&pending);
        assert_eq!(first, SimulatedExecutor::transaction_hash(&pending));
        assert_eq!(first.len(), 66);
        assert!(first.starts_with("0x"));
    }
}
