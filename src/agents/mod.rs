// Agent: classifies each message and dispatches it to one collaborator
pub mod intent;
pub mod replies;
pub mod session;
pub mod transfer;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::chain::{ChainClient, OneGateClient};
use crate::config::NeoxConfig;
use crate::error::{NeoxError, NeoxResult};
use crate::neo::address::extract_addresses;
use crate::neo::amount::format_decimal;
use crate::neo::{validate_address, Address, AddressCheck};
use crate::prices::{AlertBook, AlertCondition, CoinGeckoFeed, PriceAlert, PriceFeed};
use crate::providers::{ChatMessage, ChatRequest, ProviderManager};
use crate::security::{GoPlusClient, SecurityGate, SecurityScanner, SecurityTarget};
use crate::wallet::WalletSession;

pub use intent::{ChainQuery, Classification, Intent, IntentClassifier, KeywordClassifier, LlmClassifier};
pub use session::{Conversation, Role, SessionStats};
pub use transfer::{
    LiveExecutor, PendingTransfer, SimulatedExecutor, TransferExecutor, TransferReceipt, TransferRequest,
    TransferState, NETWORK_FEE,
};

const CONTEXT_TURNS: usize = 4;
const RECENT_BLOCK_LIMIT: usize = 5;
const HISTORY_LIMIT: usize = 10;

const GENERAL_PROMPT: &str = "You are NeoXBridge, a helpful assistant for the Neo N3 blockchain. \
Answer briefly and accurately. You can explain Neo concepts and point users to these commands: \
load wallet, check balance, security check, block height, recent blocks, transaction status, \
my nfts, transaction history, committee info, price alerts and send NEO/GAS. \
Never ask for or repeat private keys.";

#[derive(Debug, Clone, Serialize)]
pub struct AgentResponse {
    pub success: bool,
    pub message: String,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl AgentResponse {
    pub fn ok<T: Into<String>>(action: &str, message: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            action: action.to_string(),
            timestamp: Utc::now(),
            data: None,
        }
    }

    pub fn fail<T: Into<String>>(action: &str, message: T) -> Self {
        Self {
            success: false,
            ..Self::ok(action, message)
        }
    }

    pub fn with_data<T: Serialize>(mut self, data: &T) -> Self {
        self.data = serde_json::to_value(data).ok();
        self
    }
}

/// External collaborators the agent talks to.
pub struct Services {
    pub chain: Arc<dyn ChainClient>,
    pub security: SecurityGate,
    pub prices: Arc<dyn PriceFeed>,
    pub providers: Option<Arc<ProviderManager>>,
}

impl Services {
    pub async fn from_config(config: &NeoxConfig) -> NeoxResult<Self> {
        let chain = OneGateClient::from_config(config)?;
        let scanner = GoPlusClient::from_config(&config.security)?;
        let prices = CoinGeckoFeed::from_config(&config.prices)?;

        let manager = ProviderManager::from_config(&config.llm).await?;
        let providers = if manager.has_providers().await {
            Some(Arc::new(manager))
        } else {
            info!("No LLM provider configured, using keyword intent rules");
            None
        };

        Ok(Self {
            chain: Arc::new(chain),
            security: SecurityGate::new(Some(Arc::new(scanner) as Arc<dyn SecurityScanner>), &config.security.blocklist),
            prices: Arc::new(prices),
            providers,
        })
    }
}

pub struct Agent {
    config: NeoxConfig,
    services: Services,
    classifier: Box<dyn IntentClassifier>,
    wallet: Option<WalletSession>,
    conversation: Conversation,
    stats: SessionStats,
    alerts: AlertBook,
    transfer: TransferState,
    simulated: Box<dyn TransferExecutor>,
    live: Box<dyn TransferExecutor>,
    last_poll: Option<Instant>,
}

impl Agent {
    pub fn new(config: NeoxConfig, services: Services) -> Self {
        let classifier: Box<dyn IntentClassifier> = match &services.providers {
            Some(providers) => Box::new(LlmClassifier::new(providers.clone())),
            None => Box::new(KeywordClassifier::new()),
        };

        Self {
            config,
            services,
            classifier,
            wallet: None,
            conversation: Conversation::new(),
            stats: SessionStats::default(),
            alerts: AlertBook::new(),
            transfer: TransferState::Idle,
            simulated: Box::new(SimulatedExecutor),
            live: Box::new(LiveExecutor),
            last_poll: None,
        }
    }

    pub async fn from_config(config: NeoxConfig) -> NeoxResult<Self> {
        let services = Services::from_config(&config).await?;
        Ok(Self::new(config, services))
    }

    pub fn with_live_executor(mut self, executor: Box<dyn TransferExecutor>) -> Self {
        self.live = executor;
        self
    }

    pub fn config(&self) -> &NeoxConfig {
        &self.config
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn wallet(&self) -> Option<&WalletSession> {
        self.wallet.as_ref()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn alerts(&self) -> &AlertBook {
        &self.alerts
    }

    pub fn pending_transfer(&self) -> Option<&PendingTransfer> {
        self.transfer.pending()
    }

    pub fn has_llm(&self) -> bool {
        self.services.providers.is_some()
    }

    /// Loads a wallet from `NEOX_PRIVATE_KEY`; returns whether one was loaded.
    pub fn load_wallet_from_env<F>(&mut self, lookup: F) -> NeoxResult<bool>
    where
        F: Fn(&str) -> Option<String>,
    {
        let Some(key) = lookup("NEOX_PRIVATE_KEY").filter(|k| !k.trim().is_empty()) else {
            return Ok(false);
        };

        let key = SecretString::from(key);
        let session = WalletSession::from_text(key.expose_secret(), self.config.neo.network)?;
        self.replace_wallet(session);
        Ok(true)
    }

    /// Unloads the wallet and drops any pending transfer.
    pub fn unload_wallet(&mut self) -> bool {
        self.transfer.take();
        match self.wallet.take() {
            Some(session) => {
                session.clear();
                true
            }
            None => false,
        }
    }

    fn replace_wallet(&mut self, session: WalletSession) {
        if let Some(previous) = self.wallet.take() {
            previous.clear();
        }
        self.transfer.take();
        self.wallet = Some(session);
    }

    pub async fn process_message(&mut self, text: &str) -> AgentResponse {
        let text = text.trim();
        self.stats.messages += 1;

        let context = self.conversation.recent_context(CONTEXT_TURNS);
        let Classification { intent, confidence, source } = self.classifier.classify(text, &context).await;
        debug!("Intent {} ({:?}, {:.2})", intent.name(), source, confidence);

        let has_key = intent::contains_private_key(text);
        let recorded = if has_key { intent::redact_keys(text) } else { text.to_string() };
        self.conversation.push(Role::User, &recorded);

        // Free text carrying key material is answered locally, never forwarded.
        if has_key && matches!(intent, Intent::General { .. }) {
            warn!("Message looks like it contains a private key; not forwarding it");
            let response = AgentResponse::fail(intent.name(), replies::key_not_forwarded());
            self.conversation.push(Role::Assistant, &response.message);
            return response;
        }

        if let Some(address) = extract_addresses(text).into_iter().find(|a| validate_address(a).is_valid()) {
            self.conversation.remember_address(&address);
        }

        if !matches!(intent, Intent::General { .. } | Intent::Help) {
            self.stats.commands_processed += 1;
        }

        let response = self.dispatch(intent).await;
        if !response.success {
            debug!("{} failed: {}", response.action, response.message.lines().next().unwrap_or_default());
        }

        self.conversation.push(Role::Assistant, &response.message);
        response
    }

    async fn dispatch(&mut self, intent: Intent) -> AgentResponse {
        let action = intent.name();
        match intent {
            Intent::LoadWallet { key } => self.load_wallet(action, key),
            Intent::WalletStatus => self.wallet_status(action),
            Intent::ValidateAddress { address } => self.validate(action, &address),
            Intent::CheckBalance { address } => self.check_balance(action, address).await,
            Intent::SecurityCheck { target } => self.security_check(action, target).await,
            Intent::ChainInfo { query } => self.chain_info(action, query).await,
            Intent::TransactionStatus { hash } => self.transaction_status(action, hash).await,
            Intent::Nfts { address } => self.nfts(action, address).await,
            Intent::TransactionHistory => self.transaction_history(action).await,
            Intent::Governance => self.governance(action).await,
            Intent::CreateAlert { symbol, condition, threshold } => {
                self.create_alert(action, &symbol, condition, threshold)
            }
            Intent::ListAlerts => AgentResponse::ok(action, replies::alert_list(&self.alerts.active())),
            Intent::RemoveAlert { id } => self.remove_alert(action, &id),
            Intent::AlertHelp => AgentResponse::ok(action, replies::alert_help()),
            Intent::Price { symbol } => self.price(action, symbol).await,
            Intent::Send { amount, asset, recipient } => self.prepare_transfer(action, &amount, &asset, &recipient).await,
            Intent::SendHelp => AgentResponse::ok(
                action,
                replies::send_help(&format_decimal(self.config.security.max_transfer_amount)),
            ),
            Intent::Confirm => self.confirm_transfer(action).await,
            Intent::Cancel => self.cancel_transfer(action),
            Intent::Help => AgentResponse::ok(action, replies::help()),
            Intent::General { text } => self.general(action, &text).await,
        }
    }

    fn load_wallet(&mut self, action: &str, key: SecretString) -> AgentResponse {
        match WalletSession::from_text(key.expose_secret(), self.config.neo.network) {
            Ok(session) => {
                let info = session.info();
                self.replace_wallet(session);
                AgentResponse::ok(action, replies::wallet_loaded(&info)).with_data(&info)
            }
            Err(e) => {
                warn!("Wallet load rejected: {}", e);
                AgentResponse::fail(action, format!("❌ **Failed to load wallet:** {}\n\n{}", e, replies::no_wallet()))
            }
        }
    }

    fn wallet_status(&self, action: &str) -> AgentResponse {
        match &self.wallet {
            Some(session) => {
                let info = session.info();
                AgentResponse::ok(action, replies::wallet_status(&info, self.config.demo_mode)).with_data(&info)
            }
            None => AgentResponse::fail(action, replies::no_wallet()),
        }
    }

    fn validate(&mut self, action: &str, address: &str) -> AgentResponse {
        if address.trim().is_empty() {
            return AgentResponse::fail(
                action,
                format!("📍 **Usage:** `validate ADDRESS`\n\n{}", replies::ADDRESS_RULES),
            );
        }

        match self.parse_address(action, address) {
            Ok(address) => AgentResponse::ok(action, replies::address_valid(&address)),
            Err(response) => response,
        }
    }

    /// Validates an address before any collaborator sees it.
    fn parse_address(&mut self, action: &str, text: &str) -> Result<Address, AgentResponse> {
        match validate_address(text) {
            AddressCheck::Valid { address, .. } => {
                self.stats.addresses_validated += 1;
                Ok(address)
            }
            AddressCheck::Invalid { input, reason } => {
                Err(AgentResponse::fail(action, replies::address_invalid(&input, &reason)))
            }
        }
    }

    /// Explicit address, then the wallet's, then the last one mentioned.
    fn resolve_address(&mut self, action: &str, explicit: Option<String>) -> Result<Address, AgentResponse> {
        let candidate = explicit
            .or_else(|| self.wallet.as_ref().map(|w| w.address().to_string()))
            .or_else(|| self.conversation.last_address().map(str::to_string));

        match candidate {
            Some(text) => self.parse_address(action, &text),
            None => Err(AgentResponse::fail(
                action,
                "📍 Please provide a Neo address or load a wallet first.\n\n**Example:** `balance for ADDRESS`",
            )),
        }
    }

    fn service_failure(action: &str, service: &str, e: &NeoxError) -> AgentResponse {
        if !e.is_service_failure() {
            warn!("{} rejected the request: {}", service, e);
            return AgentResponse::fail(action, format!("❌ {}", e));
        }

        error!("{} failed: {}", service, e);
        AgentResponse::fail(action, replies::service_unavailable(service, e))
    }

    async fn check_balance(&mut self, action: &str, address: Option<String>) -> AgentResponse {
        let address = match self.resolve_address(action, address) {
            Ok(address) => address,
            Err(response) => return response,
        };

        info!("💰 Balance lookup for {}", address);
        let chain = self.services.chain.clone();
        match chain.assets_held(&address).await {
            Ok(assets) => AgentResponse::ok(action, replies::balance(&address, &assets, chain.network())).with_data(&assets),
            Err(e) => Self::service_failure(action, "Neo blockchain API", &e),
        }
    }

    async fn security_check(&mut self, action: &str, target: Option<SecurityTarget>) -> AgentResponse {
        let Some(target) = target else {
            return AgentResponse::fail(action, replies::security_usage());
        };

        if let SecurityTarget::Address(text) = &target {
            if validate_address(text).is_valid() {
                self.stats.addresses_validated += 1;
            }
        }

        match self.services.security.scan(&target).await {
            Ok(report) => AgentResponse::ok(action, replies::security_report(&report)).with_data(&report),
            Err(e) => Self::service_failure(action, "security service", &e),
        }
    }

    async fn chain_info(&self, action: &str, query: ChainQuery) -> AgentResponse {
        let chain = &self.services.chain;
        let network = chain.network();

        let result = match query {
            ChainQuery::BlockHeight => chain
                .block_height()
                .await
                .map(|height| replies::block_height(height, network, chain.endpoint())),
            ChainQuery::RecentBlocks => chain
                .recent_blocks(RECENT_BLOCK_LIMIT)
                .await
                .map(|blocks| replies::recent_blocks(&blocks, network)),
            ChainQuery::AssetCount => chain.asset_count().await.map(|count| replies::asset_count(count, network)),
            ChainQuery::Overview => match chain.block_height().await {
                Ok(height) => chain
                    .asset_count()
                    .await
                    .map(|assets| replies::chain_overview(height, assets, network)),
                Err(e) => Err(e),
            },
        };

        match result {
            Ok(message) => AgentResponse::ok(action, message),
            Err(e) => Self::service_failure(action, "Neo blockchain API", &e),
        }
    }

    async fn transaction_status(&self, action: &str, hash: Option<String>) -> AgentResponse {
        let Some(hash) = hash else {
            return AgentResponse::fail(
                action,
                "🔎 Please provide a transaction hash (`0x` followed by 64 hex characters).",
            );
        };

        match self.services.chain.transaction_status(&hash).await {
            Ok(status) => AgentResponse::ok(action, replies::transaction_status(&status)).with_data(&status),
            Err(e) => Self::service_failure(action, "Neo blockchain API", &e),
        }
    }

    async fn nfts(&mut self, action: &str, address: Option<String>) -> AgentResponse {
        let address = match self.resolve_address(action, address) {
            Ok(address) => address,
            Err(response) => return response,
        };

        let chain = self.services.chain.clone();
        match chain.nfts_owned(&address).await {
            Ok(holdings) => {
                AgentResponse::ok(action, replies::nfts(&address, &holdings, chain.network())).with_data(&holdings)
            }
            Err(e) => Self::service_failure(action, "Neo blockchain API", &e),
        }
    }

    async fn transaction_history(&mut self, action: &str) -> AgentResponse {
        let address = match self.resolve_address(action, None) {
            Ok(address) => address,
            Err(response) => return response,
        };

        match self.services.chain.transfers(&address).await {
            Ok(records) => AgentResponse::ok(action, replies::transfer_history(&address, &records, HISTORY_LIMIT)),
            Err(e) => Self::service_failure(action, "Neo blockchain API", &e),
        }
    }

    async fn governance(&self, action: &str) -> AgentResponse {
        let chain = &self.services.chain;
        let result = async { Ok::<_, NeoxError>((chain.committee().await?, chain.candidate_count().await?)) }.await;

        match result {
            Ok((committee, candidates)) => {
                AgentResponse::ok(action, replies::governance(committee.len(), candidates, chain.network()))
                    .with_data(&committee)
            }
            Err(e) => Self::service_failure(action, "Neo blockchain API", &e),
        }
    }

    fn create_alert(&mut self, action: &str, symbol: &str, condition: AlertCondition, threshold: Decimal) -> AgentResponse {
        match self.alerts.create(symbol, condition, threshold) {
            Ok(alert) => {
                self.stats.alerts_created += 1;
                AgentResponse::ok(action, replies::alert_created(&alert)).with_data(&alert)
            }
            Err(e) => AgentResponse::fail(action, format!("❌ {}\n\n{}", e, replies::alert_help())),
        }
    }

    fn remove_alert(&mut self, action: &str, id: &str) -> AgentResponse {
        if id.trim().is_empty() {
            return AgentResponse::fail(action, "🗑️ **Usage:** `remove alert ID` (see `check my alerts` for ids)");
        }

        match self.alerts.remove(id.trim()) {
            Some(alert) => AgentResponse::ok(
                action,
                format!(
                    "🗑️ Removed alert {} ({} {} ${})",
                    alert.short_id(),
                    alert.symbol,
                    alert.condition,
                    format_decimal(alert.threshold)
                ),
            ),
            None => AgentResponse::fail(action, format!("❌ No alert found with id `{}`", id.trim())),
        }
    }

    async fn price(&self, action: &str, symbol: Option<String>) -> AgentResponse {
        let symbols = match symbol {
            Some(symbol) => vec![symbol],
            None => vec!["NEO".to_string(), "GAS".to_string()],
        };

        let mut quotes = Vec::new();
        let mut last_error = None;
        for symbol in symbols {
            match self.services.prices.price(&symbol).await {
                Ok(price) => quotes.push((symbol, price.map(format_decimal))),
                Err(e) => {
                    warn!("Price lookup for {} failed: {}", symbol, e);
                    quotes.push((symbol, None));
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if quotes.iter().all(|(_, price)| price.is_none()) => Self::service_failure(action, "price service", &e),
            _ => AgentResponse::ok(action, replies::price(&quotes)),
        }
    }

    async fn prepare_transfer(&mut self, action: &str, amount: &str, asset: &str, recipient: &str) -> AgentResponse {
        let Some(from) = self.wallet.as_ref().map(|w| w.address().clone()) else {
            return AgentResponse::fail(
                action,
                format!("❌ **No wallet loaded.** Load one before sending.\n\n{}", replies::no_wallet()),
            );
        };

        let request = match TransferRequest::validate(amount, asset, recipient, self.config.security.max_transfer_amount) {
            Ok(request) => request,
            Err(NeoxError::InvalidAddress(_)) => {
                return match self.parse_address(action, recipient) {
                    Err(response) => response,
                    Ok(_) => AgentResponse::fail(action, replies::ADDRESS_RULES),
                };
            }
            Err(e) => return AgentResponse::fail(action, format!("❌ **Transfer rejected:** {}", e)),
        };
        self.stats.addresses_validated += 1;

        let balances = match self.services.chain.native_balances(&from).await {
            Ok(balances) => balances,
            Err(e) => return Self::service_failure(action, "Neo blockchain API", &e),
        };
        if let Err(e) = request.check_balance(&balances) {
            info!("Transfer rejected: {}", e);
            return AgentResponse::fail(action, format!("❌ **Transfer rejected:** {}", e));
        }

        let mut pending = PendingTransfer::new(from, request);

        if self.config.security.enable_checks {
            let target = SecurityTarget::Address(pending.to.to_string());
            match self.services.security.scan(&target).await {
                Ok(report) if report.is_malicious() => {
                    warn!("🚫 Transfer to {} blocked: {}", pending.to, report.flags.join(", "));
                    return AgentResponse::fail(
                        action,
                        format!(
                            "🚫 **Transfer blocked:** the recipient is flagged as malicious ({}).",
                            report.flags.join(", ")
                        ),
                    )
                    .with_data(&report);
                }
                Ok(report) => pending.security = Some((&report).into()),
                Err(e) => {
                    warn!("Recipient scan unavailable: {}", e);
                    pending.security_note = Some(format!("security scan unavailable ({})", e));
                }
            }
        }

        if !self.config.security.require_confirmation {
            return self.execute(action, pending).await;
        }

        let message = replies::transfer_preview(&pending, self.config.demo_mode);
        let response = AgentResponse::ok(action, message).with_data(&pending);
        if self.transfer.take().is_some() {
            debug!("Replacing previous pending transfer");
        }
        info!("⏳ Transfer of {} {} to {} awaiting confirmation", format_decimal(pending.amount), pending.asset, pending.to);
        self.transfer = TransferState::AwaitingConfirmation(pending);
        response
    }

    async fn confirm_transfer(&mut self, action: &str) -> AgentResponse {
        match self.transfer.take() {
            Some(pending) => self.execute(action, pending).await,
            None => AgentResponse::fail(action, "ℹ️ There is no pending transfer to confirm."),
        }
    }

    fn cancel_transfer(&mut self, action: &str) -> AgentResponse {
        match self.transfer.take() {
            Some(pending) => {
                info!("Transfer to {} cancelled", pending.to);
                AgentResponse::ok(action, "🚫 **Transfer cancelled.** Nothing was sent.")
            }
            None => AgentResponse::ok(action, "ℹ️ There is no pending transfer to cancel."),
        }
    }

    async fn execute(&mut self, action: &str, pending: PendingTransfer) -> AgentResponse {
        let Some(wallet) = &self.wallet else {
            return AgentResponse::fail(action, "❌ The wallet was unloaded; transfer aborted.");
        };

        let executor = if self.config.demo_mode { &self.simulated } else { &self.live };
        let result = executor.execute(&pending, wallet).await;
        match result {
            Ok(receipt) => {
                if receipt.simulated {
                    self.stats.transfers_simulated += 1;
                }
                AgentResponse::ok(action, replies::transfer_executed(&receipt)).with_data(&receipt)
            }
            Err(e) => {
                error!("Transfer failed: {}", e);
                AgentResponse::fail(action, format!("❌ **Transfer failed:** {}", e))
            }
        }
    }

    async fn general(&self, action: &str, text: &str) -> AgentResponse {
        let Some(providers) = &self.services.providers else {
            return AgentResponse::ok(action, replies::general_welcome());
        };

        let mut system = GENERAL_PROMPT.to_string();
        let context = self.conversation.recent_context(CONTEXT_TURNS);
        system.push_str(&format!("\n\nRecent conversation:\n{}", context));

        let request = ChatRequest::new(vec![ChatMessage::system(system), ChatMessage::user(text)])
            .with_temperature(self.config.llm.temperature)
            .with_max_tokens(self.config.llm.max_tokens);

        match providers.chat_completion(&request).await {
            Ok(response) => AgentResponse::ok(action, response.content),
            Err(e) => {
                warn!("LLM reply unavailable: {}", e);
                AgentResponse::ok(action, replies::general_welcome())
            }
        }
    }

    /// Checks alerts if the poll interval has elapsed since the last check.
    pub async fn poll_alerts(&mut self) -> Vec<PriceAlert> {
        let interval = Duration::from_secs(self.config.prices.poll_interval_secs);
        if self.last_poll.is_some_and(|last| last.elapsed() < interval) {
            return Vec::new();
        }
        self.check_alerts_now().await
    }

    pub async fn check_alerts_now(&mut self) -> Vec<PriceAlert> {
        self.last_poll = Some(Instant::now());
        if self.alerts.active().is_empty() {
            return Vec::new();
        }

        let triggered = self.alerts.check(self.services.prices.as_ref()).await;
        for alert in &triggered {
            info!("🔔 Alert {} triggered for {}", alert.short_id(), alert.symbol);
            self.conversation.push(Role::Assistant, &replies::alert_triggered(alert));
        }
        triggered
    }
}
