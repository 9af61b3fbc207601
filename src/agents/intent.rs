// Intent classification: keyword rules and an LLM classifier that falls back to them
use async_trait::async_trait;
use regex::Regex;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::Value;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

use crate::neo::address::{extract_addresses, extract_tx_hash};
use crate::prices::AlertCondition;
use crate::providers::{ChatMessage, ChatRequest, ProviderManager};
use crate::security::SecurityTarget;

/// LLM classifications below this confidence are re-done by keyword rules.
pub const MIN_LLM_CONFIDENCE: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainQuery {
    BlockHeight,
    RecentBlocks,
    AssetCount,
    Overview,
}

#[derive(Debug)]
pub enum Intent {
    LoadWallet { key: SecretString },
    WalletStatus,
    ValidateAddress { address: String },
    CheckBalance { address: Option<String> },
    SecurityCheck { target: Option<SecurityTarget> },
    ChainInfo { query: ChainQuery },
    TransactionStatus { hash: Option<String> },
    Nfts { address: Option<String> },
    TransactionHistory,
    Governance,
    CreateAlert { symbol: String, condition: AlertCondition, threshold: Decimal },
    ListAlerts,
    RemoveAlert { id: String },
    AlertHelp,
    Price { symbol: Option<String> },
    Send { amount: String, asset: String, recipient: String },
    SendHelp,
    Confirm,
    Cancel,
    Help,
    General { text: String },
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::LoadWallet { .. } => "load_wallet",
            Intent::WalletStatus => "wallet_status",
            Intent::ValidateAddress { .. } => "validate_address",
            Intent::CheckBalance { .. } => "check_balance",
            Intent::SecurityCheck { .. } => "security_check",
            Intent::ChainInfo { .. } => "chain_info",
            Intent::TransactionStatus { .. } => "transaction_status",
            Intent::Nfts { .. } => "nfts",
            Intent::TransactionHistory => "transaction_history",
            Intent::Governance => "governance",
            Intent::CreateAlert { .. } => "create_alert",
            Intent::ListAlerts => "list_alerts",
            Intent::RemoveAlert { .. } => "remove_alert",
            Intent::AlertHelp => "alert_help",
            Intent::Price { .. } => "price",
            Intent::Send { .. } => "send",
            Intent::SendHelp => "send_help",
            Intent::Confirm => "confirm",
            Intent::Cancel => "cancel",
            Intent::Help => "help",
            Intent::General { .. } => "general",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierSource {
    Keyword,
    Llm,
}

#[derive(Debug)]
pub struct Classification {
    pub intent: Intent,
    pub confidence: f64,
    pub source: ClassifierSource,
}

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify(&self, text: &str, context: &str) -> Classification;
}

fn wif_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b[KL][1-9A-HJ-NP-Za-km-z]{51}\b").expect("static regex"))
}

fn hex_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b(?:0x)?[a-fA-F0-9]{64}\b").expect("static regex"))
}

fn send_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(?:send|transfer|pay)\s+(-?\d+(?:\.\d+)?)\s+([a-z]+)\s+to\s+(\S+)").expect("static regex")
    })
}

fn alert_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(neo|gas|btc|bitcoin|eth|ethereum)\s+(above|below)\s+\$?(\d+(?:\.\d+)?)").expect("static regex")
    })
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\bN[A-Za-z0-9]{33}\b|\b0x[a-fA-F0-9]+\b|\b[KL][1-9A-HJ-NP-Za-km-z]{51}\b|\b[a-fA-F0-9]{64}\b|https?://\S+")
            .expect("static regex")
    })
}

/// Lowercased text with addresses, hashes, keys and URLs blanked out, so
/// keyword rules only see the words the user typed.
fn keyword_text(text: &str) -> String {
    token_pattern().replace_all(text, " ").to_lowercase()
}

/// First private-key-shaped token: WIF, then `0x` hex, then bare hex.
pub fn extract_private_key(text: &str) -> Option<String> {
    wif_pattern()
        .find(text)
        .or_else(|| hex_key_pattern().find(text))
        .map(|m| m.as_str().to_string())
}

/// True when `text` might carry key material and must stay on this machine.
pub fn contains_private_key(text: &str) -> bool {
    extract_private_key(text).is_some()
}

/// Replaces anything shaped like a private key with `[REDACTED]`.
pub fn redact_keys(text: &str) -> String {
    let text = wif_pattern().replace_all(text, "[REDACTED]");
    hex_key_pattern().replace_all(&text, "[REDACTED]").into_owned()
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

fn has_word(lower: &str, words: &[&str]) -> bool {
    lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .any(|word| words.contains(&word))
}

fn price_symbol(lower: &str) -> Option<String> {
    lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .find_map(|word| match word {
            "neo" => Some("NEO"),
            "gas" => Some("GAS"),
            "btc" | "bitcoin" => Some("BTC"),
            "eth" | "ethereum" => Some("ETH"),
            _ => None,
        })
        .map(str::to_string)
}

/// Word after `keyword`, for commands like `validate X` or `remove alert X`.
fn word_after<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let mut words = text.split_whitespace();
    words.by_ref().find(|w| w.eq_ignore_ascii_case(keyword))?;
    words.next()
}

/// Deterministic rules evaluated in a fixed order.
#[derive(Debug, Default, Clone)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, text: &str) -> Intent {
        let trimmed = text.trim();
        let scrubbed = keyword_text(trimmed);
        let lower = scrubbed.trim();

        match lower {
            "confirm" | "yes" | "y" => return Intent::Confirm,
            "cancel" | "no" | "n" | "abort" => return Intent::Cancel,
            "help" | "?" | "commands" | "what can you do" => return Intent::Help,
            _ => {}
        }
        if lower.starts_with("confirm send") || lower.starts_with("confirm transfer") {
            return Intent::Confirm;
        }

        if contains_any(lower, &["load wallet", "import wallet", "private key", "wallet status", "my address", "my wallet"]) {
            return match extract_private_key(trimmed) {
                Some(key) => Intent::LoadWallet { key: SecretString::from(key) },
                None => Intent::WalletStatus,
            };
        }

        if has_word(lower, &["validate", "valid", "verify"]) {
            let address = extract_addresses(trimmed)
                .into_iter()
                .next()
                .or_else(|| word_after(trimmed, "validate").map(str::to_string))
                .unwrap_or_default();
            return Intent::ValidateAddress { address };
        }

        if lower.contains("balance") {
            return Intent::CheckBalance {
                address: extract_addresses(trimmed).into_iter().next(),
            };
        }

        if contains_any(lower, &["security", "safe", "malicious", "check address", "analyze", "analyse", "scan", "phishing", "honeypot"]) {
            return Intent::SecurityCheck {
                target: SecurityTarget::detect(trimmed),
            };
        }

        if let Some(hash) = extract_tx_hash(trimmed) {
            return Intent::TransactionStatus { hash: Some(hash) };
        }
        if contains_any(lower, &["transaction status", "tx status"]) {
            return Intent::TransactionStatus { hash: None };
        }

        if contains_any(lower, &["block", "asset count", "asset info", "chain info", "network status"]) {
            let query = if contains_any(lower, &["recent block", "latest block", "last block"]) {
                ChainQuery::RecentBlocks
            } else if lower.contains("height") {
                ChainQuery::BlockHeight
            } else if lower.contains("asset") {
                ChainQuery::AssetCount
            } else {
                ChainQuery::Overview
            };
            return Intent::ChainInfo { query };
        }

        if contains_any(lower, &["nft", "nep11", "nep-11", "collectible", "non-fungible"]) {
            return Intent::Nfts {
                address: extract_addresses(trimmed).into_iter().next(),
            };
        }

        if lower.contains("alert") {
            if has_word(lower, &["remove", "delete", "cancel"]) {
                let id = word_after(trimmed, "alert").unwrap_or_default().to_string();
                return Intent::RemoveAlert { id };
            }
            if let Some(caps) = alert_pattern().captures(trimmed) {
                let condition = AlertCondition::from_str(&caps[2]);
                let threshold = Decimal::from_str(&caps[3]);
                if let (Some(symbol), Ok(condition), Ok(threshold)) = (price_symbol(&caps[1].to_lowercase()), condition, threshold) {
                    return Intent::CreateAlert { symbol, condition, threshold };
                }
            }
            if contains_any(lower, &["alerts", "my alert", "list", "show", "check"]) {
                return Intent::ListAlerts;
            }
            return Intent::AlertHelp;
        }

        if contains_any(lower, &["price", "worth", "how much is", "monitor"]) {
            return Intent::Price { symbol: price_symbol(lower) };
        }

        if has_word(lower, &["send", "transfer", "pay"]) {
            if let Some(caps) = send_pattern().captures(trimmed) {
                return Intent::Send {
                    amount: caps[1].to_string(),
                    asset: caps[2].to_uppercase(),
                    recipient: caps[3].trim_end_matches(['.', ',', '!', '?']).to_string(),
                };
            }
            return Intent::SendHelp;
        }

        if contains_any(lower, &["history", "recent transactions", "transfers", "transactions"]) {
            return Intent::TransactionHistory;
        }

        if contains_any(lower, &["governance", "committee", "candidate", "vote", "voting"]) {
            return Intent::Governance;
        }

        Intent::General { text: trimmed.to_string() }
    }
}

#[async_trait]
impl IntentClassifier for KeywordClassifier {
    async fn classify(&self, text: &str, _context: &str) -> Classification {
        Classification {
            intent: KeywordClassifier::classify(self, text),
            confidence: 1.0,
            source: ClassifierSource::Keyword,
        }
    }
}

const CLASSIFIER_PROMPT: &str = "You are the intent classifier of NeoXBridge, a Neo N3 blockchain assistant. \
Classify the user's message into exactly one intent and extract its parameters.\n\n\
Intents:\n\
- wallet_status: show the loaded wallet\n\
- validate_address: check whether a Neo address is well formed (address)\n\
- check_balance: NEO/GAS balance (address, optional)\n\
- security_check: risk scan of an address, token contract or URL (address, contract, url)\n\
- chain_info: block height, recent blocks, asset count (query: height|recent_blocks|asset_count|overview)\n\
- transaction_status: status of a transaction (tx_hash)\n\
- nfts: NEP-11 tokens owned (address, optional)\n\
- transaction_history: recent NEP-17 transfers of the wallet\n\
- governance: committee and candidates\n\
- create_alert: price alert (symbol, condition above|below, threshold)\n\
- list_alerts: show price alerts\n\
- remove_alert: delete a price alert (alert_id)\n\
- price: current price (symbol)\n\
- send: transfer tokens (amount, asset NEO|GAS, recipient)\n\
- send_help: how to send tokens\n\
- confirm / cancel: answer to a pending transfer\n\
- help: list commands\n\
- general: anything else\n\n\
Reply with JSON only: {\"intent\": \"...\", \"confidence\": 0.0-1.0, \"parameters\": {...}}";

/// Strips an optional ```json fence around the reply.
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn param<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params[key].as_str().map(str::trim).filter(|s| !s.is_empty())
}

fn param_text(params: &Value, key: &str) -> Option<String> {
    match &params[key] {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Builds an intent from the LLM's JSON; `None` when required parameters are missing.
fn intent_from_json(name: &str, params: &Value, text: &str) -> Option<Intent> {
    let intent = match name {
        "wallet_status" => Intent::WalletStatus,
        "validate_address" => Intent::ValidateAddress {
            address: param(params, "address")?.to_string(),
        },
        "check_balance" => Intent::CheckBalance {
            address: param(params, "address").map(str::to_string),
        },
        "security_check" => {
            let candidate = ["address", "contract", "url", "target"]
                .iter()
                .find_map(|key| param(params, key))
                .unwrap_or(text);
            Intent::SecurityCheck {
                target: SecurityTarget::detect(candidate),
            }
        }
        "chain_info" => Intent::ChainInfo {
            query: match param(params, "query").unwrap_or("overview") {
                "height" | "block_height" => ChainQuery::BlockHeight,
                "recent_blocks" | "blocks" => ChainQuery::RecentBlocks,
                "asset_count" | "assets" => ChainQuery::AssetCount,
                _ => ChainQuery::Overview,
            },
        },
        "transaction_status" => Intent::TransactionStatus {
            hash: param(params, "tx_hash").and_then(extract_tx_hash),
        },
        "nfts" => Intent::Nfts {
            address: param(params, "address").map(str::to_string),
        },
        "transaction_history" => Intent::TransactionHistory,
        "governance" => Intent::Governance,
        "create_alert" => Intent::CreateAlert {
            symbol: price_symbol(&param(params, "symbol")?.to_lowercase())?,
            condition: AlertCondition::from_str(param(params, "condition")?).ok()?,
            threshold: Decimal::from_str(&param_text(params, "threshold")?).ok()?,
        },
        "list_alerts" => Intent::ListAlerts,
        "remove_alert" => Intent::RemoveAlert {
            id: param_text(params, "alert_id")?,
        },
        "price" => Intent::Price {
            symbol: param(params, "symbol").and_then(|s| price_symbol(&s.to_lowercase())),
        },
        "send" => Intent::Send {
            amount: param_text(params, "amount")?,
            asset: param(params, "asset")?.to_uppercase(),
            recipient: param(params, "recipient")?.to_string(),
        },
        "send_help" => Intent::SendHelp,
        "confirm" => Intent::Confirm,
        "cancel" => Intent::Cancel,
        "help" => Intent::Help,
        "general" => Intent::General { text: text.to_string() },
        _ => return None,
    };
    Some(intent)
}

/// Asks the LLM for a JSON classification and falls back to keyword rules.
pub struct LlmClassifier {
    providers: Arc<ProviderManager>,
    fallback: KeywordClassifier,
}

impl LlmClassifier {
    pub fn new(providers: Arc<ProviderManager>) -> Self {
        Self {
            providers,
            fallback: KeywordClassifier::new(),
        }
    }

    fn keyword(&self, text: &str) -> Classification {
        Classification {
            intent: self.fallback.classify(text),
            confidence: 1.0,
            source: ClassifierSource::Keyword,
        }
    }

    pub fn parse_reply(reply: &str, text: &str) -> Option<(Intent, f64)> {
        let json: Value = serde_json::from_str(strip_code_fence(reply)).ok()?;
        let name = json["intent"].as_str()?;
        let confidence = json["confidence"].as_f64().unwrap_or(0.0).clamp(0.0, 1.0);
        let intent = intent_from_json(name, &json["parameters"], text)?;
        Some((intent, confidence))
    }
}

#[async_trait]
impl IntentClassifier for LlmClassifier {
    async fn classify(&self, text: &str, context: &str) -> Classification {
        if contains_private_key(text) {
            debug!("Message may contain key material, classifying locally");
            return self.keyword(text);
        }

        let mut user_message = format!("Message: {}", text);
        if !context.is_empty() {
            user_message.push_str(&format!("\n\nRecent conversation:\n{}", context));
        }

        let request = ChatRequest::new(vec![ChatMessage::system(CLASSIFIER_PROMPT), ChatMessage::user(user_message)])
            .with_temperature(0.1)
            .with_max_tokens(300);

        let reply = match self.providers.chat_completion(&request).await {
            Ok(response) => response.content,
            Err(e) => {
                warn!("LLM classification unavailable, using keyword rules: {}", e);
                return self.keyword(text);
            }
        };

        match Self::parse_reply(&reply, text) {
            Some((intent, confidence)) if confidence >= MIN_LLM_CONFIDENCE => {
                debug!("LLM intent {} ({:.2})", intent.name(), confidence);
                Classification {
                    intent,
                    confidence,
                    source: ClassifierSource::Llm,
                }
            }
            Some((intent, confidence)) => {
                debug!("LLM intent {} below threshold ({:.2})", intent.name(), confidence);
                self.keyword(text)
            }
            None => {
                warn!("Unparseable LLM classification, using keyword rules");
                self.keyword(text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neo::ScriptHash;
    use secrecy::ExposeSecret;

    fn classify(text: &str) -> Intent {
        KeywordClassifier::new().classify(text)
    }

    #[test]
    fn wallet_commands() {
        let key = "c7134d6fd8e73d819e82755c64c93788d8db0961929e025a53363c4cc02a6962";
        match classify(&format!("load wallet {}", key)) {
            Intent::LoadWallet { key: parsed } => assert_eq!(parsed.expose_secret(), key),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(classify("wallet status"), Intent::WalletStatus));
        assert!(matches!(classify("load wallet"), Intent::WalletStatus));
    }

    #[test]
    fn balance_and_validation() {
        let address = ScriptHash([1u8; 20]).to_address().to_string();
        match classify(&format!("balance for {}", address)) {
            Intent::CheckBalance { address: Some(found) } => assert_eq!(found, address),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(classify("check my balance"), Intent::CheckBalance { address: None }));
        match classify("validate NotAnAddress") {
            Intent::ValidateAddress { address } => assert_eq!(address, "NotAnAddress"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn security_targets() {
        let contract = format!("0x{}", "ab".repeat(20));
        match classify(&format!("analyze token {}", contract)) {
            Intent::SecurityCheck { target: Some(SecurityTarget::Token(found)) } => assert_eq!(found, contract),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(classify("is it safe?"), Intent::SecurityCheck { target: None }));
    }

    #[test]
    fn chain_queries() {
        assert!(matches!(classify("block height"), Intent::ChainInfo { query: ChainQuery::BlockHeight }));
        assert!(matches!(classify("show recent blocks"), Intent::ChainInfo { query: ChainQuery::RecentBlocks }));
        assert!(matches!(classify("asset count"), Intent::ChainInfo { query: ChainQuery::AssetCount }));
        let tx = format!("0x{}", "1f".repeat(32));
        assert!(matches!(classify(&format!("status of {}", tx)), Intent::TransactionStatus { hash: Some(_) }));
    }

    #[test]
    fn alerts_and_prices() {
        match classify("create price alert NEO above 50") {
            Intent::CreateAlert { symbol, condition, threshold } => {
                assert_eq!(symbol, "NEO");
                assert_eq!(condition, AlertCondition::Above);
                assert_eq!(threshold, Decimal::from(50));
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(classify("check my alerts"), Intent::ListAlerts));
        assert!(matches!(classify("remove alert 1a2b3c4d"), Intent::RemoveAlert { .. }));
        assert!(matches!(classify("create price alert"), Intent::AlertHelp));
        match classify("gas price") {
            Intent::Price { symbol } => assert_eq!(symbol.as_deref(), Some("GAS")),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn transfers() {
        let address = ScriptHash([2u8; 20]).to_address().to_string();
        match classify(&format!("send 5 NEO to {}", address)) {
            Intent::Send { amount, asset, recipient } => {
                assert_eq!(amount, "5");
                assert_eq!(asset, "NEO");
                assert_eq!(recipient, address);
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert!(matches!(classify("send help"), Intent::SendHelp));
        assert!(matches!(classify("confirm"), Intent::Confirm));
        assert!(matches!(classify("no"), Intent::Cancel));
    }

    #[test]
    fn remaining_categories() {
        assert!(matches!(classify("transaction history"), Intent::TransactionHistory));
        assert!(matches!(classify("committee info"), Intent::Governance));
        assert!(matches!(classify("my nfts"), Intent::Nfts { address: None }));
        assert!(matches!(classify("help"), Intent::Help));
        assert!(matches!(classify("tell me about neo"), Intent::General { .. }));
    }

    #[test]
    fn parses_fenced_llm_replies() {
        let reply = "```json\n{\"intent\": \"price\", \"confidence\": 0.9, \"parameters\": {\"symbol\": \"neo\"}}\n```";
        let (intent, confidence) = LlmClassifier::parse_reply(reply, "neo price?").unwrap();
        assert!(matches!(intent, Intent::Price { symbol: Some(ref s) } if s == "NEO"));
        assert!((confidence - 0.9).abs() < 1e-9);

        assert!(LlmClassifier::parse_reply("not json", "x").is_none());
        assert!(LlmClassifier::parse_reply("{\"intent\": \"send\", \"parameters\": {}}", "x").is_none());
    }

    #[test]
    fn detects_key_material() {
        assert!(contains_private_key(&"ab".repeat(32)));
        assert!(!contains_private_key("send 5 NEO"));
        assert_eq!(redact_keys(&format!("load wallet 0x{}", "ab".repeat(32))), "load wallet [REDACTED]");
    }
}
