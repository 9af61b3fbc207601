mod common;

use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use common::*;
use neoxbridge::agents::Role;
use neoxbridge::security::SecurityScanner;

#[tokio::test]
async fn validates_addresses_without_network_calls() {
    let chain = Arc::new(MockChain::with_balances(10, Decimal::from(10)));
    let mut agent = default_agent(chain.clone());

    let valid = agent.process_message(&format!("validate {}", address(1))).await;
    assert!(valid.success, "{}", valid.message);
    assert_eq!(valid.action, "validate_address");

    let invalid = agent.process_message("validate Nshort").await;
    assert!(!invalid.success);
    assert!(invalid.message.contains("34 characters"));

    let bad_checksum = agent.process_message(&format!("validate {}", corrupted_address(1))).await;
    assert!(!bad_checksum.success);
    assert!(bad_checksum.message.to_lowercase().contains("checksum"));

    assert_eq!(chain.calls(), 0);
    assert_eq!(agent.stats().addresses_validated, 1);
}

#[tokio::test]
async fn invalid_balance_address_never_reaches_the_chain() {
    let chain = Arc::new(MockChain::with_balances(10, Decimal::from(10)));
    let mut agent = default_agent(chain.clone());

    let response = agent.process_message(&format!("balance for {}", corrupted_address(2))).await;
    assert!(!response.success);
    assert!(response.message.contains("Invalid Neo address"));
    assert_eq!(chain.calls(), 0);
}

#[tokio::test]
async fn balance_uses_explicit_then_remembered_address() {
    let chain = Arc::new(MockChain::with_balances(7, Decimal::new(1025, 2)));
    let mut agent = default_agent(chain.clone());

    let response = agent.process_message(&format!("balance for {}", address(3))).await;
    assert!(response.success, "{}", response.message);
    assert!(response.message.contains("10.25"));
    assert!(response.data.is_some());

    let again = agent.process_message("what is the balance").await;
    assert!(again.success);
    assert!(again.message.contains(&address(3)));
    assert_eq!(chain.calls(), 2);
}

#[tokio::test]
async fn chain_failures_are_reported_not_raised() {
    let chain = Arc::new(MockChain::failing());
    let mut agent = default_agent(chain);

    let response = agent.process_message("block height").await;
    assert!(!response.success);
    assert!(response.message.contains("Could not reach"));
    assert!(response.message.contains("explorer unavailable"));
}

#[tokio::test]
async fn input_errors_are_not_reported_as_outages() {
    let chain = Arc::new(MockChain::rejecting());
    let mut agent = default_agent(chain);

    let response = agent.process_message("block height").await;
    assert!(!response.success);
    assert!(!response.message.contains("Could not reach"));
    assert!(response.message.contains("malformed explorer request"));
}

#[tokio::test]
async fn chain_queries_route_to_the_client() {
    let chain = Arc::new(MockChain::with_balances(0, Decimal::ZERO));
    let mut agent = default_agent(chain);

    let height = agent.process_message("what is the current block height?").await;
    assert_eq!(height.action, "chain_info");
    assert!(height.message.contains("4321987"));

    let assets = agent.process_message("asset count").await;
    assert!(assets.message.contains("842"));

    let governance = agent.process_message("show committee info").await;
    assert!(governance.message.contains("21"));
    assert!(governance.message.contains("95"));

    let tx = agent.process_message(&format!("status of 0x{}", "ab".repeat(32))).await;
    assert_eq!(tx.action, "transaction_status");
    assert!(tx.message.contains("Succeeded"));
}

#[tokio::test]
async fn loading_a_wallet_keeps_the_key_out_of_the_conversation() {
    let mut agent = default_agent(Arc::new(MockChain::with_balances(0, Decimal::ZERO)));

    let response = agent.process_message(&format!("load wallet {}", KEY_HEX)).await;
    assert!(response.success, "{}", response.message);
    assert!(response.message.contains(&wallet_address()));
    assert_eq!(agent.wallet().map(|w| w.address().to_string()), Some(wallet_address()));

    for turn in agent.conversation().turns() {
        assert!(!turn.text.contains(KEY_HEX));
    }
    assert_eq!(agent.conversation().turns()[0].role, Role::User);

    let status = agent.process_message("wallet status").await;
    assert!(status.success);
    assert!(status.message.contains("demo"));
}

#[tokio::test]
async fn wallet_loads_from_environment() {
    let mut agent = default_agent(Arc::new(MockChain::with_balances(0, Decimal::ZERO)));

    let loaded = agent
        .load_wallet_from_env(|key| (key == "NEOX_PRIVATE_KEY").then(|| KEY_HEX.to_string()))
        .unwrap();
    assert!(loaded);
    assert!(agent.wallet().is_some());

    assert!(agent.unload_wallet());
    assert!(agent.wallet().is_none());
    assert!(!agent.load_wallet_from_env(|_| None).unwrap());
}

#[tokio::test]
async fn demo_mode_never_calls_the_live_executor() {
    let live_calls = Arc::new(AtomicU32::new(0));
    let chain = Arc::new(MockChain::with_balances(10, Decimal::from(10)));
    let mut agent = default_agent(chain).with_live_executor(Box::new(CountingExecutor { calls: live_calls.clone() }));

    agent.process_message(&format!("load wallet {}", KEY_HEX)).await;
    let preview = agent.process_message(&format!("send 1 GAS to {}", address(4))).await;
    assert!(preview.success, "{}", preview.message);
    assert!(preview.message.contains("Transaction Preview"));
    assert!(agent.pending_transfer().is_some());

    let receipt = agent.process_message("confirm").await;
    assert!(receipt.success, "{}", receipt.message);
    assert!(receipt.message.contains("Simulated"));
    assert!(agent.pending_transfer().is_none());

    assert_eq!(live_calls.load(Ordering::SeqCst), 0);
    assert_eq!(agent.stats().transfers_simulated, 1);
}

#[tokio::test]
async fn live_mode_uses_the_live_executor() {
    let live_calls = Arc::new(AtomicU32::new(0));
    let mut config = test_config();
    config.demo_mode = false;
    let chain = Arc::new(MockChain::with_balances(10, Decimal::from(10)));
    let mut agent = agent_with(config, chain, None, Arc::new(FixedPrices::default()))
        .with_live_executor(Box::new(CountingExecutor { calls: live_calls.clone() }));

    agent.process_message(&format!("load wallet {}", KEY_HEX)).await;
    agent.process_message(&format!("send 1 GAS to {}", address(4))).await;
    let response = agent.process_message("yes").await;

    assert!(!response.success);
    assert_eq!(live_calls.load(Ordering::SeqCst), 1);
    assert_eq!(agent.stats().transfers_simulated, 0);
}

#[tokio::test]
async fn transfer_rejections() {
    let chain = Arc::new(MockChain::with_balances(10, Decimal::ONE));
    let mut agent = default_agent(chain);

    let no_wallet = agent.process_message(&format!("send 1 GAS to {}", address(5))).await;
    assert!(!no_wallet.success);
    assert!(no_wallet.message.contains("No wallet loaded"));

    agent.process_message(&format!("load wallet {}", KEY_HEX)).await;

    let bad_recipient = agent.process_message(&format!("send 1 GAS to {}", corrupted_address(5))).await;
    assert!(!bad_recipient.success);
    assert!(bad_recipient.message.contains("Invalid Neo address"));

    let fractional = agent.process_message(&format!("send 1.5 NEO to {}", address(5))).await;
    assert!(!fractional.success);

    let over_limit = agent.process_message(&format!("send 1001 NEO to {}", address(5))).await;
    assert!(!over_limit.success);
    assert!(over_limit.message.contains("maximum"));

    // 1 GAS plus the 0.5 GAS fee needs 1.5 GAS
    let insufficient = agent.process_message(&format!("send 1 GAS to {}", address(5))).await;
    assert!(!insufficient.success);
    assert!(insufficient.message.contains("Insufficient"));

    let affordable = agent.process_message(&format!("send 0.5 GAS to {}", address(5))).await;
    assert!(affordable.success, "{}", affordable.message);
    assert!(agent.pending_transfer().is_some());
}

#[tokio::test]
async fn flagged_recipients_are_blocked() {
    let flagged = address(6);
    let scanner = Arc::new(ListScanner::new(vec![flagged.clone()]));
    let chain = Arc::new(MockChain::with_balances(10, Decimal::from(10)));
    let mut agent = agent_with(test_config(), chain, Some(scanner.clone() as Arc<dyn SecurityScanner>), Arc::new(FixedPrices::default()));

    agent.process_message(&format!("load wallet {}", KEY_HEX)).await;

    let blocked = agent.process_message(&format!("send 1 NEO to {}", flagged)).await;
    assert!(!blocked.success);
    assert!(blocked.message.contains("Transfer blocked"));
    assert!(agent.pending_transfer().is_none());

    let clean = agent.process_message(&format!("send 1 NEO to {}", address(7))).await;
    assert!(clean.success);
    assert!(clean.message.contains("SAFE"));
    assert_eq!(scanner.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn blocklisted_recipients_are_blocked_without_a_scanner() {
    let mut config = test_config();
    config.security.blocklist = vec![address(8)];
    let chain = Arc::new(MockChain::with_balances(10, Decimal::from(10)));
    let mut agent = agent_with(config, chain, None, Arc::new(FixedPrices::default()));

    agent.process_message(&format!("load wallet {}", KEY_HEX)).await;
    let blocked = agent.process_message(&format!("send 1 NEO to {}", address(8))).await;
    assert!(!blocked.success);
    assert!(blocked.message.contains("blocklist"));
}

#[tokio::test]
async fn cancel_and_confirm_transitions() {
    let chain = Arc::new(MockChain::with_balances(10, Decimal::from(10)));
    let mut agent = default_agent(chain);

    let nothing = agent.process_message("confirm").await;
    assert!(!nothing.success);

    agent.process_message(&format!("load wallet {}", KEY_HEX)).await;
    agent.process_message(&format!("send 2 NEO to {}", address(9))).await;
    assert!(agent.pending_transfer().is_some());

    let cancelled = agent.process_message("cancel").await;
    assert!(cancelled.success);
    assert!(cancelled.message.contains("cancelled"));
    assert!(agent.pending_transfer().is_none());

    let after_cancel = agent.process_message("confirm").await;
    assert!(!after_cancel.success);
    assert_eq!(agent.stats().transfers_simulated, 0);
}

#[tokio::test]
async fn transfers_execute_immediately_without_confirmation() {
    let mut config = test_config();
    config.security.require_confirmation = false;
    let chain = Arc::new(MockChain::with_balances(10, Decimal::from(10)));
    let mut agent = agent_with(config, chain, None, Arc::new(FixedPrices::default()));

    agent.process_message(&format!("load wallet {}", KEY_HEX)).await;
    let response = agent.process_message(&format!("transfer 3 NEO to {}", address(10))).await;

    assert!(response.success, "{}", response.message);
    assert!(response.message.contains("Simulated"));
    assert!(agent.pending_transfer().is_none());
    assert_eq!(agent.stats().transfers_simulated, 1);
}

#[tokio::test]
async fn price_alerts_are_listed_triggered_and_removed() {
    let prices = Arc::new(FixedPrices::default());
    prices.set("NEO", Decimal::from(12));
    let chain = Arc::new(MockChain::with_balances(0, Decimal::ZERO));
    let mut agent = agent_with(test_config(), chain, None, prices.clone());

    let created = agent.process_message("create price alert NEO above 50").await;
    assert!(created.success, "{}", created.message);
    agent.process_message("create price alert GAS below 3").await;
    assert_eq!(agent.stats().alerts_created, 2);

    let listed = agent.process_message("check my alerts").await;
    assert!(listed.message.contains("NEO above $50"));
    assert!(listed.message.contains("GAS below $3"));

    assert!(agent.check_alerts_now().await.is_empty());

    prices.set("NEO", Decimal::from(50));
    let triggered = agent.check_alerts_now().await;
    assert_eq!(triggered.len(), 1);
    assert_eq!(triggered[0].symbol, "NEO");
    assert!(!triggered[0].active);

    let remaining = agent.alerts().active();
    assert_eq!(remaining.len(), 1);
    let removed = agent.process_message(&format!("remove alert {}", remaining[0].short_id())).await;
    assert!(removed.success, "{}", removed.message);

    let empty = agent.process_message("list my alerts").await;
    assert!(empty.message.contains("No active alerts"));
}

#[tokio::test]
async fn polling_is_rate_limited() {
    let prices = Arc::new(FixedPrices::default());
    let chain = Arc::new(MockChain::with_balances(0, Decimal::ZERO));
    let mut agent = agent_with(test_config(), chain, None, prices.clone());

    agent.process_message("create price alert GAS above 5").await;
    assert!(agent.poll_alerts().await.is_empty());

    prices.set("GAS", Decimal::from(6));
    assert!(agent.poll_alerts().await.is_empty(), "second poll inside the interval must be skipped");
    assert_eq!(agent.check_alerts_now().await.len(), 1);
}

#[tokio::test]
async fn prices_and_help_without_an_llm() {
    let prices = Arc::new(FixedPrices::default());
    prices.set("NEO", Decimal::new(1234, 2));
    let chain = Arc::new(MockChain::with_balances(0, Decimal::ZERO));
    let mut agent = agent_with(test_config(), chain, None, prices);

    let price = agent.process_message("neo price").await;
    assert!(price.message.contains("$12.34"));

    let help = agent.process_message("help").await;
    assert!(help.success);
    assert!(help.message.contains("Command Reference"));

    let general = agent.process_message("good morning").await;
    assert!(general.success);
    assert!(general.message.contains("Welcome to NeoXBridge"));
    assert!(!agent.has_llm());
}
