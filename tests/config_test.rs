use rust_decimal::Decimal;
use std::collections::HashMap;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

use neoxbridge::config::ConfigManager;
use neoxbridge::neo::Network;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key| map.get(key).cloned()
}

#[tokio::test]
async fn missing_file_means_defaults() {
    let dir = TempDir::new().unwrap();
    let manager = ConfigManager::with_path(dir.path().join("absent.toml"));

    let config = manager.load_config_with(env(&[])).await.unwrap();
    assert!(config.demo_mode);
    assert_eq!(config.neo.network, Network::Testnet);
    assert_eq!(config.security.max_transfer_amount, Decimal::from(1000));
    assert_eq!(config.explorer_url(), "https://testmagnet.explorer.onegate.space/api");
}

#[tokio::test]
async fn environment_overrides_the_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
demo_mode = true

[neo]
network = "mainnet"
timeout_secs = 12

[security]
max_transfer_amount = "250"
blocklist = ["NbadActor"]

[llm]
model = "gpt-4o"
"#
    )
    .unwrap();

    let manager = ConfigManager::with_path(file.path());
    let config = manager
        .load_config_with(env(&[
            ("NEO_NETWORK", "testnet"),
            ("DEMO_MODE", "off"),
            ("OPENAI_API_KEY", "sk-test"),
            ("NEO_TIMEOUT", "not-a-number"),
        ]))
        .await
        .unwrap();

    assert_eq!(config.neo.network, Network::Testnet);
    assert!(!config.demo_mode);
    assert_eq!(config.neo.timeout_secs, 12);
    assert_eq!(config.security.max_transfer_amount, Decimal::from(250));
    assert_eq!(config.security.blocklist, vec!["NbadActor".to_string()]);
    assert_eq!(config.llm.model, "gpt-4o");
    assert!(config.llm_configured());

    let status = config.status();
    assert!(status.openai_configured);
    assert!(!status.goplus_configured);
    assert_eq!(status.missing, vec!["GO_PLUS_LABS_APP_KEY"]);
}

#[tokio::test]
async fn malformed_file_is_a_config_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "demo_mode = \"perhaps\"").unwrap();

    let result = ConfigManager::with_path(file.path()).load_config_with(env(&[])).await;
    assert!(matches!(result, Err(neoxbridge::NeoxError::Config(_))));
}
