// One-shot commands that skip intent classification
use std::sync::Arc;
use tracing::info;

use crate::agents::replies;
use crate::chain::{ChainClient, OneGateClient};
use crate::cli::ui;
use crate::config::NeoxConfig;
use crate::error::{NeoxError, NeoxResult};
use crate::neo::{validate_address, AddressCheck};
use crate::security::{GoPlusClient, SecurityGate, SecurityScanner, SecurityTarget};

/// Offline check; never touches the network.
pub fn handle_validate(address: &str) -> NeoxResult<()> {
    match validate_address(address) {
        AddressCheck::Valid { address, .. } => {
            println!("{}", ui::plain(&replies::address_valid(&address)));
            Ok(())
        }
        AddressCheck::Invalid { input, reason } => {
            println!("{}", ui::plain(&replies::address_invalid(&input, &reason)));
            Err(NeoxError::invalid_address(reason.to_string()))
        }
    }
}

pub async fn handle_balance(config: &NeoxConfig, address: &str) -> NeoxResult<()> {
    let address = match validate_address(address) {
        AddressCheck::Valid { address, .. } => address,
        AddressCheck::Invalid { input, reason } => {
            println!("{}", ui::plain(&replies::address_invalid(&input, &reason)));
            return Err(NeoxError::invalid_address(reason.to_string()));
        }
    };

    let client = OneGateClient::from_config(config)?;
    info!("💰 Balance lookup for {} on {}", address, client.network());
    let assets = client.assets_held(&address).await?;
    println!("{}", ui::plain(&replies::balance(&address, &assets, client.network())));
    Ok(())
}

pub async fn handle_scan(config: &NeoxConfig, target: &str) -> NeoxResult<()> {
    let Some(target) = SecurityTarget::detect(target) else {
        println!("{}", ui::plain(&replies::security_usage()));
        return Err(NeoxError::invalid_input(format!("Nothing to scan in '{}'", target)));
    };

    let scanner = GoPlusClient::from_config(&config.security)?;
    let gate = SecurityGate::new(Some(Arc::new(scanner) as Arc<dyn SecurityScanner>), &config.security.blocklist);

    let report = gate.scan(&target).await?;
    println!("{}", ui::plain(&replies::security_report(&report)));
    Ok(())
}
