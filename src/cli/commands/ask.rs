use tracing::{info, warn};

use crate::agents::Agent;
use crate::cli::ui;
use crate::config::NeoxConfig;
use crate::error::NeoxResult;

pub async fn handle_ask(config: NeoxConfig, message: String) -> NeoxResult<()> {
    let colors = config.ui.enable_colors;
    let mut agent = Agent::from_config(config).await?;
    if let Err(e) = agent.load_wallet_from_env(|key| std::env::var(key).ok()) {
        warn!("Could not load wallet from NEOX_PRIVATE_KEY: {}", e);
    }

    info!("❓ Single message");
    let response = agent.process_message(&message).await;
    ui::print_agent_response(&response, colors);

    Ok(())
}
