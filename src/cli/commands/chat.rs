use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::agents::{replies, Agent};
use crate::cli::ui;
use crate::config::NeoxConfig;
use crate::error::NeoxResult;

pub async fn handle_chat(config: NeoxConfig) -> NeoxResult<()> {
    let colors = config.ui.enable_colors;
    if config.ui.enable_banner {
        println!("{}", ui::banner());
    }

    let mut agent = Agent::from_config(config).await?;
    match agent.load_wallet_from_env(|key| std::env::var(key).ok()) {
        Ok(true) => info!("Wallet loaded from NEOX_PRIVATE_KEY"),
        Ok(false) => {}
        Err(e) => warn!("Could not load wallet from NEOX_PRIVATE_KEY: {}", e),
    }

    info!("💬 Chat session started (demo mode: {})", agent.config().demo_mode);
    ui::print_status(&agent.config().status(), None, agent.wallet().map(|w| w.address().as_str()));
    println!("{}\n", ui::plain(&replies::general_welcome()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        for alert in agent.poll_alerts().await {
            println!("{}\n", ui::plain(&replies::alert_triggered(&alert)));
        }

        print!("neox> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();

        match input.to_lowercase().as_str() {
            "" => continue,
            "quit" | "exit" | "bye" => break,
            "help" => {
                println!("{}\n", ui::plain(&replies::help()));
                continue;
            }
            "status" => {
                ui::print_status(
                    &agent.config().status(),
                    Some(agent.stats()),
                    agent.wallet().map(|w| w.address().as_str()),
                );
                continue;
            }
            "examples" => {
                ui::print_examples();
                continue;
            }
            _ => {}
        }

        let response = agent.process_message(input).await;
        ui::print_agent_response(&response, colors);
    }

    println!();
    ui::print_session_summary(agent.stats());
    Ok(())
}
