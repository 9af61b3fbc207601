use tracing::info;

use crate::cli::{ui, ConfigAction};
use crate::config::{ConfigManager, NeoxConfig};
use crate::error::NeoxResult;
use crate::providers::ProviderManager;

pub async fn handle_config(config: &NeoxConfig, action: ConfigAction) -> NeoxResult<()> {
    match action {
        ConfigAction::Status => {
            info!("📊 Configuration status");
            ui::print_status(&config.status(), None, None);

            let providers = ProviderManager::from_config(&config.llm).await?;
            for (provider, healthy) in providers.health_check_all().await {
                println!("  {} {}", if healthy { "✅" } else { "❌" }, provider);
            }
        }
        ConfigAction::Path => {
            let manager = ConfigManager::new();
            let exists = tokio::fs::try_exists(manager.path()).await.unwrap_or(false);
            println!(
                "📄 {}{}",
                manager.path().display(),
                if exists { "" } else { " (not created, using defaults)" }
            );
        }
    }

    Ok(())
}
