// Console rendering for the chat loop and one-shot commands
use crossterm::style::Stylize;
use rust_decimal::Decimal;

use crate::agents::{AgentResponse, SessionStats};
use crate::config::ConfigStatus;
use crate::neo::amount::format_decimal;

pub fn banner() -> String {
    format!(
        r#"
 _   _            __  __ ____       _     _
| \ | | ___  ___  \ \/ /| __ ) _ __(_) __| | __ _  ___
|  \| |/ _ \/ _ \  \  / |  _ \| '__| |/ _` |/ _` |/ _ \
| |\  |  __/ (_) | /  \ | |_) | |  | | (_| | (_| |  __/
|_| \_|\___|\___/ /_/\_\|____/|_|  |_|\__,_|\__, |\___|
                                            |___/
  Neo N3 in plain language - v{}
"#,
        env!("CARGO_PKG_VERSION")
    )
}

/// `first8...last8` for anything longer than 20 characters.
pub fn format_address(address: &str) -> String {
    if address.chars().count() <= 20 {
        return address.to_string();
    }
    let chars: Vec<char> = address.chars().collect();
    let head: String = chars[..8].iter().collect();
    let tail: String = chars[chars.len() - 8..].iter().collect();
    format!("{}...{}", head, tail)
}

pub fn format_amount(amount: Decimal, asset: &str) -> String {
    format!("{} {}", format_decimal(amount), asset)
}

/// Drops the markdown emphasis used in replies.
pub fn plain(text: &str) -> String {
    text.replace("**", "").replace('`', "")
}

pub fn print_agent_response(response: &AgentResponse, colors: bool) {
    let text = plain(&response.message);
    if !colors {
        println!("{}\n", text);
    } else if response.success {
        println!("{}\n", text.as_str().cyan());
    } else {
        println!("{}\n", text.as_str().red());
    }
}

pub fn print_status(status: &ConfigStatus, stats: Option<&SessionStats>, wallet: Option<&str>) {
    let flag = |on: bool| if on { "✅" } else { "❌" };

    println!("📊 NeoXBridge Status");
    println!("  • Network: {} ({})", status.network, status.explorer_url);
    println!("  • Mode: {}", if status.demo_mode { "🧪 demo" } else { "🌐 live" });
    println!("  • OpenAI: {}", flag(status.openai_configured));
    println!("  • Ollama: {}", flag(status.ollama_configured));
    println!("  • GoPlus key: {}", flag(status.goplus_configured));
    println!("  • Security checks: {}", flag(status.security_checks));
    println!("  • Require confirmation: {}", flag(status.require_confirmation));
    println!("  • Max transfer: {}", format_decimal(status.max_transfer_amount));
    if let Some(wallet) = wallet {
        println!("  • Wallet: {}", format_address(wallet));
    }
    if let Some(stats) = stats {
        println!("  • Messages: {}", stats.messages);
        println!("  • Uptime: {}", stats.uptime_display());
    }
    if !status.is_complete() {
        println!("  ⚠️  Missing: {}", status.missing.join(", "));
    }
    println!();
}

pub fn print_examples() {
    println!("💡 Examples");
    for example in [
        "load wallet YOUR_PRIVATE_KEY",
        "check my balance",
        "validate NXV7ZhHiyM1aHXwpVsRZC6BwNFP2jghXAq",
        "security check https://example.com",
        "block height",
        "recent blocks",
        "create price alert NEO above 50",
        "check my alerts",
        "send 1 GAS to ADDRESS",
        "committee info",
    ] {
        println!("  • {}", example);
    }
    println!();
}

pub fn print_session_summary(stats: &SessionStats) {
    println!("👋 Session summary");
    println!("  • Duration: {}", stats.uptime_display());
    println!("  • Messages: {}", stats.messages);
    println!("  • Commands: {}", stats.commands_processed);
    println!("  • Addresses validated: {}", stats.addresses_validated);
    println!("  • Transfers simulated: {}", stats.transfers_simulated);
    println!("  • Alerts created: {}", stats.alerts_created);
}
