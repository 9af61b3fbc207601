// Templated chat replies
use crate::chain::{AssetBalance, BlockSummary, NftHolding, TransactionStatus, TransferRecord};
use crate::neo::amount::format_decimal;
use crate::neo::{Address, InvalidReason, Network};
use crate::prices::PriceAlert;
use crate::security::SecurityReport;
use crate::wallet::WalletInfo;

use super::transfer::{PendingTransfer, TransferReceipt};

pub const ADDRESS_RULES: &str = "Neo N3 addresses are 34 characters long, start with 'N', \
use only Base58 characters (no 0, O, I or l) and end in a 4-byte checksum.";

pub fn help() -> String {
    "🤖 **NeoXBridge - Command Reference**

🔐 **Wallet:**
• `load wallet PRIVATE_KEY` - Load your Neo wallet (hex, 0x-hex or WIF)
• `wallet status` - Show the loaded wallet

💰 **Balance & Assets:**
• `check my balance` - Balance of the loaded wallet
• `balance for ADDRESS` - Balance of any address
• `validate ADDRESS` - Check an address offline
• `my nfts` - NEP-11 tokens owned

🛡️ **Security:**
• `security check ADDRESS` - Address risk scan
• `analyze token CONTRACT` - Token contract scan
• `security check URL` - Website scan

📊 **Blockchain Data:**
• `block height` - Current height
• `recent blocks` - Latest blocks
• `asset count` - Number of assets
• `status of TX_HASH` - Transaction result
• `transaction history` - Recent NEP-17 transfers
• `committee info` - Governance overview

📈 **Prices:**
• `neo price` - Current price
• `create price alert NEO above 50` - New alert
• `check my alerts` - Active alerts
• `remove alert ID` - Delete an alert

💸 **Transfers:**
• `send 5 NEO to ADDRESS` - Prepare a transfer
• `confirm` / `cancel` - Answer a pending transfer
• `send help` - Transfer rules"
        .to_string()
}

pub fn send_help(max_amount: &str) -> String {
    format!(
        "💸 **Transfer Help**

🚀 **Usage:** `send AMOUNT ASSET to ADDRESS`
• `send 5 NEO to ADDRESS`
• `transfer 2.5 GAS to ADDRESS`

🔐 **Requirements:**
• A loaded wallet
• A valid recipient address
• Enough balance, plus a 0.5 GAS network fee
• At most {} per transfer

💡 **Assets:**
• NEO is indivisible - whole numbers only
• GAS allows up to 8 decimal places",
        max_amount
    )
}

pub fn alert_help() -> String {
    "🚨 **Price Alert Help**

**Usage:** `create price alert SYMBOL above/below PRICE`
• `create price alert NEO above 50`
• `create price alert GAS below 3`

**Supported symbols:** NEO, GAS, BTC, ETH"
        .to_string()
}

pub fn general_welcome() -> String {
    "🌉 **Welcome to NeoXBridge!**

I can check balances, scan addresses and tokens, report chain data, watch prices and prepare NEO/GAS transfers.

Type `help` for all commands, or try:
• `load wallet YOUR_PRIVATE_KEY`
• `security check ADDRESS`
• `create price alert NEO above 50`"
        .to_string()
}

pub fn wallet_loaded(info: &WalletInfo) -> String {
    format!(
        "✅ **Wallet Loaded**

📍 **Address:** `{}`
💼 **Network:** {}
🔑 **Key format:** {}

Try `check my balance`, `my nfts` or `transaction history`.",
        info.address, info.network, info.key_format
    )
}

pub fn wallet_status(info: &WalletInfo, demo_mode: bool) -> String {
    format!(
        "💼 **Wallet Status**

🔸 **Address:** `{}`
🔸 **Network:** {}
🔸 **Loaded:** {}
🔸 **Mode:** {}",
        info.address,
        info.network,
        info.loaded_at.format("%Y-%m-%d %H:%M:%S UTC"),
        if demo_mode { "🧪 demo" } else { "🌐 live" }
    )
}

pub fn no_wallet() -> String {
    "💼 **No wallet loaded**

**Usage:** `load wallet YOUR_PRIVATE_KEY`

**Supported formats:**
• 64 hex characters
• 0x followed by 64 hex characters
• WIF (52 characters starting with K or L)"
        .to_string()
}

pub fn key_not_forwarded() -> String {
    format!(
        "🔐 **That looks like a private key.** It was not sent anywhere and has been removed from the conversation.

{}",
        no_wallet()
    )
}

pub fn address_valid(address: &Address) -> String {
    format!(
        "✅ **Valid Neo N3 address**

📍 `{}`
🔸 **Script hash:** `{}`",
        address,
        address.script_hash()
    )
}

pub fn address_invalid(input: &str, reason: &InvalidReason) -> String {
    format!(
        "❌ **Invalid Neo address:** `{}`

🔸 **Reason:** {}

{}",
        input, reason, ADDRESS_RULES
    )
}

pub fn balance(address: &Address, assets: &[AssetBalance], network: Network) -> String {
    let mut lines = Vec::new();
    for asset in assets {
        lines.push(format!("🔸 **{}:** {}", asset.symbol, format_decimal(asset.amount)));
    }
    if lines.is_empty() {
        lines.push("🔸 No assets held".to_string());
    }

    format!(
        "💰 **Balance for {}**

{}

🌐 **Network:** {}",
        address,
        lines.join("\n"),
        network
    )
}

pub fn security_report(report: &SecurityReport) -> String {
    let status = if report.is_safe {
        "✅ SAFE".to_string()
    } else {
        format!("{} RISK: {}", report.risk_level.emoji(), report.risk_level)
    };

    let details = if report.checks.is_empty() {
        "• No checks could run (no security API configured)".to_string()
    } else {
        report
            .checks
            .iter()
            .map(|c| format!("• {}: {} {}", c.name, if c.passed { "✅" } else { "❌" }, c.detail))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "🛡️ **Security Analysis - {}**

🔸 **Target:** `{}`
🔸 **Type:** {}
🔸 **Risk Level:** {}
🔸 **Confidence:** {:.0}%
🔸 **Checks Passed:** {}/{}

📊 **Details:**
{}",
        status,
        report.target,
        report.kind,
        report.risk_level,
        report.confidence * 100.0,
        report.checks_passed,
        report.total_checks,
        details
    )
}

pub fn security_usage() -> String {
    "🛡️ **Security Analysis**

Please provide a target:
• `security check ADDRESS` - Neo address
• `analyze token 0x...` - token contract (40 hex digits)
• `security check https://...` - website"
        .to_string()
}

pub fn block_height(height: u64, network: Network, endpoint: &str) -> String {
    format!(
        "📊 **Neo Blockchain Data**

🔸 **Current Block Height:** {}
🔸 **Network:** {}
📡 **Endpoint:** {}",
        height, network, endpoint
    )
}

pub fn recent_blocks(blocks: &[BlockSummary], network: Network) -> String {
    let lines: Vec<String> = blocks
        .iter()
        .map(|b| format!("• Block #{}: {} transactions", b.index, b.transaction_count))
        .collect();

    format!(
        "📊 **Recent Blocks**

{}

🔸 **Network:** {}",
        if lines.is_empty() { "• No blocks returned".to_string() } else { lines.join("\n") },
        network
    )
}

pub fn asset_count(count: u64, network: Network) -> String {
    format!(
        "📊 **Neo Asset Statistics**

🔸 **Total Assets:** {}
🔸 **Network:** {}",
        count, network
    )
}

pub fn chain_overview(height: u64, assets: u64, network: Network) -> String {
    format!(
        "📊 **Neo Blockchain Overview**

🔸 **Current Height:** {}
🔸 **Total Assets:** {}
🔸 **Network:** {}

Try `recent blocks`, `asset count` or `block height`.",
        height, assets, network
    )
}

pub fn transaction_status(status: &TransactionStatus) -> String {
    let result = if status.succeeded() { "✅ Succeeded" } else { "❌ Failed" };
    let gas = status
        .gas_consumed
        .map(|g| format!("{} GAS", format_decimal(g)))
        .unwrap_or_else(|| "unknown".to_string());

    format!(
        "🔎 **Transaction {}**

🔸 **Result:** {} ({})
🔸 **GAS consumed:** {}{}",
        status.tx_hash,
        result,
        status.vm_state,
        gas,
        status
            .block_hash
            .as_ref()
            .map(|b| format!("\n🔸 **Block:** {}", b))
            .unwrap_or_default()
    )
}

pub fn nfts(address: &Address, holdings: &[NftHolding], network: Network) -> String {
    let mut per_contract: Vec<(&str, usize)> = Vec::new();
    for holding in holdings {
        match per_contract.iter_mut().find(|(c, _)| *c == holding.contract) {
            Some((_, count)) => *count += 1,
            None => per_contract.push((&holding.contract, 1)),
        }
    }

    let collections = if per_contract.is_empty() {
        "None found".to_string()
    } else {
        per_contract
            .iter()
            .map(|(contract, count)| format!("• {}: {} NFT(s)", contract, count))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "🎨 **NFT Collection for {}**

🔸 **Total NFTs:** {}
📦 **Collections:**
{}

🌐 **Network:** {}",
        address,
        holdings.len(),
        collections,
        network
    )
}

pub fn transfer_history(address: &Address, records: &[TransferRecord], limit: usize) -> String {
    if records.is_empty() {
        return format!("📜 **Transfer History for {}**\n\nNo NEP-17 transfers found.", address);
    }

    let own_hash = address.script_hash().to_string();
    let lines: Vec<String> = records
        .iter()
        .take(limit)
        .map(|r| {
            let outgoing = r.from.as_deref().is_some_and(|f| f.eq_ignore_ascii_case(&own_hash) || f == address.as_str());
            let direction = if outgoing { "📤 out" } else { "📥 in" };
            format!("• {} {} of {} ({})", direction, r.raw_value, r.contract, short_hash(&r.tx_hash))
        })
        .collect();

    format!(
        "📜 **Transfer History for {}**

{}

🔸 **Showing:** {} of {}",
        address,
        lines.join("\n"),
        lines.len(),
        records.len()
    )
}

fn short_hash(hash: &str) -> String {
    let chars: Vec<char> = hash.chars().collect();
    if chars.len() <= 18 {
        return hash.to_string();
    }
    let head: String = chars[..10].iter().collect();
    let tail: String = chars[chars.len() - 8..].iter().collect();
    format!("{}...{}", head, tail)
}

pub fn governance(committee_size: usize, candidates: u64, network: Network) -> String {
    format!(
        "🏛️ **Neo Governance**

🔸 **Committee Members:** {}
🔸 **Total Candidates:** {}
🔸 **Network:** {}",
        committee_size, candidates, network
    )
}

pub fn alert_created(alert: &PriceAlert) -> String {
    format!(
        "🚨 **Price Alert Created**

🔸 **ID:** {}
🔸 **Symbol:** {}
🔸 **Condition:** {} ${}
🔸 **Status:** Active

I'll check the price between your messages.",
        alert.short_id(),
        alert.symbol,
        alert.condition,
        format_decimal(alert.threshold)
    )
}

pub fn alert_list(alerts: &[PriceAlert]) -> String {
    if alerts.is_empty() {
        return "🚨 **Active Price Alerts**\n\nNo active alerts.\n\nCreate one with: `create price alert NEO above 50`"
            .to_string();
    }

    let lines: Vec<String> = alerts
        .iter()
        .map(|a| format!("• [{}] {} {} ${}", a.short_id(), a.symbol, a.condition, format_decimal(a.threshold)))
        .collect();

    format!(
        "🚨 **Active Price Alerts**

{}

🔸 **Total Active:** {}",
        lines.join("\n"),
        alerts.len()
    )
}

pub fn alert_triggered(alert: &PriceAlert) -> String {
    format!(
        "🔔 **Price Alert Triggered**: {} is {} ${} (now ${})",
        alert.symbol,
        alert.condition,
        format_decimal(alert.threshold),
        alert.triggered_price.map(format_decimal).unwrap_or_else(|| "?".to_string())
    )
}

pub fn price(quotes: &[(String, Option<String>)]) -> String {
    let lines: Vec<String> = quotes
        .iter()
        .map(|(symbol, price)| match price {
            Some(price) => format!("🔸 **{}:** ${}", symbol, price),
            None => format!("🔸 **{}:** unavailable", symbol),
        })
        .collect();

    format!("📈 **Current Prices (USD)**\n\n{}", lines.join("\n"))
}

pub fn transfer_preview(pending: &PendingTransfer, demo_mode: bool) -> String {
    let total = if pending.asset.symbol() == "GAS" {
        format!("{} GAS", format_decimal(pending.amount + pending.network_fee))
    } else {
        format!(
            "{} {} + {} GAS",
            format_decimal(pending.amount),
            pending.asset,
            format_decimal(pending.network_fee)
        )
    };

    let security = match (&pending.security, &pending.security_note) {
        (Some(verdict), _) if verdict.is_safe => "✅ SAFE".to_string(),
        (Some(verdict), _) => format!(
            "⚠️ {} RISK DETECTED{}",
            verdict.risk_level,
            if verdict.summary.is_empty() { String::new() } else { format!(" - {}", verdict.summary) }
        ),
        (None, Some(note)) => format!("⚠️ Not verified - {}", note),
        (None, None) => "⏭️ Checks disabled".to_string(),
    };

    format!(
        "💸 **Transaction Preview**{}

📤 **From:** `{}`
📥 **To:** `{}`
💰 **Amount:** {} {}
⛽ **Network Fee:** {} GAS
🔸 **Total Cost:** {}

🛡️ **Security Status:** {}

{}Type `confirm` to execute or `cancel` to abort.",
        if demo_mode { " (🧪 demo mode)" } else { "" },
        pending.from,
        pending.to,
        format_decimal(pending.amount),
        pending.asset,
        format_decimal(pending.network_fee),
        total,
        security,
        if pending.has_security_warning() { "⚠️ Review the warning above before confirming.\n\n" } else { "" }
    )
}

pub fn transfer_executed(receipt: &TransferReceipt) -> String {
    format!(
        "✅ **Transfer {}**

🔸 **Hash:** `{}`
📥 **To:** `{}`
💰 **Amount:** {} {}
⛽ **Fee:** {} GAS{}",
        if receipt.simulated { "Simulated" } else { "Sent" },
        receipt.tx_hash,
        receipt.to,
        format_decimal(receipt.amount),
        receipt.asset,
        format_decimal(receipt.network_fee),
        if receipt.simulated {
            "\n\n🧪 Demo mode: nothing was broadcast to the network."
        } else {
            ""
        }
    )
}

pub fn service_unavailable(service: &str, error: &dyn std::fmt::Display) -> String {
    format!(
        "❌ Could not reach the {}. Please try again.\n\n🔸 **Error:** {}",
        service, error
    )
}
