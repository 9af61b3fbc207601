// Risk assessment for addresses, token contracts and URLs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::NeoxResult;
use crate::neo::address::{extract_addresses, extract_contract_hash};
use crate::neo::{validate_address, AddressCheck};

pub mod goplus;

pub use goplus::GoPlusClient;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SecurityTarget {
    /// Raw address text; not yet validated.
    Address(String),
    Token(String),
    Url(String),
}

impl SecurityTarget {
    /// First match in address, token, URL order.
    pub fn detect(text: &str) -> Option<Self> {
        if let Some(address) = extract_addresses(text).into_iter().next() {
            return Some(SecurityTarget::Address(address));
        }
        if let Some(contract) = extract_contract_hash(text) {
            return Some(SecurityTarget::Token(contract));
        }
        text.split_whitespace()
            .find(|word| word.starts_with("http://") || word.starts_with("https://"))
            .map(|url| SecurityTarget::Url(url.trim_end_matches(['.', ',', ')', '?', '!']).to_string()))
    }

    pub fn value(&self) -> &str {
        match self {
            SecurityTarget::Address(v) | SecurityTarget::Token(v) | SecurityTarget::Url(v) => v,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SecurityTarget::Address(_) => "address",
            SecurityTarget::Token(_) => "token",
            SecurityTarget::Url(_) => "url",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
    Unknown,
}

impl RiskLevel {
    pub fn from_pass_rate(pass_rate: f64) -> Self {
        if pass_rate >= 0.9 {
            RiskLevel::Low
        } else if pass_rate >= 0.7 {
            RiskLevel::Medium
        } else if pass_rate >= 0.5 {
            RiskLevel::High
        } else {
            RiskLevel::Critical
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            RiskLevel::Low => "🟢",
            RiskLevel::Medium => "🟡",
            RiskLevel::High => "🟠",
            RiskLevel::Critical => "🔴",
            RiskLevel::Unknown => "⚪",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
            RiskLevel::Unknown => "UNKNOWN",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    pub fn new<N: Into<String>, D: Into<String>>(name: N, passed: bool, detail: D) -> Self {
        Self {
            name: name.into(),
            passed,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SecurityReport {
    pub target: String,
    pub kind: &'static str,
    pub is_safe: bool,
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub checks_passed: usize,
    pub total_checks: usize,
    pub checks: Vec<CheckResult>,
    /// Malicious indicators reported for the target.
    pub flags: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl SecurityReport {
    pub fn aggregate(target: &SecurityTarget, checks: Vec<CheckResult>, flags: Vec<String>) -> Self {
        let total_checks = checks.len();
        let checks_passed = checks.iter().filter(|c| c.passed).count();

        let (risk_level, confidence) = if total_checks == 0 {
            (RiskLevel::Unknown, 0.0)
        } else {
            let pass_rate = checks_passed as f64 / total_checks as f64;
            (RiskLevel::from_pass_rate(pass_rate), (pass_rate + 0.1).min(1.0))
        };

        Self {
            target: target.value().to_string(),
            kind: target.kind(),
            is_safe: total_checks > 0 && checks_passed == total_checks,
            risk_level,
            confidence,
            checks_passed,
            total_checks,
            checks,
            flags,
            timestamp: Utc::now(),
        }
    }

    fn rejected(target: &SecurityTarget, check: CheckResult, flags: Vec<String>, risk_level: RiskLevel) -> Self {
        Self {
            target: target.value().to_string(),
            kind: target.kind(),
            is_safe: false,
            risk_level,
            confidence: 1.0,
            checks_passed: 0,
            total_checks: 1,
            checks: vec![check],
            flags,
            timestamp: Utc::now(),
        }
    }

    pub fn is_malicious(&self) -> bool {
        !self.flags.is_empty()
    }
}

#[async_trait]
pub trait SecurityScanner: Send + Sync {
    async fn scan(&self, target: &SecurityTarget) -> NeoxResult<SecurityReport>;
}

/// Local checks in front of an optional external scanner.
pub struct SecurityGate {
    scanner: Option<Arc<dyn SecurityScanner>>,
    blocklist: HashSet<String>,
}

impl SecurityGate {
    pub fn new(scanner: Option<Arc<dyn SecurityScanner>>, blocklist: &[String]) -> Self {
        Self {
            scanner,
            blocklist: blocklist.iter().map(|a| a.trim().to_string()).collect(),
        }
    }

    pub async fn scan(&self, target: &SecurityTarget) -> NeoxResult<SecurityReport> {
        if let SecurityTarget::Address(text) = target {
            match validate_address(text) {
                AddressCheck::Invalid { reason, .. } => {
                    warn!("Security scan of malformed address {}: {}", text, reason);
                    return Ok(SecurityReport::rejected(
                        target,
                        CheckResult::new("format", false, reason.to_string()),
                        Vec::new(),
                        RiskLevel::High,
                    ));
                }
                AddressCheck::Valid { address, .. } => {
                    if self.blocklist.contains(address.as_str()) {
                        warn!("🚫 {} is on the local blocklist", address);
                        return Ok(SecurityReport::rejected(
                            target,
                            CheckResult::new("blocklist", false, "Address is on the local blocklist"),
                            vec!["blocklist".to_string()],
                            RiskLevel::Critical,
                        ));
                    }
                }
            }
        }

        match &self.scanner {
            Some(scanner) => {
                let report = scanner.scan(target).await?;
                info!(
                    "🛡️ Scanned {} {}: {} ({}/{})",
                    report.kind, report.target, report.risk_level, report.checks_passed, report.total_checks
                );
                Ok(report)
            }
            None => {
                let mut checks = Vec::new();
                if matches!(target, SecurityTarget::Address(_)) {
                    checks.push(CheckResult::new("format", true, "Valid Neo N3 address"));
                }
                Ok(SecurityReport::aggregate(target, checks, Vec::new()))
            }
        }
    }
}
