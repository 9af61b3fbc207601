use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{NeoxError, NeoxResult};

pub const NEO_CONTRACT: &str = "0xef4073a0f2b305a38ec4050e4d3d28bc40ea63f5";
pub const GAS_CONTRACT: &str = "0xd2a4cff31913016155e38e474a2c06d08be276cf";

/// Native assets that can be transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    Neo,
    Gas,
}

impl Asset {
    pub fn symbol(&self) -> &'static str {
        match self {
            Asset::Neo => "NEO",
            Asset::Gas => "GAS",
        }
    }

    pub fn decimals(&self) -> u32 {
        match self {
            Asset::Neo => 0,
            Asset::Gas => 8,
        }
    }

    pub fn contract_hash(&self) -> &'static str {
        match self {
            Asset::Neo => NEO_CONTRACT,
            Asset::Gas => GAS_CONTRACT,
        }
    }

    /// Rejects non-positive amounts and amounts finer than the asset's precision.
    pub fn check_amount(&self, amount: Decimal) -> NeoxResult<()> {
        if amount <= Decimal::ZERO {
            return Err(NeoxError::invalid_input("Amount must be positive"));
        }
        if amount.normalize().scale() > self.decimals() {
            return Err(match self {
                Asset::Neo => NeoxError::invalid_input("NEO is indivisible - send whole numbers only"),
                Asset::Gas => NeoxError::invalid_input("GAS supports at most 8 decimal places"),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Asset {
    type Err = NeoxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "NEO" => Ok(Asset::Neo),
            "GAS" => Ok(Asset::Gas),
            other => Err(NeoxError::invalid_input(format!(
                "Unsupported asset '{}'. Only NEO and GAS are supported.",
                other
            ))),
        }
    }
}

/// Converts an on-chain integer amount to a decimal using the token's precision.
pub fn from_raw(raw: &str, decimals: u32) -> NeoxResult<Decimal> {
    let value = Decimal::from_str(raw.trim())
        .map_err(|e| NeoxError::chain(format!("Invalid raw amount '{}': {}", raw, e)))?;
    let mut scaled = value;
    scaled
        .set_scale(decimals)
        .map_err(|e| NeoxError::chain(format!("Unsupported precision {}: {}", decimals, e)))?;
    Ok(scaled.normalize())
}

pub fn parse_amount(text: &str) -> NeoxResult<Decimal> {
    Decimal::from_str(text.trim())
        .map_err(|_| NeoxError::invalid_input(format!("Invalid amount '{}'. Please specify a valid number.", text)))
}

/// Renders at most 8 fractional digits with trailing zeros removed.
pub fn format_decimal(value: Decimal) -> String {
    value.round_dp(8).normalize().to_string()
}
