use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::base58::{self, Base58Error};
use crate::error::{NeoxError, NeoxResult};

/// Neo N3 address version byte.
pub const ADDRESS_VERSION: u8 = 0x35;
pub const ADDRESS_LENGTH: usize = 34;

/// 20-byte account identifier, stored little-endian as on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptHash(pub [u8; 20]);

impl ScriptHash {
    pub fn to_address(&self) -> Address {
        let mut payload = Vec::with_capacity(21);
        payload.push(ADDRESS_VERSION);
        payload.extend_from_slice(&self.0);
        Address(base58::encode_check(&payload))
    }

    /// Parses the `0x`-prefixed big-endian form used by explorers.
    pub fn from_hex(text: &str) -> NeoxResult<Self> {
        let trimmed = text.strip_prefix("0x").unwrap_or(text);
        let mut bytes = hex::decode(trimmed)
            .map_err(|e| NeoxError::invalid_input(format!("Invalid script hash '{}': {}", text, e)))?;
        if bytes.len() != 20 {
            return Err(NeoxError::invalid_input(format!(
                "Script hash must be 20 bytes, got {}",
                bytes.len()
            )));
        }
        bytes.reverse();
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&bytes);
        Ok(Self(hash))
    }
}

impl std::fmt::Display for ScriptHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut reversed = self.0;
        reversed.reverse();
        write!(f, "0x{}", hex::encode(reversed))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn parse(text: &str) -> NeoxResult<Self> {
        match validate(text) {
            AddressCheck::Valid { address, .. } => Ok(address),
            AddressCheck::Invalid { reason, .. } => Err(NeoxError::invalid_address(reason.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn script_hash(&self) -> ScriptHash {
        // Only constructed through validation, so the payload is known to be 21 bytes.
        let payload = base58::decode_check(&self.0).unwrap_or_default();
        let mut hash = [0u8; 20];
        if payload.len() == 21 {
            hash.copy_from_slice(&payload[1..]);
        }
        ScriptHash(hash)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Address {
    type Err = NeoxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = NeoxError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    Length(usize),
    Prefix,
    Alphabet { character: char, position: usize },
    PayloadLength(usize),
    Version(u8),
    Checksum,
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidReason::Length(len) => write!(
                f,
                "Invalid length. Neo addresses must be {} characters long (got {}).",
                ADDRESS_LENGTH, len
            ),
            InvalidReason::Prefix => write!(f, "Invalid prefix. Neo addresses must start with 'N'."),
            InvalidReason::Alphabet { character, position } => write!(
                f,
                "Character '{}' at position {} is not allowed in a Neo address.",
                character,
                position + 1
            ),
            InvalidReason::PayloadLength(len) => {
                write!(f, "Decoded address is {} bytes, expected 25.", len)
            }
            InvalidReason::Version(v) => {
                write!(f, "Address version byte 0x{:02x} is not a Neo N3 address.", v)
            }
            InvalidReason::Checksum => {
                write!(f, "Address checksum does not match. Check for a typo.")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressCheck {
    Valid { address: Address, script_hash: ScriptHash },
    Invalid { input: String, reason: InvalidReason },
}

impl AddressCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, AddressCheck::Valid { .. })
    }
}

pub fn validate(text: &str) -> AddressCheck {
    let input = text.trim();
    let invalid = |reason| AddressCheck::Invalid { input: input.to_string(), reason };

    let length = input.chars().count();
    if length != ADDRESS_LENGTH {
        return invalid(InvalidReason::Length(length));
    }
    if !input.starts_with('N') {
        return invalid(InvalidReason::Prefix);
    }

    let raw = match base58::decode(input) {
        Ok(raw) => raw,
        Err(Base58Error::InvalidCharacter { character, position }) => {
            return invalid(InvalidReason::Alphabet { character, position });
        }
        Err(_) => return invalid(InvalidReason::Checksum),
    };
    if raw.len() != 25 {
        return invalid(InvalidReason::PayloadLength(raw.len()));
    }
    if raw[0] != ADDRESS_VERSION {
        return invalid(InvalidReason::Version(raw[0]));
    }
    if base58::decode_check(input).is_err() {
        return invalid(InvalidReason::Checksum);
    }

    let mut hash = [0u8; 20];
    hash.copy_from_slice(&raw[1..21]);
    AddressCheck::Valid {
        address: Address(input.to_string()),
        script_hash: ScriptHash(hash),
    }
}

fn address_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\bN[A-Za-z0-9]{33}\b").expect("static regex"))
}

fn tx_hash_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b0x[a-fA-F0-9]{64}\b").expect("static regex"))
}

fn contract_hash_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b0x[a-fA-F0-9]{40}\b").expect("static regex"))
}

/// Address-shaped tokens in free text. They are candidates only; run `validate` before use.
pub fn extract_addresses(text: &str) -> Vec<String> {
    address_pattern()
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn extract_tx_hash(text: &str) -> Option<String> {
    tx_hash_pattern().find(text).map(|m| m.as_str().to_lowercase())
}

pub fn extract_contract_hash(text: &str) -> Option<String> {
    contract_hash_pattern().find(text).map(|m| m.as_str().to_lowercase())
}
