// Wallet session: key parsing and address derivation
use chrono::{DateTime, Utc};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use ripemd::Ripemd160;
use secrecy::{ExposeSecret, SecretBox};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::{NeoxError, NeoxResult};
use crate::neo::base58;
use crate::neo::{Address, Network, ScriptHash};

const WIF_VERSION: u8 = 0x80;
const WIF_COMPRESSED_FLAG: u8 = 0x01;

// PUSHDATA1 33 <pubkey> SYSCALL System.Crypto.CheckSig
const VERIFICATION_PREFIX: [u8; 2] = [0x0c, 0x21];
const VERIFICATION_SUFFIX: [u8; 5] = [0x41, 0x56, 0xe7, 0xb3, 0x27];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KeyFormat {
    Hex,
    PrefixedHex,
    Wif,
}

impl std::fmt::Display for KeyFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyFormat::Hex => write!(f, "hex"),
            KeyFormat::PrefixedHex => write!(f, "0x-hex"),
            KeyFormat::Wif => write!(f, "WIF"),
        }
    }
}

pub struct PrivateKey {
    bytes: SecretBox<[u8; 32]>,
    format: KeyFormat,
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("format", &self.format)
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

impl PrivateKey {
    /// Accepts 64 hex characters, `0x` + 64 hex characters, or a 52-character WIF.
    pub fn parse(text: &str) -> NeoxResult<Self> {
        let text = text.trim();

        if text.len() == 52 && (text.starts_with('K') || text.starts_with('L')) {
            return Self::from_wif(text);
        }

        let (digits, format) = match text.strip_prefix("0x") {
            Some(rest) => (rest, KeyFormat::PrefixedHex),
            None => (text, KeyFormat::Hex),
        };

        if digits.len() != 64 {
            return Err(NeoxError::invalid_key(
                "Private key must be 64 hex characters (optionally 0x-prefixed) or a 52-character WIF starting with K or L",
            ));
        }

        let mut bytes = [0u8; 32];
        hex::decode_to_slice(digits, &mut bytes).map_err(|_| {
            NeoxError::invalid_key("Private key must contain only hexadecimal characters (0-9, a-f, A-F)")
        })?;

        Self::from_bytes(bytes, format)
    }

    fn from_wif(text: &str) -> NeoxResult<Self> {
        let payload = base58::decode_check(text)
            .map_err(|e| NeoxError::invalid_key(format!("Invalid WIF format: {}", e)))?;

        if payload.len() != 34 || payload[0] != WIF_VERSION || payload[33] != WIF_COMPRESSED_FLAG {
            return Err(NeoxError::invalid_key(format!(
                "Invalid WIF payload: expected 34 bytes with version 0x80 and compression flag, got {} bytes",
                payload.len()
            )));
        }

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&payload[1..33]);
        Self::from_bytes(bytes, KeyFormat::Wif)
    }

    fn from_bytes(bytes: [u8; 32], format: KeyFormat) -> NeoxResult<Self> {
        if bytes.iter().all(|&b| b == 0) {
            return Err(NeoxError::invalid_key("Private key cannot be all zeros"));
        }
        // Out-of-range scalars are caught here rather than at derivation time.
        p256::SecretKey::from_slice(&bytes)
            .map_err(|_| NeoxError::invalid_key("Private key is not a valid secp256r1 scalar"))?;

        Ok(Self {
            bytes: SecretBox::new(Box::new(bytes)),
            format,
        })
    }

    pub fn format(&self) -> KeyFormat {
        self.format
    }

    /// Compressed secp256r1 public key.
    pub fn public_key(&self) -> NeoxResult<Vec<u8>> {
        let secret = p256::SecretKey::from_slice(self.bytes.expose_secret())
            .map_err(|_| NeoxError::invalid_key("Private key is not a valid secp256r1 scalar"))?;
        Ok(secret.public_key().to_encoded_point(true).as_bytes().to_vec())
    }

    pub fn script_hash(&self) -> NeoxResult<ScriptHash> {
        let public_key = self.public_key()?;

        let mut script = Vec::with_capacity(40);
        script.extend_from_slice(&VERIFICATION_PREFIX);
        script.extend_from_slice(&public_key);
        script.extend_from_slice(&VERIFICATION_SUFFIX);

        let digest = Ripemd160::digest(Sha256::digest(&script));
        let mut hash = [0u8; 20];
        hash.copy_from_slice(&digest);
        Ok(ScriptHash(hash))
    }

    pub fn address(&self) -> NeoxResult<Address> {
        Ok(self.script_hash()?.to_address())
    }

    pub fn to_wif(&self) -> String {
        let mut payload = Vec::with_capacity(34);
        payload.push(WIF_VERSION);
        payload.extend_from_slice(self.bytes.expose_secret());
        payload.push(WIF_COMPRESSED_FLAG);
        base58::encode_check(&payload)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletInfo {
    pub address: Address,
    pub network: Network,
    pub key_format: KeyFormat,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct WalletSession {
    address: Address,
    network: Network,
    key: PrivateKey,
    loaded_at: DateTime<Utc>,
}

impl WalletSession {
    /// Loads a wallet, deriving the address unless a known address is supplied.
    pub fn load(key: PrivateKey, network: Network, known_address: Option<Address>) -> NeoxResult<Self> {
        let derived = key.address()?;

        let address = match known_address {
            Some(known) if known != derived => {
                warn!("Supplied address {} differs from derived address {}, using supplied", known, derived);
                known
            }
            Some(known) => known,
            None => derived,
        };

        info!("🔓 Wallet loaded: {} ({}, {} key)", address, network, key.format());

        Ok(Self {
            address,
            network,
            key,
            loaded_at: Utc::now(),
        })
    }

    pub fn from_text(text: &str, network: Network) -> NeoxResult<Self> {
        Self::load(PrivateKey::parse(text)?, network, None)
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn key(&self) -> &PrivateKey {
        &self.key
    }

    /// Drops the session; the key bytes are zeroized with it.
    pub fn clear(self) {
        info!("🔒 Wallet {} unloaded", self.address);
    }

    pub fn info(&self) -> WalletInfo {
        WalletInfo {
            address: self.address.clone(),
            network: self.network,
            key_format: self.key.format(),
            loaded_at: self.loaded_at,
        }
    }
}
