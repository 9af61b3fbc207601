// Base58 / Base58Check as used by Neo addresses and WIF keys
use bs58::decode::Error as DecodeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Base58Error {
    InvalidCharacter { character: char, position: usize },
    TooShort,
    ChecksumMismatch,
}

impl std::fmt::Display for Base58Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Base58Error::InvalidCharacter { character, position } => {
                write!(f, "character '{}' at position {} is not valid Base58", character, position)
            }
            Base58Error::TooShort => write!(f, "payload too short to carry a checksum"),
            Base58Error::ChecksumMismatch => write!(f, "checksum does not match"),
        }
    }
}

impl std::error::Error for Base58Error {}

/// Maps a decoder error onto character positions of `input`.
fn convert(input: &str, error: DecodeError) -> Base58Error {
    let at_byte = |index: usize| Base58Error::InvalidCharacter {
        character: input.get(index..).and_then(|rest| rest.chars().next()).unwrap_or('?'),
        position: input.get(..index).map_or(index, |head| head.chars().count()),
    };

    match error {
        DecodeError::InvalidCharacter { index, .. } => at_byte(index),
        DecodeError::NonAsciiCharacter { index } => at_byte(index),
        DecodeError::NoChecksum => Base58Error::TooShort,
        _ => Base58Error::ChecksumMismatch,
    }
}

pub fn encode(input: &[u8]) -> String {
    bs58::encode(input).into_string()
}

pub fn decode(input: &str) -> Result<Vec<u8>, Base58Error> {
    bs58::decode(input).into_vec().map_err(|e| convert(input, e))
}

/// Appends the first four bytes of double SHA-256 before encoding.
pub fn encode_check(payload: &[u8]) -> String {
    bs58::encode(payload).with_check().into_string()
}

/// Decodes and verifies the checksum; returns the payload without it.
pub fn decode_check(input: &str) -> Result<Vec<u8>, Base58Error> {
    bs58::decode(input).with_check(None).into_vec().map_err(|e| convert(input, e))
}
