use rust_decimal::Decimal;
use thiserror::Error;

pub type NeoxResult<T> = Result<T, NeoxError>;

#[derive(Error, Debug)]
pub enum NeoxError {
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid private key: {0}")]
    InvalidKey(String),

    #[error("Chain query failed: {0}")]
    Chain(String),

    #[error("Security check failed: {0}")]
    Security(String),

    #[error("Insufficient {asset} balance: required {required}, available {available}")]
    InsufficientBalance {
        asset: String,
        required: Decimal,
        available: Decimal,
    },

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl NeoxError {
    pub fn provider<T: Into<String>>(msg: T) -> Self {
        NeoxError::Provider(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        NeoxError::Config(msg.into())
    }

    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        NeoxError::InvalidInput(msg.into())
    }

    pub fn invalid_address<T: Into<String>>(msg: T) -> Self {
        NeoxError::InvalidAddress(msg.into())
    }

    pub fn invalid_key<T: Into<String>>(msg: T) -> Self {
        NeoxError::InvalidKey(msg.into())
    }

    pub fn chain<T: Into<String>>(msg: T) -> Self {
        NeoxError::Chain(msg.into())
    }

    pub fn security<T: Into<String>>(msg: T) -> Self {
        NeoxError::Security(msg.into())
    }

    pub fn unsupported<T: Into<String>>(msg: T) -> Self {
        NeoxError::Unsupported(msg.into())
    }

    /// True for failures of an external service rather than of the user's input.
    pub fn is_service_failure(&self) -> bool {
        matches!(
            self,
            NeoxError::Provider(_) | NeoxError::Network(_) | NeoxError::Chain(_) | NeoxError::Security(_)
        )
    }
}
