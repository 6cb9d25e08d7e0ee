use thiserror::Error;

use crate::combat::eligibility::Refusal;
use crate::core::types::ShipId;

#[derive(Error, Debug)]
pub enum GameError {
    #[error("Attack refused: {}", .0.message())]
    Refused(Refusal),

    #[error("Ship {0} is busy, try again")]
    Busy(ShipId),

    #[error("Ship not found: {0}")]
    ShipNotFound(ShipId),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GameError {
    /// Contention is the only failure a caller can fix by retrying as-is
    pub fn is_retryable(&self) -> bool {
        matches!(self, GameError::Busy(_))
    }

    /// Refusal reason when this is a validation failure
    pub fn refusal(&self) -> Option<&Refusal> {
        match self {
            GameError::Refused(reason) => Some(reason),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GameError>;
