use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("unknown policy: {0}")]
    UnknownPolicy(String),
    #[error("unknown recency mode: {0}")]
    UnknownRecencyMode(String),
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("invalid tier thresholds: high {high} must exceed medium {medium}")]
    InvalidTierThresholds { high: u32, medium: u32 },
    #[error("invalid owner address: {0}")]
    InvalidOwnerAddress(String),
}
