use thiserror::Error;

pub type Result<T> = std::result::Result<T, RewardsError>;

#[derive(Error, Debug)]
pub enum RewardsError {
    #[error("External tool error: {0}")]
    ExternalTool(String),

    #[error("Identity verification failed")]
    IdentityVerificationFailed,

    #[error("Redemption failed: {0}")]
    RedemptionFailed(String),

    #[error("Mint provisioning failed: {0}")]
    MintProvisioning(String),

    #[error("Insufficient points: {required} required, {available} available")]
    InsufficientPoints { required: u64, available: u64 },

    #[error("Unknown reward: {0}")]
    UnknownReward(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Wallet already exists: {0}")]
    WalletExists(String),

    #[error("Storage error: {0}")]
    Storage(String),
}
