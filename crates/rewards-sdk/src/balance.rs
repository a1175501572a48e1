use rewards_oracle::OracleClient;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, RewardsError};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    /// Native currency (SOL)
    pub native: f64,
    /// Reward points held in the mint's token account
    pub points: u64,
}

/// Fresh balances for `public_key`; nothing is cached.
///
/// A missing point account is created on the spot and reported as zero
/// points for this call.
pub fn query_balance(oracle: &dyn OracleClient, mint: &str, public_key: &str) -> Result<Balance> {
    if public_key.trim().is_empty() {
        return Err(RewardsError::InvalidInput("Public key must not be empty".into()));
    }

    let native = oracle
        .native_balance(public_key)
        .map_err(|e| RewardsError::ExternalTool(e.diagnostic()))?;

    let points = match oracle.token_balance(mint, public_key) {
        Ok(points) => points,
        Err(e) => {
            warn!(
                "Point balance unavailable for {} ({}), provisioning account",
                public_key,
                e.diagnostic()
            );
            oracle
                .create_token_account(mint, public_key)
                .map_err(|e| RewardsError::ExternalTool(e.diagnostic()))?;
            info!("Created point account for {}", public_key);
            0
        }
    };

    Ok(Balance { native, points })
}
