/// Reward redemption: verify the claimed identity, then move points from the
/// member's account to the treasury.
///
/// The oracle is not polled for finality. After submission a fixed delay is
/// observed and the reported transaction identifier is returned, so callers
/// only know the transfer was submitted.
use rewards_oracle::OracleClient;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{Result, RewardsError};
use crate::identity::{verify_identity, Identity};

pub const DEFAULT_CONFIRMATION_DELAY: Duration = Duration::from_secs(1);

pub struct TransferRequest<'a> {
    pub mint: &'a str,
    pub identity: &'a Identity,
    pub points: u64,
    pub treasury: &'a str,
    pub confirmation_delay: Duration,
}

/// Full redemption: identity check, then transfer. An unverifiable identity
/// never reaches the transfer step.
pub fn redeem_points(oracle: &dyn OracleClient, request: &TransferRequest<'_>) -> Result<String> {
    if request.points == 0 {
        return Err(RewardsError::InvalidInput("Points must be positive".into()));
    }
    if !verify_identity(oracle, &request.identity.phrase, &request.identity.public_key) {
        warn!(
            "Redemption refused: identity {} not verified",
            request.identity.public_key
        );
        return Err(RewardsError::IdentityVerificationFailed);
    }
    transfer_points(oracle, request)
}

/// Transfer step only. The identity must already have been verified.
pub fn transfer_points(oracle: &dyn OracleClient, request: &TransferRequest<'_>) -> Result<String> {
    let from = request.identity.public_key.as_str();
    let tx_signature = oracle
        .transfer(request.mint, request.points, from, request.treasury)
        .map_err(|e| {
            warn!("Transfer of {} points from {} failed: {}", request.points, from, e);
            RewardsError::RedemptionFailed(e.diagnostic())
        })?;

    if !request.confirmation_delay.is_zero() {
        std::thread::sleep(request.confirmation_delay);
    }

    info!(
        "Submitted transfer of {} points from {} to treasury: {}",
        request.points, from, tx_signature
    );
    Ok(tx_signature)
}
