pub mod balance;
pub mod catalog;
pub mod client;
pub mod error;
pub mod identity;
pub mod ledger;
pub mod mint;
pub mod redemption;
pub mod wallet;

pub use balance::Balance;
pub use catalog::{find_reward, Reward, CATALOG};
pub use client::{ClientConfig, RewardsClient};
pub use error::{Result, RewardsError};
pub use identity::{Identity, RecoveryPhrase};
pub use ledger::{ActivityKind, ActivityRecord};
pub use wallet::{CreatedWallet, WalletRecord, WalletStore};
