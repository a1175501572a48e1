use std::path::Path;

use crate::error::Result;
use crate::secret::SecretFile;

/// Typed view of the ledger oracle. Every method maps to one external call;
/// implementations own all parsing of the oracle's output.
pub trait OracleClient: Send + Sync {
    /// Public key derived from the recovery phrase stored in `phrase`.
    fn recover_public_key(&self, phrase: &SecretFile) -> Result<String>;

    /// Write the keypair derived from `phrase` to `outfile`, replacing it.
    fn write_keypair(&self, phrase: &SecretFile, outfile: &Path) -> Result<()>;

    fn public_key_of(&self, keypair: &Path) -> Result<String>;

    fn native_balance(&self, public_key: &str) -> Result<f64>;

    /// Point balance of `owner`'s account for `mint`. Errors when the account
    /// does not exist yet.
    fn token_balance(&self, mint: &str, owner: &str) -> Result<u64>;

    fn create_token_account(&self, mint: &str, owner: &str) -> Result<()>;

    /// Returns the new mint identifier.
    fn create_mint(&self, decimals: u8) -> Result<String>;

    /// Moves `amount` points from `from` to `to`; `from` pays the fee.
    /// Returns the transaction identifier reported by the oracle.
    fn transfer(&self, mint: &str, amount: u64, from: &str, to: &str) -> Result<String>;

    fn mint_to(&self, mint: &str, amount: u64, owner: &str) -> Result<String>;

    fn airdrop(&self, amount: f64, public_key: &str) -> Result<()>;
}
