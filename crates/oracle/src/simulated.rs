//! Self-contained oracle for demo deployments without a local validator.
//!
//! Keys are derived deterministically from the normalized recovery phrase
//! (`sha256(phrase)` as the secret half, `sha256(secret)` as the public half,
//! base58 encoded), balances live in memory, and transaction identifiers are
//! random 64-character hex strings.

use rand::RngCore;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

use crate::client::OracleClient;
use crate::error::{OracleError, Result};
use crate::secret::SecretFile;

const PROGRAM: &str = "simulated-oracle";

#[derive(Default)]
struct Ledger {
    native: HashMap<String, f64>,
    /// (mint, owner) -> points
    accounts: HashMap<(String, String), u64>,
    mints: HashSet<String>,
}

#[derive(Default)]
pub struct SimulatedOracle {
    ledger: Mutex<Ledger>,
}

impl SimulatedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_native(self, public_key: &str, amount: f64) -> Self {
        self.lock().native.insert(public_key.to_string(), amount);
        self
    }

    /// Registers `mint` and credits `owner`'s account with `points`.
    pub fn with_points(self, mint: &str, owner: &str, points: u64) -> Self {
        {
            let mut ledger = self.lock();
            ledger.mints.insert(mint.to_string());
            ledger
                .accounts
                .insert((mint.to_string(), owner.to_string()), points);
        }
        self
    }

    /// Public key this oracle derives for `phrase`.
    pub fn derive_public_key(phrase: &str) -> String {
        let (_, public) = derive_keypair(phrase);
        bs58::encode(public).into_string()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Ledger> {
        // A panic while holding the lock leaves plain data behind; keep serving it.
        self.ledger.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl OracleClient for SimulatedOracle {
    fn recover_public_key(&self, phrase: &SecretFile) -> Result<String> {
        let words = std::fs::read_to_string(phrase.path())?;
        if normalize(&words).is_empty() {
            return Err(failed("Error: empty seed phrase"));
        }
        Ok(Self::derive_public_key(&words))
    }

    fn write_keypair(&self, phrase: &SecretFile, outfile: &Path) -> Result<()> {
        let words = std::fs::read_to_string(phrase.path())?;
        if normalize(&words).is_empty() {
            return Err(failed("Error: empty seed phrase"));
        }
        let (secret, public) = derive_keypair(&words);
        let bytes: Vec<u8> = secret.iter().chain(public.iter()).copied().collect();
        let json = serde_json::to_string(&bytes).map_err(|e| failed(&e.to_string()))?;
        std::fs::write(outfile, json)?;
        Ok(())
    }

    fn public_key_of(&self, keypair: &Path) -> Result<String> {
        let raw = std::fs::read_to_string(keypair)?;
        let bytes: Vec<u8> = serde_json::from_str(&raw).map_err(|_| OracleError::UnexpectedOutput {
            program: PROGRAM.to_string(),
            output: "keypair file is not a byte array".to_string(),
        })?;
        if bytes.len() != 64 {
            return Err(failed("Error: keypair must be 64 bytes"));
        }
        Ok(bs58::encode(&bytes[32..]).into_string())
    }

    fn native_balance(&self, public_key: &str) -> Result<f64> {
        Ok(self.lock().native.get(public_key).copied().unwrap_or(0.0))
    }

    fn token_balance(&self, mint: &str, owner: &str) -> Result<u64> {
        self.lock()
            .accounts
            .get(&(mint.to_string(), owner.to_string()))
            .copied()
            .ok_or_else(|| failed("Error: Account not found"))
    }

    fn create_token_account(&self, mint: &str, owner: &str) -> Result<()> {
        let mut ledger = self.lock();
        if !ledger.mints.contains(mint) {
            return Err(failed("Error: Mint not found"));
        }
        let key = (mint.to_string(), owner.to_string());
        if ledger.accounts.contains_key(&key) {
            return Err(failed("Error: Account already exists"));
        }
        ledger.accounts.insert(key, 0);
        Ok(())
    }

    fn create_mint(&self, decimals: u8) -> Result<String> {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let mint = bs58::encode(bytes).into_string();
        self.lock().mints.insert(mint.clone());
        info!("Simulated mint {} created ({} decimals)", mint, decimals);
        Ok(mint)
    }

    fn transfer(&self, mint: &str, amount: u64, from: &str, to: &str) -> Result<String> {
        let mut ledger = self.lock();
        if !ledger.mints.contains(mint) {
            return Err(failed("Error: Mint not found"));
        }
        let from_key = (mint.to_string(), from.to_string());
        let available = *ledger
            .accounts
            .get(&from_key)
            .ok_or_else(|| failed("Error: Sender account not found"))?;
        if available < amount {
            return Err(failed(&format!(
                "Error: Insufficient funds, need {}, have {}",
                amount, available
            )));
        }

        ledger.accounts.insert(from_key, available - amount);
        *ledger
            .accounts
            .entry((mint.to_string(), to.to_string()))
            .or_insert(0) += amount;
        Ok(random_signature())
    }

    fn mint_to(&self, mint: &str, amount: u64, owner: &str) -> Result<String> {
        let mut ledger = self.lock();
        if !ledger.mints.contains(mint) {
            return Err(failed("Error: Mint not found"));
        }
        let balance = ledger
            .accounts
            .get_mut(&(mint.to_string(), owner.to_string()))
            .ok_or_else(|| failed("Error: Recipient account not found"))?;
        *balance += amount;
        Ok(random_signature())
    }

    fn airdrop(&self, amount: f64, public_key: &str) -> Result<()> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(failed("Error: invalid airdrop amount"));
        }
        *self
            .lock()
            .native
            .entry(public_key.to_string())
            .or_insert(0.0) += amount;
        Ok(())
    }
}

fn normalize(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn derive_keypair(phrase: &str) -> ([u8; 32], [u8; 32]) {
    let mut secret = [0u8; 32];
    secret.copy_from_slice(&Sha256::digest(normalize(phrase).as_bytes()));
    let mut public = [0u8; 32];
    public.copy_from_slice(&Sha256::digest(secret));
    (secret, public)
}

fn random_signature() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn failed(diagnostic: &str) -> OracleError {
    OracleError::ToolFailed {
        program: PROGRAM.to_string(),
        diagnostic: diagnostic.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHRASE: &str = "raven snap earn taste fossil pelican law fever smoke cat mountain primary";

    #[test]
    fn test_derivation_is_deterministic_and_normalized() {
        let a = SimulatedOracle::derive_public_key(PHRASE);
        let b = SimulatedOracle::derive_public_key(&format!("  {}\n", PHRASE.to_uppercase()));
        assert_eq!(a, b);
        assert_ne!(a, SimulatedOracle::derive_public_key("other words"));
    }

    #[test]
    fn test_keypair_file_matches_recovery() {
        let oracle = SimulatedOracle::new();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("member.json");
        let secret = SecretFile::create(PHRASE).unwrap();

        oracle.write_keypair(&secret, &out).unwrap();
        assert_eq!(
            oracle.public_key_of(&out).unwrap(),
            oracle.recover_public_key(&secret).unwrap()
        );
    }

    #[test]
    fn test_transfer_moves_points() {
        let oracle = SimulatedOracle::new().with_points("Mint1", "Member1", 10_000);

        let tx = oracle.transfer("Mint1", 5000, "Member1", "Treasury").unwrap();
        assert_eq!(tx.len(), 64);
        assert_eq!(oracle.token_balance("Mint1", "Member1").unwrap(), 5000);
        assert_eq!(oracle.token_balance("Mint1", "Treasury").unwrap(), 5000);
    }

    #[test]
    fn test_transfer_insufficient_funds() {
        let oracle = SimulatedOracle::new().with_points("Mint1", "Member1", 100);
        assert!(oracle.transfer("Mint1", 5000, "Member1", "Treasury").is_err());
        assert_eq!(oracle.token_balance("Mint1", "Member1").unwrap(), 100);
    }

    #[test]
    fn test_account_lifecycle() {
        let oracle = SimulatedOracle::new();
        let mint = oracle.create_mint(9).unwrap();

        assert!(oracle.token_balance(&mint, "Member1").is_err());
        oracle.create_token_account(&mint, "Member1").unwrap();
        assert_eq!(oracle.token_balance(&mint, "Member1").unwrap(), 0);
        assert!(oracle.create_token_account(&mint, "Member1").is_err());

        oracle.mint_to(&mint, 250, "Member1").unwrap();
        assert_eq!(oracle.token_balance(&mint, "Member1").unwrap(), 250);
    }

    #[test]
    fn test_airdrop() {
        let oracle = SimulatedOracle::new();
        assert_eq!(oracle.native_balance("Member1").unwrap(), 0.0);
        oracle.airdrop(1.0, "Member1").unwrap();
        oracle.airdrop(0.5, "Member1").unwrap();
        assert_eq!(oracle.native_balance("Member1").unwrap(), 1.5);
        assert!(oracle.airdrop(-1.0, "Member1").is_err());
    }
}
