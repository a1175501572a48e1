use rand::RngCore;
use rewards_oracle::{OracleClient, SecretFile};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::error::{Result, RewardsError};
use crate::identity::RecoveryPhrase;

const DATA_SUFFIX: &str = "_data.json";

/// What is kept on disk per wallet. The recovery phrase is deliberately absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WalletRecord {
    pub name: String,
    pub public_key: String,
    /// Keypair file written by the key tool
    pub path: PathBuf,
}

/// A freshly created wallet. The phrase is shown once and then dropped.
#[derive(Debug)]
pub struct CreatedWallet {
    pub record: WalletRecord,
    pub recovery_phrase: RecoveryPhrase,
}

/// Fresh 24-word BIP-39 phrase from 256 bits of entropy.
pub fn generate_phrase() -> Result<RecoveryPhrase> {
    let mut entropy = Zeroizing::new([0u8; 32]);
    rand::thread_rng().fill_bytes(&mut *entropy);
    let mnemonic = bip39::Mnemonic::from_entropy(&*entropy)
        .map_err(|e| RewardsError::InvalidInput(format!("Mnemonic generation failed: {}", e)))?;
    Ok(RecoveryPhrase::new(mnemonic.to_string()))
}

pub struct WalletStore {
    dir: PathBuf,
}

impl WalletStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            RewardsError::Storage(format!("Create {} failed: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn create(&self, oracle: &dyn OracleClient, name: &str) -> Result<CreatedWallet> {
        validate_name(name)?;
        let data_path = self.data_path(name);
        if data_path.exists() {
            return Err(RewardsError::WalletExists(name.to_string()));
        }

        let phrase = generate_phrase()?;
        let keypair_path = self.dir.join(format!("{}.json", name));
        {
            let secret = SecretFile::create(phrase.expose())
                .map_err(|e| RewardsError::Storage(format!("Stage phrase failed: {}", e)))?;
            oracle
                .write_keypair(&secret, &keypair_path)
                .map_err(|e| RewardsError::ExternalTool(e.diagnostic()))?;
        }

        let public_key = oracle
            .public_key_of(&keypair_path)
            .map_err(|e| RewardsError::ExternalTool(e.diagnostic()))?;

        let record = WalletRecord {
            name: name.to_string(),
            public_key,
            path: keypair_path,
        };
        self.save(&record)?;
        info!("Created wallet {} ({})", record.name, record.public_key);

        Ok(CreatedWallet {
            record,
            recovery_phrase: phrase,
        })
    }

    /// Sorted by name. Unreadable entries are skipped.
    pub fn list(&self) -> Result<Vec<WalletRecord>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| {
            RewardsError::Storage(format!("Read {} failed: {}", self.dir.display(), e))
        })?;

        let mut wallets = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let is_data = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(DATA_SUFFIX));
            if !is_data {
                continue;
            }
            match read_record(&path) {
                Ok(record) => wallets.push(record),
                Err(e) => warn!("Skipping wallet file {}: {}", path.display(), e),
            }
        }
        wallets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(wallets)
    }

    pub fn get(&self, name: &str) -> Result<Option<WalletRecord>> {
        validate_name(name)?;
        let path = self.data_path(name);
        if !path.exists() {
            return Ok(None);
        }
        read_record(&path).map(Some)
    }

    fn data_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}{}", name, DATA_SUFFIX))
    }

    fn save(&self, record: &WalletRecord) -> Result<()> {
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| RewardsError::Storage(format!("Serialize failed: {}", e)))?;
        let path = self.data_path(&record.name);
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, json)
            .map_err(|e| RewardsError::Storage(format!("Write failed: {}", e)))?;
        std::fs::rename(&temp_path, &path)
            .map_err(|e| RewardsError::Storage(format!("Rename failed: {}", e)))?;
        Ok(())
    }
}

/// Native balance for display on the wallet overview; an unreachable oracle
/// shows as zero.
pub fn display_balance(oracle: &dyn OracleClient, public_key: &str) -> f64 {
    oracle.native_balance(public_key).unwrap_or_else(|e| {
        warn!("Balance lookup for {} failed: {}", public_key, e);
        0.0
    })
}

fn read_record(path: &Path) -> Result<WalletRecord> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| RewardsError::Storage(format!("Read failed: {}", e)))?;
    serde_json::from_str(&raw).map_err(|e| RewardsError::Storage(format!("Parse failed: {}", e)))
}

fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(RewardsError::InvalidInput(format!(
            "Wallet name must be 1-64 characters of letters, digits, '-' or '_': {:?}",
            name
        )));
    }
    Ok(())
}
