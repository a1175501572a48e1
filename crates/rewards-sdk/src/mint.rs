use once_cell::sync::OnceCell;
use rewards_oracle::OracleClient;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Result, RewardsError};

/// Decimal places of the reward-point mint.
pub const POINT_DECIMALS: u8 = 9;

/// Process-wide reward-point mint, created through the oracle on first use and
/// remembered in a plain-text file.
pub struct MintRegistry {
    path: PathBuf,
    mint: OnceCell<String>,
}

impl MintRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mint: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached identifier, if this process already resolved it.
    pub fn cached(&self) -> Option<&str> {
        self.mint.get().map(String::as_str)
    }

    /// Concurrent first callers block on one another; creation runs at most once.
    pub fn get_or_create(&self, oracle: &dyn OracleClient) -> Result<String> {
        self.mint
            .get_or_try_init(|| self.load_or_create(oracle))
            .cloned()
    }

    fn load_or_create(&self, oracle: &dyn OracleClient) -> Result<String> {
        if let Some(existing) = self.load()? {
            info!("Using reward mint {} from {}", existing, self.path.display());
            return Ok(existing);
        }

        let mint = oracle
            .create_mint(POINT_DECIMALS)
            .map_err(|e| RewardsError::MintProvisioning(e.diagnostic()))?;
        self.save(&mint)?;
        info!("Created reward mint {}", mint);
        Ok(mint)
    }

    fn load(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => {
                let value = raw.trim();
                Ok((!value.is_empty()).then(|| value.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(RewardsError::Storage(format!(
                "Read {} failed: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn save(&self, mint: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| RewardsError::Storage(format!("Create dir failed: {}", e)))?;
        }
        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, mint)
            .map_err(|e| RewardsError::Storage(format!("Write failed: {}", e)))?;
        std::fs::rename(&temp_path, &self.path)
            .map_err(|e| RewardsError::Storage(format!("Rename failed: {}", e)))?;
        Ok(())
    }
}
