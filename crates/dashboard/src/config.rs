use rewards_oracle::{CliOracle, OracleClient, OracleConfig, SimulatedOracle, DEFAULT_RPC_URL};
use rewards_sdk::client::DEFAULT_MINT_FILE;
use rewards_sdk::ClientConfig;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Placeholder treasury used when `TREASURY_ACCOUNT` is not set
pub const DEFAULT_TREASURY_ACCOUNT: &str = "Treasury_Account";
pub const DEFAULT_LEDGER_PATH: &str = "activity.jsonl";
pub const DEFAULT_WALLET_DIR: &str = "solana_wallet";

/// Which oracle backs this deployment. Never mixed at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OracleMode {
    Cli,
    Simulated,
}

impl FromStr for OracleMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cli" => Ok(Self::Cli),
            "simulated" => Ok(Self::Simulated),
            other => Err(anyhow::anyhow!(
                "Unknown ORACLE_MODE {:?} (expected \"cli\" or \"simulated\")",
                other
            )),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DashboardConfig {
    pub host: String,
    pub port: u16,
    pub oracle_mode: OracleMode,
    pub oracle: OracleConfig,
    pub treasury_account: String,
    pub mint_file: PathBuf,
    pub ledger_path: PathBuf,
    pub wallet_dir: PathBuf,
    pub confirmation_delay: Duration,
}

impl DashboardConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = lookup("PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);

        let oracle_mode = match lookup("ORACLE_MODE") {
            Some(mode) => mode.parse()?,
            None => OracleMode::Cli,
        };

        let mut oracle = OracleConfig::default()
            .with_rpc_url(&lookup("ORACLE_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string()));
        if let Some(bin) = lookup("SOLANA_BIN") {
            oracle = oracle.with_solana_bin(&expand(&bin));
        }
        if let Some(bin) = lookup("SOLANA_KEYGEN_BIN") {
            oracle = oracle.with_keygen_bin(&expand(&bin));
        }
        if let Some(bin) = lookup("SPL_TOKEN_BIN") {
            oracle = oracle.with_spl_token_bin(&expand(&bin));
        }

        let treasury_account = match lookup("TREASURY_ACCOUNT") {
            Some(account) if !account.trim().is_empty() => account.trim().to_string(),
            _ => {
                tracing::warn!(
                    "TREASURY_ACCOUNT not set! Redeemed points go to the placeholder account {}.",
                    DEFAULT_TREASURY_ACCOUNT
                );
                DEFAULT_TREASURY_ACCOUNT.to_string()
            }
        };

        let mint_file = path_var(&lookup, "MINT_FILE", DEFAULT_MINT_FILE);
        let ledger_path = path_var(&lookup, "LEDGER_PATH", DEFAULT_LEDGER_PATH);
        let wallet_dir = path_var(&lookup, "WALLET_DIR", DEFAULT_WALLET_DIR);

        let confirmation_delay = match lookup("CONFIRMATION_DELAY_MS") {
            Some(ms) => Duration::from_millis(ms.trim().parse().map_err(|e| {
                anyhow::anyhow!("Invalid CONFIRMATION_DELAY_MS {:?}: {}", ms, e)
            })?),
            None => rewards_sdk::redemption::DEFAULT_CONFIRMATION_DELAY,
        };

        Ok(Self {
            host,
            port,
            oracle_mode,
            oracle,
            treasury_account,
            mint_file,
            ledger_path,
            wallet_dir,
            confirmation_delay,
        })
    }

    pub fn build_oracle(&self) -> Arc<dyn OracleClient> {
        match self.oracle_mode {
            OracleMode::Cli => Arc::new(CliOracle::new(self.oracle.clone())),
            OracleMode::Simulated => Arc::new(SimulatedOracle::new()),
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(&self.treasury_account)
            .with_mint_file(self.mint_file.clone())
            .with_ledger_path(self.ledger_path.clone())
            .with_confirmation_delay(self.confirmation_delay)
    }
}

fn path_var(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> PathBuf {
    PathBuf::from(expand(&lookup(key).unwrap_or_else(|| default.to_string())))
}

fn expand(value: &str) -> String {
    shellexpand::tilde(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> anyhow::Result<DashboardConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DashboardConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.oracle_mode, OracleMode::Cli);
        assert_eq!(config.oracle.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.treasury_account, DEFAULT_TREASURY_ACCOUNT);
        assert_eq!(config.mint_file, PathBuf::from("token_mint.txt"));
        assert_eq!(config.confirmation_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "9090"),
            ("ORACLE_MODE", "Simulated"),
            ("ORACLE_URL", "http://127.0.0.1:8899"),
            ("TREASURY_ACCOUNT", " Treasury111 "),
            ("SPL_TOKEN_BIN", "/opt/solana/bin/spl-token"),
            ("LEDGER_PATH", "/var/lib/rewards/activity.jsonl"),
            ("CONFIRMATION_DELAY_MS", "0"),
        ])
        .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.oracle_mode, OracleMode::Simulated);
        assert_eq!(config.oracle.rpc_url, "http://127.0.0.1:8899");
        assert_eq!(config.oracle.spl_token_bin, "/opt/solana/bin/spl-token");
        assert_eq!(config.treasury_account, "Treasury111");
        assert_eq!(config.ledger_path, PathBuf::from("/var/lib/rewards/activity.jsonl"));
        assert_eq!(config.confirmation_delay, Duration::ZERO);
    }

    #[test]
    fn test_tilde_paths_expanded() {
        let config = config_from(&[("WALLET_DIR", "~/wallets")]).unwrap();
        let expected = shellexpand::tilde("~/wallets").to_string();
        assert_eq!(config.wallet_dir, PathBuf::from(expected));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(config_from(&[("ORACLE_MODE", "mainnet")]).is_err());
        assert!(config_from(&[("CONFIRMATION_DELAY_MS", "soon")]).is_err());
    }
}
