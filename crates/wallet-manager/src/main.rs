use anyhow::Result;
use clap::{Parser, Subcommand};
use rewards_oracle::{CliOracle, OracleClient, OracleConfig, DEFAULT_RPC_URL};
use rewards_sdk::{ClientConfig, RewardsClient, WalletStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "wallet-manager")]
#[command(about = "Manage member wallets and reward points for the Soezliana rewards program")]
struct Cli {
    /// Directory holding keypair files and wallet records
    #[arg(long, env = "WALLET_DIR", default_value = "solana_wallet")]
    wallet_dir: PathBuf,

    /// Cluster endpoint passed to the Solana tools
    #[arg(short, long, env = "ORACLE_URL", default_value = DEFAULT_RPC_URL)]
    url: String,

    #[arg(long, env = "MINT_FILE", default_value = "token_mint.txt")]
    mint_file: PathBuf,

    #[arg(long, env = "LEDGER_PATH", default_value = "activity.jsonl")]
    ledger: PathBuf,

    /// Account that receives redeemed points
    #[arg(long, env = "TREASURY_ACCOUNT", default_value = "Treasury_Account")]
    treasury: String,

    #[arg(long, env = "SOLANA_BIN", default_value = "solana")]
    solana_bin: String,

    #[arg(long, env = "SOLANA_KEYGEN_BIN", default_value = "solana-keygen")]
    keygen_bin: String,

    #[arg(long, env = "SPL_TOKEN_BIN", default_value = "spl-token")]
    spl_token_bin: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a wallet with a fresh 24-word recovery phrase
    Create { name: String },

    /// List wallets with their SOL balance
    List,

    /// Show SOL and reward point balances
    Balance { public_key: String },

    /// Request SOL from the cluster faucet
    Airdrop {
        public_key: String,
        #[arg(short, long, default_value_t = 1.0)]
        amount: f64,
    },

    /// Show the reward point mint, creating it on first use
    Mint,

    /// Grant reward points to a member (recovery phrase required)
    Grant { public_key: String, amount: u64 },

    /// Redeem a catalog reward or a raw point amount (recovery phrase required)
    Redeem {
        public_key: String,

        /// Catalog reward name
        #[arg(required_unless_present = "points")]
        reward: Option<String>,

        #[arg(short, long, conflicts_with = "reward")]
        points: Option<u64>,

        /// Repeating a key replays the earlier result instead of transferring again
        #[arg(long)]
        idempotency_key: Option<String>,
    },

    /// Recent redemptions and grants
    Activity {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

impl Cli {
    fn oracle_config(&self) -> OracleConfig {
        OracleConfig::default()
            .with_rpc_url(&self.url)
            .with_solana_bin(&self.solana_bin)
            .with_keygen_bin(&self.keygen_bin)
            .with_spl_token_bin(&self.spl_token_bin)
    }

    fn client_config(&self) -> ClientConfig {
        ClientConfig::new(&self.treasury)
            .with_mint_file(self.mint_file.clone())
            .with_ledger_path(self.ledger.clone())
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so command output stays clean.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wallet_manager=warn,rewards_sdk=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let oracle: Arc<dyn OracleClient> = Arc::new(CliOracle::new(cli.oracle_config()));

    let client = || RewardsClient::new(cli.client_config(), oracle.clone());

    match &cli.command {
        Commands::Create { name } => {
            let store = WalletStore::open(cli.wallet_dir.clone())?;
            commands::create(&store, oracle.as_ref(), name)
        }
        Commands::List => {
            let store = WalletStore::open(cli.wallet_dir.clone())?;
            commands::list(&store, oracle.as_ref())
        }
        Commands::Balance { public_key } => commands::balance(&client()?, public_key),
        Commands::Airdrop { public_key, amount } => {
            commands::airdrop(&client()?, public_key, *amount)
        }
        Commands::Mint => commands::mint(&client()?),
        Commands::Grant { public_key, amount } => {
            commands::grant(&client()?, public_key, *amount)
        }
        Commands::Redeem {
            public_key,
            reward,
            points,
            idempotency_key,
        } => commands::redeem(
            &client()?,
            public_key,
            reward.as_deref(),
            *points,
            idempotency_key.as_deref(),
        ),
        Commands::Activity { limit } => commands::activity(&client()?, *limit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_redeem_reward_by_name() {
        let cli = Cli::try_parse_from([
            "wallet-manager",
            "redeem",
            "FRop2RpXbp7ftp8CY3WzAJkPApfNcQwP2bn52xsC5iNp",
            "Annual Health Checkup",
        ])
        .unwrap();
        match cli.command {
            Commands::Redeem { reward, points, .. } => {
                assert_eq!(reward.as_deref(), Some("Annual Health Checkup"));
                assert_eq!(points, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_redeem_needs_exactly_one_target() {
        assert!(Cli::try_parse_from(["wallet-manager", "redeem", "Member1"]).is_err());
        assert!(Cli::try_parse_from([
            "wallet-manager",
            "redeem",
            "Member1",
            "Annual Health Checkup",
            "--points",
            "5000",
        ])
        .is_err());
        assert!(Cli::try_parse_from(["wallet-manager", "redeem", "Member1", "--points", "5000"]).is_ok());
    }

    #[test]
    fn test_airdrop_defaults_to_one_sol() {
        let cli = Cli::try_parse_from(["wallet-manager", "airdrop", "Member1"]).unwrap();
        match cli.command {
            Commands::Airdrop { amount, .. } => assert_eq!(amount, 1.0),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_tool_overrides_reach_oracle_config() {
        let cli = Cli::try_parse_from([
            "wallet-manager",
            "--url",
            "http://127.0.0.1:8899",
            "--spl-token-bin",
            "/opt/solana/bin/spl-token",
            "mint",
        ])
        .unwrap();
        let config = cli.oracle_config();
        assert_eq!(config.rpc_url, "http://127.0.0.1:8899");
        assert_eq!(config.spl_token_bin, "/opt/solana/bin/spl-token");
    }
}
