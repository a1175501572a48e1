//! Typed adapter over the ledger oracle: the `solana`, `solana-keygen` and
//! `spl-token` command-line tools, or an in-process simulation of them.
//!
//! ```rust,no_run
//! use rewards_oracle::{CliOracle, OracleClient, OracleConfig};
//!
//! fn main() -> rewards_oracle::Result<()> {
//!     let oracle = CliOracle::new(OracleConfig::default().with_rpc_url("localhost"));
//!     let sol = oracle.native_balance("FRop2RpXbp7ftp8CY3WzAJkPApfNcQwP2bn52xsC5iNp")?;
//!     println!("{} SOL", sol);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod runner;
pub mod secret;
pub mod simulated;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use cli::CliOracle;
pub use client::OracleClient;
pub use config::{OracleConfig, DEFAULT_RPC_URL};
pub use error::{OracleError, Result};
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
pub use secret::SecretFile;
pub use simulated::SimulatedOracle;
