use std::path::Path;
use tracing::debug;

use crate::client::OracleClient;
use crate::config::OracleConfig;
use crate::error::{OracleError, Result};
use crate::runner::{CommandOutput, CommandRunner, SystemRunner};
use crate::secret::SecretFile;

/// Oracle backed by the locally installed Solana tool suite.
pub struct CliOracle<R = SystemRunner> {
    config: OracleConfig,
    runner: R,
}

impl CliOracle<SystemRunner> {
    pub fn new(config: OracleConfig) -> Self {
        Self::with_runner(config, SystemRunner)
    }
}

impl<R: CommandRunner> CliOracle<R> {
    pub fn with_runner(config: OracleConfig, runner: R) -> Self {
        Self { config, runner }
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Query commands: only the exit status counts as failure, stderr noise is
    /// tolerated and the output is judged by the parser.
    fn query(&self, program: &str, args: Vec<String>) -> Result<CommandOutput> {
        let output = self.runner.run(program, &args)?;
        if !output.success {
            return Err(tool_failed(program, &output));
        }
        Ok(output)
    }

    /// State-changing commands: any error text at all is a failure.
    fn submit(&self, program: &str, args: Vec<String>) -> Result<CommandOutput> {
        let output = self.runner.run(program, &args)?;
        if !output.success || output.has_error_text() {
            return Err(tool_failed(program, &output));
        }
        Ok(output)
    }

    fn url_args(&self) -> [String; 2] {
        ["--url".to_string(), self.config.rpc_url.clone()]
    }
}

impl<R: CommandRunner> OracleClient for CliOracle<R> {
    fn recover_public_key(&self, phrase: &SecretFile) -> Result<String> {
        let program = &self.config.keygen_bin;
        let output = self.query(program, vec!["recover".into(), path_arg(phrase.path())])?;
        single_line(program, &output.stdout)
    }

    fn write_keypair(&self, phrase: &SecretFile, outfile: &Path) -> Result<()> {
        let program = &self.config.keygen_bin;
        self.query(
            program,
            vec![
                "recover".into(),
                "--force".into(),
                "-o".into(),
                path_arg(outfile),
                path_arg(phrase.path()),
            ],
        )?;
        Ok(())
    }

    fn public_key_of(&self, keypair: &Path) -> Result<String> {
        let program = &self.config.keygen_bin;
        let output = self.query(program, vec!["pubkey".into(), path_arg(keypair)])?;
        single_line(program, &output.stdout)
    }

    fn native_balance(&self, public_key: &str) -> Result<f64> {
        let program = &self.config.solana_bin;
        let mut args = vec!["balance".to_string(), public_key.to_string()];
        args.extend(self.url_args());

        let output = self.query(program, args)?;
        parse_native_balance(&output.stdout).ok_or_else(|| unexpected(program, &output.stdout))
    }

    fn token_balance(&self, mint: &str, owner: &str) -> Result<u64> {
        let program = &self.config.spl_token_bin;
        let mut args = vec![
            "balance".to_string(),
            mint.to_string(),
            "--owner".to_string(),
            owner.to_string(),
        ];
        args.extend(self.url_args());

        let output = self.query(program, args)?;
        parse_token_amount(&output.stdout).ok_or_else(|| unexpected(program, &output.stdout))
    }

    fn create_token_account(&self, mint: &str, owner: &str) -> Result<()> {
        let program = &self.config.spl_token_bin;
        let mut args = vec![
            "create-account".to_string(),
            mint.to_string(),
            "--owner".to_string(),
            owner.to_string(),
        ];
        args.extend(self.url_args());

        self.submit(program, args)?;
        Ok(())
    }

    fn create_mint(&self, decimals: u8) -> Result<String> {
        let program = &self.config.spl_token_bin;
        let output = self.submit(
            program,
            vec![
                "create-token".into(),
                "--decimals".into(),
                decimals.to_string(),
            ],
        )?;

        // "Creating token <MINT> under program <PROGRAM>"
        output
            .stdout
            .split_whitespace()
            .nth(2)
            .map(str::to_string)
            .ok_or_else(|| unexpected(program, &output.stdout))
    }

    fn transfer(&self, mint: &str, amount: u64, from: &str, to: &str) -> Result<String> {
        let program = &self.config.spl_token_bin;
        let mut args = vec![
            "transfer".to_string(),
            mint.to_string(),
            amount.to_string(),
            to.to_string(),
            "--from".to_string(),
            from.to_string(),
            "--fee-payer".to_string(),
            from.to_string(),
        ];
        args.extend(self.url_args());

        let output = self.submit(program, args)?;
        last_token(&output.stdout).ok_or_else(|| unexpected(program, &output.stdout))
    }

    fn mint_to(&self, mint: &str, amount: u64, owner: &str) -> Result<String> {
        let program = &self.config.spl_token_bin;
        let mut args = vec![
            "mint".to_string(),
            mint.to_string(),
            amount.to_string(),
            "--owner".to_string(),
            owner.to_string(),
        ];
        args.extend(self.url_args());

        let output = self.submit(program, args)?;
        last_token(&output.stdout).ok_or_else(|| unexpected(program, &output.stdout))
    }

    fn airdrop(&self, amount: f64, public_key: &str) -> Result<()> {
        let program = &self.config.solana_bin;
        let mut args = vec![
            "airdrop".to_string(),
            amount.to_string(),
            public_key.to_string(),
        ];
        args.extend(self.url_args());

        let output = self.submit(program, args)?;
        debug!("Airdrop output: {}", output.stdout.trim());
        Ok(())
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn tool_failed(program: &str, output: &CommandOutput) -> OracleError {
    OracleError::ToolFailed {
        program: program.to_string(),
        diagnostic: output.diagnostic(),
    }
}

fn unexpected(program: &str, stdout: &str) -> OracleError {
    OracleError::UnexpectedOutput {
        program: program.to_string(),
        output: stdout.trim().to_string(),
    }
}

fn single_line(program: &str, stdout: &str) -> Result<String> {
    let value = stdout.trim();
    if value.is_empty() {
        return Err(unexpected(program, stdout));
    }
    Ok(value.to_string())
}

/// `"12.5 SOL"` -> 12.5
pub(crate) fn parse_native_balance(stdout: &str) -> Option<f64> {
    let value: f64 = stdout.split_whitespace().next()?.parse().ok()?;
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Points are integral. A decimal rendering is accepted and truncated.
pub(crate) fn parse_token_amount(stdout: &str) -> Option<u64> {
    let value = stdout.trim();
    if let Ok(amount) = value.parse::<u64>() {
        return Some(amount);
    }
    let (whole, fraction) = value.split_once('.')?;
    if whole.is_empty() || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    whole.parse().ok()
}

fn last_token(stdout: &str) -> Option<String> {
    stdout.split_whitespace().last().map(str::to_string)
}
