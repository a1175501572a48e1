//! Terminal output for each subcommand.

use anyhow::{Context, Result};
use colored::Colorize;
use rewards_oracle::OracleClient;
use rewards_sdk::wallet::display_balance;
use rewards_sdk::{ActivityKind, ActivityRecord, Identity, RecoveryPhrase, RewardsClient, WalletStore};
use std::io::{self, Write};
use zeroize::Zeroizing;

pub const PHRASE_ENV: &str = "REWARDS_RECOVERY_PHRASE";

pub fn create(store: &WalletStore, oracle: &dyn OracleClient, name: &str) -> Result<()> {
    println!("{}", format!("Creating wallet '{}'...", name).cyan());
    let created = store.create(oracle, name)?;

    println!("{}", "✓ Wallet created".green());
    println!();
    println!("{}: {}", "Public Key".bold(), created.record.public_key);
    println!("{}: {}", "Keypair File".bold(), created.record.path.display());
    println!();
    println!("{}", "Your recovery phrase:".bold());
    println!("{}", created.recovery_phrase.expose().yellow());
    println!();
    println!(
        "{}",
        "IMPORTANT: Write down this phrase now. It is not stored and cannot be shown again!"
            .red()
            .bold()
    );
    Ok(())
}

pub fn list(store: &WalletStore, oracle: &dyn OracleClient) -> Result<()> {
    let wallets = store.list()?;
    if wallets.is_empty() {
        println!("No wallets in {}", store.dir().display());
        return Ok(());
    }

    println!("{:<20} {:<46} {:>12}", "NAME".bold(), "PUBLIC KEY".bold(), "SOL".bold());
    for wallet in &wallets {
        let native = display_balance(oracle, &wallet.public_key);
        println!("{:<20} {:<46} {:>12.4}", wallet.name, wallet.public_key, native);
    }
    Ok(())
}

pub fn balance(client: &RewardsClient, public_key: &str) -> Result<()> {
    let balance = client.balance(public_key)?;
    println!("{}: {}", "Account".bold(), public_key);
    println!("  SOL:    {:.4}", balance.native);
    println!("  Points: {}", balance.points.to_string().green());
    Ok(())
}

pub fn airdrop(client: &RewardsClient, public_key: &str, amount: f64) -> Result<()> {
    client.request_airdrop(public_key, amount)?;
    println!("{}", format!("✓ Airdropped {} SOL to {}", amount, public_key).green());
    Ok(())
}

pub fn mint(client: &RewardsClient) -> Result<()> {
    let mint = client.mint_id()?;
    println!("{}: {}", "Point Mint".bold(), mint);
    println!("  stored in {}", client.config().mint_file.display());
    Ok(())
}

pub fn grant(client: &RewardsClient, public_key: &str, amount: u64) -> Result<()> {
    let identity = Identity::new(public_key, read_phrase()?);
    let record = client.mint_points(&identity, amount)?;
    println!("{}", format!("✓ Granted {} points to {}", amount, public_key).green());
    print_transaction(&record);
    Ok(())
}

pub fn redeem(
    client: &RewardsClient,
    public_key: &str,
    reward: Option<&str>,
    points: Option<u64>,
    idempotency_key: Option<&str>,
) -> Result<()> {
    let identity = Identity::new(public_key, read_phrase()?);

    match (reward, points) {
        (Some(reward), _) => {
            let record = client.redeem_reward(&identity, reward, idempotency_key)?;
            println!("{}", format!("✓ Redeemed {}", record.label).green());
            print_transaction(&record);
        }
        (None, Some(points)) => {
            let tx = client.redeem_points(&identity, points, idempotency_key)?;
            println!("{}", format!("✓ Redeemed {} points", points).green());
            println!("  Transaction: {}", tx);
        }
        (None, None) => anyhow::bail!("Name a reward or pass --points"),
    }
    Ok(())
}

pub fn activity(client: &RewardsClient, limit: usize) -> Result<()> {
    let entries = client.activity(Some(limit));
    if entries.is_empty() {
        println!("No activity yet");
        return Ok(());
    }
    for record in &entries {
        println!("{}", format_activity(record));
    }
    Ok(())
}

/// Phrase from the environment, else prompted on stdin.
fn read_phrase() -> Result<RecoveryPhrase> {
    if let Ok(phrase) = std::env::var(PHRASE_ENV) {
        let phrase = Zeroizing::new(phrase);
        return Ok(RecoveryPhrase::new(phrase.trim()));
    }

    print!("Enter the recovery phrase for this wallet: ");
    io::stdout().flush()?;
    let mut input = Zeroizing::new(String::new());
    io::stdin()
        .read_line(&mut input)
        .context("Failed to read recovery phrase")?;
    Ok(RecoveryPhrase::new(input.trim()))
}

fn print_transaction(record: &ActivityRecord) {
    println!("  Transaction: {}", record.tx_signature);
    println!("  Points:      {}", signed_points(record.points));
}

fn format_activity(record: &ActivityRecord) -> String {
    let kind = match record.kind {
        ActivityKind::Redemption => "REDEEM",
        ActivityKind::Grant => "GRANT ",
    };
    let points = signed_points(record.points);
    let points = if record.points < 0 {
        points.red()
    } else {
        points.green()
    };
    format!(
        "{} | {} | {:>8} | {} | {}",
        record.timestamp.format("%Y-%m-%d %H:%M"),
        kind,
        points,
        record.label,
        short(&record.tx_signature)
    )
}

fn signed_points(points: i64) -> String {
    if points > 0 {
        format!("+{}", points)
    } else {
        points.to_string()
    }
}

fn short(signature: &str) -> String {
    if signature.len() <= 16 {
        return signature.to_string();
    }
    format!("{}...", &signature[..12])
}
