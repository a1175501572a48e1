/// Entry point for the presentation layer: balances, catalog redemptions,
/// point grants and the activity feed, all backed by one oracle.
use rewards_oracle::OracleClient;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::balance::{query_balance, Balance};
use crate::catalog::{find_reward, Reward, CATALOG};
use crate::error::{Result, RewardsError};
use crate::identity::{verify_identity, Identity, RecoveryPhrase};
use crate::ledger::{ActivityLedger, ActivityRecord};
use crate::mint::MintRegistry;
use crate::redemption::{self, TransferRequest, DEFAULT_CONFIRMATION_DELAY};

pub const DEFAULT_MINT_FILE: &str = "token_mint.txt";
pub const POINTS_REDEMPTION_LABEL: &str = "Points redemption";
pub const POINTS_GRANT_LABEL: &str = "Points minted";

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Account receiving redeemed points
    pub treasury_account: String,
    /// Plain-text file holding the reward mint identifier
    pub mint_file: PathBuf,
    /// JSON-lines activity log; in memory only when unset
    pub ledger_path: Option<PathBuf>,
    /// Fixed wait after a transfer is submitted
    pub confirmation_delay: Duration,
}

impl ClientConfig {
    pub fn new(treasury_account: &str) -> Self {
        Self {
            treasury_account: treasury_account.to_string(),
            mint_file: PathBuf::from(DEFAULT_MINT_FILE),
            ledger_path: None,
            confirmation_delay: DEFAULT_CONFIRMATION_DELAY,
        }
    }

    pub fn with_mint_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.mint_file = path.into();
        self
    }

    pub fn with_ledger_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ledger_path = Some(path.into());
        self
    }

    pub fn with_confirmation_delay(mut self, delay: Duration) -> Self {
        self.confirmation_delay = delay;
        self
    }
}

pub struct RewardsClient {
    config: ClientConfig,
    oracle: Arc<dyn OracleClient>,
    mint: MintRegistry,
    ledger: ActivityLedger,
    /// Idempotency keys of redemptions currently being processed
    in_flight: Mutex<HashSet<String>>,
}

impl RewardsClient {
    pub fn new(config: ClientConfig, oracle: Arc<dyn OracleClient>) -> Result<Self> {
        if config.treasury_account.trim().is_empty() {
            return Err(RewardsError::InvalidInput(
                "Treasury account must be configured".into(),
            ));
        }
        let ledger = match &config.ledger_path {
            Some(path) => ActivityLedger::open(path.clone())?,
            None => ActivityLedger::in_memory(),
        };
        let mint = MintRegistry::new(config.mint_file.clone());

        Ok(Self {
            config,
            oracle,
            mint,
            ledger,
            in_flight: Mutex::new(HashSet::new()),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn oracle(&self) -> &dyn OracleClient {
        self.oracle.as_ref()
    }

    pub fn catalog(&self) -> &'static [Reward] {
        &CATALOG
    }

    pub fn mint_id(&self) -> Result<String> {
        self.mint.get_or_create(self.oracle())
    }

    pub fn verify_identity(&self, phrase: &RecoveryPhrase, public_key: &str) -> bool {
        verify_identity(self.oracle(), phrase, public_key)
    }

    pub fn balance(&self, public_key: &str) -> Result<Balance> {
        let mint = self.mint_id()?;
        query_balance(self.oracle(), &mint, public_key)
    }

    /// Redeems a raw point amount and records it. Returns the transaction
    /// identifier reported by the oracle.
    pub fn redeem_points(
        &self,
        identity: &Identity,
        points: u64,
        idempotency_key: Option<&str>,
    ) -> Result<String> {
        if points == 0 {
            return Err(RewardsError::InvalidInput("Points must be positive".into()));
        }
        let record = self.redeem_once(POINTS_REDEMPTION_LABEL, points, idempotency_key, |mint| {
            let request = self.transfer_request(&mint, identity, points);
            redemption::redeem_points(self.oracle(), &request)
        })?;
        Ok(record.tx_signature)
    }

    /// Redeems a catalog reward after checking the member can afford it.
    pub fn redeem_reward(
        &self,
        identity: &Identity,
        reward_name: &str,
        idempotency_key: Option<&str>,
    ) -> Result<ActivityRecord> {
        let reward = find_reward(reward_name)
            .ok_or_else(|| RewardsError::UnknownReward(reward_name.to_string()))?;

        self.redeem_once(reward.name, reward.points, idempotency_key, |mint| {
            if !self.verify_identity(&identity.phrase, &identity.public_key) {
                warn!("Reward redemption refused: identity {} not verified", identity.public_key);
                return Err(RewardsError::IdentityVerificationFailed);
            }

            let available = query_balance(self.oracle(), &mint, &identity.public_key)?.points;
            if available < reward.points {
                return Err(RewardsError::InsufficientPoints {
                    required: reward.points,
                    available,
                });
            }

            let request = self.transfer_request(&mint, identity, reward.points);
            redemption::transfer_points(self.oracle(), &request)
        })
    }

    /// Grants points to a verified member and records the grant.
    pub fn mint_points(&self, identity: &Identity, amount: u64) -> Result<ActivityRecord> {
        if amount == 0 {
            return Err(RewardsError::InvalidInput("Amount must be positive".into()));
        }
        if !self.verify_identity(&identity.phrase, &identity.public_key) {
            return Err(RewardsError::IdentityVerificationFailed);
        }

        let mint = self.mint_id()?;
        // Provisions the point account when it does not exist yet.
        query_balance(self.oracle(), &mint, &identity.public_key)?;

        let tx_signature = self
            .oracle
            .mint_to(&mint, amount, &identity.public_key)
            .map_err(|e| RewardsError::ExternalTool(e.diagnostic()))?;
        info!("Minted {} points to {}: {}", amount, identity.public_key, tx_signature);

        let record = ActivityRecord::grant(POINTS_GRANT_LABEL, amount, tx_signature)?;
        self.record(record.clone())?;
        Ok(record)
    }

    pub fn request_airdrop(&self, public_key: &str, amount: f64) -> Result<()> {
        if public_key.trim().is_empty() {
            return Err(RewardsError::InvalidInput("Public key must not be empty".into()));
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(RewardsError::InvalidInput(format!(
                "Airdrop amount must be positive: {}",
                amount
            )));
        }
        self.oracle
            .airdrop(amount, public_key)
            .map_err(|e| RewardsError::ExternalTool(e.diagnostic()))?;
        info!("Airdropped {} SOL to {}", amount, public_key);
        Ok(())
    }

    /// Activity feed, newest first.
    pub fn activity(&self, limit: Option<usize>) -> Vec<ActivityRecord> {
        self.ledger.recent(limit)
    }

    fn transfer_request<'a>(
        &'a self,
        mint: &'a str,
        identity: &'a Identity,
        points: u64,
    ) -> TransferRequest<'a> {
        TransferRequest {
            mint,
            identity,
            points,
            treasury: &self.config.treasury_account,
            confirmation_delay: self.config.confirmation_delay,
        }
    }

    /// Runs `submit` at most once per idempotency key and appends the
    /// resulting redemption record. A key that already succeeded replays the
    /// stored record without touching the oracle.
    fn redeem_once<F>(
        &self,
        label: &str,
        points: u64,
        idempotency_key: Option<&str>,
        submit: F,
    ) -> Result<ActivityRecord>
    where
        F: FnOnce(String) -> Result<String>,
    {
        let _claim = match idempotency_key {
            Some(key) => {
                if let Some(previous) = self.ledger.find_by_idempotency_key(key) {
                    return replay(previous, label, points);
                }
                let claim = InFlight::claim(&self.in_flight, key)?;
                // Another request with this key may have finished while we waited.
                if let Some(previous) = self.ledger.find_by_idempotency_key(key) {
                    return replay(previous, label, points);
                }
                Some(claim)
            }
            None => None,
        };

        let mint = self.mint_id()?;
        let tx_signature = submit(mint)?;

        let record = ActivityRecord::redemption(label, points, tx_signature)?
            .with_idempotency_key(idempotency_key);
        self.record(record.clone())?;
        Ok(record)
    }

    fn record(&self, record: ActivityRecord) -> Result<()> {
        let tx_signature = record.tx_signature.clone();
        self.ledger.append(record).map_err(|e| {
            error!("Transaction {} submitted but not recorded: {}", tx_signature, e);
            RewardsError::Storage(format!(
                "Transaction {} submitted but not recorded: {}",
                tx_signature, e
            ))
        })
    }
}

fn replay(previous: ActivityRecord, label: &str, points: u64) -> Result<ActivityRecord> {
    let expected = -i64::try_from(points).unwrap_or(i64::MAX);
    if previous.label != label || previous.points != expected {
        return Err(RewardsError::InvalidInput(
            "Idempotency key was already used for a different redemption".into(),
        ));
    }
    info!(
        "Replaying redemption {} for repeated idempotency key",
        previous.tx_signature
    );
    Ok(previous)
}

/// Marks an idempotency key as being processed until dropped.
struct InFlight<'a> {
    set: &'a Mutex<HashSet<String>>,
    key: String,
}

impl<'a> InFlight<'a> {
    fn claim(set: &'a Mutex<HashSet<String>>, key: &str) -> Result<Self> {
        let mut keys = set.lock().unwrap_or_else(|e| e.into_inner());
        if !keys.insert(key.to_string()) {
            return Err(RewardsError::InvalidInput(
                "A redemption with this idempotency key is already in progress".into(),
            ));
        }
        Ok(Self {
            set,
            key: key.to_string(),
        })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewards_oracle::testing::ScriptedRunner;
    use rewards_oracle::{CliOracle, OracleConfig, SimulatedOracle};

    const KEY: &str = "FRop2RpXbp7ftp8CY3WzAJkPApfNcQwP2bn52xsC5iNp";
    const PHRASE: &str = "raven snap earn taste fossil pelican law fever smoke cat mountain primary";
    const MINT: &str = "MintAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

    fn config(dir: &std::path::Path) -> ClientConfig {
        ClientConfig::new("Treasury")
            .with_mint_file(dir.join("token_mint.txt"))
            .with_confirmation_delay(Duration::ZERO)
    }

    fn scripted_client(
        dir: &std::path::Path,
        runner: ScriptedRunner,
    ) -> (RewardsClient, Arc<CliOracle<ScriptedRunner>>) {
        std::fs::write(dir.join("token_mint.txt"), MINT).unwrap();
        let oracle = Arc::new(CliOracle::with_runner(OracleConfig::default(), runner));
        let client = RewardsClient::new(config(dir), oracle.clone()).unwrap();
        (client, oracle)
    }

    fn member() -> Identity {
        Identity::new(KEY, RecoveryPhrase::new(PHRASE))
    }

    #[test]
    fn test_redeem_points_records_negative_entry() {
        let dir = tempfile::tempdir().unwrap();
        let (client, _) = scripted_client(
            dir.path(),
            ScriptedRunner::new()
                .respond("solana-keygen", KEY)
                .respond("spl-token", "Transfer 5000 tokens\n\nSignature: abc123\n"),
        );

        let tx = client.redeem_points(&member(), 5000, None).unwrap();
        assert_eq!(tx, "abc123");

        let activity = client.activity(None);
        assert_eq!(activity.len(), 1);
        assert_eq!(activity[0].points, -5000);
        assert_eq!(activity[0].tx_signature, "abc123");
        assert_eq!(activity[0].label, POINTS_REDEMPTION_LABEL);
    }

    #[test]
    fn test_failed_transfer_records_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (client, _) = scripted_client(
            dir.path(),
            ScriptedRunner::new()
                .respond("solana-keygen", KEY)
                .fail("spl-token", "Error: Insufficient funds"),
        );

        assert!(matches!(
            client.redeem_points(&member(), 5000, None),
            Err(RewardsError::RedemptionFailed(_))
        ));
        assert!(client.activity(None).is_empty());
    }

    #[test]
    fn test_idempotency_key_prevents_second_transfer() {
        let dir = tempfile::tempdir().unwrap();
        let (client, oracle) = scripted_client(
            dir.path(),
            ScriptedRunner::new()
                .respond("solana-keygen", KEY)
                .respond("spl-token", "Signature: abc123"),
        );

        let first = client.redeem_points(&member(), 5000, Some("req-1")).unwrap();
        let second = client.redeem_points(&member(), 5000, Some("req-1")).unwrap();
        assert_eq!(first, second);
        assert_eq!(oracle.runner().calls_to("spl-token", "transfer"), 1);
        assert_eq!(client.activity(None).len(), 1);

        assert!(matches!(
            client.redeem_points(&member(), 10, Some("req-1")),
            Err(RewardsError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_without_key_every_call_transfers() {
        let dir = tempfile::tempdir().unwrap();
        let (client, oracle) = scripted_client(
            dir.path(),
            ScriptedRunner::new()
                .respond("solana-keygen", KEY)
                .respond("solana-keygen", KEY)
                .respond("spl-token", "Signature: tx1")
                .respond("spl-token", "Signature: tx2"),
        );

        assert_eq!(client.redeem_points(&member(), 10, None).unwrap(), "tx1");
        assert_eq!(client.redeem_points(&member(), 10, None).unwrap(), "tx2");
        assert_eq!(oracle.runner().calls_to("spl-token", "transfer"), 2);
    }

    fn simulated_client(dir: &std::path::Path, points: u64) -> RewardsClient {
        std::fs::write(dir.join("token_mint.txt"), MINT).unwrap();
        let member = SimulatedOracle::derive_public_key(PHRASE);
        let oracle = SimulatedOracle::new()
            .with_native(&member, 2.0)
            .with_points(MINT, &member, points);
        RewardsClient::new(config(dir), Arc::new(oracle)).unwrap()
    }

    fn simulated_member() -> Identity {
        Identity::new(SimulatedOracle::derive_public_key(PHRASE), RecoveryPhrase::new(PHRASE))
    }

    #[test]
    fn test_redeem_reward_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let client = simulated_client(dir.path(), 12_000);
        let member = simulated_member();

        let record = client
            .redeem_reward(&member, "Annual Health Checkup", None)
            .unwrap();
        assert_eq!(record.points, -5000);
        assert_eq!(record.label, "Annual Health Checkup");

        let balance = client.balance(&member.public_key).unwrap();
        assert_eq!(balance.points, 7000);
        assert_eq!(balance.native, 2.0);
    }

    #[test]
    fn test_insufficient_points_no_transfer() {
        let dir = tempfile::tempdir().unwrap();
        let client = simulated_client(dir.path(), 1000);
        let member = simulated_member();

        match client.redeem_reward(&member, "Medical Coverage Boost", None) {
            Err(RewardsError::InsufficientPoints {
                required,
                available,
            }) => {
                assert_eq!(required, 10000);
                assert_eq!(available, 1000);
            }
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(client.balance(&member.public_key).unwrap().points, 1000);
        assert!(client.activity(None).is_empty());
    }

    #[test]
    fn test_unknown_reward_and_wrong_phrase() {
        let dir = tempfile::tempdir().unwrap();
        let client = simulated_client(dir.path(), 50_000);

        assert!(matches!(
            client.redeem_reward(&simulated_member(), "Gym Membership", None),
            Err(RewardsError::UnknownReward(_))
        ));

        let impostor = Identity::new(
            SimulatedOracle::derive_public_key(PHRASE),
            RecoveryPhrase::new("wrong words entirely"),
        );
        assert!(matches!(
            client.redeem_reward(&impostor, "Annual Health Checkup", None),
            Err(RewardsError::IdentityVerificationFailed)
        ));
        assert_eq!(client.balance(&impostor.public_key).unwrap().points, 50_000);
    }

    #[test]
    fn test_mint_points_provisions_and_records() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("token_mint.txt"), MINT).unwrap();
        let oracle = SimulatedOracle::new().with_points(MINT, "Someone", 0);
        let client = RewardsClient::new(config(dir.path()), Arc::new(oracle)).unwrap();
        let member = simulated_member();

        let record = client.mint_points(&member, 1000).unwrap();
        assert_eq!(record.points, 1000);
        assert_eq!(record.label, POINTS_GRANT_LABEL);
        assert_eq!(client.balance(&member.public_key).unwrap().points, 1000);
    }

    #[test]
    fn test_airdrop_validation() {
        let dir = tempfile::tempdir().unwrap();
        let client = simulated_client(dir.path(), 0);
        let member = simulated_member();

        assert!(client.request_airdrop(&member.public_key, 0.0).is_err());
        client.request_airdrop(&member.public_key, 1.0).unwrap();
        assert_eq!(client.balance(&member.public_key).unwrap().native, 3.0);
    }

    #[test]
    fn test_treasury_required() {
        let dir = tempfile::tempdir().unwrap();
        let result = RewardsClient::new(
            ClientConfig::new(" ").with_mint_file(dir.path().join("m.txt")),
            Arc::new(SimulatedOracle::new()),
        );
        assert!(matches!(result, Err(RewardsError::InvalidInput(_))));
    }
}
