use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use rewards_oracle::OracleClient;
use rewards_sdk::client::POINTS_REDEMPTION_LABEL;
use rewards_sdk::wallet::display_balance;
use rewards_sdk::{ActivityRecord, Identity, RecoveryPhrase, Reward, RewardsClient, WalletStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::info;

use crate::config::DashboardConfig;
use crate::error::{DashboardError, Result};

const MAX_BODY_BYTES: usize = 16 * 1024;

pub struct DashboardState {
    pub config: DashboardConfig,
    pub client: RewardsClient,
    pub wallets: WalletStore,
}

impl DashboardState {
    pub fn new(config: DashboardConfig) -> anyhow::Result<Self> {
        let oracle = config.build_oracle();
        Self::with_oracle(config, oracle)
    }

    pub fn with_oracle(config: DashboardConfig, oracle: Arc<dyn OracleClient>) -> anyhow::Result<Self> {
        let client = RewardsClient::new(config.client_config(), oracle)?;
        let wallets = WalletStore::open(config.wallet_dir.clone())?;
        Ok(Self {
            config,
            client,
            wallets,
        })
    }
}

pub fn router(state: Arc<DashboardState>) -> Router {
    Router::new()
        .route("/health", get(health))
        // Reward catalog
        .route("/rewards", get(list_rewards))
        // Point mint identifier (created on first use)
        .route("/mint", get(get_mint))
        .route("/balance/:public_key", get(get_balance))
        .route("/wallets", get(list_wallets))
        .route("/verify", post(verify))
        .route("/redeem", post(redeem))
        .route("/mint/points", post(mint_points))
        .route("/activity", get(get_activity))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(state: Arc<DashboardState>) -> anyhow::Result<()> {
    // 10 requests per second per IP
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(10)
        .burst_size(20)
        .key_extractor(tower_governor::key_extractor::SmartIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow::anyhow!("Invalid rate limit configuration"))?;

    let app = router(state.clone()).layer(GovernorLayer {
        config: Arc::new(governor_conf),
    });

    let addr = format!("{}:{}", state.config.host, state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Dashboard listening on {} (rate limited: 10 req/s per IP)", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;
    Ok(())
}

/// Every oracle call spawns a process and waits for it, so SDK work runs on
/// the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> rewards_sdk::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DashboardError::Internal(format!("Worker task failed: {}", e)))?
        .map_err(DashboardError::from)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct RewardsResponse {
    rewards: Vec<Reward>,
}

#[derive(Serialize)]
struct MintResponse {
    mint: String,
}

#[derive(Serialize)]
struct BalanceResponse {
    public_key: String,
    /// SOL
    native: f64,
    points: u64,
}

#[derive(Serialize)]
struct WalletSummary {
    name: String,
    public_key: String,
    native: f64,
}

#[derive(Serialize)]
struct WalletsResponse {
    wallets: Vec<WalletSummary>,
}

#[derive(Deserialize)]
struct VerifyRequest {
    public_key: String,
    recovery_phrase: RecoveryPhrase,
}

#[derive(Serialize)]
struct VerifyResponse {
    valid: bool,
}

#[derive(Deserialize)]
struct RedeemRequest {
    public_key: String,
    recovery_phrase: RecoveryPhrase,
    /// Catalog reward name
    reward: Option<String>,
    /// Raw point amount, when no reward is named
    points: Option<u64>,
    /// Repeating a key replays the first outcome instead of transferring again
    idempotency_key: Option<String>,
}

#[derive(Deserialize)]
struct MintPointsRequest {
    public_key: String,
    recovery_phrase: RecoveryPhrase,
    amount: u64,
}

#[derive(Serialize)]
struct TransactionResponse {
    success: bool,
    tx_signature: String,
    label: String,
    /// Signed point delta
    points: i64,
}

impl From<ActivityRecord> for TransactionResponse {
    fn from(record: ActivityRecord) -> Self {
        Self {
            success: true,
            tx_signature: record.tx_signature,
            label: record.label,
            points: record.points,
        }
    }
}

#[derive(Deserialize)]
struct ActivityQuery {
    limit: Option<usize>,
}

#[derive(Serialize)]
struct ActivityResponse {
    entries: Vec<ActivityRecord>,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn list_rewards(State(state): State<Arc<DashboardState>>) -> Json<RewardsResponse> {
    Json(RewardsResponse {
        rewards: state.client.catalog().to_vec(),
    })
}

async fn get_mint(State(state): State<Arc<DashboardState>>) -> Result<Json<MintResponse>> {
    let mint = blocking(move || state.client.mint_id()).await?;
    Ok(Json(MintResponse { mint }))
}

async fn get_balance(
    State(state): State<Arc<DashboardState>>,
    Path(public_key): Path<String>,
) -> Result<Json<BalanceResponse>> {
    let key = public_key.clone();
    let balance = blocking(move || state.client.balance(&key)).await?;
    Ok(Json(BalanceResponse {
        public_key,
        native: balance.native,
        points: balance.points,
    }))
}

async fn list_wallets(State(state): State<Arc<DashboardState>>) -> Result<Json<WalletsResponse>> {
    let wallets = blocking(move || {
        let records = state.wallets.list()?;
        Ok(records
            .into_iter()
            .map(|w| WalletSummary {
                native: display_balance(state.client.oracle(), &w.public_key),
                name: w.name,
                public_key: w.public_key,
            })
            .collect())
    })
    .await?;
    Ok(Json(WalletsResponse { wallets }))
}

async fn verify(
    State(state): State<Arc<DashboardState>>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>> {
    let valid = blocking(move || {
        Ok(state
            .client
            .verify_identity(&req.recovery_phrase, &req.public_key))
    })
    .await?;
    Ok(Json(VerifyResponse { valid }))
}

async fn redeem(
    State(state): State<Arc<DashboardState>>,
    Json(req): Json<RedeemRequest>,
) -> Result<Json<TransactionResponse>> {
    let identity = Identity::new(req.public_key, req.recovery_phrase);
    let key = req.idempotency_key;

    let response = match (req.reward, req.points) {
        (Some(reward), None) => {
            let record = blocking(move || {
                state
                    .client
                    .redeem_reward(&identity, &reward, key.as_deref())
            })
            .await?;
            TransactionResponse::from(record)
        }
        (None, Some(points)) => {
            let delta = i64::try_from(points).map_err(|_| {
                DashboardError::InvalidRequest(format!("Point amount too large: {}", points))
            })?;
            let tx_signature = blocking(move || {
                state
                    .client
                    .redeem_points(&identity, points, key.as_deref())
            })
            .await?;
            TransactionResponse {
                success: true,
                tx_signature,
                label: POINTS_REDEMPTION_LABEL.to_string(),
                points: -delta,
            }
        }
        _ => {
            return Err(DashboardError::InvalidRequest(
                "Exactly one of reward or points must be given".into(),
            ))
        }
    };
    Ok(Json(response))
}

async fn mint_points(
    State(state): State<Arc<DashboardState>>,
    Json(req): Json<MintPointsRequest>,
) -> Result<Json<TransactionResponse>> {
    let identity = Identity::new(req.public_key, req.recovery_phrase);
    let record = blocking(move || state.client.mint_points(&identity, req.amount)).await?;
    Ok(Json(record.into()))
}

async fn get_activity(
    State(state): State<Arc<DashboardState>>,
    Query(query): Query<ActivityQuery>,
) -> Json<ActivityResponse> {
    Json(ActivityResponse {
        entries: state.client.activity(query.limit),
    })
}
