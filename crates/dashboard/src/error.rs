use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rewards_sdk::RewardsError;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DashboardError>;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error(transparent)]
    Rewards(#[from] RewardsError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DashboardError {
    pub fn status(&self) -> StatusCode {
        match self {
            DashboardError::Rewards(e) => match e {
                RewardsError::IdentityVerificationFailed => StatusCode::UNAUTHORIZED,
                RewardsError::InsufficientPoints { .. } => StatusCode::CONFLICT,
                RewardsError::WalletExists(_) => StatusCode::CONFLICT,
                RewardsError::UnknownReward(_) => StatusCode::BAD_REQUEST,
                RewardsError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                RewardsError::ExternalTool(_) => StatusCode::BAD_GATEWAY,
                RewardsError::RedemptionFailed(_) => StatusCode::BAD_GATEWAY,
                RewardsError::MintProvisioning(_) => StatusCode::BAD_GATEWAY,
                RewardsError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            DashboardError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            DashboardError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
