use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::json;
use solana_program::pubkey::Pubkey;

use super::AppState;
use crate::{
    error::LaunchError,
    processors::{PreparedLaunch, QueuePage, SubmitRequest, Submission},
    types::{FeeTier, KeypairView, LaunchParams, LaunchProtectionMode},
    utils::{page_limit, parse_pubkey},
};

#[derive(Deserialize, Debug, Clone)]
pub struct PreparePayload {
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub description: String,
    pub image_uri: String,
    #[serde(default)]
    pub initial_buy_lamports: Option<u64>,
    #[serde(default)]
    pub fee_tier_bps: Option<u16>,
    #[serde(default)]
    pub protection: Option<String>,
}

impl PreparePayload {
    fn into_params(self, creator: Pubkey) -> Result<LaunchParams, LaunchError> {
        let fee_tier = match self.fee_tier_bps {
            Some(bps) => FeeTier::from_bps(bps)?,
            None => FeeTier::default(),
        };
        let protection = match self.protection.as_deref() {
            Some(mode) => mode.parse()?,
            None => LaunchProtectionMode::default(),
        };
        Ok(LaunchParams {
            creator,
            name: self.name,
            symbol: self.symbol,
            description: self.description,
            image_uri: self.image_uri,
            initial_buy_lamports: self.initial_buy_lamports,
            fee_tier,
            protection,
        })
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct SubmitPayload {
    pub signed_tx: String,
    pub mint: String,
    #[serde(default)]
    pub aux_metadata: Vec<String>,
}

impl SubmitPayload {
    fn into_request(self) -> Result<SubmitRequest, LaunchError> {
        Ok(SubmitRequest {
            mint: parse_pubkey("mint", &self.mint)?,
            signed_tx: self.signed_tx,
            aux_metadata: self.aux_metadata,
        })
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SubmitResponse {
    pub mint: String,
    pub signature: String,
}

impl From<Submission> for SubmitResponse {
    fn from(s: Submission) -> Self {
        Self {
            mint: s.mint.to_string(),
            signature: s.signature.to_string(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct MintPayload {
    pub mint: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct PreparePoolPayload {
    pub mint: String,
    pub config_address: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct AssignPayload {
    pub address: String,
    pub wallet: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct UnassignPayload {
    pub address: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct QueueParams {
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub limit: Option<usize>,
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, LaunchError> {
    payload
        .map(|Json(t)| t)
        .map_err(|e| LaunchError::validation("body", e.body_text()))
}

async fn admin(state: &AppState, headers: &HeaderMap) -> Result<Pubkey, LaunchError> {
    let identity = state.verifier.verify(headers).await?;
    if !state.admins.contains(&identity) {
        return Err(LaunchError::Forbidden);
    }
    Ok(identity)
}

pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

pub async fn prepare_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<PreparePayload>, JsonRejection>,
) -> Result<Json<PreparedLaunch>, LaunchError> {
    let creator = state.verifier.verify(&headers).await?;
    let params = body(payload)?.into_params(creator)?;
    Ok(Json(state.service.prepare(params).await?))
}

pub async fn submit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SubmitPayload>, JsonRejection>,
) -> Result<Json<SubmitResponse>, LaunchError> {
    let requester = state.verifier.verify(&headers).await?;
    let request = body(payload)?.into_request()?;
    Ok(Json(state.service.submit(request, &requester).await?.into()))
}

/// Always succeeds. Without an identity or a readable mint there is nothing
/// to release, and a lapsed reservation is reclaimed by the expiry sweep anyway.
pub async fn release_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<MintPayload>, JsonRejection>,
) -> impl IntoResponse {
    match state.verifier.verify(&headers).await {
        Ok(requester) => match body(payload).and_then(|p| parse_pubkey("mint", &p.mint)) {
            Ok(mint) => state.service.release(&mint, &requester).await,
            Err(e) => debug!("Ignoring release from {}: {}", requester, e),
        },
        Err(e) => debug!("Ignoring unidentified release: {}", e),
    }
    (StatusCode::OK, Json(json!({ "success": true })))
}

pub async fn prepare_project_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<PreparePayload>, JsonRejection>,
) -> Result<Json<PreparedLaunch>, LaunchError> {
    let creator = state.verifier.verify(&headers).await?;
    let params = body(payload)?.into_params(creator)?;
    Ok(Json(state.service.prepare_project(params).await?))
}

pub async fn submit_project_config_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SubmitPayload>, JsonRejection>,
) -> Result<Json<SubmitResponse>, LaunchError> {
    let requester = state.verifier.verify(&headers).await?;
    let request = body(payload)?.into_request()?;
    Ok(Json(state.service.submit_project_config(request, &requester).await?.into()))
}

pub async fn prepare_pool_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<PreparePoolPayload>, JsonRejection>,
) -> Result<Json<PreparedLaunch>, LaunchError> {
    let requester = state.verifier.verify(&headers).await?;
    let payload = body(payload)?;
    let mint = parse_pubkey("mint", &payload.mint)?;
    let config = parse_pubkey("config_address", &payload.config_address)?;
    Ok(Json(state.service.prepare_pool(&mint, &config, &requester).await?))
}

pub async fn assign_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<AssignPayload>, JsonRejection>,
) -> Result<Json<KeypairView>, LaunchError> {
    admin(&state, &headers).await?;
    let payload = body(payload)?;
    let address = parse_pubkey("address", &payload.address)?;
    let wallet = parse_pubkey("wallet", &payload.wallet)?;
    Ok(Json(state.service.admin().assign(&address, &wallet, payload.note).await?))
}

pub async fn unassign_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<UnassignPayload>, JsonRejection>,
) -> Result<Json<KeypairView>, LaunchError> {
    admin(&state, &headers).await?;
    let address = parse_pubkey("address", &body(payload)?.address)?;
    Ok(Json(state.service.admin().unassign(&address).await?))
}

pub async fn queue_handler(
    State(state): State<AppState>,
    Query(params): Query<QueueParams>,
) -> Result<Json<QueuePage>, LaunchError> {
    let offset = params.offset.unwrap_or(0);
    let limit = page_limit(params.limit);
    Ok(Json(state.service.admin().list_queue(offset, limit).await?))
}

pub async fn my_assignments_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<KeypairView>>, LaunchError> {
    let identity = state.verifier.verify(&headers).await?;
    Ok(Json(state.service.admin().list_assignments(&identity).await?))
}
