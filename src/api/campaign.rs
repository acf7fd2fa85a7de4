// src/api/campaign.rs
use crate::api::stats::ApiResponse;
use crate::config::{CampaignConfig, CampaignConfigUpdate, Preset};
use crate::models::{BatchOutcome, RunTrigger};
use crate::server::ServerState;
use rocket::{get, post, serde::json::Json, State};
use serde::Deserialize;

/// Manual trigger. Runs the batch synchronously and returns its counters;
/// rejected while a batch is already in flight.
#[post("/campaign/run")]
pub async fn run_campaign(state: &State<ServerState>) -> Json<ApiResponse<BatchOutcome>> {
    match state.scheduler.run_batch(RunTrigger::Manual).await {
        Ok(outcome) => Json(ApiResponse::success(outcome)),
        Err(e) => Json(ApiResponse::error(e.to_string())),
    }
}

#[get("/campaign/config")]
pub async fn get_campaign_config(
    state: &State<ServerState>,
) -> Json<ApiResponse<CampaignConfig>> {
    Json(ApiResponse::success(state.config_store.get()))
}

#[post("/campaign/config", data = "<update>")]
pub async fn update_campaign_config(
    state: &State<ServerState>,
    update: Json<CampaignConfigUpdate>,
) -> Json<ApiResponse<CampaignConfig>> {
    match state.config_store.update(update.into_inner()) {
        Ok(config) => Json(ApiResponse::success(config)),
        Err(e) => Json(ApiResponse::error(e.to_string())),
    }
}

#[derive(Deserialize)]
pub struct PresetRequest {
    pub preset: String,
}

#[post("/campaign/config/preset", data = "<body>")]
pub async fn apply_campaign_preset(
    state: &State<ServerState>,
    body: Json<PresetRequest>,
) -> Json<ApiResponse<CampaignConfig>> {
    match Preset::parse(&body.preset) {
        Some(preset) => Json(ApiResponse::success(state.config_store.apply_preset(preset))),
        None => Json(ApiResponse::error(format!(
            "unknown preset: {} (expected conservative, moderate or aggressive)",
            body.preset
        ))),
    }
}
