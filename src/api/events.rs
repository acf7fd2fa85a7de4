// src/api/events.rs
use crate::api::stats::ApiResponse;
use crate::models::parse_ts;
use crate::outreach::events::{DeliveryEvent, EventKind, EventOutcome};
use crate::server::ServerState;
use chrono::Utc;
use rocket::{post, serde::json::Json, State};
use serde::Deserialize;
use serde_json::{json, Value};

/// Inbound webhook body from the delivery provider. Events are keyed by the
/// provider message id, the engine's tracking id, or both.
#[derive(Debug, Deserialize)]
pub struct DeliveryEventPayload {
    pub event: String,
    pub message_id: Option<String>,
    pub tracking_id: Option<String>,
    pub timestamp: Option<String>,
    pub reason: Option<String>,
}

#[post("/outreach/events", data = "<payload>")]
pub async fn receive_delivery_event(
    state: &State<ServerState>,
    payload: Json<DeliveryEventPayload>,
) -> Json<ApiResponse<Value>> {
    let payload = payload.into_inner();

    let Some(kind) = EventKind::parse(&payload.event) else {
        return Json(ApiResponse::error(format!(
            "unknown event type: {}",
            payload.event
        )));
    };

    if payload.message_id.is_none() && payload.tracking_id.is_none() {
        return Json(ApiResponse::error(
            "message_id or tracking_id required".to_string(),
        ));
    }

    let timestamp = match payload.timestamp.as_deref() {
        Some(raw) => match parse_ts(raw) {
            Some(ts) => ts,
            None => {
                return Json(ApiResponse::error(format!(
                    "unparseable timestamp: {}",
                    raw
                )))
            }
        },
        None => Utc::now(),
    };

    let event = DeliveryEvent {
        kind,
        provider_message_id: payload.message_id,
        tracking_id: payload.tracking_id,
        timestamp,
        reason: payload.reason,
    };

    match state.log.apply_event(&event).await {
        Ok(outcome) => Json(ApiResponse::success(json!({
            "applied": outcome == EventOutcome::Applied,
        }))),
        Err(e) => Json(ApiResponse::error(e.to_string())),
    }
}
