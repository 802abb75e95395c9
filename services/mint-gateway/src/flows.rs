use ab_api_types::{BridgeEvent, BridgeRequest, QuantityRequest};
use axum::{Json, extract::State};
use tracing::info;

use crate::{AppState, ApiResult, bad_request};

pub(crate) async fn account(State(state): State<AppState>) -> Json<BridgeEvent> {
    Json(state.bridge.handle(BridgeRequest::AccountRequested).await)
}

pub(crate) async fn approve(
    State(state): State<AppState>,
    Json(request): Json<QuantityRequest>,
) -> ApiResult<BridgeEvent> {
    if request.quantity.trim().is_empty() {
        return Err(bad_request("quantity is required"));
    }

    let event = state
        .bridge
        .handle(BridgeRequest::ApproveRequested(request.quantity))
        .await;
    info!(port = event.port(), "approve request handled");
    Ok(Json(event))
}

pub(crate) async fn mint(
    State(state): State<AppState>,
    Json(request): Json<QuantityRequest>,
) -> ApiResult<BridgeEvent> {
    if request.quantity.trim().is_empty() {
        return Err(bad_request("quantity is required"));
    }

    let event = state
        .bridge
        .handle(BridgeRequest::MintRequested(request.quantity))
        .await;
    info!(port = event.port(), "mint request handled");
    Ok(Json(event))
}

/// Accepts the raw port message, for front-ends that forward their
/// outgoing ports verbatim.
pub(crate) async fn port(
    State(state): State<AppState>,
    Json(request): Json<BridgeRequest>,
) -> Json<BridgeEvent> {
    Json(state.bridge.handle(request).await)
}
