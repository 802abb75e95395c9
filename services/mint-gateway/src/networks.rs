use ab_api_types::NetworkListResponse;
use axum::{Json, extract::State};

use crate::AppState;

/// Lists the networks the mint contracts are deployed on, in table order.
///
/// The front-end uses this to label the network picker and to build
/// explorer links without hard-coding contract addresses.
pub(crate) async fn networks(State(state): State<AppState>) -> Json<NetworkListResponse> {
    Json(NetworkListResponse {
        networks: state
            .bridge
            .registry()
            .networks()
            .iter()
            .map(|network| network.info())
            .collect(),
    })
}
