use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Build the health payload, pinging the room store so connectivity issues
/// show up in the logs even while the degraded flag lags behind.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    if let Ok(store) = state.require_room_store().await {
        if let Err(err) = store.health_check().await {
            warn!(error = %err, "room store health check failed");
        }
    } else {
        warn!("room store unavailable (degraded mode)");
    }

    HealthResponse::new(state.is_degraded().await)
}
