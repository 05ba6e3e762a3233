use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: &'static str,
    /// Whether the room store is currently reachable.
    pub storage_connected: bool,
}

impl HealthResponse {
    /// Build the payload from the shared degraded flag.
    pub fn new(degraded: bool) -> Self {
        Self {
            status: if degraded { "degraded" } else { "ok" },
            storage_connected: !degraded,
        }
    }
}
