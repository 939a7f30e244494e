use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::domain::generation::GenerationService;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub struct HealthController {
    generation_service: Arc<GenerationService>,
}

impl HealthController {
    pub fn new(generation_service: Arc<GenerationService>) -> Self {
        Self { generation_service }
    }

    /// GET /health/ready - Stitcher and backend availability.
    /// Only an unavailable stitcher makes the service not ready.
    pub async fn ready(State(controller): State<Arc<HealthController>>) -> impl IntoResponse {
        let service = &controller.generation_service;

        let stitcher_ok = match service.stitcher().health_check().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Stitcher health check failed");
                false
            }
        };

        let mut backends = Map::new();
        for (provider, backend) in service.backends().iter() {
            let status = match backend.health_check().await {
                Ok(()) => "available",
                Err(e) => {
                    tracing::warn!(provider = %provider, error = %e, "Backend health check failed");
                    "unavailable"
                }
            };
            backends.insert(provider.to_string(), Value::from(status));
        }

        let status = if stitcher_ok {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };

        (
            status,
            Json(json!({
                "status": if stitcher_ok { "ready" } else { "not_ready" },
                "stitcher": if stitcher_ok { "available" } else { "unavailable" },
                "backends": backends,
            })),
        )
    }
}
