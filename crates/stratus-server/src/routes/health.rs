//! `/health`: liveness plus component readiness.

use crate::state::AppState;
use axum::{extract::State, Json};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub components: Components,
}

#[derive(Debug, Serialize)]
pub struct Components {
    pub catalog: CatalogHealth,
    pub engine: EngineHealth,
    pub predictor: PredictorHealth,
    pub events: EventsHealth,
}

#[derive(Debug, Serialize)]
pub struct CatalogHealth {
    pub objects: usize,
}

#[derive(Debug, Serialize)]
pub struct EngineHealth {
    pub jobs: usize,
    pub queued: usize,
}

#[derive(Debug, Serialize)]
pub struct PredictorHealth {
    pub model_available: bool,
}

#[derive(Debug, Serialize)]
pub struct EventsHealth {
    pub subscribers: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        components: Components {
            catalog: CatalogHealth {
                objects: state.catalog.len(),
            },
            engine: EngineHealth {
                jobs: state.engine.job_count(),
                queued: state.engine.queue_len(),
            },
            predictor: PredictorHealth {
                model_available: state.predictor.is_available(),
            },
            events: EventsHealth {
                subscribers: state.bus.subscriber_count(),
            },
        },
    })
}
