//! HTTP probes served beside the bot. `/health` reports storage latency and
//! the bookable catalog, `/health/ready` fails until the database answers and
//! at least one service is bookable, `/health/live` only proves the process runs.

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::time::Instant;
use tower_http::trace::TraceLayer;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub checked_at: DateTime<Utc>,
    pub version: String,
    pub uptime_seconds: i64,
    pub storage: StorageProbe,
    /// Absent when storage is unreachable.
    pub salon: Option<SalonSnapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StorageProbe {
    pub reachable: bool,
    pub latency_ms: u64,
    pub open_connections: u32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SalonSnapshot {
    pub active_services: i64,
    pub pending_bookings: i64,
}

#[derive(Clone)]
struct ProbeState {
    pool: SqlitePool,
    started_at: DateTime<Utc>,
}

pub struct HealthService {
    pub router: Router,
}

impl HealthService {
    pub fn new(pool: SqlitePool) -> Self {
        let state = ProbeState {
            pool,
            started_at: Utc::now(),
        };

        let router = Router::new()
            .route("/health", get(report))
            .route("/health/ready", get(readiness))
            .route("/health/live", get(|| async { Json("alive") }))
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        Self { router }
    }
}

async fn snapshot(pool: &SqlitePool) -> Result<SalonSnapshot, sqlx::Error> {
    let (active_services,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM services WHERE is_active = TRUE AND deleted_at IS NULL")
            .fetch_one(pool)
            .await?;
    let (pending_bookings,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM bookings WHERE status = 'pending'")
            .fetch_one(pool)
            .await?;
    Ok(SalonSnapshot {
        active_services,
        pending_bookings,
    })
}

async fn report(State(state): State<ProbeState>) -> (StatusCode, Json<HealthReport>) {
    let start = Instant::now();
    let salon = match snapshot(&state.pool).await {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::warn!("Health probe could not read storage: {}", e);
            None
        }
    };
    let reachable = salon.is_some();

    let body = HealthReport {
        status: if reachable { "healthy" } else { "unhealthy" }.to_string(),
        checked_at: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: Utc::now().signed_duration_since(state.started_at).num_seconds(),
        storage: StorageProbe {
            reachable,
            latency_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            open_connections: state.pool.size(),
        },
        salon,
    };

    let code = if reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(body))
}

async fn readiness(State(state): State<ProbeState>) -> (StatusCode, Json<&'static str>) {
    match snapshot(&state.pool).await {
        Ok(s) if s.active_services > 0 => (StatusCode::OK, Json("ready")),
        Ok(_) => (StatusCode::SERVICE_UNAVAILABLE, Json("no bookable services")),
        Err(e) => {
            tracing::warn!("Readiness check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, Json("storage unavailable"))
        }
    }
}
