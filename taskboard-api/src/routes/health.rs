/// Health check endpoint
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected",
///   "access_mode": "organization",
///   "pool": { "active_connections": 1, "idle_connections": 4, "total_connections": 5 },
///   "migrations": { "applied_migrations": 1, "latest_version": 20250101000000, ... }
/// }
/// ```
///
/// Always answers `200`; a lost database shows up as `"degraded"`.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::Serialize;
use taskboard_shared::db::{
    migrations::{get_migration_status, MigrationStatus},
    pool::{get_pool_stats, health_check as ping, PoolStats},
};
use tracing::warn;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,

    pub version: String,

    /// `connected` or `disconnected`
    pub database: String,

    pub access_mode: String,

    pub pool: PoolStats,

    /// Absent when the database is unreachable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migrations: Option<MigrationStatus>,
}

pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let connected = match ping(&state.db).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Health check could not reach the database");
            false
        }
    };

    let migrations = if connected {
        get_migration_status(&state.db)
            .await
            .map_err(|e| warn!(error = %e, "Failed to read migration status"))
            .ok()
    } else {
        None
    };

    Ok(Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
        access_mode: state.config.access_mode.as_str().to_string(),
        pool: get_pool_stats(&state.db),
        migrations,
    }))
}
