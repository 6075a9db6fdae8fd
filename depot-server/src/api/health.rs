//! Health and build metadata endpoints

use axum::extract::State;
use serde::Serialize;
use shared::error::{ApiResponse, AppResult};

use crate::error::ServiceError;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthBody {
    pub locations_count: i64,
}

/// Datastore reachability check
pub async fn health_check(State(state): State<AppState>) -> AppResult<ApiResponse<HealthBody>> {
    let locations_count = state
        .store
        .count_locations()
        .await
        .map_err(ServiceError::from)?;
    Ok(ApiResponse::success(HealthBody { locations_count }))
}

#[derive(Serialize)]
pub struct MetaBody {
    pub version: &'static str,
    pub commit: &'static str,
}

pub async fn meta() -> ApiResponse<MetaBody> {
    ApiResponse::success(MetaBody {
        version: env!("CARGO_PKG_VERSION"),
        commit: option_env!("GIT_HASH").unwrap_or("dev"),
    })
}
