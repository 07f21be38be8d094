use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use quotecache_core::{CacheStatus, ClearReport, PreloadReport};

use crate::{error::ApiResult, main_lib::AppState};

async fn cache_status(State(state): State<Arc<AppState>>) -> ApiResult<Json<CacheStatus>> {
    let status = state.engine.cache_status().await?;
    Ok(Json(status))
}

async fn preload(State(state): State<Arc<AppState>>) -> Json<PreloadReport> {
    Json(state.engine.preload_hot_set().await)
}

async fn clear_expired(State(state): State<Arc<AppState>>) -> ApiResult<Json<ClearReport>> {
    let report = state.engine.clear_expired().await?;
    Ok(Json(report))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/cache/status", get(cache_status))
        .route("/cache/preload", post(preload))
        .route("/cache/clear", post(clear_expired))
}
