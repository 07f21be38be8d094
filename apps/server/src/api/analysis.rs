use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use quotecache_core::AnalysisCacheRecord;
use serde_json::Value;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

async fn get_analysis(
    Path(symbol): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<AnalysisCacheRecord>> {
    state
        .engine
        .get_analysis(&symbol)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

async fn put_analysis(
    Path(symbol): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(result): Json<Value>,
) -> ApiResult<Json<AnalysisCacheRecord>> {
    let stored = state.engine.put_analysis(&symbol, result).await?;
    Ok(Json(stored))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/analysis/{symbol}", get(get_analysis).put(put_analysis))
}
