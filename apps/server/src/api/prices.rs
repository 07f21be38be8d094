use std::{collections::BTreeMap, sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use quotecache_core::PriceResponse;
use serde::{Deserialize, Serialize};

use crate::{
    error::{ApiError, ApiResult, ErrorBody},
    main_lib::AppState,
};

#[derive(Deserialize)]
struct TimeoutQuery {
    /// Seconds; replaces the ladder ceiling for this request.
    timeout: Option<f64>,
}

#[derive(Deserialize)]
struct PricesQuery {
    symbols: String,
    timeout: Option<f64>,
}

/// One entry of a batch answer: the price, or why there is none.
#[derive(Serialize)]
#[serde(untagged)]
enum PriceEntry {
    Ok(PriceResponse),
    Err { error: ErrorBody },
}

#[derive(Serialize)]
struct PricesResponse {
    results: BTreeMap<String, PriceEntry>,
    count: usize,
}

/// Validate a `timeout` override. It must be positive and shorter than the
/// server's request timeout, or the ladder's own timeout answer never arrives.
fn parse_timeout(timeout: Option<f64>, limit: Duration) -> ApiResult<Option<Duration>> {
    timeout
        .map(|secs| {
            let timeout = Duration::try_from_secs_f64(secs)
                .ok()
                .filter(|d| !d.is_zero())
                .ok_or_else(|| ApiError::BadRequest(format!("Invalid timeout: {}", secs)))?;
            if timeout >= limit {
                return Err(ApiError::BadRequest(format!(
                    "Timeout {}s must be below the request timeout of {}s",
                    secs,
                    limit.as_secs_f64()
                )));
            }
            Ok(timeout)
        })
        .transpose()
}

async fn get_price(
    Path(symbol): Path<String>,
    Query(q): Query<TimeoutQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<PriceResponse>> {
    let timeout = parse_timeout(q.timeout, state.request_timeout)?;
    let price = state.engine.get_price(&symbol, timeout).await?;
    Ok(Json(price))
}

async fn get_prices(
    Query(q): Query<PricesQuery>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<PricesResponse>> {
    let timeout = parse_timeout(q.timeout, state.request_timeout)?;
    let symbols: Vec<&str> = q
        .symbols
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if symbols.is_empty() {
        return Err(ApiError::BadRequest("No symbols given".to_string()));
    }

    let results: BTreeMap<String, PriceEntry> = state
        .engine
        .get_prices(&symbols, timeout)
        .await?
        .into_iter()
        .map(|(symbol, result)| {
            let entry = match result {
                Ok(price) => PriceEntry::Ok(price),
                Err(err) => PriceEntry::Err {
                    error: ErrorBody::from_core(&err),
                },
            };
            (symbol, entry)
        })
        .collect();

    Ok(Json(PricesResponse {
        count: results.len(),
        results,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/price/{symbol}", get(get_price))
        .route("/prices", get(get_prices))
}
