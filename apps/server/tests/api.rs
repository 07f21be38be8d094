use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use quotecache_core::{EngineConfig, HotSet, LadderConfig};
use quotecache_market_data::{
    FetchScope, MarketDataError, PriceRecord, PriceSource, Symbol, ThrottleConfig,
};
use quotecache_server::{api::app_router, build_state_with_source, config::Config};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

/// Answers instantly, except that symbols starting with "DOWN" fail and those
/// starting with "HANG" never answer.
struct StubSource;

#[async_trait]
impl PriceSource for StubSource {
    fn id(&self) -> &'static str {
        "STUB"
    }

    async fn fetch(
        &self,
        symbol: &Symbol,
        scope: FetchScope,
    ) -> Result<PriceRecord, MarketDataError> {
        if symbol.as_str().starts_with("HANG") {
            return std::future::pending().await;
        }
        if symbol.as_str().starts_with("DOWN") {
            return Err(MarketDataError::provider("STUB", "upstream unavailable"));
        }
        let currency = symbol.default_currency();
        let mut record = PriceRecord::new(symbol.as_str(), dec!(101.25), currency)
            .with_previous_close(dec!(100));
        if scope == FetchScope::Full {
            record.volume = Some(dec!(12345));
        }
        Ok(record)
    }
}

async fn build_test_router() -> (Router, TempDir) {
    build_router_with(Duration::from_secs(30), LadderConfig::default()).await
}

async fn build_router_with(request_timeout: Duration, ladder: LadderConfig) -> (Router, TempDir) {
    let tmp = tempdir().unwrap();
    let engine = EngineConfig {
        hot_set: HotSet::new(&["AAPL", "0700.HK", "DOWNX"]).unwrap(),
        ladder,
        ..EngineConfig::default()
    };
    let config = Config {
        listen_addr: "127.0.0.1:0".parse().unwrap(),
        db_path: tmp.path().join("test.db").to_str().unwrap().to_string(),
        cors_allow: vec!["*".to_string()],
        request_timeout,
        engine,
        throttle: ThrottleConfig::default(),
    };
    let state = build_state_with_source(&config, Arc::new(StubSource))
        .await
        .unwrap();
    (app_router(state, &config), tmp)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn healthz_responds() {
    let (app, _tmp) = build_test_router().await;
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn price_is_fetched_then_served_from_cache() {
    let (app, _tmp) = build_test_router().await;

    let (status, first) = send(&app, Method::GET, "/api/v1/price/aapl", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["symbol"], "AAPL");
    assert_eq!(first["served_from"], "fresh");
    assert_eq!(first["stale"], false);
    assert_eq!(first["volume"], 12345.0);

    let (status, second) = send(&app, Method::GET, "/api/v1/price/AAPL", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["served_from"], "cache");
    assert_eq!(second["price"], first["price"]);
}

#[tokio::test]
async fn invalid_symbol_is_a_bad_request() {
    let (app, _tmp) = build_test_router().await;
    let (status, body) = send(&app, Method::GET, "/api/v1/price/BADSYM", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn failing_source_without_cache_is_bad_gateway() {
    let (app, _tmp) = build_test_router().await;
    let (status, body) = send(&app, Method::GET, "/api/v1/price/DOWNX", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["message"].as_str().unwrap().contains("DOWNX"));
}

#[tokio::test]
async fn zero_timeout_is_rejected() {
    let (app, _tmp) = build_test_router().await;
    let (status, _) = send(&app, Method::GET, "/api/v1/price/AAPL?timeout=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn timeout_override_must_stay_below_request_timeout() {
    let ladder = LadderConfig {
        fast: Duration::from_millis(100),
        cache: Duration::from_millis(200),
        total: Duration::from_millis(400),
    };
    let (app, _tmp) = build_router_with(Duration::from_secs(1), ladder).await;

    let (status, body) = send(&app, Method::GET, "/api/v1/price/HANGX?timeout=3", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);

    let uri = "/api/v1/prices?symbols=HANGX&timeout=1";
    let (status, body) = send(&app, Method::GET, uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 400);

    // Within the limit the ladder answers with its own timeout error.
    let uri = "/api/v1/price/HANGX?timeout=0.5";
    let (status, body) = send(&app, Method::GET, uri, None).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["code"], 504);
    assert!(body["message"].as_str().unwrap().contains("HANGX"));
}

#[tokio::test]
async fn batch_reports_each_symbol() {
    let (app, _tmp) = build_test_router().await;
    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/prices?symbols=AAPL,700.hk,BADSYM,DOWNX&timeout=5",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 4);
    let results = &body["results"];
    assert_eq!(results["AAPL"]["served_from"], "fresh");
    assert_eq!(results["0700.HK"]["currency"], "HKD");
    assert_eq!(results["BADSYM"]["error"]["code"], 400);
    assert_eq!(results["DOWNX"]["error"]["code"], 502);
}

#[tokio::test]
async fn cache_endpoints_report_state() {
    let (app, _tmp) = build_test_router().await;

    let (status, report) = send(&app, Method::POST, "/api/v1/cache/preload", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["preloaded_count"], 2);
    assert_eq!(report["failures"], json!(["DOWNX"]));

    let (status, cache) = send(&app, Method::GET, "/api/v1/cache/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cache["valid_count"], 2);
    assert_eq!(cache["entries"][0]["symbol"], "0700.HK");
    assert_eq!(cache["entries"][1]["symbol"], "AAPL");
    assert_eq!(cache["hot_set"], json!(["AAPL", "0700.HK", "DOWNX"]));

    let (status, cleared) = send(&app, Method::POST, "/api/v1/cache/clear", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["removed_count"], 0);
}

#[tokio::test]
async fn analysis_round_trip() {
    let (app, _tmp) = build_test_router().await;

    let (status, _) = send(&app, Method::GET, "/api/v1/analysis/NVDA", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let doc = json!({"signal": "hold", "confidence": 0.6});
    let (status, stored) =
        send(&app, Method::PUT, "/api/v1/analysis/nvda", Some(doc.clone())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stored["symbol"], "NVDA");

    let (status, fetched) = send(&app, Method::GET, "/api/v1/analysis/NVDA", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["result"], doc);
}
