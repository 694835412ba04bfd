use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use ratefeed_core::{CoinGeckoPlan, Instrument, ProviderCredentials, ProviderError, ProviderId};
use ratefeed_price_feed::feeds::{BinanceProvider, CoinGeckoProvider, CoinbaseProvider, KuCoinProvider};
use ratefeed_price_feed::{Clock, HttpFetcher, RateProvider};

const NOW: i64 = 1_700_000_123;

struct FixedClock;

impl Clock for FixedClock {
    fn now_unix(&self) -> i64 {
        NOW
    }
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn http(timeout: Duration) -> HttpFetcher {
    HttpFetcher::new(timeout, Arc::new(FixedClock)).unwrap()
}

#[tokio::test]
async fn coinbase_spot_price() {
    let app = Router::new().route(
        "/v2/prices/:pair/spot",
        get(|Path(pair): Path<String>| async move {
            assert_eq!(pair, "BTC-USD");
            Json(json!({ "data": { "amount": "67010.50", "base": "BTC", "currency": "USD" } }))
        }),
    );
    let base = serve(app).await;

    let provider = CoinbaseProvider::new(http(Duration::from_secs(5))).with_base_url(base);
    let snapshot = provider.fetch(Instrument::Btc).await.unwrap();

    assert_eq!(snapshot.provider(), ProviderId::Coinbase);
    assert_eq!(snapshot.scaled_price(), 6701050);
    assert_eq!(snapshot.fetched_at(), NOW);
}

#[tokio::test]
async fn coingecko_sends_demo_key_and_requested_id() {
    let app = Router::new().route(
        "/simple/price",
        get(|Query(params): Query<HashMap<String, String>>, headers: HeaderMap| async move {
            if headers.get("x-cg-demo-api-key").and_then(|v| v.to_str().ok()) != Some("demo-key") {
                return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "missing key" })));
            }
            let id = params.get("ids").cloned().unwrap_or_default();
            assert_eq!(params.get("vs_currencies").map(String::as_str), Some("usd"));
            let mut body = serde_json::Map::new();
            body.insert(id, json!({ "usd": 3456.789 }));
            (StatusCode::OK, Json(Value::Object(body)))
        }),
    );
    let base = serve(app).await;

    let credentials = ProviderCredentials {
        coingecko_api_key: Some("demo-key".into()),
        coingecko_plan: CoinGeckoPlan::Demo,
    };
    let provider = CoinGeckoProvider::new(http(Duration::from_secs(5)), &credentials).with_base_url(base);

    let snapshot = provider.fetch(Instrument::Eth).await.unwrap();
    assert_eq!(snapshot.instrument(), Instrument::Eth);
    assert_eq!(snapshot.scaled_price(), 345679);
}

#[tokio::test]
async fn kucoin_error_code_is_unavailable() {
    let app = Router::new().route(
        "/api/v1/market/orderbook/level1",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            assert_eq!(params.get("symbol").map(String::as_str), Some("BTC-USDT"));
            Json(json!({ "code": "400100", "msg": "symbol suspended", "data": null }))
        }),
    );
    let base = serve(app).await;

    let provider = KuCoinProvider::new(http(Duration::from_secs(5))).with_base_url(base);
    let err = provider.fetch(Instrument::Btc).await.unwrap_err();
    assert!(matches!(err, ProviderError::UpstreamUnavailable { provider: ProviderId::KuCoin, .. }));
}

#[tokio::test]
async fn binance_non_success_status_is_unavailable() {
    let app = Router::new().route(
        "/api/v3/ticker/price",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
    );
    let base = serve(app).await;

    let provider = BinanceProvider::new(http(Duration::from_secs(5))).with_base_url(base);
    let err = provider.fetch(Instrument::Eth).await.unwrap_err();
    assert!(matches!(err, ProviderError::UpstreamUnavailable { .. }));
}

#[tokio::test]
async fn binance_non_numeric_price_is_malformed() {
    let app = Router::new().route(
        "/api/v3/ticker/price",
        get(|| async { Json(json!({ "symbol": "ETHUSDT", "price": "abc" })) }),
    );
    let base = serve(app).await;

    let provider = BinanceProvider::new(http(Duration::from_secs(5))).with_base_url(base);
    let err = provider.fetch(Instrument::Eth).await.unwrap_err();
    assert!(matches!(err, ProviderError::MalformedResponse { .. }));
}

#[tokio::test]
async fn invalid_json_body_is_malformed() {
    let app = Router::new().route("/v2/prices/:pair/spot", get(|| async { "<html>oops</html>" }));
    let base = serve(app).await;

    let provider = CoinbaseProvider::new(http(Duration::from_secs(5))).with_base_url(base);
    let err = provider.fetch(Instrument::Btc).await.unwrap_err();
    assert!(matches!(err, ProviderError::MalformedResponse { .. }));
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let app = Router::new().route(
        "/v2/prices/:pair/spot",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(Value::Null)
        }),
    );
    let base = serve(app).await;

    let provider = CoinbaseProvider::new(http(Duration::from_millis(200))).with_base_url(base);
    let err = provider.fetch(Instrument::Btc).await.unwrap_err();
    match err {
        ProviderError::UpstreamUnavailable { message, .. } => assert!(message.contains("timed out")),
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn unreachable_upstream_is_unavailable() {
    // bind then drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let provider = KuCoinProvider::new(http(Duration::from_secs(2))).with_base_url(format!("http://{}", addr));
    let err = provider.fetch(Instrument::Btc).await.unwrap_err();
    assert!(matches!(err, ProviderError::UpstreamUnavailable { .. }));
}
