use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use ratefeed_core::{Instrument, ProviderId};
use ratefeed_price_feed::{ManualClock, MockProvider, RateAggregator, RateCache, RateProvider, TTL_SECS};
use ratefeed_server::{HttpServerBuilder, RatesService};

const START: i64 = 1_700_000_000;

struct TestApp {
    clock: Arc<ManualClock>,
    coingecko: Arc<MockProvider>,
    coinbase: Arc<MockProvider>,
    kucoin: Arc<MockProvider>,
    router: Router,
}

fn test_app() -> TestApp {
    let clock = Arc::new(ManualClock::new(START));
    let coingecko = Arc::new(
        MockProvider::new(ProviderId::CoinGecko, clock.clone())
            .with_price(Instrument::Btc, 67000.00)
            .with_price(Instrument::Eth, 3500.10)
            .with_delay(Duration::from_millis(20)),
    );
    let coinbase = Arc::new(
        MockProvider::new(ProviderId::Coinbase, clock.clone())
            .with_price(Instrument::Btc, 67010.50)
            .with_price(Instrument::Eth, 3501.00),
    );
    let kucoin = Arc::new(
        MockProvider::new(ProviderId::KuCoin, clock.clone())
            .with_price(Instrument::Btc, 66999.99)
            .with_price(Instrument::Eth, 3500.00),
    );

    let providers: Vec<Arc<dyn RateProvider>> = vec![
        coingecko.clone() as Arc<dyn RateProvider>,
        coinbase.clone() as Arc<dyn RateProvider>,
        kucoin.clone() as Arc<dyn RateProvider>,
    ];
    let cache = Arc::new(RateCache::new(clock.clone()));
    let service = RatesService::new(RateAggregator::new(providers, cache));
    let router = HttpServerBuilder::new().cors(false).build(service).router();

    TestApp {
        clock,
        coingecko,
        coinbase,
        kucoin,
        router,
    }
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn btc_returns_all_providers_in_order() {
    let app = test_app();

    let (status, body) = get(&app.router, "/btc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!([
            { "dex": "CoinGecko", "price": 6700000, "timestamp": START },
            { "dex": "Coinbase", "price": 6701050, "timestamp": START },
            { "dex": "KuCoin", "price": 6699999, "timestamp": START },
        ])
    );
}

#[tokio::test]
async fn eth_uses_its_own_cache_entries() {
    let app = test_app();

    get(&app.router, "/btc").await;
    let (status, body) = get(&app.router, "/eth").await;

    assert_eq!(status, StatusCode::OK);
    let prices: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["price"].as_i64().unwrap())
        .collect();
    assert_eq!(prices, vec![350010, 350100, 350000]);
    assert_eq!(app.kucoin.calls(), 2);
}

#[tokio::test]
async fn repeated_requests_within_ttl_hit_the_cache() {
    let app = test_app();

    get(&app.router, "/btc").await;
    app.clock.advance(TTL_SECS - 1);
    let (status, _) = get(&app.router, "/btc").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.coingecko.calls(), 1);
    assert_eq!(app.coinbase.calls(), 1);
    assert_eq!(app.kucoin.calls(), 1);

    app.clock.advance(1);
    get(&app.router, "/btc").await;
    assert_eq!(app.coingecko.calls(), 2);
}

#[tokio::test]
async fn one_failing_provider_fails_the_request_without_negative_caching() {
    let app = test_app();
    app.coinbase.set_timeout(Instrument::Btc);

    let (status, body) = get(&app.router, "/btc").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, serde_json::json!({ "error": "Failed to fetch BTC rates" }));

    // still inside the TTL: Coinbase is tried again, the others come from cache
    let (status, _) = get(&app.router, "/btc").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.coinbase.calls(), 2);
    assert_eq!(app.coingecko.calls(), 1);
    assert_eq!(app.kucoin.calls(), 1);
}

#[tokio::test]
async fn index_describes_service() {
    let app = test_app();

    let (status, body) = get(&app.router, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "ratefeed");
    assert_eq!(body["providers"], serde_json::json!(["CoinGecko", "Coinbase", "KuCoin"]));
    // static: no upstream calls
    assert_eq!(app.coingecko.calls(), 0);
}

#[tokio::test]
async fn health_reports_cache_stats() {
    let app = test_app();
    get(&app.router, "/btc").await;
    get(&app.router, "/btc").await;

    let (status, body) = get(&app.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["cache"]["entries"], 3);
    assert_eq!(body["cache"]["misses"], 3);
    assert_eq!(body["cache"]["hits"], 3);
}

#[tokio::test]
async fn slow_upstream_past_request_deadline_is_generic_500() {
    let clock = Arc::new(ManualClock::new(START));
    let fast = Arc::new(MockProvider::new(ProviderId::Coinbase, clock.clone()).with_price(Instrument::Btc, 67010.50));
    let hung = Arc::new(
        MockProvider::new(ProviderId::KuCoin, clock.clone())
            .with_price(Instrument::Btc, 66999.99)
            .with_delay(Duration::from_millis(300)),
    );
    let providers: Vec<Arc<dyn RateProvider>> = vec![
        fast.clone() as Arc<dyn RateProvider>,
        hung.clone() as Arc<dyn RateProvider>,
    ];
    let service = RatesService::new(RateAggregator::new(providers, Arc::new(RateCache::new(clock))));
    let router = HttpServerBuilder::new()
        .cors(false)
        .request_timeout(Duration::from_millis(50))
        .build(service)
        .router();

    let (status, body) = get(&router, "/btc").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, serde_json::json!({ "error": "Failed to fetch BTC rates" }));
    assert_eq!(hung.calls(), 1);
}
