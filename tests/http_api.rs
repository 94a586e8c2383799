use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::AUTHORIZATION},
};
use chrono::{Duration, TimeZone, Utc};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use weather_gateway::{
    Gateway, GatewayConfig, GatewayError, app,
    clock::ManualClock,
    history::HistoryStore,
    models::WeatherQuery,
    state::AppState,
    upstream::WeatherUpstream,
};

#[derive(Debug)]
struct FakeOpenWeather;

#[async_trait]
impl WeatherUpstream for FakeOpenWeather {
    async fn fetch(&self, _api_key: &str, query: &WeatherQuery) -> Result<Value, GatewayError> {
        let name = match &query.location {
            weather_gateway::models::Location::City(city) => city.clone(),
            weather_gateway::models::Location::Postal(_) => "Mountain View".to_string(),
        };
        Ok(json!({
            "coord": {"lon": -0.13, "lat": 51.51},
            "name": name,
            "sys": {"country": query.country},
            "main": {"temp": 1.0, "humidity": 90},
            "wind": {"speed": 1.5},
            "weather": [{"id": 801, "description": "few clouds"}],
            "cod": 200
        }))
    }
}

fn router_with(config: GatewayConfig) -> (Router, ManualClock) {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap());
    let gateway = Gateway::new(
        config,
        Arc::new(FakeOpenWeather),
        Arc::new(HistoryStore::temporary().unwrap()),
        Arc::new(clock.clone()),
    );
    (app(Arc::new(AppState::new(gateway))), clock)
}

fn open_config() -> GatewayConfig {
    GatewayConfig {
        api_key: Some("dummykey".to_string()),
        ..Default::default()
    }
}

async fn get(router: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
    }
    let res = router
        .clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn root_is_alive() {
    let (router, _) = router_with(open_config());
    let (status, body) = get(&router, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn weather_success_returns_contract_fields() {
    let (router, _) = router_with(open_config());
    let (status, body) = get(&router, "/weather?city=London&country=gb", None).await;

    assert_eq!(status, StatusCode::OK);
    for field in ["name", "sys", "main", "wind", "weather"] {
        assert!(body.get(field).is_some(), "missing {}", field);
    }
    assert!(body.get("coord").is_none());
    assert_eq!(body["name"], "London");
    assert_eq!(body["sys"]["country"], "GB");
}

#[tokio::test]
async fn missing_selector_is_bad_request() {
    let (router, _) = router_with(open_config());
    let (status, body) = get(&router, "/weather", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Provide either city or postal");
}

#[tokio::test]
async fn repeated_query_key_is_json_bad_request() {
    let (router, _) = router_with(open_config());
    let (status, body) = get(&router, "/weather?city=a&city=b", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].as_str().unwrap().contains("city"));
}

#[tokio::test]
async fn allow_list_requires_token() {
    let mut config = open_config();
    config.tokens = ["secret".to_string()].into_iter().collect();
    let (router, _) = router_with(config);

    let (status, body) = get(&router, "/weather?city=London&country=gb", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Unauthorized");

    let (status, _) = get(&router, "/weather?city=London&country=gb", Some("SECRET")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = get(&router, "/weather?city=London&country=gb", Some("secret")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn second_rapid_request_is_rate_limited() {
    let mut config = open_config();
    config.rate_limit = 1;
    let (router, clock) = router_with(config);

    let (first, _) = get(&router, "/weather?city=London&country=gb", None).await;
    let (second, body) = get(&router, "/weather?city=London&country=gb", None).await;
    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["detail"], "Rate limit exceeded.");

    clock.advance(Duration::seconds(61));
    let (third, _) = get(&router, "/weather?city=London&country=gb", None).await;
    assert_eq!(third, StatusCode::OK);
}

#[tokio::test]
async fn exhausted_daily_quota_names_the_limit() {
    let mut config = open_config();
    config.daily_limit = 2;
    let (router, _) = router_with(config);

    for _ in 0..2 {
        let (status, _) = get(&router, "/weather?postal=94040&country=us", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = get(&router, "/weather?postal=94040&country=us", None).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert!(body["detail"].as_str().unwrap().contains('2'));
}

#[tokio::test]
async fn missing_upstream_key_is_server_error() {
    let (router, _) = router_with(GatewayConfig::default());
    let (status, body) = get(&router, "/weather?city=London", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().contains("OPENWEATHER_API_KEY"));
}

#[tokio::test]
async fn history_lists_and_searches_lookups() {
    let (router, _) = router_with(open_config());
    get(&router, "/weather?city=London&country=gb", None).await;
    get(&router, "/weather?city=Tokyo&country=jp", None).await;

    let (status, body) = get(&router, "/history?limit=10", None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["city"], "Tokyo");
    assert_eq!(items[0]["description"], "few clouds");
    assert!(items[0].get("raw").is_none());

    let (status, body) = get(&router, "/history/search?q=lond", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let (status, _) = get(&router, "/history/search?q=%20", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn history_limit_is_clamped_not_rejected() {
    let (router, _) = router_with(open_config());
    get(&router, "/weather?city=London&country=gb", None).await;
    get(&router, "/weather?city=Tokyo&country=jp", None).await;

    let (status, body) = get(&router, "/history?limit=-5", None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["city"], "Tokyo");

    let (status, body) = get(&router, "/history/search?q=o&limit=0", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_history_limit_is_json_bad_request() {
    let (router, _) = router_with(open_config());

    let (status, body) = get(&router, "/history?limit=abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());

    let (status, body) = get(&router, "/history/search?q=rain&limit=ten", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn history_honours_allow_list() {
    let mut config = open_config();
    config.tokens = ["secret".to_string()].into_iter().collect();
    let (router, _) = router_with(config);

    let (status, _) = get(&router, "/history", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = get(&router, "/history", Some("secret")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn health_reports_daily_usage() {
    let (router, _) = router_with(open_config());
    get(&router, "/weather?city=London", None).await;

    let (status, body) = get(&router, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["daily_usage"]["count"], 1);
    assert_eq!(body["daily_usage"]["limit"], 1000);
}

#[tokio::test]
async fn health_reads_the_gateway_clock() {
    let (router, clock) = router_with(open_config());
    clock.advance(Duration::seconds(90));

    let (status, body) = get(&router, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timestamp"], "2024-06-01T12:01:30+00:00");
    assert_eq!(body["uptime_secs"], 90);

    // next UTC day: the stale counter reads as zero
    get(&router, "/weather?city=London", None).await;
    clock.set(Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 1).unwrap());
    let (_, body) = get(&router, "/health", None).await;
    assert_eq!(body["daily_usage"]["count"], 0);
    assert_eq!(body["daily_usage"]["date"], "2024-06-02");
}

#[tokio::test]
async fn metrics_are_exposed() {
    let (router, _) = router_with(open_config());
    get(&router, "/weather?city=London", None).await;

    let res = router
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("weather_gateway_requests_total"));
}
