//! Shared harness for the HTTP integration tests.
#![allow(dead_code)]

use std::net::IpAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use glimpse_core::config::Config;
use glimpse_duckdb::DuckDbBackend;
use glimpse_server::app::build_app;
use glimpse_server::ingest::geo::{GeoError, GeoLocation, GeoResolver};
use glimpse_server::state::AppState;

pub const CHROME_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
    AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";

/// Address the geo double maps to the United Kingdom. Every other parseable
/// address maps to Germany.
pub const UK_IP: &str = "81.2.69.160";
pub const DE_IP: &str = "89.160.20.112";

pub struct FixedGeo;

impl GeoResolver for FixedGeo {
    fn resolve(&self, ip: &str) -> Result<GeoLocation, GeoError> {
        ip.parse::<IpAddr>()
            .map_err(|_| GeoError::InvalidAddress(ip.to_string()))?;
        let country = if ip == UK_IP {
            "United Kingdom"
        } else {
            "Germany"
        };
        Ok(GeoLocation {
            country: country.to_string(),
            city: None,
            latitude: None,
            longitude: None,
        })
    }
}

pub fn test_config() -> Config {
    Config {
        port: 0,
        data_dir: "/tmp/glimpse-test".to_string(),
        geoip_path: "/nonexistent/GeoLite2-City.mmdb".to_string(),
        duckdb_memory_limit: "1GB".to_string(),
        token_secret: None,
        cors_origins: vec![],
    }
}

pub fn test_state() -> Arc<AppState> {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    Arc::new(AppState::new(
        db,
        test_config(),
        Arc::new(FixedGeo),
        "integration-secret",
    ))
}

pub fn app(state: &Arc<AppState>) -> Router {
    build_app(Arc::clone(state))
}

/// Upsert a user and return `(user_id, bearer token)`.
pub async fn sign_in(state: &Arc<AppState>, email: &str) -> (Uuid, String) {
    let user_id = state.store.upsert_user(email).await.expect("upsert user");
    let token = state.tokens.issue(user_id).expect("issue token");
    (user_id, token)
}

pub async fn send(router: Router, request: Request<Body>) -> Response<Body> {
    router.oneshot(request).await.expect("request")
}

pub fn authed(method: &str, uri: &str, token: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"));
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .expect("build request"),
        None => builder.body(Body::empty()).expect("build request"),
    }
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("parse JSON")
}

/// Create an app over HTTP and return its tracking id.
pub async fn create_app(state: &Arc<AppState>, token: &str, name: &str) -> String {
    let response = send(
        app(state),
        authed("POST", "/apps", token, Some(serde_json::json!({ "name": name }))),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    let json = json_body(response).await;
    json["data"]["trackingID"]
        .as_str()
        .expect("trackingID")
        .to_string()
}

/// Base64 beacon, percent-encoded for use in a query string.
pub fn beacon(payload: &Value) -> String {
    STANDARD
        .encode(payload.to_string())
        .replace('+', "%2B")
        .replace('/', "%2F")
        .replace('=', "%3D")
}

pub fn pageview(tracking_id: &str, visitor: &str, url: &str, referrer: &str, ua: &str) -> Value {
    serde_json::json!({
        "tracking": {
            "visitorID": visitor,
            "trackingID": tracking_id,
            "url": url,
            "referrer": referrer,
            "ua": ua,
        },
        "type": "pageview",
    })
}

pub fn track_request(payload: &Value, ip: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(format!("/analytics/track?data={}", beacon(payload)))
        .header("x-forwarded-for", ip)
        .body(Body::empty())
        .expect("build request")
}

/// Send a beacon and assert it was accepted.
pub async fn track(state: &Arc<AppState>, payload: &Value, ip: &str) {
    let response = send(app(state), track_request(payload, ip)).await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
}
