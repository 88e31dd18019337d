#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use api_lib::adapters::{InMemorySlot, SandboxPaymentAdapter};
use api_lib::config::{Config, TimerConfig};
use api_lib::web::{self, state::AppState};
use aura_core::domain::{
    CatalogItem, ItemStatus, Offering, PaymentReceipt, PaymentRequest, Review, ReviewStatus,
};
use aura_core::{
    CatalogService, DurableSlot, PaymentService, PortError, PortResult, ProfileStore,
    SessionFacade, SystemClock,
};

pub const ADMIN_TOKEN: &str = "operator-secret";

/// Build a test `Config` with safe defaults. No variable is read from the environment.
pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        log_level: tracing::Level::INFO,
        database_url: None,
        data_dir: PathBuf::from("./unused"),
        catalog_url: None,
        catalog_path: PathBuf::from("./unused.json"),
        payment_api_url: "http://127.0.0.1:9/transactions".to_string(),
        payment_api_token: None,
        admin_token: Some(ADMIN_TOKEN.to_string()),
        cors_origin: "http://localhost:3000".to_string(),
        timers: TimerConfig::default(),
    }
}

pub fn offering(id: u32, minutes: u32, price: f64) -> Offering {
    Offering {
        id,
        duration_minutes: minutes,
        price,
        product_hash: format!("prod-{}", id),
        offer_hash: format!("offer-{}", id),
    }
}

pub fn review(id: &str, rating: u8, status: ReviewStatus, hidden: bool) -> Review {
    Review {
        id: id.to_string(),
        author: "Leo".to_string(),
        rating,
        comment: "Lovely".to_string(),
        status,
        avatar: None,
        response: None,
        hidden,
    }
}

/// Two items; `aria` carries one public, one pending and one hidden review.
pub fn sample_catalog() -> Vec<CatalogItem> {
    let aria = CatalogItem {
        id: "aria".to_string(),
        name: "Aria".to_string(),
        age: 24,
        bio: "Hi".to_string(),
        profile_image: "aria.jpg".to_string(),
        gallery_images: vec!["aria-1.jpg".to_string()],
        video_url: "aria.mp4".to_string(),
        status: ItemStatus::Online,
        offerings: vec![offering(1, 5, 19.9), offering(2, 15, 49.9)],
        reviews: vec![
            review("review-0000000000001-a", 4, ReviewStatus::Approved, false),
            review("review-0000000000002-a", 1, ReviewStatus::Pending, false),
            review("review-0000000000003-a", 1, ReviewStatus::Approved, true),
        ],
    };
    let bea = CatalogItem {
        id: "bea".to_string(),
        name: "Bea".to_string(),
        status: ItemStatus::Offline,
        offerings: vec![offering(3, 10, 29.9)],
        reviews: Vec::new(),
        ..aria.clone()
    };
    vec![aria, bea]
}

pub struct StaticCatalog(pub Vec<CatalogItem>);

#[async_trait]
impl CatalogService for StaticCatalog {
    async fn list_items(&self) -> PortResult<Vec<CatalogItem>> {
        Ok(self.0.clone())
    }
}

/// A gateway that refuses every charge with a fixed reason.
pub struct DecliningPayments(pub String);

#[async_trait]
impl PaymentService for DecliningPayments {
    async fn charge(&self, _request: &PaymentRequest) -> PortResult<PaymentReceipt> {
        Err(PortError::Rejected(self.0.clone()))
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
    pub slot: Arc<InMemorySlot>,
}

pub async fn build_test_app_with(config: Config, payments: Arc<dyn PaymentService>) -> TestApp {
    let slot = Arc::new(InMemorySlot::new());
    let durable: Arc<dyn DurableSlot> = slot.clone();
    let session = SessionFacade::start(
        ProfileStore::new(durable),
        &StaticCatalog(sample_catalog()),
        payments,
        Arc::new(SystemClock),
    )
    .await
    .unwrap();
    let state = AppState::new(session, Arc::new(config));
    TestApp {
        router: web::router(state.clone()),
        state,
        slot,
    }
}

pub async fn build_test_app() -> TestApp {
    build_test_app_with(test_config(), Arc::new(SandboxPaymentAdapter::new())).await
}

impl TestApp {
    /// Sends one request through the router and returns the status and body.
    pub async fn call(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        self.call_with_headers(method, uri, body, &[]).await
    }

    pub async fn call_with_headers(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = match body {
            Some(json) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, bytes.to_vec())
    }

    pub async fn json(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = self.call(method, uri, body).await;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, json)
    }

    pub async fn admin(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = self
            .call_with_headers(method, uri, body, &[("x-admin-token", ADMIN_TOKEN)])
            .await;
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn register(&self, name: &str, email: &str) {
        let (status, _) = self
            .json(
                "POST",
                "/auth/register",
                Some(serde_json::json!({ "name": name, "email": email })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    pub async fn messages(&self) -> Vec<String> {
        let (_, body) = self.json("GET", "/notifications", None).await;
        body["notifications"]
            .as_array()
            .map(|list| {
                list.iter()
                    .filter_map(|n| n["message"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

pub fn short_toasts(mut config: Config) -> Config {
    config.timers.toast_visible = Duration::from_millis(40);
    config.timers.toast_exit = Duration::from_millis(10);
    config
}
