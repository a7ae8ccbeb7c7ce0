use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use tower::ServiceExt;

use event_gateway::broker::{Connector, Delivery, DeliveryError, OutboundRecord, ProducerClient};
use event_gateway::web::router;
use event_gateway::{AppState, BrokerConfig, Config, Error, EventPublisher, Result};

pub const SECRET: &str = "test-webhook-secret";

/// Broker behaviour scripted by a test.
#[derive(Default)]
pub struct BrokerScript {
    pub unreachable: bool,
    pub rejections: VecDeque<bool>,
    pub delivered: Vec<(String, serde_json::Value)>,
    pub connects: usize,
}

/// Connector for an in-memory broker shared with the test.
#[derive(Clone, Default)]
pub struct TestConnector {
    pub script: Arc<Mutex<BrokerScript>>,
}

impl TestConnector {
    pub fn unreachable() -> Self {
        let connector = Self::default();
        connector.script.lock().unwrap().unreachable = true;
        connector
    }

    pub fn rejecting() -> Self {
        let connector = Self::default();
        connector.script.lock().unwrap().rejections.push_back(true);
        connector
    }

    pub fn delivered(&self) -> Vec<(String, serde_json::Value)> {
        self.script.lock().unwrap().delivered.clone()
    }

    pub fn connects(&self) -> usize {
        self.script.lock().unwrap().connects
    }
}

pub struct TestClient {
    script: Arc<Mutex<BrokerScript>>,
}

#[async_trait]
impl Connector for TestConnector {
    type Client = TestClient;

    async fn connect(&self, config: &BrokerConfig) -> Result<TestClient> {
        let mut script = self.script.lock().unwrap();
        if script.unreachable {
            return Err(Error::Connection(format!(
                "failed to reach Kafka at {}",
                config.bootstrap_servers()
            )));
        }
        script.connects += 1;
        Ok(TestClient {
            script: Arc::clone(&self.script),
        })
    }
}

#[async_trait]
impl ProducerClient for TestClient {
    async fn deliver(
        &self,
        record: OutboundRecord<'_>,
    ) -> std::result::Result<Delivery, DeliveryError> {
        let mut script = self.script.lock().unwrap();
        if script.rejections.pop_front().unwrap_or(false) {
            return Err(DeliveryError::new("Broker: Not enough in-sync replicas"));
        }
        let payload = serde_json::from_slice(record.payload).unwrap();
        script.delivered.push((record.topic.to_string(), payload));
        Ok(Delivery {
            partition: 0,
            offset: script.delivered.len() as i64 - 1,
        })
    }

    async fn flush(&self, _timeout: Duration) -> std::result::Result<(), DeliveryError> {
        Ok(())
    }
}

pub fn test_config() -> Config {
    Config::from_vars(|name| match name {
        "GITHUB_HMAC_SECRET" => Some(SECRET.to_string()),
        "KAFKA_TOPIC" => Some("test-events".to_string()),
        _ => None,
    })
    .unwrap()
}

pub fn make_app(connector: TestConnector) -> (axum::Router, EventPublisher<TestConnector>) {
    let config = test_config();
    let publisher = EventPublisher::with_connector(config.broker.clone(), connector);
    let app = router(AppState::new(config, publisher.clone()));
    (app, publisher)
}

pub async fn post_event(app: axum::Router, body: &str, signature: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/events")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("x-hub-signature-256", signature);
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();
    app.oneshot(req).await.unwrap()
}

pub async fn read_json(resp: Response<Body>) -> (StatusCode, serde_json::Value) {
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}
