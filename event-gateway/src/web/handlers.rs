//! HTTP endpoint handlers.
//!
//! The event endpoint:
//! 1. Validates the JSON body
//! 2. Verifies the HMAC signature over the raw bytes
//! 3. Publishes to Kafka and waits for the acknowledgment
//! 4. Maps the outcome to a status code

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::broker::{Connector, Event, EventPublisher, KafkaConnector};
use crate::web::signature::verify_signature;
use crate::Config;

/// Error body returned when the broker does not acknowledge an event.
pub const PUBLISH_FAILED: &str = "Failed to publish event to Kafka";

/// Shared application state.
pub struct AppState<C: Connector = KafkaConnector> {
    pub config: Arc<Config>,
    pub publisher: EventPublisher<C>,
}

impl<C: Connector> AppState<C> {
    pub fn new(config: Config, publisher: EventPublisher<C>) -> Self {
        Self {
            config: Arc::new(config),
            publisher,
        }
    }
}

impl<C: Connector> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            publisher: self.publisher.clone(),
        }
    }
}

/// Build the service router.
pub fn router<C: Connector>(state: AppState<C>) -> Router {
    Router::new()
        .route("/health", get(health::<C>))
        .route("/events", post(ingest_event::<C>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
///
/// Always 200: a disconnected publisher reconnects lazily on the next event,
/// so broker state is only logged.
pub async fn health<C: Connector>(State(state): State<AppState<C>>) -> Json<HealthResponse> {
    let kafka_connected = state.publisher.is_connected().await;
    debug!(kafka_connected, "health_check");
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Event Ingestion
// =============================================================================

/// Event endpoint response.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IngestResponse {
    fn accepted() -> (StatusCode, Json<Self>) {
        (
            StatusCode::ACCEPTED,
            Json(Self {
                status: Some("accepted"),
                error: None,
            }),
        )
    }

    fn error(code: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Self>) {
        (
            code,
            Json(Self {
                status: None,
                error: Some(message.into()),
            }),
        )
    }
}

/// Event ingestion endpoint.
///
/// Responds 400 for a missing or non-object body, 403 for a missing or
/// mismatched signature, 500 when Kafka cannot be reached or does not
/// acknowledge, and 202 once the event is acknowledged.
pub async fn ingest_event<C: Connector>(
    State(state): State<AppState<C>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<IngestResponse>) {
    let payload = match parse_payload(&body) {
        Ok(payload) => payload,
        Err(message) => {
            warn!(body_length = body.len(), reason = %message, "event_body_invalid");
            return IngestResponse::error(StatusCode::BAD_REQUEST, message);
        }
    };

    let header_name = state.config.signature_header.as_str();
    let signature = headers
        .get(header_name)
        .map(|v| String::from_utf8_lossy(v.as_bytes()));

    if let Err(e) = verify_signature(
        &body,
        state.config.hmac_secret.as_bytes(),
        signature.as_deref(),
    ) {
        warn!(header = header_name, error = %e, "event_signature_rejected");
        return IngestResponse::error(StatusCode::FORBIDDEN, format!("{header_name}: {e}"));
    }

    if let Err(e) = state.publisher.connect().await {
        error!(error = %e, "event_publisher_unavailable");
        return IngestResponse::error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
    }

    let topic = state.config.broker.topic();
    let event = Event::new(payload);

    match state.publisher.send(&event, Some(topic), None).await {
        Ok(true) => {
            info!(topic = %topic, body_length = body.len(), "event_accepted");
            IngestResponse::accepted()
        }
        Ok(false) => {
            error!(topic = %topic, "event_publish_failed");
            IngestResponse::error(StatusCode::INTERNAL_SERVER_ERROR, PUBLISH_FAILED)
        }
        Err(e) => {
            error!(topic = %topic, error = %e, "event_publish_error");
            IngestResponse::error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Parse the body as a non-empty JSON object.
fn parse_payload(body: &[u8]) -> Result<Map<String, Value>, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err("Request body required".to_string());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) if !map.is_empty() => Ok(map),
        Ok(Value::Object(_)) => Err("Request body required".to_string()),
        Ok(_) => Err("Request body must be a JSON object".to_string()),
        Err(e) => Err(format!("Invalid JSON body: {e}")),
    }
}
