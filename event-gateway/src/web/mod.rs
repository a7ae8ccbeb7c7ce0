//! Web server module for ingesting signed events.
//!
//! This module provides a small axum surface that:
//! - Exposes a liveness endpoint
//! - Verifies the HMAC signature of each posted event
//! - Publishes the event to Kafka and waits for the acknowledgment
//! - Returns 202 Accepted once the broker has the event

pub mod handlers;
pub mod signature;

pub use handlers::{
    health, ingest_event, router, AppState, HealthResponse, IngestResponse, PUBLISH_FAILED,
};
pub use signature::{sign, verify_signature};
