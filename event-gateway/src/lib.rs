//! Event Gateway - signed webhook ingestion for Kafka.
//!
//! Accepts JSON events over HTTP, authenticates them with an HMAC-SHA256
//! signature header, and forwards them to a Kafka topic.
//!
//! ## Architecture
//!
//! ```text
//! Webhook → POST /events → signature check → EventPublisher → Kafka topic
//! ```

pub mod broker;
pub mod config;
pub mod error;
pub mod web;

// Re-export commonly used types
pub use broker::{Event, EventPublisher};
pub use config::{Acks, BrokerConfig, Config};
pub use error::{Error, Result, SignatureError};
pub use web::AppState;
