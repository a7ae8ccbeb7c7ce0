//! Broker module for Kafka publishing.
//!
//! This module provides:
//! - Event and record types
//! - The producer client seam and its rdkafka implementation
//! - The shared publisher used by the web handlers
//!
//! ## Flow
//!
//! ```text
//! Web Handler → EventPublisher → ProducerClient (rdkafka) → Kafka topic
//! ```

pub mod client;
pub mod kafka;
pub mod publisher;
pub mod types;

pub use client::{Connector, DeliveryError, ProducerClient};
pub use kafka::{KafkaClient, KafkaConnector};
pub use publisher::EventPublisher;
pub use types::{Delivery, Event, OutboundRecord};
