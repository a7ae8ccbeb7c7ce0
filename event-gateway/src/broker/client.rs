//! Producer client abstraction.
//!
//! [`EventPublisher`](super::EventPublisher) owns the connection lifecycle and
//! delivery contract; the traits here are the thin seam it drives. The
//! production implementation is [`KafkaConnector`](super::KafkaConnector);
//! tests plug in an in-memory client.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::types::{Delivery, OutboundRecord};
use crate::config::BrokerConfig;
use crate::Result;

/// Why the broker did not acknowledge a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DeliveryError {
    pub message: String,
}

impl DeliveryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Creates producer clients from a [`BrokerConfig`].
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Client: ProducerClient;

    /// Establish a client for the configured cluster.
    ///
    /// Returns [`Error::Connection`](crate::Error::Connection) when the
    /// cluster cannot be reached.
    async fn connect(&self, config: &BrokerConfig) -> Result<Self::Client>;
}

/// A live producer handle. Must be safe to share between concurrent senders.
#[async_trait]
pub trait ProducerClient: Send + Sync + 'static {
    /// Dispatch a record and resolve once the broker acknowledges it.
    async fn deliver(
        &self,
        record: OutboundRecord<'_>,
    ) -> std::result::Result<Delivery, DeliveryError>;

    /// Wait for every buffered and in-flight record to be dispatched.
    async fn flush(&self, timeout: Duration) -> std::result::Result<(), DeliveryError>;
}
