//! Async Kafka publisher for forwarding events.
//!
//! A single publisher is created at startup and shared by clone across all
//! request handlers. It holds at most one producer client at a time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::client::{Connector, ProducerClient};
use super::kafka::KafkaConnector;
use super::types::{Event, OutboundRecord};
use crate::config::BrokerConfig;
use crate::{Error, Result};

/// Event publisher with explicit connection management.
///
/// The lifecycle is `connect` → `send`/`send_batch` → `close`. Connecting is
/// idempotent, closing is idempotent and safe without a prior connect, and a
/// closed publisher may be connected again.
///
/// `send` reports broker rejections and acknowledgment timeouts as
/// `Ok(false)` so callers can apply their own retry policy; only misuse
/// (sending while disconnected) and payload encoding faults are errors.
pub struct EventPublisher<C: Connector = KafkaConnector> {
    inner: Arc<PublisherInner<C>>,
}

struct PublisherInner<C: Connector> {
    config: BrokerConfig,
    connector: C,
    client: RwLock<Option<C::Client>>,
    /// Serializes connection attempts and keeps the last failure. The client
    /// lock is never held across a network round-trip.
    connect_gate: Mutex<Option<String>>,
    /// Bumped after every finished connection attempt.
    attempts: AtomicU64,
}

impl<C: Connector> Clone for EventPublisher<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl EventPublisher<KafkaConnector> {
    /// Create a Kafka publisher. No connection is made until [`connect`].
    ///
    /// [`connect`]: EventPublisher::connect
    pub fn new(config: BrokerConfig) -> Self {
        Self::with_connector(config, KafkaConnector)
    }
}

impl<C: Connector> EventPublisher<C> {
    /// Create a publisher that obtains clients from `connector`.
    pub fn with_connector(config: BrokerConfig, connector: C) -> Self {
        Self {
            inner: Arc::new(PublisherInner {
                config,
                connector,
                client: RwLock::new(None),
                connect_gate: Mutex::new(None),
                attempts: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.inner.config
    }

    pub async fn is_connected(&self) -> bool {
        self.inner.client.read().await.is_some()
    }

    /// Establish the producer client. Does nothing when already connected.
    ///
    /// Concurrent callers share one attempt: a caller that waited on an
    /// attempt which failed gets that failure back instead of dialing the
    /// cluster again.
    pub async fn connect(&self) -> Result<()> {
        if self.is_connected().await {
            return Ok(());
        }

        let seen = self.inner.attempts.load(Ordering::Acquire);
        let mut last_error = self.inner.connect_gate.lock().await;

        if self.is_connected().await {
            return Ok(());
        }
        if self.inner.attempts.load(Ordering::Acquire) != seen {
            if let Some(message) = last_error.as_ref() {
                return Err(Error::Connection(message.clone()));
            }
        }

        let config = &self.inner.config;
        let result = self.inner.connector.connect(config).await;
        let outcome = match result {
            Ok(connected) => {
                *self.inner.client.write().await = Some(connected);
                *last_error = None;
                info!(
                    brokers = ?config.brokers(),
                    acks = %config.acks(),
                    retries = config.retries(),
                    "kafka_publisher_connected"
                );
                Ok(())
            }
            Err(e) => {
                error!(brokers = ?config.brokers(), error = %e, "kafka_publisher_connect_failed");
                *last_error = Some(match &e {
                    Error::Connection(message) => message.clone(),
                    other => other.to_string(),
                });
                Err(e)
            }
        };
        self.inner.attempts.fetch_add(1, Ordering::AcqRel);

        outcome
    }

    /// Publish one event and wait for the broker to acknowledge it.
    ///
    /// The topic is `topic` if given, else the event's own override, else
    /// the configured default. The partition key follows the same
    /// precedence between `key` and the event's key; without one the
    /// broker's partitioner decides.
    ///
    /// Waits at most the configured acknowledgment timeout. Returns
    /// `Ok(true)` on acknowledgment and `Ok(false)` on rejection or timeout.
    pub async fn send(&self, event: &Event, topic: Option<&str>, key: Option<&str>) -> Result<bool> {
        // Held across the delivery await so `close` cannot release the
        // client underneath an in-flight send.
        let guard = self.inner.client.read().await;
        let client = guard.as_ref().ok_or(Error::NotConnected)?;

        let topic = topic
            .or(event.topic.as_deref())
            .unwrap_or_else(|| self.inner.config.topic());
        let key = key.map(str::as_bytes).or(event.key.as_deref());
        let payload = event.to_json_bytes()?;

        let record = OutboundRecord {
            topic,
            key,
            payload: &payload,
        };

        let ack_timeout = self.inner.config.ack_timeout();
        match timeout(ack_timeout, client.deliver(record)).await {
            Ok(Ok(delivery)) => {
                debug!(
                    topic = %topic,
                    partition = delivery.partition,
                    offset = delivery.offset,
                    payload_length = payload.len(),
                    "kafka_event_sent"
                );
                Ok(true)
            }
            Ok(Err(e)) => {
                error!(topic = %topic, error = %e, "kafka_event_send_failed");
                Ok(false)
            }
            Err(_) => {
                error!(
                    topic = %topic,
                    timeout = ?ack_timeout,
                    "kafka_event_ack_timeout"
                );
                Ok(false)
            }
        }
    }

    /// Publish events one after another, returning how many were
    /// acknowledged. A failed event does not stop the rest.
    pub async fn send_batch(&self, events: &[Event], topic: Option<&str>) -> Result<usize> {
        let mut sent_count = 0;
        for event in events {
            if self.send(event, topic, None).await? {
                sent_count += 1;
            }
        }

        debug!(
            total = events.len(),
            sent = sent_count,
            failed = events.len() - sent_count,
            "kafka_batch_sent"
        );

        Ok(sent_count)
    }

    /// Flush pending messages and release the client.
    ///
    /// Waits for in-flight sends to finish first. Never fails; flush errors
    /// are logged.
    pub async fn close(&self) {
        let mut client = self.inner.client.write().await;

        let Some(connected) = client.take() else {
            return;
        };

        if let Err(e) = connected.flush(self.inner.config.ack_timeout()).await {
            warn!(error = %e, "kafka_publisher_flush_error");
        }
        drop(connected);

        info!("kafka_publisher_closed");
    }
}
