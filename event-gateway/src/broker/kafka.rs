//! Kafka implementation of the producer client, backed by rdkafka.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::ClientConfig;
use tracing::{debug, error};

use super::client::{Connector, DeliveryError, ProducerClient};
use super::types::{Delivery, OutboundRecord};
use crate::config::BrokerConfig;
use crate::{Error, Result};

/// Connector that builds rdkafka [`FutureProducer`] clients.
#[derive(Debug, Clone, Default)]
pub struct KafkaConnector;

impl KafkaConnector {
    /// Producer properties derived from the broker configuration.
    pub fn client_config(config: &BrokerConfig) -> ClientConfig {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", config.bootstrap_servers())
            .set("acks", config.acks().as_str())
            .set("retries", config.retries().to_string())
            // librdkafka reads 0 as "no timeout"
            .set(
                "message.timeout.ms",
                config.ack_timeout().as_millis().max(1).to_string(),
            );
        client_config
    }
}

#[async_trait]
impl Connector for KafkaConnector {
    type Client = KafkaClient;

    async fn connect(&self, config: &BrokerConfig) -> Result<KafkaClient> {
        let producer: FutureProducer = Self::client_config(config).create()?;

        // Creating the producer does not touch the network; a metadata
        // round-trip is what proves the cluster is reachable.
        let probe = producer.clone();
        let timeout = config.ack_timeout();
        tokio::task::spawn_blocking(move || {
            probe.client().fetch_metadata(None, timeout).map(|_| ())
        })
        .await
        .map_err(|e| Error::Connection(format!("metadata probe aborted: {e}")))?
        .map_err(|e| {
            error!(
                brokers = %config.bootstrap_servers(),
                error = %e,
                "kafka_metadata_probe_failed"
            );
            Error::Connection(format!(
                "failed to reach Kafka at {}: {e}",
                config.bootstrap_servers()
            ))
        })?;

        debug!(brokers = %config.bootstrap_servers(), "kafka_metadata_probe_ok");

        Ok(KafkaClient {
            producer,
            queue_timeout: config.ack_timeout(),
        })
    }
}

/// A connected rdkafka producer.
#[derive(Clone)]
pub struct KafkaClient {
    producer: FutureProducer,
    queue_timeout: Duration,
}

#[async_trait]
impl ProducerClient for KafkaClient {
    async fn deliver(
        &self,
        record: OutboundRecord<'_>,
    ) -> std::result::Result<Delivery, DeliveryError> {
        let mut future_record: FutureRecord<'_, [u8], [u8]> =
            FutureRecord::to(record.topic).payload(record.payload);
        if let Some(key) = record.key {
            future_record = future_record.key(key);
        }

        self.producer
            .send(future_record, self.queue_timeout)
            .await
            .map(|(partition, offset)| Delivery { partition, offset })
            .map_err(|(e, _)| DeliveryError::new(e.to_string()))
    }

    async fn flush(&self, timeout: Duration) -> std::result::Result<(), DeliveryError> {
        let producer = self.producer.clone();
        tokio::task::spawn_blocking(move || producer.flush(timeout))
            .await
            .map_err(|e| DeliveryError::new(format!("flush aborted: {e}")))?
            .map_err(|e| DeliveryError::new(e.to_string()))
    }
}
