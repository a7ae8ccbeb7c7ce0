//! Error types for the event gateway.
//!
//! Publishing has two failure shapes. Programmer and configuration faults
//! (bad broker settings, an unreachable cluster at connect time, sending on
//! a closed publisher) are raised as [`Error`]. A broker that rejects or
//! never acknowledges a message is an expected runtime condition and is
//! reported as `Ok(false)` from [`EventPublisher::send`] instead.
//!
//! [`EventPublisher::send`]: crate::broker::EventPublisher::send

use thiserror::Error;

/// The main error type for gateway operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid broker or service configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The broker cluster could not be reached while connecting.
    #[error("Connection error: {0}")]
    Connection(String),

    /// `send` or `send_batch` was called before `connect`.
    #[error("Producer not connected. Call connect() first.")]
    NotConnected,

    /// An inbound payload that cannot be published as an event.
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// Kafka client construction error.
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    /// JSON serialization error when encoding an event payload.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Authentication failure at the ingestion boundary.
///
/// Kept apart from [`Error`] so that a bad signature is never reported as an
/// internal server error.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureError {
    /// The signature header was absent or empty.
    #[error("signature header is missing")]
    MissingSignature,

    /// The signature header did not match the computed digest.
    #[error("request signatures didn't match")]
    SignatureMismatch,
}

/// A convenient Result type alias for gateway operations.
pub type Result<T> = std::result::Result<T, Error>;
