//! Configuration module.
//!
//! [`BrokerConfig`] holds the immutable Kafka connection parameters used by
//! the publisher. [`Config`] is the service configuration read from
//! environment variables by the binary.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};

/// Default time to wait for a broker acknowledgment per message.
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(10);

/// Default header carrying the request signature.
pub const DEFAULT_SIGNATURE_HEADER: &str = "x-hub-signature-256";

// =============================================================================
// Broker Configuration
// =============================================================================

/// How many replicas must confirm a write before it counts as delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Acks {
    /// Fire and forget.
    None,
    /// Partition leader only.
    Leader,
    /// All in-sync replicas.
    #[default]
    All,
}

impl Acks {
    /// Value understood by the `acks` producer property.
    pub fn as_str(&self) -> &'static str {
        match self {
            Acks::None => "0",
            Acks::Leader => "1",
            Acks::All => "all",
        }
    }
}

impl FromStr for Acks {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "none" => Ok(Acks::None),
            "1" | "leader" => Ok(Acks::Leader),
            "all" | "-1" => Ok(Acks::All),
            other => Err(Error::Config(format!("invalid acks value: {other:?}"))),
        }
    }
}

impl fmt::Display for Acks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw broker list as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerList {
    /// Comma-separated `host:port` endpoints.
    Csv(String),
    /// Already split endpoints, used as-is.
    List(Vec<String>),
}

impl BrokerList {
    fn into_endpoints(self) -> Vec<String> {
        match self {
            BrokerList::Csv(raw) => raw.split(',').map(|s| s.trim().to_string()).collect(),
            BrokerList::List(list) => list,
        }
    }
}

impl From<&str> for BrokerList {
    fn from(raw: &str) -> Self {
        BrokerList::Csv(raw.to_string())
    }
}

impl From<String> for BrokerList {
    fn from(raw: String) -> Self {
        BrokerList::Csv(raw)
    }
}

impl From<Vec<String>> for BrokerList {
    fn from(list: Vec<String>) -> Self {
        BrokerList::List(list)
    }
}

impl From<&[&str]> for BrokerList {
    fn from(list: &[&str]) -> Self {
        BrokerList::List(list.iter().map(|s| s.to_string()).collect())
    }
}

/// Kafka connection and topic parameters.
///
/// Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfig {
    brokers: Vec<String>,
    topic: String,
    acks: Acks,
    retries: u32,
    ack_timeout: Duration,
}

impl BrokerConfig {
    /// Build a validated broker configuration.
    ///
    /// A string broker list is split on commas and each endpoint trimmed.
    /// Fails with [`Error::Config`] when no endpoints remain, when any
    /// endpoint is blank, or when the topic is blank.
    pub fn new(
        brokers: impl Into<BrokerList>,
        topic: impl Into<String>,
        acks: Acks,
        retries: u32,
    ) -> Result<Self> {
        let list: BrokerList = brokers.into();
        let brokers = list.into_endpoints();
        let topic = topic.into();

        if brokers.is_empty() {
            return Err(Error::Config("broker list is empty".to_string()));
        }
        if brokers.iter().any(|b| b.trim().is_empty()) {
            return Err(Error::Config(format!(
                "broker list contains an empty endpoint: {brokers:?}"
            )));
        }
        if topic.trim().is_empty() {
            return Err(Error::Config("topic name is empty".to_string()));
        }

        Ok(Self {
            brokers,
            topic,
            acks,
            retries,
            ack_timeout: DEFAULT_ACK_TIMEOUT,
        })
    }

    /// Build a configuration with `acks=all` and three retries.
    pub fn with_defaults(brokers: impl Into<BrokerList>, topic: impl Into<String>) -> Result<Self> {
        Self::new(brokers, topic, Acks::default(), 3)
    }

    /// Override how long `send` waits for an acknowledgment.
    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    pub fn brokers(&self) -> &[String] {
        &self.brokers
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn acks(&self) -> Acks {
        self.acks
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn ack_timeout(&self) -> Duration {
        self.ack_timeout
    }

    /// Endpoints joined for the `bootstrap.servers` property.
    pub fn bootstrap_servers(&self) -> String {
        self.brokers.join(",")
    }
}

// =============================================================================
// Service Configuration
// =============================================================================

/// Service configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// Kafka connection parameters
    pub broker: BrokerConfig,

    /// Lowercased name of the header carrying the request signature
    pub signature_header: String,

    /// Shared secret for HMAC-SHA256 request signatures
    pub hmac_secret: String,

    /// Port for the web server to listen on
    pub port: u16,

    /// Connect to Kafka before accepting requests instead of on first use
    pub connect_on_startup: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("broker", &self.broker)
            .field("signature_header", &self.signature_header)
            .field("hmac_secret", &"<redacted>")
            .field("port", &self.port)
            .field("connect_on_startup", &self.connect_on_startup)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let brokers = var("KAFKA_BROKERS").unwrap_or_else(|| "localhost:9092".to_string());
        let topic = var("KAFKA_TOPIC").unwrap_or_else(|| "events".to_string());

        let acks = match var("KAFKA_ACKS") {
            Some(raw) => raw.parse::<Acks>()?,
            None => Acks::default(),
        };

        let retries = match var("KAFKA_RETRIES") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                Error::Config(format!("KAFKA_RETRIES must be a non-negative integer, got {raw:?}"))
            })?,
            None => 3,
        };

        let broker = BrokerConfig::new(brokers, topic, acks, retries)?;

        let signature_header = var("SIGNATURE_HEADER")
            .map(|h| h.trim().to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_SIGNATURE_HEADER.to_string());

        let hmac_secret = var("GITHUB_HMAC_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Config("GITHUB_HMAC_SECRET must be set".to_string()))?;

        let port = var("PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(8000);

        let connect_on_startup = var("KAFKA_CONNECT_ON_STARTUP")
            .map(|v| parse_bool(&v))
            .unwrap_or(true);

        Ok(Config {
            broker,
            signature_header,
            hmac_secret,
            port,
            connect_on_startup,
        })
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_broker_list_split_and_trimmed() {
        let config = BrokerConfig::new("broker1:9092, broker2:9092", "my-topic", Acks::All, 3).unwrap();
        assert_eq!(config.brokers(), ["broker1:9092", "broker2:9092"]);
        assert_eq!(config.topic(), "my-topic");
        assert_eq!(config.bootstrap_servers(), "broker1:9092,broker2:9092");
    }

    #[test]
    fn test_single_broker() {
        let config = BrokerConfig::with_defaults("localhost:9092", "events").unwrap();
        assert_eq!(config.brokers(), ["localhost:9092"]);
        assert_eq!(config.acks(), Acks::All);
        assert_eq!(config.retries(), 3);
        assert_eq!(config.ack_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_broker_sequence_used_as_is() {
        let list = vec!["a:1".to_string(), "b:2".to_string(), "c:3".to_string()];
        let config = BrokerConfig::new(list.clone(), "t", Acks::Leader, 0).unwrap();
        assert_eq!(config.brokers(), list.as_slice());
    }

    #[test]
    fn test_empty_brokers_rejected() {
        assert!(matches!(
            BrokerConfig::new(Vec::<String>::new(), "t", Acks::All, 3),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            BrokerConfig::new("", "t", Acks::All, 3),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            BrokerConfig::new("a:1,,b:2", "t", Acks::All, 3),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_empty_topic_rejected() {
        assert!(matches!(
            BrokerConfig::new("a:1", "  ", Acks::All, 3),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_acks_parsing() {
        assert_eq!("0".parse::<Acks>().unwrap(), Acks::None);
        assert_eq!("1".parse::<Acks>().unwrap(), Acks::Leader);
        assert_eq!("ALL".parse::<Acks>().unwrap(), Acks::All);
        assert_eq!("-1".parse::<Acks>().unwrap(), Acks::All);
        assert!("2".parse::<Acks>().is_err());
        assert_eq!(Acks::Leader.to_string(), "1");
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_vars(vars(&[("GITHUB_HMAC_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.broker.brokers(), ["localhost:9092"]);
        assert_eq!(config.broker.topic(), "events");
        assert_eq!(config.broker.acks(), Acks::All);
        assert_eq!(config.broker.retries(), 3);
        assert_eq!(config.signature_header, "x-hub-signature-256");
        assert_eq!(config.port, 8000);
        assert!(config.connect_on_startup);
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::from_vars(vars(&[
            ("GITHUB_HMAC_SECRET", "s3cret"),
            ("KAFKA_BROKERS", "k1:9092, k2:9092"),
            ("KAFKA_TOPIC", "webhooks"),
            ("KAFKA_ACKS", "1"),
            ("KAFKA_RETRIES", "5"),
            ("SIGNATURE_HEADER", "X-Signature"),
            ("PORT", "9000"),
            ("KAFKA_CONNECT_ON_STARTUP", "false"),
        ]))
        .unwrap();
        assert_eq!(config.broker.brokers(), ["k1:9092", "k2:9092"]);
        assert_eq!(config.broker.topic(), "webhooks");
        assert_eq!(config.broker.acks(), Acks::Leader);
        assert_eq!(config.broker.retries(), 5);
        assert_eq!(config.signature_header, "x-signature");
        assert_eq!(config.port, 9000);
        assert!(!config.connect_on_startup);
    }

    #[test]
    fn test_config_requires_secret() {
        assert!(matches!(Config::from_vars(vars(&[])), Err(Error::Config(_))));
    }

    #[test]
    fn test_config_rejects_negative_retries() {
        let result = Config::from_vars(vars(&[
            ("GITHUB_HMAC_SECRET", "s3cret"),
            ("KAFKA_RETRIES", "-1"),
        ]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = Config::from_vars(vars(&[("GITHUB_HMAC_SECRET", "s3cret")])).unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
    }
}
