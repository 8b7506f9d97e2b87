//! Connection policy for the HTTP transport.
//!
//! Values here bound the worst-case latency of a single call. They can be
//! loaded from any serde format; durations are expressed in milliseconds.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Transport policy applied when the connection pool is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Time allowed to receive the response status line, headers and body.
    #[serde(rename = "read_timeout_ms", with = "duration_ms")]
    pub read_timeout: Duration,

    /// Time allowed to send the request head and body.
    #[serde(rename = "write_timeout_ms", with = "duration_ms")]
    pub write_timeout: Duration,

    #[serde(rename = "connect_timeout_ms", with = "duration_ms")]
    pub connect_timeout: Duration,

    /// How long an idle pooled connection is kept before it is closed.
    #[serde(rename = "max_idle_age_ms", with = "duration_ms")]
    pub max_idle_age: Duration,

    /// Idle connections kept per host. Active connections are not capped, so
    /// this is not a concurrency limit.
    pub max_idle_connections_per_host: usize,

    /// Value of the `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(3),
            write_timeout: Duration::from_secs(3),
            connect_timeout: Duration::from_secs(3),
            max_idle_age: Duration::from_secs(5),
            max_idle_connections_per_host: 150,
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    format!(
        "{}/{} (rust)",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
