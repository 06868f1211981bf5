use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration for a receive run.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Settings {
    pub receive: ReceiveSettings,
    pub https: HttpsSettings,
    pub suite: SuiteSettings,
}

/// Timing of the receive wait.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ReceiveSettings {
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
    /// Pause between the end of the wait and closing the connection.
    pub grace_period_ms: u64,
}

/// Options applied only to HTTPS connections.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct HttpsSettings {
    pub minimum_polling_interval_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct SuiteSettings {
    pub device_prefix: String,
    pub log_level: String,
}

impl ReceiveSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}

impl HttpsSettings {
    pub fn minimum_polling_interval(&self) -> Duration {
        Duration::from_millis(self.minimum_polling_interval_ms)
    }
}

/// Partial settings loaded from files or environment; missing values fall
/// back to `Settings::default()`.
#[derive(Debug, Deserialize)]
pub struct PartialSettings {
    pub receive: Option<PartialReceiveSettings>,
    pub https: Option<PartialHttpsSettings>,
    pub suite: Option<PartialSuiteSettings>,
}

#[derive(Debug, Deserialize)]
pub struct PartialReceiveSettings {
    pub timeout_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub grace_period_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PartialHttpsSettings {
    pub minimum_polling_interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct PartialSuiteSettings {
    pub device_prefix: Option<String>,
    pub log_level: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            receive: ReceiveSettings {
                timeout_ms: 60_000,
                poll_interval_ms: 100,
                grace_period_ms: 200,
            },
            https: HttpsSettings {
                minimum_polling_interval_ms: 1_000,
            },
            suite: SuiteSettings {
                device_prefix: "rust-device-client-e2e-test".to_string(),
                log_level: "info".to_string(),
            },
        }
    }
}
