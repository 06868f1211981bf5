//! The `config` module loads harness settings and the service credential.
//!
//! Settings come from an optional `config/default` file and `HARNESS_*`
//! environment variables, merged over defaults. The credential is a single
//! connection string read from the process environment (a `.env` file is
//! honored); without it no collaborator can be built.

mod settings;

use std::fmt;

use config::{Config, ConfigError, Environment, File};

use crate::utils::HarnessError;
use settings::PartialSettings;

pub use settings::{HttpsSettings, ReceiveSettings, Settings, SuiteSettings};

/// Environment variable holding the service connection string.
pub const CREDENTIAL_ENV_VAR: &str = "IOTHUB_CONNECTION_STRING";

/// Loads the configuration from `config/default` and the environment.
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from("config/default")
}

/// Same as `load_config`, reading the file source from `path` (extension optional).
pub fn load_config_from(path: &str) -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix("HARNESS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;
    let default = Settings::default();

    let receive = partial.receive.as_ref();
    let https = partial.https.as_ref();
    let suite = partial.suite.as_ref();

    Ok(Settings {
        receive: ReceiveSettings {
            timeout_ms: receive
                .and_then(|r| r.timeout_ms)
                .unwrap_or(default.receive.timeout_ms),
            poll_interval_ms: receive
                .and_then(|r| r.poll_interval_ms)
                .unwrap_or(default.receive.poll_interval_ms),
            grace_period_ms: receive
                .and_then(|r| r.grace_period_ms)
                .unwrap_or(default.receive.grace_period_ms),
        },
        https: HttpsSettings {
            minimum_polling_interval_ms: https
                .and_then(|h| h.minimum_polling_interval_ms)
                .unwrap_or(default.https.minimum_polling_interval_ms),
        },
        suite: SuiteSettings {
            device_prefix: suite
                .and_then(|s| s.device_prefix.clone())
                .unwrap_or(default.suite.device_prefix),
            log_level: suite
                .and_then(|s| s.log_level.clone())
                .unwrap_or(default.suite.log_level),
        },
    })
}

/// Service connection string used to build the registry and sender.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceCredential(String);

impl ServiceCredential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The `HostName=` segment, if the string carries one.
    pub fn host_name(&self) -> Option<&str> {
        self.0
            .split(';')
            .filter_map(|segment| segment.split_once('='))
            .find(|(key, _)| key.trim().eq_ignore_ascii_case("HostName"))
            .map(|(_, value)| value.trim())
    }
}

impl fmt::Debug for ServiceCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ServiceCredential").field(&"<redacted>").finish()
    }
}

/// Reads the credential from `IOTHUB_CONNECTION_STRING`.
pub fn load_credential() -> Result<ServiceCredential, HarnessError> {
    let _ = dotenvy::dotenv();
    credential_from_env(CREDENTIAL_ENV_VAR)
}

pub fn credential_from_env(var: &str) -> Result<ServiceCredential, HarnessError> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(ServiceCredential::new(value)),
        _ => Err(HarnessError::MissingCredential(var.to_string())),
    }
}
