use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Transport protocol a device connection speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Https,
    Amqps,
    Mqtt,
}

impl Protocol {
    pub const ALL: [Protocol; 3] = [Protocol::Https, Protocol::Amqps, Protocol::Mqtt];

    /// Whether application properties survive delivery over this protocol.
    pub fn supports_properties(self) -> bool {
        matches!(self, Protocol::Https | Protocol::Amqps)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Https => "https",
            Protocol::Amqps => "amqps",
            Protocol::Mqtt => "mqtt",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "https" => Ok(Protocol::Https),
            "amqps" | "amqp" => Ok(Protocol::Amqps),
            "mqtt" => Ok(Protocol::Mqtt),
            other => Err(format!("unknown protocol '{other}'")),
        }
    }
}

/// A named string value attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: String,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A cloud-to-device message.
///
/// The sent copy is produced by the harness, the received copy by the
/// transport. Property order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub payload: Vec<u8>,
    pub properties: Vec<Property>,
}

impl Message {
    pub fn from_text(text: &str) -> Self {
        Self {
            payload: text.as_bytes().to_vec(),
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push(Property::new(name, value));
        self
    }

    /// Payload as UTF-8, if it is valid text.
    pub fn payload_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}
