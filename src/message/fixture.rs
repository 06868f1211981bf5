use super::model::{Message, Property, Protocol};

/// Builds the message sent in each scenario.
///
/// Every property-capable protocol gets the same three properties so the
/// verifier has one stable expected set per run.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageFixture;

impl MessageFixture {
    const PROPERTIES: [(&'static str, &'static str); 3] = [
        ("name1", "value1"),
        ("name2", "value2"),
        ("name3", "value3"),
    ];

    pub fn build(protocol: Protocol) -> Message {
        let text = format!(
            "Rust service e2e test message to be received over {} protocol",
            protocol.as_str().to_uppercase()
        );
        let mut message = Message::from_text(&text);
        if protocol.supports_properties() {
            message.properties = Self::expected_properties();
        }
        message
    }

    /// The property set every property-capable scenario sends.
    pub fn expected_properties() -> Vec<Property> {
        Self::PROPERTIES
            .iter()
            .map(|(name, value)| Property::new(*name, *value))
            .collect()
    }
}
