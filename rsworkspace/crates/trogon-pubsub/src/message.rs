use std::collections::HashMap;
use std::str;

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// One message delivered by a push request.
///
/// The payload is opaque: it is whatever the publisher sent, already
/// base64-decoded. Metadata fields are optional because the push envelope
/// does not guarantee them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    data: Bytes,
    message_id: Option<String>,
    publish_time: Option<DateTime<Utc>>,
    attributes: HashMap<String, String>,
    subscription: Option<String>,
}

impl Message {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            ..Default::default()
        }
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    pub fn with_publish_time(mut self, publish_time: DateTime<Utc>) -> Self {
        self.publish_time = Some(publish_time);
        self
    }

    pub fn with_attributes(mut self, attributes: HashMap<String, String>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_subscription(mut self, subscription: impl Into<String>) -> Self {
        self.subscription = Some(subscription.into());
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The payload as UTF-8, or `None` if it is binary.
    pub fn text(&self) -> Option<&str> {
        str::from_utf8(&self.data).ok()
    }

    pub fn into_data(self) -> Bytes {
        self.data
    }

    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    pub fn publish_time(&self) -> Option<DateTime<Utc>> {
        self.publish_time
    }

    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Fully-qualified subscription the backend says it delivered from.
    pub fn subscription(&self) -> Option<&str> {
        self.subscription.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_is_returned_unchanged() {
        let message = Message::new("testmessagedata");
        assert_eq!(message.data(), b"testmessagedata");
        assert_eq!(message.text(), Some("testmessagedata"));
    }

    #[test]
    fn binary_payload_has_no_text_view() {
        let message = Message::new(vec![0xff, 0xfe, 0x00]);
        assert_eq!(message.text(), None);
        assert_eq!(message.into_data().as_ref(), &[0xff, 0xfe, 0x00]);
    }

    #[test]
    fn metadata_defaults_to_absent() {
        let message = Message::new("x");
        assert_eq!(message.message_id(), None);
        assert_eq!(message.publish_time(), None);
        assert!(message.attributes().is_empty());
        assert_eq!(message.subscription(), None);
    }

    #[test]
    fn attribute_lookup() {
        let attributes = HashMap::from([("origin".to_string(), "billing".to_string())]);
        let message = Message::new("x").with_attributes(attributes);

        assert_eq!(message.attribute("origin"), Some("billing"));
        assert_eq!(message.attribute("missing"), None);
    }
}
