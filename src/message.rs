use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Placeholder for a public IP address that could not be resolved.
pub const UNKNOWN: &str = "UNKNOWN";
/// Placeholder for a message body that decoded to nothing.
pub const EMPTY: &str = "EMPTY";

/// One message handed over by the queue trigger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboundMessage {
    pub id: Option<String>,
    pub body: Vec<u8>,
    pub properties: Map<String, Value>,
}

/// The enriched document written to the sink, one per inbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputRecord {
    pub id: String,
    pub message: String,
    pub properties: Map<String, Value>,
    pub public_ip_address: String,
}

impl InboundMessage {
    // Queue-assigned id, or a fresh v4 uuid when the queue gave none
    pub fn resolve_id(&self) -> String {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => uuid::Uuid::new_v4().to_string(),
        }
    }

    // Lenient UTF-8 decode: invalid sequences become U+FFFD
    pub fn decode_body(&self) -> String {
        let text = String::from_utf8_lossy(&self.body);
        if text.is_empty() {
            EMPTY.to_string()
        } else {
            text.into_owned()
        }
    }
}
