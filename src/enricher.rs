use std::sync::Arc;

use tracing::{error, info, instrument};

use crate::error::EnrichError;
use crate::lookup::PublicIpLookup;
use crate::message::{InboundMessage, OutputRecord, EMPTY, UNKNOWN};
use crate::sink::RecordSink;

/// Turns one queue message into one stored record tagged with the public IP
/// address the function ran behind.
///
/// Flow:
/// 1. Keep the queue message id, or generate one
/// 2. Decode the body as UTF-8 text
/// 3. Ask the lookup service for the public IP (failure falls back to `UNKNOWN`)
/// 4. Build the output record
/// 5. Append it to the sink (failure is returned to the caller)
pub struct MessageEnricher {
    lookup: Arc<dyn PublicIpLookup>,
    sink: Arc<dyn RecordSink>,
}

impl MessageEnricher {
    pub fn new(lookup: Arc<dyn PublicIpLookup>, sink: Arc<dyn RecordSink>) -> Self {
        Self { lookup, sink }
    }

    /// Build the record for `message` without writing it anywhere.
    pub async fn enrich(&self, message: InboundMessage) -> OutputRecord {
        let id = message.resolve_id();
        let text = message.decode_body();

        let public_ip_address = match self.lookup.lookup().await {
            Ok(ip) => {
                info!(message_id = %id, public_ip = %ip, "public IP lookup succeeded");
                ip
            }
            Err(e) => {
                error!(message_id = %id, error = %e, "public IP lookup failed, using {}", UNKNOWN);
                UNKNOWN.to_string()
            }
        };

        OutputRecord {
            id,
            message: text,
            properties: message.properties,
            public_ip_address,
        }
    }

    /// Enrich and store one message. `None` is accepted and does nothing.
    #[instrument(skip_all)]
    pub async fn process(
        &self,
        message: Option<InboundMessage>,
    ) -> Result<Option<OutputRecord>, EnrichError> {
        let Some(message) = message else {
            return Ok(None);
        };

        info!(
            message_id = message.id.as_deref().unwrap_or(EMPTY),
            body_len = message.body.len(),
            "message received"
        );

        let record = self.enrich(message).await;

        if let Err(e) = self.sink.append(&record).await {
            error!(message_id = %record.id, error = %e, "failed to store record");
            return Err(e.into());
        }

        info!(message_id = %record.id, "record stored");
        Ok(Some(record))
    }
}
