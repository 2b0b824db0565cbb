use aws_lambda_events::event::sqs::{
    BatchItemFailure, SqsBatchResponse, SqsEvent, SqsMessage, SqsMessageAttribute,
};
use lambda_runtime::{Error, LambdaEvent};
use serde_json::{Map, Number, Value};
use tracing::{error, info, info_span, Instrument};

use crate::enricher::MessageEnricher;
use crate::message::InboundMessage;

// SQS attribute -> JSON value; Number attributes stay numeric when they round-trip exactly
fn attribute_to_value(attribute: &SqsMessageAttribute) -> Value {
    let is_number = attribute
        .data_type
        .as_deref()
        .is_some_and(|t| t.starts_with("Number"));

    if let Some(s) = &attribute.string_value {
        if is_number {
            // SQS numbers carry up to 38 digits; keep the text unless f64/u64/i64 holds it exactly
            if let Ok(n) = s.parse::<Number>() {
                if n.to_string() == *s {
                    return Value::Number(n);
                }
            }
        }
        return Value::String(s.clone());
    }
    if let Some(binary) = &attribute.binary_value {
        return serde_json::to_value(binary).unwrap_or(Value::Null);
    }
    if !attribute.string_list_values.is_empty() {
        return Value::Array(
            attribute
                .string_list_values
                .iter()
                .cloned()
                .map(Value::String)
                .collect(),
        );
    }
    if !attribute.binary_list_values.is_empty() {
        return serde_json::to_value(&attribute.binary_list_values).unwrap_or(Value::Null);
    }
    Value::Null
}

pub fn to_inbound_message(record: SqsMessage) -> InboundMessage {
    let properties: Map<String, Value> = record
        .message_attributes
        .iter()
        .map(|(name, attribute)| (name.clone(), attribute_to_value(attribute)))
        .collect();

    InboundMessage {
        id: record.message_id,
        body: record.body.unwrap_or_default().into_bytes(),
        properties,
    }
}

// Lambda entry point - one enricher pass per SQS record, failed records are
// reported back so only they get redelivered.
// The SQS event source mapping must set FunctionResponseTypes to
// ReportBatchItemFailures, otherwise Lambda ignores batchItemFailures and
// deletes the whole batch, failed records included.
pub async fn function_handler(
    enricher: &MessageEnricher,
    event: LambdaEvent<Option<SqsEvent>>,
) -> Result<SqsBatchResponse, Error> {
    let (payload, context) = event.into_parts();
    let span = info_span!(
        "invocation",
        request_id = %context.request_id,
        function_name = %context.env_config.function_name
    );

    async move {
        let mut response = SqsBatchResponse::default();

        let Some(event) = payload else {
            info!("empty event, nothing to do");
            return Ok(response);
        };

        info!(record_count = event.records.len(), "started");

        for record in event.records {
            let message_id = record.message_id.clone();
            let message = to_inbound_message(record);

            if let Err(e) = enricher.process(Some(message)).await {
                match message_id {
                    Some(id) if !id.is_empty() => {
                        error!(message_id = %id, error = %e, "record failed, reporting for redelivery");
                        response.batch_item_failures.push(BatchItemFailure {
                            item_identifier: id,
                        });
                    }
                    _ => {
                        error!(error = %e, "record without message id failed");
                        return Err(Error::from(e));
                    }
                }
            }
        }

        info!(
            failure_count = response.batch_item_failures.len(),
            "completed"
        );
        Ok(response)
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SinkError;
    use crate::lookup::MockPublicIpLookup;
    use crate::message::OutputRecord;
    use crate::sink::MockRecordSink;
    use lambda_runtime::Context;
    use serde_json::json;
    use std::collections::HashMap;
    use aws_sdk_dynamodb::types::AttributeValue;
    use std::sync::Arc;

    fn sqs_message(id: Option<&str>, body: &str) -> SqsMessage {
        SqsMessage {
            message_id: id.map(str::to_string),
            body: Some(body.to_string()),
            ..Default::default()
        }
    }

    fn string_attribute(data_type: &str, value: &str) -> SqsMessageAttribute {
        SqsMessageAttribute {
            string_value: Some(value.to_string()),
            data_type: Some(data_type.to_string()),
            ..Default::default()
        }
    }

    fn event(records: Vec<SqsMessage>) -> LambdaEvent<Option<SqsEvent>> {
        LambdaEvent::new(Some(SqsEvent { records }), Context::default())
    }

    fn lookup() -> MockPublicIpLookup {
        let mut lookup = MockPublicIpLookup::new();
        lookup
            .expect_lookup()
            .returning(|| Ok("9.9.9.9".to_string()));
        lookup
    }

    #[test]
    fn test_to_inbound_message_maps_attributes() {
        let mut record = sqs_message(Some("m1"), "hello");
        record.message_attributes = HashMap::from([
            ("k".to_string(), string_attribute("String", "v")),
            ("count".to_string(), string_attribute("Number", "42")),
            ("odd".to_string(), string_attribute("Number", "not-a-number")),
        ]);

        let message = to_inbound_message(record);

        assert_eq!(message.id.as_deref(), Some("m1"));
        assert_eq!(message.body, b"hello".to_vec());
        assert_eq!(message.properties.get("k"), Some(&json!("v")));
        assert_eq!(message.properties.get("count"), Some(&json!(42)));
        assert_eq!(message.properties.get("odd"), Some(&json!("not-a-number")));
    }

    #[test]
    fn test_to_inbound_message_keeps_number_precision() {
        let mut record = sqs_message(Some("m1"), "hello");
        record.message_attributes = HashMap::from([
            ("big".to_string(), string_attribute("Number", "12345678901234567890123")),
            ("dec".to_string(), string_attribute("Number", "0.10000000000000000000001")),
            ("exp".to_string(), string_attribute("Number", "1e3")),
            ("neg".to_string(), string_attribute("Number", "-17")),
            ("half".to_string(), string_attribute("Number.float", "2.5")),
        ]);

        let message = to_inbound_message(record);

        assert_eq!(message.properties["big"], json!("12345678901234567890123"));
        assert_eq!(message.properties["dec"], json!("0.10000000000000000000001"));
        assert_eq!(message.properties["exp"], json!("1e3"));
        assert_eq!(message.properties["neg"], json!(-17));
        assert_eq!(message.properties["half"], json!(2.5));

        let record = OutputRecord {
            id: "m1".to_string(),
            message: "hello".to_string(),
            properties: message.properties,
            public_ip_address: "9.9.9.9".to_string(),
        };
        let item = crate::sink::record_to_item(&record);
        let AttributeValue::M(properties) = &item["properties"] else {
            panic!("properties should be a map attribute");
        };
        assert_eq!(
            properties["big"],
            AttributeValue::S("12345678901234567890123".to_string())
        );
    }

    #[test]
    fn test_to_inbound_message_without_body() {
        let record = SqsMessage::default();

        let message = to_inbound_message(record);

        assert!(message.id.is_none());
        assert!(message.body.is_empty());
        assert!(message.properties.is_empty());
    }

    #[tokio::test]
    async fn test_handler_null_payload_is_noop() {
        let mut sink = MockRecordSink::new();
        sink.expect_append().never();
        let mut lookup = MockPublicIpLookup::new();
        lookup.expect_lookup().never();
        let enricher = MessageEnricher::new(Arc::new(lookup), Arc::new(sink));

        let response = function_handler(&enricher, LambdaEvent::new(None, Context::default()))
            .await
            .unwrap();

        assert!(response.batch_item_failures.is_empty());
    }

    #[tokio::test]
    async fn test_handler_stores_every_record() {
        let mut sink = MockRecordSink::new();
        sink.expect_append()
            .withf(|record: &OutputRecord| record.public_ip_address == "9.9.9.9")
            .times(2)
            .returning(|_| Ok(()));
        let enricher = MessageEnricher::new(Arc::new(lookup()), Arc::new(sink));

        let response = function_handler(
            &enricher,
            event(vec![sqs_message(Some("a"), "one"), sqs_message(Some("b"), "two")]),
        )
        .await
        .unwrap();

        assert!(response.batch_item_failures.is_empty());
    }

    #[tokio::test]
    async fn test_handler_reports_failed_records() {
        let mut sink = MockRecordSink::new();
        sink.expect_append().times(2).returning(|record| {
            if record.id == "bad" {
                Err(SinkError::Write {
                    id: record.id.clone(),
                    table: "records".to_string(),
                    source: "throttled".into(),
                })
            } else {
                Ok(())
            }
        });
        let enricher = MessageEnricher::new(Arc::new(lookup()), Arc::new(sink));

        let response = function_handler(
            &enricher,
            event(vec![sqs_message(Some("good"), "one"), sqs_message(Some("bad"), "two")]),
        )
        .await
        .unwrap();

        assert_eq!(response.batch_item_failures.len(), 1);
        assert_eq!(response.batch_item_failures[0].item_identifier, "bad");
    }

    #[tokio::test]
    async fn test_handler_fails_invocation_for_unreportable_record() {
        let mut sink = MockRecordSink::new();
        sink.expect_append().times(1).returning(|record| {
            Err(SinkError::Write {
                id: record.id.clone(),
                table: "records".to_string(),
                source: "throttled".into(),
            })
        });
        let enricher = MessageEnricher::new(Arc::new(lookup()), Arc::new(sink));

        let result = function_handler(&enricher, event(vec![sqs_message(None, "orphan")])).await;

        assert!(result.is_err());
    }
}
