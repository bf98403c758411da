// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Helper functions for integration tests

use base64::Engine;
use cloudwatch_logs_processor::envelope::{LogEntry, LogEnvelope};
use cloudwatch_logs_processor::records::{FirehoseEvent, InputRecord, OutputRecord};
use cloudwatch_logs_processor::ProcessorConfig;
use serde_json::Map;

pub const DELIVERY_STREAM_ARN: &str =
    "arn:aws:firehose:us-east-1:123456789012:deliverystream/cwl-to-s3";
pub const SOURCE_STREAM_ARN: &str = "arn:aws:kinesis:eu-west-1:123456789012:stream/cwl-source";

fn envelope(message_type: &str, messages: &[String]) -> LogEnvelope {
    LogEnvelope {
        message_type: Some(message_type.to_string()),
        owner: "123456789012".to_string(),
        log_group: "/aws/lambda/checkout".to_string(),
        log_stream: "2023/12/01/[$LATEST]abcd1234".to_string(),
        subscription_filters: vec!["to-firehose".to_string()],
        entries: messages
            .iter()
            .enumerate()
            .map(|(i, message)| {
                LogEntry::new(
                    format!("3195310660696698337880902507980421114328961542429{i:07}"),
                    1_510_109_208_016 + i as i64,
                    message.clone(),
                )
            })
            .collect(),
        extra: Map::new(),
    }
}

/// Gzip-compressed data envelope holding one entry per message
pub fn data_payload(messages: &[String]) -> Vec<u8> {
    envelope("DATA_MESSAGE", messages)
        .encode()
        .expect("Failed to encode data envelope")
}

pub fn control_payload() -> Vec<u8> {
    envelope(
        "CONTROL_MESSAGE",
        &["CWL CONTROL MESSAGE: Checking health of destination Firehose.".to_string()],
    )
    .encode()
    .expect("Failed to encode control envelope")
}

/// A message whose transformed line (message plus newline) is `line_len` bytes
pub fn message_of_line_len(line_len: usize) -> String {
    "x".repeat(line_len - 1)
}

/// Delivery stream event, reingestion goes through `PutRecordBatch`
pub fn firehose_event(records: Vec<InputRecord>) -> FirehoseEvent {
    FirehoseEvent {
        invocation_id: Some("invocation-1".to_string()),
        region: Some("us-east-1".to_string()),
        delivery_stream_arn: Some(DELIVERY_STREAM_ARN.to_string()),
        records,
        ..Default::default()
    }
}

/// Kinesis-sourced event, reingestion goes through `PutRecords`
pub fn kinesis_event(records: Vec<InputRecord>) -> FirehoseEvent {
    FirehoseEvent {
        invocation_id: Some("invocation-1".to_string()),
        region: Some("eu-west-1".to_string()),
        source_kinesis_stream_arn: Some(SOURCE_STREAM_ARN.to_string()),
        records,
        ..Default::default()
    }
}

/// Default configuration without backoff delays
pub fn test_config() -> ProcessorConfig {
    ProcessorConfig {
        retry_base_delay_ms: 0,
        ..Default::default()
    }
}

/// Decoded bytes of an `Ok` record's data
pub fn output_bytes(record: &OutputRecord) -> Vec<u8> {
    base64::engine::general_purpose::STANDARD
        .decode(record.data().expect("record has no data"))
        .expect("record data is not base64")
}
