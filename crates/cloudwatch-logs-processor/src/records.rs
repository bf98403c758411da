// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Request and response shapes of the Firehose data transformation contract.

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The event a Firehose delivery stream hands to its transformation function.
///
/// Exactly one of `delivery_stream_arn` and `source_kinesis_stream_arn` is
/// expected; the latter is set when the delivery stream reads from a Kinesis
/// data stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirehoseEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_stream_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_kinesis_stream_arn: Option<String>,
    #[serde(default)]
    pub records: Vec<InputRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputRecord {
    #[serde(rename = "recordId")]
    pub id: String,
    /// Base64 of the gzip-compressed subscription payload.
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approximate_arrival_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kinesis_record_metadata: Option<KinesisRecordMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KinesisRecordMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_key: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InputRecord {
    pub fn new(id: impl Into<String>, payload: &[u8]) -> Self {
        InputRecord {
            id: id.into(),
            data: base64::engine::general_purpose::STANDARD.encode(payload),
            approximate_arrival_timestamp: None,
            kinesis_record_metadata: None,
        }
    }

    #[must_use]
    pub fn with_partition_key(mut self, partition_key: impl Into<String>) -> Self {
        self.kinesis_record_metadata = Some(KinesisRecordMetadata {
            partition_key: Some(partition_key.into()),
            extra: Map::new(),
        });
        self
    }

    /// The raw (still compressed) payload bytes.
    pub fn payload(&self) -> Result<Vec<u8>, base64::DecodeError> {
        base64::engine::general_purpose::STANDARD.decode(self.data.as_bytes())
    }

    #[must_use]
    pub fn partition_key(&self) -> Option<&str> {
        self.kinesis_record_metadata
            .as_ref()
            .and_then(|metadata| metadata.partition_key.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    Ok,
    Dropped,
    ProcessingFailed,
}

/// Transformation result for one input record.
///
/// `data` is present exactly when the status is [`RecordStatus::Ok`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    #[serde(rename = "recordId")]
    id: String,
    #[serde(rename = "result")]
    status: RecordStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<String>,
}

impl OutputRecord {
    pub fn ok(id: impl Into<String>, transformed: &[u8]) -> Self {
        OutputRecord {
            id: id.into(),
            status: RecordStatus::Ok,
            data: Some(base64::engine::general_purpose::STANDARD.encode(transformed)),
        }
    }

    pub fn dropped(id: impl Into<String>) -> Self {
        OutputRecord {
            id: id.into(),
            status: RecordStatus::Dropped,
            data: None,
        }
    }

    pub fn processing_failed(id: impl Into<String>) -> Self {
        OutputRecord {
            id: id.into(),
            status: RecordStatus::ProcessingFailed,
            data: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn status(&self) -> RecordStatus {
        self.status
    }

    /// Base64 of the transformed output.
    #[must_use]
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    /// Length of the base64 data, zero when there is none.
    #[must_use]
    pub fn data_len(&self) -> usize {
        self.data.as_ref().map_or(0, String::len)
    }

    /// Bytes this record contributes to the response: `id` plus `data`.
    #[must_use]
    pub fn accounted_size(&self) -> usize {
        self.id.len() + self.data_len()
    }

    /// Withdraws the data; the record is delivered by reingestion instead.
    pub fn mark_dropped(&mut self) {
        self.status = RecordStatus::Dropped;
        self.data = None;
    }

    pub fn mark_processing_failed(&mut self) {
        self.status = RecordStatus::ProcessingFailed;
        self.data = None;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirehoseResponse {
    pub records: Vec<OutputRecord>,
}
