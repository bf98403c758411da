// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! CloudWatch Logs subscription envelopes.
//!
//! CloudWatch Logs delivers each subscription payload as a gzip-compressed JSON
//! document:
//!
//! ```json
//! {
//!   "messageType": "DATA_MESSAGE",
//!   "owner": "123456789012",
//!   "logGroup": "log_group_name",
//!   "logStream": "log_stream_name",
//!   "subscriptionFilters": ["subscription_filter_name"],
//!   "logEvents": [
//!     {"id": "0123...", "timestamp": 1510109208016, "message": "log message 1"}
//!   ]
//! }
//! ```
//!
//! Members this module does not model are kept in `extra` so a re-encoded
//! envelope carries everything the original did.

use std::io::{Read, Write};

use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{CONTROL_MESSAGE_TYPE, DATA_MESSAGE_TYPE};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("failed to decompress payload: {0}")]
    Decompress(#[source] std::io::Error),

    #[error("failed to parse envelope: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("failed to serialize envelope: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to compress envelope: {0}")]
    Compress(#[source] std::io::Error),
}

/// Classification of an envelope by its `messageType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    /// Subscription heartbeat. Carries no log data.
    Control,
    /// Log events to transform.
    Data,
    /// Anything else, including a missing discriminator.
    Unknown,
}

/// A single log event inside a data envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    /// Milliseconds since the epoch.
    pub timestamp: i64,
    pub message: String,
    /// Optional members such as `extractedFields`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LogEntry {
    pub fn new(id: impl Into<String>, timestamp: i64, message: impl Into<String>) -> Self {
        LogEntry {
            id: id.into(),
            timestamp,
            message: message.into(),
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub log_group: String,
    #[serde(default)]
    pub log_stream: String,
    #[serde(default)]
    pub subscription_filters: Vec<String>,
    #[serde(default, rename = "logEvents")]
    pub entries: Vec<LogEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LogEnvelope {
    /// Decompresses and parses one subscription payload.
    ///
    /// A payload that parses but carries an unrecognized `messageType` is
    /// returned successfully; callers check [`LogEnvelope::kind`].
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let mut decoder = GzDecoder::new(payload);
        let mut decompressed = Vec::new();
        decoder
            .read_to_end(&mut decompressed)
            .map_err(DecodeError::Decompress)?;
        Ok(serde_json::from_slice(&decompressed)?)
    }

    /// Serializes back to the subscription JSON shape and gzips the result.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        let json = serde_json::to_vec(self)?;
        gzip(&json).map_err(EncodeError::Compress)
    }

    #[must_use]
    pub fn kind(&self) -> EnvelopeKind {
        match self.message_type.as_deref() {
            Some(CONTROL_MESSAGE_TYPE) => EnvelopeKind::Control,
            Some(DATA_MESSAGE_TYPE) => EnvelopeKind::Data,
            _ => EnvelopeKind::Unknown,
        }
    }

    /// Copy of this envelope carrying `entries` in place of its own.
    #[must_use]
    pub fn with_entries(&self, entries: Vec<LogEntry>) -> Self {
        LogEnvelope {
            message_type: self.message_type.clone(),
            owner: self.owner.clone(),
            log_group: self.log_group.clone(),
            log_stream: self.log_stream.clone(),
            subscription_filters: self.subscription_filters.clone(),
            entries,
            extra: self.extra.clone(),
        }
    }
}

pub(crate) fn gzip(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}
