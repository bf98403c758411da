// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use crate::records::FirehoseEvent;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum DestinationError {
    #[error("event has neither deliveryStreamArn nor sourceKinesisStreamArn")]
    MissingSource,

    #[error("event has both deliveryStreamArn and sourceKinesisStreamArn")]
    AmbiguousSource,

    #[error("malformed stream ARN '{0}'")]
    MalformedArn(String),
}

/// Which batch API overflow is sent back through.
///
/// Both APIs take an ordered list of records and answer with a positionally
/// aligned list of per-record results; they differ only in member names and
/// in the partition key the Kinesis variant requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationMode {
    /// Kinesis Data Streams `PutRecords`, partition-keyed.
    KeyedStream,
    /// Firehose `PutRecordBatch`.
    UnkeyedStream,
}

impl DestinationMode {
    #[must_use]
    pub fn is_keyed(self) -> bool {
        matches!(self, DestinationMode::KeyedStream)
    }

    /// Service prefix of the regional endpoint.
    #[must_use]
    pub fn service(self) -> &'static str {
        match self {
            DestinationMode::KeyedStream => "kinesis",
            DestinationMode::UnkeyedStream => "firehose",
        }
    }

    #[must_use]
    pub fn operation(self) -> &'static str {
        match self {
            DestinationMode::KeyedStream => "PutRecords",
            DestinationMode::UnkeyedStream => "PutRecordBatch",
        }
    }

    /// Value of the `X-Amz-Target` header.
    #[must_use]
    pub fn target(self) -> &'static str {
        match self {
            DestinationMode::KeyedStream => "Kinesis_20131202.PutRecords",
            DestinationMode::UnkeyedStream => "Firehose_20150804.PutRecordBatch",
        }
    }

    /// Request member naming the stream.
    #[must_use]
    pub fn stream_name_member(self) -> &'static str {
        match self {
            DestinationMode::KeyedStream => "StreamName",
            DestinationMode::UnkeyedStream => "DeliveryStreamName",
        }
    }

    /// Response member holding the per-record results.
    #[must_use]
    pub fn results_member(self) -> &'static str {
        match self {
            DestinationMode::KeyedStream => "Records",
            DestinationMode::UnkeyedStream => "RequestResponses",
        }
    }
}

impl fmt::Display for DestinationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.operation())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub mode: DestinationMode,
    pub region: String,
    pub name: String,
}

impl Destination {
    /// Picks the stream the invocation's records came from.
    pub fn resolve(event: &FirehoseEvent) -> Result<Self, DestinationError> {
        match (
            event.source_kinesis_stream_arn.as_deref(),
            event.delivery_stream_arn.as_deref(),
        ) {
            (Some(_), Some(_)) => Err(DestinationError::AmbiguousSource),
            (Some(arn), None) => Self::from_arn(DestinationMode::KeyedStream, arn),
            (None, Some(arn)) => Self::from_arn(DestinationMode::UnkeyedStream, arn),
            (None, None) => Err(DestinationError::MissingSource),
        }
    }

    /// Region is the fourth `:` field, the name the second `/` field, e.g.
    /// `arn:aws:firehose:us-east-1:123456789012:deliverystream/my-stream`.
    pub fn from_arn(mode: DestinationMode, arn: &str) -> Result<Self, DestinationError> {
        let region = arn
            .split(':')
            .nth(3)
            .filter(|region| !region.is_empty())
            .ok_or_else(|| DestinationError::MalformedArn(arn.to_string()))?;
        let name = arn
            .split('/')
            .nth(1)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| DestinationError::MalformedArn(arn.to_string()))?;

        Ok(Destination {
            mode,
            region: region.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stream {} ({})", self.mode.service(), self.name, self.region)
    }
}
