// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Limits imposed by the Firehose transformation contract and the destination
//! batch APIs.

/// Maximum accounted size of all `Ok` records returned from one invocation.
///
/// Below the 6 MiB platform limit, since the JSON framing of the response is
/// not accounted record by record.
pub const MAX_RESPONSE_SIZE_BYTES: usize = 6_000_000;

/// Maximum number of units accepted by a single `PutRecordBatch` or
/// `PutRecords` call.
pub const MAX_UNITS_PER_BATCH: usize = 500;

/// Number of attempts made for one reingestion chunk before the invocation is
/// failed.
pub const MAX_REINGEST_ATTEMPTS: u32 = 20;

/// Base delay of the default capped exponential backoff.
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 100;

/// Upper bound of the default capped exponential backoff.
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 2_000;

/// Per-request timeout used by the HTTP destination client.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// `messageType` of the heartbeat CloudWatch Logs sends when a subscription
/// is created.
pub(crate) const CONTROL_MESSAGE_TYPE: &str = "CONTROL_MESSAGE";

/// `messageType` of envelopes carrying log events.
pub(crate) const DATA_MESSAGE_TYPE: &str = "DATA_MESSAGE";
