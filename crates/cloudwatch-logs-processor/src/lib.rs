// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Firehose data transformation for CloudWatch Logs subscription records.
//!
//! Every record of a [`records::FirehoseEvent`] carries a gzip-compressed
//! subscription payload. The [`processor::Processor`] turns data payloads into
//! newline-separated log lines, drops control messages and keeps the response
//! under its size ceiling by putting whatever does not fit back on the source
//! stream through a [`reingest::BatchPut`] capability.
//!
//! - [`envelope`]: the subscription payload and its gzip/JSON codec
//! - [`transformer`]: per-entry rendering
//! - [`budget`]: response size accounting
//! - [`splitter`]: halving oversized data envelopes
//! - [`destination`]: where reingested records go
//! - [`reingest`]: batched puts with partial-failure retry
//! - [`http_put`]: the AWS JSON 1.1 implementation of [`reingest::BatchPut`]

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod budget;
pub mod config;
pub mod constants;
pub mod destination;
pub mod envelope;
pub mod error;
pub mod http_put;
pub mod processor;
pub mod records;
pub mod reingest;
pub mod splitter;
pub mod transformer;

pub use config::ProcessorConfig;
pub use error::{ConfigError, ProcessorError};
pub use processor::Processor;
pub use records::{FirehoseEvent, FirehoseResponse, InputRecord, OutputRecord, RecordStatus};
