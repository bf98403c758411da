// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::destination::DestinationError;
use crate::reingest::ReingestError;

/// Errors that fail a whole invocation.
///
/// Per-record problems (undecodable payloads, unknown message types,
/// unsplittable records) never surface here; they become `ProcessingFailed`
/// results instead.
#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    #[error("Invalid invocation event: {0}")]
    Destination(#[from] DestinationError),

    #[error("Failed to reingest records: {0}")]
    Reingestion(#[from] ReingestError),
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
