// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! One invocation of the transformation: decode, transform, fit the response
//! into its size budget, and reingest whatever did not fit.
//!
//! ```text
//!   records ──> decode + transform ──> budget ──┬──> response
//!                                               │
//!                          oversized or over ───┤
//!                          the running total    v
//!                                       split / whole ──> reingest (<= 500 per call)
//! ```
//!
//! Each input record ends in exactly one state:
//!
//! - `Ok` with transformed data,
//! - `Dropped` for control messages and for records handed to reingestion,
//! - `ProcessingFailed` for undecodable payloads, unknown message types and
//!   oversized records that hold a single log event.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::budget::{Overflow, SizeBudgetTracker};
use crate::config::ProcessorConfig;
use crate::constants::MAX_UNITS_PER_BATCH;
use crate::destination::Destination;
use crate::envelope::{EnvelopeKind, LogEnvelope};
use crate::error::ProcessorError;
use crate::records::{FirehoseEvent, FirehoseResponse, InputRecord, OutputRecord, RecordStatus};
use crate::reingest::{BatchPut, ReingestionClient, ReingestionUnit};
use crate::splitter::{split_payload, SplitError};
use crate::transformer::{render_entries, EventTransformer};

pub struct Processor {
    transformer: Box<dyn EventTransformer>,
    client: ReingestionClient,
    size_ceiling_bytes: usize,
    max_reingest_attempts: u32,
}

impl Processor {
    pub fn new(config: &ProcessorConfig, capability: Arc<dyn BatchPut>) -> Self {
        Processor {
            transformer: config.output_format.transformer(),
            client: ReingestionClient::new(capability, config.retry_strategy()),
            size_ceiling_bytes: config.size_ceiling_bytes,
            max_reingest_attempts: config.max_reingest_attempts,
        }
    }

    /// Replaces the configured transformer.
    #[must_use]
    pub fn with_transformer(mut self, transformer: Box<dyn EventTransformer>) -> Self {
        self.transformer = transformer;
        self
    }

    /// Runs one invocation.
    ///
    /// On error nothing is returned for any record: the caller is expected to
    /// retry the whole invocation.
    pub async fn process(&self, event: &FirehoseEvent) -> Result<FirehoseResponse, ProcessorError> {
        let destination = Destination::resolve(event)?;

        let (mut records, payloads): (Vec<OutputRecord>, Vec<Option<Vec<u8>>>) = event
            .records
            .iter()
            .map(|record| self.transform_record(record))
            .unzip();

        let units = self.withdraw_overflow(&destination, &event.records, payloads, &mut records);
        self.reingest(&destination, units, event.records.len())
            .await?;

        Ok(FirehoseResponse { records })
    }

    /// Returns the record's result and, for `Ok` records, its compressed
    /// payload in case it has to be reingested.
    fn transform_record(&self, record: &InputRecord) -> (OutputRecord, Option<Vec<u8>>) {
        let payload = match record.payload() {
            Ok(payload) => payload,
            Err(e) => {
                warn!(
                    "PROCESSOR | Record {} has invalid base64 data: {e}",
                    record.id
                );
                return (OutputRecord::processing_failed(&record.id), None);
            }
        };

        let envelope = match LogEnvelope::decode(&payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(
                    "PROCESSOR | Failed to decode record {} ({} bytes): {e}",
                    record.id,
                    payload.len()
                );
                return (OutputRecord::processing_failed(&record.id), None);
            }
        };

        match envelope.kind() {
            EnvelopeKind::Control => {
                debug!("PROCESSOR | Dropping control message {}", record.id);
                (OutputRecord::dropped(&record.id), None)
            }
            EnvelopeKind::Data => {
                let rendered = render_entries(self.transformer.as_ref(), &envelope.entries);
                (
                    OutputRecord::ok(&record.id, rendered.as_bytes()),
                    Some(payload),
                )
            }
            EnvelopeKind::Unknown => {
                warn!(
                    "PROCESSOR | Record {} has unsupported messageType {:?}",
                    record.id, envelope.message_type
                );
                (OutputRecord::processing_failed(&record.id), None)
            }
        }
    }

    /// Charges every record against the size budget in input order and pulls
    /// the ones that do not fit out of the response.
    ///
    /// Returns the units to reingest in the order they were discovered.
    fn withdraw_overflow(
        &self,
        destination: &Destination,
        inputs: &[InputRecord],
        payloads: Vec<Option<Vec<u8>>>,
        records: &mut [OutputRecord],
    ) -> Vec<ReingestionUnit> {
        let mut tracker = SizeBudgetTracker::new(self.size_ceiling_bytes);
        let mut units = Vec::new();

        for ((input, payload), record) in inputs.iter().zip(payloads).zip(records.iter_mut()) {
            // only `Ok` records overflow, and those always carry their payload
            let (Some(overflow), Some(payload)) = (tracker.account(record), payload) else {
                continue;
            };
            let size = record.data_len();
            let partition_key = input.partition_key().unwrap_or(&input.id);

            match overflow {
                Overflow::Cumulative => {
                    debug!(
                        "PROCESSOR | Record {} ({size} bytes) does not fit in the response ({} of {} bytes used), reingesting it",
                        input.id,
                        tracker.accounted(),
                        tracker.ceiling()
                    );
                    units.push(ReingestionUnit::new(destination.mode, payload, partition_key));
                    record.mark_dropped();
                }
                Overflow::SingleRecord => match split_payload(&payload) {
                    Ok((first, second)) => {
                        info!(
                            "PROCESSOR | Record {} ({size} bytes) is larger than {} bytes, reingesting it as two halves",
                            input.id,
                            tracker.ceiling()
                        );
                        units.push(ReingestionUnit::new(destination.mode, first, partition_key));
                        units.push(ReingestionUnit::new(destination.mode, second, partition_key));
                        record.mark_dropped();
                    }
                    Err(SplitError::Unsplittable { entries }) => {
                        error!(
                            "PROCESSOR | Record {} ({size} bytes) is larger than {} bytes but holds {entries} log event(s), marking it as failed",
                            input.id,
                            tracker.ceiling()
                        );
                        record.mark_processing_failed();
                    }
                    Err(e) => {
                        error!(
                            "PROCESSOR | Failed to split record {} ({size} bytes): {e}",
                            input.id
                        );
                        record.mark_processing_failed();
                    }
                },
            }
        }

        debug_assert!(
            records
                .iter()
                .filter(|record| record.status() == RecordStatus::Ok)
                .map(OutputRecord::accounted_size)
                .sum::<usize>()
                <= self.size_ceiling_bytes
        );
        units
    }

    async fn reingest(
        &self,
        destination: &Destination,
        units: Vec<ReingestionUnit>,
        total_records: usize,
    ) -> Result<(), ProcessorError> {
        if units.is_empty() {
            info!("PROCESSOR | No records needed to be reingested.");
            return Ok(());
        }

        let total = units.len();
        let mut reingested = 0;
        let mut remaining = units;
        while !remaining.is_empty() {
            let rest = remaining.split_off(remaining.len().min(MAX_UNITS_PER_BATCH));
            let chunk_len = remaining.len();
            if let Err(e) = self
                .client
                .send(destination, remaining, self.max_reingest_attempts)
                .await
            {
                error!("PROCESSOR | Failed to reingest records. {e}");
                return Err(e.into());
            }
            reingested += chunk_len;
            info!(
                "PROCESSOR | Reingested {reingested}/{total} records out of {total_records} in to {} stream",
                destination.name
            );
            remaining = rest;
        }

        info!(
            "PROCESSOR | Reingested all {total} records out of {total_records} in to {} stream",
            destination.name
        );
        Ok(())
    }
}
