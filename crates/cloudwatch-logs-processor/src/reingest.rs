// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Reingestion of records that did not fit in the transformation response.
//!
//! Records are put back on the stream they came from in chunks of at most
//! [`MAX_UNITS_PER_BATCH`]. Both batch APIs may accept a call while rejecting
//! individual records (throttling, internal failures), so every response is
//! inspected record by record and only the rejected subset is sent again.
//!
//! ```text
//!   units ──> chunk (<= 500) ──> batched_put ──> all accepted? ──> next chunk
//!                                     ^                │ no
//!                                     │                v
//!                                     └── backoff <── failed subset
//!                                                      │ attempts exhausted
//!                                                      v
//!                                               ReingestError
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::constants::MAX_UNITS_PER_BATCH;
use crate::destination::{Destination, DestinationMode};

/// One record to put back on the source stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReingestionUnit {
    /// Gzip-compressed subscription payload, exactly as CloudWatch Logs would
    /// have delivered it.
    pub payload: Vec<u8>,
    /// Only set for [`DestinationMode::KeyedStream`].
    pub partition_key: Option<String>,
}

impl ReingestionUnit {
    pub fn new(mode: DestinationMode, payload: Vec<u8>, partition_key: &str) -> Self {
        ReingestionUnit {
            payload,
            partition_key: mode.is_keyed().then(|| partition_key.to_string()),
        }
    }
}

/// Outcome of one unit inside a batched put, aligned with the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitResult {
    /// Absent when the unit was accepted.
    pub error_code: Option<String>,
    pub error_message: Option<String>,
}

impl UnitResult {
    #[must_use]
    pub fn accepted() -> Self {
        UnitResult::default()
    }

    pub fn rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        UnitResult {
            error_code: Some(code.into()),
            error_message: Some(message.into()),
        }
    }
}

/// Failure of a whole batched-put call.
#[derive(Debug, thiserror::Error)]
pub enum PutError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ReingestError {
    #[error("could not put {failed} records to {destination} after {attempts} attempts. {last_error}")]
    Exhausted {
        destination: String,
        attempts: u32,
        failed: usize,
        last_error: String,
    },
}

/// The `PutRecords` / `PutRecordBatch` capability of a destination.
#[async_trait]
pub trait BatchPut: Send + Sync {
    /// Puts `units` on `destination` in one call.
    ///
    /// On success the returned results are positionally aligned with `units`.
    async fn batched_put(
        &self,
        destination: &Destination,
        units: &[ReingestionUnit],
    ) -> Result<Vec<UnitResult>, PutError>;
}

/// Wait between attempts on the same chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStrategy {
    Immediate,
    /// Fixed delay in milliseconds.
    LinearBackoff(u64),
    /// `base_delay_ms * 2^(attempt - 1)`, capped at `max_delay_ms`.
    ExponentialBackoff { base_delay_ms: u64, max_delay_ms: u64 },
}

impl RetryStrategy {
    /// Delay to wait after `attempt` (1-based) failed.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            RetryStrategy::Immediate => Duration::ZERO,
            RetryStrategy::LinearBackoff(delay_ms) => Duration::from_millis(delay_ms),
            RetryStrategy::ExponentialBackoff {
                base_delay_ms,
                max_delay_ms,
            } => {
                let factor = 1_u64
                    .checked_shl(attempt.saturating_sub(1))
                    .unwrap_or(u64::MAX);
                Duration::from_millis(base_delay_ms.saturating_mul(factor).min(max_delay_ms))
            }
        }
    }
}

#[derive(Clone)]
pub struct ReingestionClient {
    capability: Arc<dyn BatchPut>,
    retry_strategy: RetryStrategy,
}

impl ReingestionClient {
    pub fn new(capability: Arc<dyn BatchPut>, retry_strategy: RetryStrategy) -> Self {
        ReingestionClient {
            capability,
            retry_strategy,
        }
    }

    /// Puts every unit on `destination`, giving each chunk of at most
    /// [`MAX_UNITS_PER_BATCH`] units `max_attempts` tries.
    ///
    /// Chunks are sent one after the other; the first chunk that exhausts its
    /// attempts fails the whole call.
    pub async fn send(
        &self,
        destination: &Destination,
        units: Vec<ReingestionUnit>,
        max_attempts: u32,
    ) -> Result<(), ReingestError> {
        let mut remaining = units;
        while !remaining.is_empty() {
            let rest = remaining.split_off(remaining.len().min(MAX_UNITS_PER_BATCH));
            self.send_chunk(destination, remaining, max_attempts).await?;
            remaining = rest;
        }
        Ok(())
    }

    async fn send_chunk(
        &self,
        destination: &Destination,
        mut pending: Vec<ReingestionUnit>,
        max_attempts: u32,
    ) -> Result<(), ReingestError> {
        let max_attempts = max_attempts.max(1);
        let operation = destination.mode.operation();
        let mut attempts = 0;

        loop {
            attempts += 1;
            let sent = pending.len();

            let outcome = self.capability.batched_put(destination, &pending).await;
            let last_error = match outcome {
                Ok(results) if results.len() == sent => {
                    let mut codes = Vec::new();
                    let mut failed = Vec::new();
                    for (unit, result) in pending.into_iter().zip(results) {
                        if let Some(code) = result.error_code {
                            codes.push(code);
                            failed.push(unit);
                        }
                    }
                    if failed.is_empty() {
                        debug!(
                            "REINGEST | {operation} accepted {sent} records on attempt {attempts}"
                        );
                        return Ok(());
                    }
                    pending = failed;
                    format!("Individual error codes: {}", codes.join(","))
                }
                // A result list that cannot be lined up with the request says
                // nothing about which units landed.
                Ok(results) => format!(
                    "{operation} returned {} results for {sent} records",
                    results.len()
                ),
                Err(e) => e.to_string(),
            };

            if attempts >= max_attempts {
                error!(
                    "REINGEST | Could not put {} records to {destination} after {attempts} attempts. {last_error}",
                    pending.len()
                );
                return Err(ReingestError::Exhausted {
                    destination: destination.to_string(),
                    attempts,
                    failed: pending.len(),
                    last_error,
                });
            }

            let delay = self.retry_strategy.delay(attempts);
            warn!(
                "REINGEST | {} of {sent} records failed while calling {operation} (attempt {attempts}/{max_attempts}), retrying in {} ms. {last_error}",
                pending.len(),
                delay.as_millis()
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tracing_test::traced_test;

    type Responder =
        dyn Fn(usize, &[ReingestionUnit]) -> Result<Vec<UnitResult>, PutError> + Send + Sync;

    struct ScriptedPut {
        calls: Mutex<Vec<Vec<ReingestionUnit>>>,
        responder: Box<Responder>,
    }

    impl ScriptedPut {
        fn new(
            responder: impl Fn(usize, &[ReingestionUnit]) -> Result<Vec<UnitResult>, PutError>
                + Send
                + Sync
                + 'static,
        ) -> Arc<Self> {
            Arc::new(ScriptedPut {
                calls: Mutex::new(Vec::new()),
                responder: Box::new(responder),
            })
        }

        fn calls(&self) -> Vec<Vec<ReingestionUnit>> {
            self.calls.lock().expect("lock poisoned").clone()
        }
    }

    #[async_trait]
    impl BatchPut for ScriptedPut {
        async fn batched_put(
            &self,
            _destination: &Destination,
            units: &[ReingestionUnit],
        ) -> Result<Vec<UnitResult>, PutError> {
            let call = {
                let mut calls = self.calls.lock().expect("lock poisoned");
                calls.push(units.to_vec());
                calls.len() - 1
            };
            (self.responder)(call, units)
        }
    }

    fn destination() -> Destination {
        Destination {
            mode: DestinationMode::UnkeyedStream,
            region: "us-east-1".to_string(),
            name: "logs".to_string(),
        }
    }

    fn units(count: usize) -> Vec<ReingestionUnit> {
        (0..count)
            .map(|i| ReingestionUnit {
                payload: format!("unit-{i}").into_bytes(),
                partition_key: None,
            })
            .collect()
    }

    fn accept_all(units: &[ReingestionUnit]) -> Vec<UnitResult> {
        vec![UnitResult::accepted(); units.len()]
    }

    #[tokio::test]
    async fn test_send_succeeds_on_first_attempt() {
        let put = ScriptedPut::new(|_, units| Ok(accept_all(units)));
        let client = ReingestionClient::new(put.clone(), RetryStrategy::Immediate);

        client
            .send(&destination(), units(3), 20)
            .await
            .expect("send failed");

        assert_eq!(put.calls().len(), 1);
        assert_eq!(put.calls()[0].len(), 3);
    }

    #[tokio::test]
    async fn test_retries_only_failed_subset() {
        let put = ScriptedPut::new(|call, units| {
            if call == 0 {
                Ok(units
                    .iter()
                    .enumerate()
                    .map(|(i, _)| {
                        if i % 2 == 1 {
                            UnitResult::rejected("ServiceUnavailableException", "slow down")
                        } else {
                            UnitResult::accepted()
                        }
                    })
                    .collect())
            } else {
                Ok(accept_all(units))
            }
        });
        let client = ReingestionClient::new(put.clone(), RetryStrategy::Immediate);
        let sent = units(4);

        client
            .send(&destination(), sent.clone(), 20)
            .await
            .expect("send failed");

        let calls = put.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1], vec![sent[1].clone(), sent[3].clone()]);
    }

    #[tokio::test]
    async fn test_always_failing_destination_stops_at_attempt_bound() {
        let put = ScriptedPut::new(|_, _| {
            Err(PutError::InvalidResponse("destination unavailable".to_string()))
        });
        let client = ReingestionClient::new(put.clone(), RetryStrategy::Immediate);

        let result = client.send(&destination(), units(2), 5).await;

        match result {
            Err(ReingestError::Exhausted {
                attempts, failed, ..
            }) => {
                assert_eq!(attempts, 5);
                assert_eq!(failed, 2);
            }
            other => panic!("expected exhausted error, got {other:?}"),
        }
        assert_eq!(put.calls().len(), 5);
    }

    #[tokio::test]
    async fn test_whole_call_failure_resends_everything() {
        let put = ScriptedPut::new(|call, units| {
            if call == 0 {
                Err(PutError::InvalidResponse("boom".to_string()))
            } else {
                Ok(accept_all(units))
            }
        });
        let client = ReingestionClient::new(put.clone(), RetryStrategy::Immediate);
        let sent = units(3);

        client
            .send(&destination(), sent.clone(), 20)
            .await
            .expect("send failed");

        let calls = put.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1], sent);
    }

    #[tokio::test]
    async fn test_misaligned_results_count_as_whole_call_failure() {
        let put = ScriptedPut::new(|call, units| {
            if call == 0 {
                Ok(vec![UnitResult::accepted()])
            } else {
                Ok(accept_all(units))
            }
        });
        let client = ReingestionClient::new(put.clone(), RetryStrategy::Immediate);

        client
            .send(&destination(), units(3), 20)
            .await
            .expect("send failed");

        let calls = put.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].len(), 3);
    }

    #[tokio::test]
    async fn test_large_batches_are_chunked() {
        let put = ScriptedPut::new(|_, units| Ok(accept_all(units)));
        let client = ReingestionClient::new(put.clone(), RetryStrategy::Immediate);

        client
            .send(&destination(), units(1_201), 20)
            .await
            .expect("send failed");

        let sizes: Vec<usize> = put.calls().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![500, 500, 201]);
    }

    #[tokio::test]
    async fn test_exhausted_chunk_stops_later_chunks() {
        let put = ScriptedPut::new(|_, units| {
            Ok(vec![UnitResult::rejected("InternalFailure", "nope"); units.len()])
        });
        let client = ReingestionClient::new(put.clone(), RetryStrategy::Immediate);

        let result = client.send(&destination(), units(700), 2).await;

        assert!(result.is_err());
        // two attempts on the first chunk, nothing on the second
        assert_eq!(put.calls().len(), 2);
        assert!(put.calls().iter().all(|call| call.len() == 500));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_retry_logs_error_codes() {
        let put = ScriptedPut::new(|call, units| {
            if call == 0 {
                Ok(vec![
                    UnitResult::rejected("ServiceUnavailableException", "slow down");
                    units.len()
                ])
            } else {
                Ok(accept_all(units))
            }
        });
        let client = ReingestionClient::new(put, RetryStrategy::Immediate);

        client
            .send(&destination(), units(1), 20)
            .await
            .expect("send failed");

        assert!(logs_contain("Individual error codes: ServiceUnavailableException"));
        assert!(logs_contain("attempt 1/20"));
    }

    #[test]
    fn test_retry_delays() {
        assert_eq!(RetryStrategy::Immediate.delay(3), Duration::ZERO);
        assert_eq!(
            RetryStrategy::LinearBackoff(25).delay(7),
            Duration::from_millis(25)
        );

        let exponential = RetryStrategy::ExponentialBackoff {
            base_delay_ms: 100,
            max_delay_ms: 2_000,
        };
        assert_eq!(exponential.delay(1), Duration::from_millis(100));
        assert_eq!(exponential.delay(2), Duration::from_millis(200));
        assert_eq!(exponential.delay(5), Duration::from_millis(1_600));
        assert_eq!(exponential.delay(6), Duration::from_millis(2_000));
        assert_eq!(exponential.delay(80), Duration::from_millis(2_000));
    }

    #[test]
    fn test_unit_keeps_partition_key_only_for_keyed_streams() {
        let keyed = ReingestionUnit::new(DestinationMode::KeyedStream, vec![1], "pk");
        let unkeyed = ReingestionUnit::new(DestinationMode::UnkeyedStream, vec![1], "pk");

        assert_eq!(keyed.partition_key.as_deref(), Some("pk"));
        assert_eq!(unkeyed.partition_key, None);
    }
}
