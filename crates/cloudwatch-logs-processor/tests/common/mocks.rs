// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Mock implementations of the batched-put capability for testing

use cloudwatch_logs_processor::destination::Destination;
use cloudwatch_logs_processor::reingest::{BatchPut, PutError, ReingestionUnit, UnitResult};
use std::sync::Mutex;

/// Accepts every unit and remembers each call
#[derive(Default)]
pub struct RecordingBatchPut {
    calls: Mutex<Vec<(Destination, Vec<ReingestionUnit>)>>,
}

impl RecordingBatchPut {
    pub fn calls(&self) -> Vec<(Destination, Vec<ReingestionUnit>)> {
        self.calls.lock().expect("lock poisoned").clone()
    }
}

#[async_trait::async_trait]
impl BatchPut for RecordingBatchPut {
    async fn batched_put(
        &self,
        destination: &Destination,
        units: &[ReingestionUnit],
    ) -> Result<Vec<UnitResult>, PutError> {
        self.calls
            .lock()
            .expect("lock poisoned")
            .push((destination.clone(), units.to_vec()));
        Ok(vec![UnitResult::accepted(); units.len()])
    }
}

/// Fails every call as a whole
#[derive(Default)]
pub struct AlwaysFailingBatchPut {
    calls: Mutex<usize>,
}

impl AlwaysFailingBatchPut {
    pub fn call_count(&self) -> usize {
        *self.calls.lock().expect("lock poisoned")
    }
}

#[async_trait::async_trait]
impl BatchPut for AlwaysFailingBatchPut {
    async fn batched_put(
        &self,
        _destination: &Destination,
        _units: &[ReingestionUnit],
    ) -> Result<Vec<UnitResult>, PutError> {
        *self.calls.lock().expect("lock poisoned") += 1;
        Err(PutError::InvalidResponse(
            "destination unavailable".to_string(),
        ))
    }
}

/// Throttles the last unit of each of the first `throttled_calls` calls,
/// then accepts everything
pub struct ThrottlingBatchPut {
    throttled_calls: usize,
    calls: Mutex<Vec<Vec<ReingestionUnit>>>,
}

impl ThrottlingBatchPut {
    pub fn new(throttled_calls: usize) -> Self {
        ThrottlingBatchPut {
            throttled_calls,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<ReingestionUnit>> {
        self.calls.lock().expect("lock poisoned").clone()
    }
}

#[async_trait::async_trait]
impl BatchPut for ThrottlingBatchPut {
    async fn batched_put(
        &self,
        _destination: &Destination,
        units: &[ReingestionUnit],
    ) -> Result<Vec<UnitResult>, PutError> {
        let call = {
            let mut calls = self.calls.lock().expect("lock poisoned");
            calls.push(units.to_vec());
            calls.len()
        };

        let mut results = vec![UnitResult::accepted(); units.len()];
        if call <= self.throttled_calls {
            if let Some(last) = results.last_mut() {
                *last = UnitResult::rejected(
                    "ProvisionedThroughputExceededException",
                    "Rate exceeded for shard shardId-000000000000",
                );
            }
        }
        Ok(results)
    }
}
