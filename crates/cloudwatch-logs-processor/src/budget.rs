// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Accounting of the transformation response against its size ceiling.
//!
//! Records are accounted in input order. A record is charged
//! `id.len() + data.len()` where `data` is the base64 text that ends up in the
//! response. Once a record has been admitted it stays admitted; overflow only
//! ever withdraws the record being looked at.

use crate::records::{OutputRecord, RecordStatus};

/// Why a record has to leave the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    /// The record's data alone is over the ceiling. Resending it unchanged
    /// would overflow again, so it has to be split.
    SingleRecord,
    /// The record fits on its own but not next to the records admitted
    /// before it. It is resent whole.
    Cumulative,
}

#[derive(Debug, Clone)]
pub struct SizeBudgetTracker {
    ceiling: usize,
    accounted: usize,
}

impl SizeBudgetTracker {
    #[must_use]
    pub fn new(ceiling: usize) -> Self {
        SizeBudgetTracker {
            ceiling,
            accounted: 0,
        }
    }

    /// Charges `record` against the budget.
    ///
    /// Returns `None` when the record stays in the response. Records that are
    /// not `Ok` carry no data and are never charged.
    pub fn account(&mut self, record: &OutputRecord) -> Option<Overflow> {
        if record.status() != RecordStatus::Ok {
            return None;
        }
        if record.data_len() > self.ceiling {
            return Some(Overflow::SingleRecord);
        }

        let projected = self.accounted + record.accounted_size();
        if projected > self.ceiling {
            return Some(Overflow::Cumulative);
        }
        self.accounted = projected;
        None
    }

    /// Bytes charged by the records admitted so far.
    #[must_use]
    pub fn accounted(&self) -> usize {
        self.accounted
    }

    #[must_use]
    pub fn ceiling(&self) -> usize {
        self.ceiling
    }
}
