// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::envelope::{DecodeError, EncodeError, EnvelopeKind, LogEnvelope};

#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("only data envelopes can be split")]
    NotData,

    #[error("envelope has {entries} log events and cannot be split")]
    Unsplittable { entries: usize },
}

/// Splits a data envelope in two at `floor(len / 2)`.
///
/// Both halves are copies of `envelope` apart from their share of the
/// entries; the first gets the shorter half when the count is odd.
pub fn split_envelope(envelope: &LogEnvelope) -> Result<(LogEnvelope, LogEnvelope), SplitError> {
    if envelope.kind() != EnvelopeKind::Data {
        return Err(SplitError::NotData);
    }
    let count = envelope.entries.len();
    if count < 2 {
        return Err(SplitError::Unsplittable { entries: count });
    }

    let (first, second) = envelope.entries.split_at(count / 2);
    Ok((
        envelope.with_entries(first.to_vec()),
        envelope.with_entries(second.to_vec()),
    ))
}

/// Decodes an original subscription payload, splits it, and re-encodes both
/// halves so they can be put back on the source stream.
///
/// The halves are not checked against any size limit. If one is still too
/// large it is split again when it comes back through the processor.
pub fn split_payload(payload: &[u8]) -> Result<(Vec<u8>, Vec<u8>), SplitError> {
    let envelope = LogEnvelope::decode(payload)?;
    let (first, second) = split_envelope(&envelope)?;
    Ok((first.encode()?, second.encode()?))
}
