// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::str::FromStr;

use serde_json::json;

use crate::envelope::LogEntry;

/// Renders one log entry as output text.
///
/// Outputs of all entries of an envelope are concatenated without any
/// separator, so implementations emit their own delimiter.
pub trait EventTransformer: Send + Sync {
    fn transform(&self, entry: &LogEntry) -> String;
}

/// The message followed by a newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageLineTransformer;

impl EventTransformer for MessageLineTransformer {
    fn transform(&self, entry: &LogEntry) -> String {
        format!("{}\n", entry.message)
    }
}

/// One JSON object per line with the entry's id, timestamp and message.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLineTransformer;

impl EventTransformer for JsonLineTransformer {
    fn transform(&self, entry: &LogEntry) -> String {
        let line = json!({
            "id": entry.id,
            "timestamp": entry.timestamp,
            "message": entry.message,
        });
        format!("{line}\n")
    }
}

/// Built-in transformer selected through configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Message,
    Json,
}

impl OutputFormat {
    #[must_use]
    pub fn transformer(self) -> Box<dyn EventTransformer> {
        match self {
            OutputFormat::Message => Box::new(MessageLineTransformer),
            OutputFormat::Json => Box::new(JsonLineTransformer),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "message" => Ok(OutputFormat::Message),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!(
                "Invalid output format '{other}'. Must be one of: message, json"
            )),
        }
    }
}

/// Concatenates the rendered entries in order.
pub fn render_entries(transformer: &dyn EventTransformer, entries: &[LogEntry]) -> String {
    entries
        .iter()
        .map(|entry| transformer.transform(entry))
        .collect()
}
