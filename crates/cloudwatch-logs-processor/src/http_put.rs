// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! [`BatchPut`] over HTTP using the AWS JSON 1.1 protocol.
//!
//! Firehose and Kinesis Data Streams expose their batch APIs as a `POST /`
//! whose operation is named by the `X-Amz-Target` header. The two request and
//! response documents only differ in member names, which
//! [`DestinationMode`](crate::destination::DestinationMode) supplies.
//!
//! Requests are not signed here. Deployments point `PROCESSOR_ENDPOINT_URL` at
//! a signing proxy or a local emulator when the regional endpoint is not
//! reachable without SigV4.

use core::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::ProcessorConfig;
use crate::destination::Destination;
use crate::reingest::{BatchPut, PutError, ReingestionUnit, UnitResult};

const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

#[derive(Debug, Clone)]
pub struct HttpBatchPut {
    client: reqwest::Client,
    endpoint_override: Option<String>,
}

impl HttpBatchPut {
    pub fn new(
        endpoint_override: Option<String>,
        https_proxy: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, PutError> {
        let mut builder = reqwest::Client::builder().timeout(timeout);
        if let Some(proxy) = https_proxy {
            builder = builder.proxy(reqwest::Proxy::https(proxy)?);
        }
        Ok(HttpBatchPut {
            client: builder.build()?,
            endpoint_override: endpoint_override.map(|url| url.trim_end_matches('/').to_string()),
        })
    }

    pub fn from_config(config: &ProcessorConfig) -> Result<Self, PutError> {
        Self::new(
            config.endpoint_url.clone(),
            config.https_proxy.as_deref(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn endpoint(&self, destination: &Destination) -> String {
        match &self.endpoint_override {
            Some(url) => format!("{url}/"),
            None => format!(
                "https://{}.{}.amazonaws.com/",
                destination.mode.service(),
                destination.region
            ),
        }
    }

    fn request_body(destination: &Destination, units: &[ReingestionUnit]) -> Value {
        let records: Vec<Value> = units
            .iter()
            .map(|unit| {
                let mut record = Map::new();
                record.insert(
                    "Data".to_string(),
                    Value::String(base64::engine::general_purpose::STANDARD.encode(&unit.payload)),
                );
                if let Some(partition_key) = &unit.partition_key {
                    record.insert(
                        "PartitionKey".to_string(),
                        Value::String(partition_key.clone()),
                    );
                }
                Value::Object(record)
            })
            .collect();

        let mut body = Map::new();
        body.insert(
            destination.mode.stream_name_member().to_string(),
            Value::String(destination.name.clone()),
        );
        body.insert("Records".to_string(), Value::Array(records));
        Value::Object(body)
    }

    fn parse_results(destination: &Destination, body: &str) -> Result<Vec<UnitResult>, PutError> {
        let member = destination.mode.results_member();
        let document: Value = serde_json::from_str(body)
            .map_err(|e| PutError::InvalidResponse(format!("response is not JSON: {e}")))?;
        let Some(entries) = document.get(member).and_then(Value::as_array) else {
            return Err(PutError::InvalidResponse(format!(
                "response has no '{member}' array"
            )));
        };

        Ok(entries
            .iter()
            .map(|entry| UnitResult {
                error_code: entry
                    .get("ErrorCode")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                error_message: entry
                    .get("ErrorMessage")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
            .collect())
    }
}

#[async_trait]
impl BatchPut for HttpBatchPut {
    async fn batched_put(
        &self,
        destination: &Destination,
        units: &[ReingestionUnit],
    ) -> Result<Vec<UnitResult>, PutError> {
        let url = self.endpoint(destination);
        let body = Self::request_body(destination, units);
        debug!(
            "REINGEST | Calling {} on {url} with {} records",
            destination.mode.operation(),
            units.len()
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Amz-Target", destination.mode.target())
            .body(body.to_string())
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(PutError::Status { status, body: text });
        }
        Self::parse_results(destination, &text)
    }
}
