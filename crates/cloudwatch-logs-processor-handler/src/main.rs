// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::io::Read;
use std::sync::Arc;
use std::{env, fs, io, process};

use anyhow::Context;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use cloudwatch_logs_processor::http_put::HttpBatchPut;
use cloudwatch_logs_processor::{FirehoseEvent, Processor, ProcessorConfig};

#[tokio::main]
pub async fn main() {
    let config = match ProcessorConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            process::exit(2);
        }
    };

    if let Err(e) = init_logging(&config.log_level) {
        eprintln!("Failed to set up logging: {e:#}");
        process::exit(2);
    }
    debug!("Logging subsystem enabled");

    if let Err(e) = run(&config).await {
        error!("PROCESSOR | Invocation failed: {e:#}");
        process::exit(1);
    }
}

fn init_logging(log_level: &str) -> anyhow::Result<()> {
    let env_filter = format!("h2=off,hyper=off,rustls=off,{log_level}");

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).context("could not parse log level in configuration")?,
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;
    Ok(())
}

async fn run(config: &ProcessorConfig) -> anyhow::Result<()> {
    let raw = match env::args().nth(1) {
        Some(path) => fs::read_to_string(&path)
            .with_context(|| format!("failed to read invocation event from {path}"))?,
        None => {
            let mut raw = String::new();
            io::stdin()
                .read_to_string(&mut raw)
                .context("failed to read invocation event from stdin")?;
            raw
        }
    };
    let event: FirehoseEvent =
        serde_json::from_str(&raw).context("failed to parse invocation event")?;
    info!(
        "PROCESSOR | Processing {} records of invocation {}",
        event.records.len(),
        event.invocation_id.as_deref().unwrap_or("<none>")
    );

    let put = HttpBatchPut::from_config(config).context("failed to build destination client")?;
    let processor = Processor::new(config, Arc::new(put));
    let response = processor.process(&event).await?;

    let output = serde_json::to_string(&response).context("failed to serialize response")?;
    println!("{output}");
    Ok(())
}
