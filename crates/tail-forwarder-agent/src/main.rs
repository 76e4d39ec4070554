// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::env;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use tail_forwarder::{Config, Dispatcher, TailEvent};

#[tokio::main]
pub async fn main() {
    let log_level = env::var("TAIL_FORWARDER_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    let env_filter = format!("hyper=off,reqwest=off,rustls=off,{}", log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("Error creating config on tail forwarder startup: {err}");
            return;
        }
    };

    let dispatcher = Dispatcher::new(config);

    // One line of input is one raw batch: a JSON array of owning events.
    // Delivery handles accumulate so the process stays alive until every
    // scheduled delivery settles.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut handles = Vec::new();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Vec<TailEvent>>(&line) {
            Ok(events) => {
                debug!("Dispatching batch of {} tail events", events.len());
                handles.extend(dispatcher.dispatch(events));
            }
            Err(err) => error!("Skipping malformed batch: {err}"),
        }
    }

    for handle in handles {
        if let Err(err) = handle.await {
            error!("Delivery task failed: {err}");
        }
    }
}
