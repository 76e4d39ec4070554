// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Entry point for one incoming raw batch.
//!
//! Record building is synchronous; only delivery suspends. Each non-empty
//! chunk is shipped by its own spawned task, and the handles are returned so
//! the caller can keep its scope alive until every delivery settles without
//! blocking the dispatch call itself. Deliveries of different chunks run
//! concurrently with no ordering guarantee. Failures are logged and never
//! surface to the dispatch caller.

use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::batcher;
use crate::config::Config;
use crate::event::TailEvent;
use crate::fields::{FieldResolver, Sampler};
use crate::record::RecordBuilder;
use crate::sink::LogsApi;

pub struct Dispatcher {
    config: Config,
    builder: RecordBuilder,
}

impl Dispatcher {
    pub fn new(config: Config) -> Self {
        Self::with_sampler(config, Sampler::default())
    }

    /// Construct with an explicit miss-diagnostic sampler (deterministic in
    /// tests).
    pub fn with_sampler(config: Config, sampler: Sampler) -> Self {
        let builder = RecordBuilder::new(&config, FieldResolver::new(sampler));
        Dispatcher { config, builder }
    }

    /// Process one raw batch: partition into chunks, build records, and
    /// schedule one delivery per non-empty chunk. Returns the delivery
    /// handles; the call itself never fails and never blocks on delivery.
    pub fn dispatch(&self, events: Vec<TailEvent>) -> Vec<JoinHandle<()>> {
        if let Err(err) = self.config.validate() {
            error!("Not forwarding {} tail events: {err}", events.len());
            return Vec::new();
        }
        // validate() guarantees both are present
        let (Some(endpoint), Some(api_key)) = (&self.config.endpoint, &self.config.api_key) else {
            return Vec::new();
        };

        let api = match LogsApi::new(endpoint.clone(), api_key.clone(), self.config.timeout) {
            Ok(api) => api,
            Err(err) => {
                error!("Failed to create ingestion client: {err}");
                return Vec::new();
            }
        };

        let chunks = match batcher::split(events, self.config.chunk_size) {
            Ok(chunks) => chunks,
            Err(err) => {
                error!("Failed to partition tail events: {err}");
                return Vec::new();
            }
        };

        let mut handles = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let records: Vec<_> = chunk
                .iter()
                .flat_map(|event| self.builder.records_for_event(event))
                .collect();
            if records.is_empty() {
                continue;
            }

            debug!("Scheduling delivery of {} log records", records.len());
            let api = api.clone();
            handles.push(tokio::spawn(async move {
                if let Err(err) = api.ship(&records).await {
                    error!("Failed to deliver {} log records: {err}", records.len());
                }
            }));
        }
        handles
    }
}
