// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Forwarder for edge-worker tail events.
//!
//! This crate ingests batches of tail events emitted by upstream edge workers
//! (console logs, uncaught exceptions, and fetch records), normalizes each
//! item into a flat canonical log record, and ships the records to a
//! log-ingestion HTTP endpoint in fixed-size chunks.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod batcher;
pub mod cdn;
pub mod config;
pub mod dispatcher;
pub mod event;
pub mod fields;
pub mod record;
pub mod sink;

pub use config::Config;
pub use dispatcher::Dispatcher;
pub use event::TailEvent;
