// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Normalization of raw tail items into canonical log records.
//!
//! Each owning event contributes one record per console entry, one per
//! uncaught exception, and one for a present fetch sub-event. Records of all
//! three categories share the same correlation-id resolution. Unresolved
//! fields stay absent and are omitted from the wire JSON; the application
//! name is the only field with a string fallback.

use serde::Serialize;
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::cdn;
use crate::config::Config;
use crate::event::{ExceptionEntry, LogEntry, TailEvent};
use crate::fields::FieldResolver;

pub const CATEGORY_CONSOLE: &str = "console";
pub const CATEGORY_EXCEPTION: &str = "exception";
pub const CATEGORY_FETCH: &str = "fetch";

/// Worker-role literal used as the default class name
const DEFAULT_CLASS_NAME: &str = "worker";

/// Placeholder text for fetch events that could not be converted
const FETCH_PLACEHOLDER_TEXT: &str = "no request data available for fetch event";

/// Severity values understood by the ingestion endpoint
pub mod severity {
    pub const DEBUG: u32 = 1;
    pub const INFO: u32 = 3;
    pub const WARN: u32 = 4;
    pub const ERROR: u32 = 5;
}

/// The canonical log record shipped to the ingestion endpoint
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    /// Epoch milliseconds
    pub timestamp: i64,
    pub application_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsystem_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub computer_name: Option<String>,
    pub severity: u32,
    pub text: String,
    pub category: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

/// Builds canonical log records from raw tail events
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    app_name: String,
    subsystem: Option<String>,
    resolver: FieldResolver,
}

impl RecordBuilder {
    pub fn new(config: &Config, resolver: FieldResolver) -> Self {
        RecordBuilder {
            app_name: config.application_name(),
            subsystem: config.subsystem.clone(),
            resolver,
        }
    }

    /// Produce every record the owning event contributes: one per console
    /// entry, one per exception, one for a present fetch sub-event.
    pub fn records_for_event(&self, event: &TailEvent) -> Vec<LogRecord> {
        let mut records = Vec::with_capacity(
            event.logs.len() + event.exceptions.len() + usize::from(event.event.is_some()),
        );
        for entry in &event.logs {
            records.push(self.console_record(entry, event));
        }
        for exception in &event.exceptions {
            records.push(self.exception_record(exception, event));
        }
        if event.event.is_some() {
            records.push(self.fetch_record(event));
        }
        records
    }

    pub fn console_record(&self, entry: &LogEntry, event: &TailEvent) -> LogRecord {
        let mut record = self.base_record(event, entry.timestamp, CATEGORY_CONSOLE);
        record.severity = severity_for_level(&entry.level);
        record.text = join_message(&entry.message);
        record.method_name = Some(entry.level.clone());
        record
    }

    pub fn exception_record(&self, exception: &ExceptionEntry, event: &TailEvent) -> LogRecord {
        let mut record = self.base_record(event, exception.timestamp, CATEGORY_EXCEPTION);
        record.severity = severity::ERROR;
        record.text = serde_json::to_string(exception).unwrap_or_default();
        // exception name, absent if missing; the worker-role default does not
        // apply here
        record.class_name =
            self.resolver
                .resolve(exception.name.as_deref(), "name", "exception entry");
        record.method_name = Some(CATEGORY_EXCEPTION.to_string());
        record
    }

    pub fn fetch_record(&self, event: &TailEvent) -> LogRecord {
        let mut record = self.base_record(event, None, CATEGORY_FETCH);
        record.method_name = Some(CATEGORY_FETCH.to_string());
        match cdn::convert(event, &self.resolver) {
            Ok(cdn_record) => {
                record.text = serde_json::to_string(&cdn_record).unwrap_or_default();
                let status = event
                    .event
                    .as_ref()
                    .and_then(|fetch| fetch.response.as_ref())
                    .and_then(|response| response.status);
                if let Some(status) = status {
                    record.severity = severity_for_status(status);
                }
            }
            Err(err) => {
                debug!("unable to build CDN record: {err}");
                record.text = FETCH_PLACEHOLDER_TEXT.to_string();
            }
        }
        record
    }

    fn base_record(
        &self,
        event: &TailEvent,
        timestamp: Option<i64>,
        category: &'static str,
    ) -> LogRecord {
        let script_name =
            self.resolver
                .resolve(event.script_name.as_deref(), "scriptName", "tail event");
        LogRecord {
            timestamp: timestamp.unwrap_or_else(now_millis),
            application_name: self.app_name.clone(),
            subsystem_name: script_name.clone().or_else(|| self.subsystem.clone()),
            computer_name: script_name,
            severity: severity::INFO,
            text: String::new(),
            category,
            class_name: Some(DEFAULT_CLASS_NAME.to_string()),
            method_name: None,
            thread_id: self.thread_id(event),
        }
    }

    /// Correlation id: ray header on the request, then the cf ray field, then
    /// the owning event's ray id, then the producer identity.
    fn thread_id(&self, event: &TailEvent) -> Option<String> {
        let request = event.event.as_ref().and_then(|fetch| fetch.request.as_ref());
        let header_ray = request.and_then(|request| {
            request
                .headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case("cf-ray"))
                .map(|(_, value)| value.as_str())
        });
        let cf_ray = request
            .and_then(|request| request.cf.as_ref())
            .and_then(|cf| cf.ray.as_deref());

        self.resolver
            .resolve(header_ray, "cf-ray", "request headers")
            .or_else(|| self.resolver.resolve(cf_ray, "ray", "request cf data"))
            .or_else(|| {
                self.resolver
                    .resolve(event.ray_id.as_deref(), "rayId", "tail event")
            })
            .or_else(|| {
                self.resolver
                    .resolve(event.script_name.as_deref(), "scriptName", "tail event")
            })
    }
}

fn severity_for_level(level: &str) -> u32 {
    match level {
        "debug" => severity::DEBUG,
        "info" | "log" => severity::INFO,
        "warn" => severity::WARN,
        "error" => severity::ERROR,
        _ => severity::INFO,
    }
}

fn severity_for_status(status: u16) -> u32 {
    if status >= 500 {
        severity::ERROR
    } else if status >= 400 {
        severity::WARN
    } else {
        severity::INFO
    }
}

/// Console arguments joined into one line: structured values are
/// JSON-serialized, scalars rendered verbatim.
fn join_message(message: &[Value]) -> String {
    message
        .iter()
        .map(|item| match item {
            Value::String(text) => text.clone(),
            Value::Object(_) | Value::Array(_) => {
                serde_json::to_string(item).unwrap_or_default()
            }
            other => other.to_string(),
        })
        .collect::<Vec<String>>()
        .join(" ")
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}
