// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Raw tail-event data model.
//!
//! These types mirror the JSON shape produced by the upstream tail feed. One
//! [`TailEvent`] covers a single worker invocation and may carry console
//! entries, uncaught exceptions, and one fetch sub-event at the same time.
//! Everything the feed does not guarantee is optional; missing-field policy
//! is applied later, during normalization.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One unit of telemetry from a single upstream worker invocation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TailEvent {
    /// Identity of the producing worker script
    pub script_name: Option<String>,
    /// Console entries recorded during the invocation, in order
    pub logs: Vec<LogEntry>,
    /// Uncaught exceptions recorded during the invocation, in order
    pub exceptions: Vec<ExceptionEntry>,
    /// The fetch sub-event, present when the invocation served a request
    pub event: Option<FetchEvent>,
    /// Correlation id assigned by the edge
    pub ray_id: Option<String>,
}

/// A single console entry
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogEntry {
    pub level: String,
    /// Console arguments as passed by the worker; may mix scalars and
    /// structured values
    pub message: Vec<Value>,
    /// Epoch milliseconds
    pub timestamp: Option<i64>,
}

/// A single uncaught exception
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExceptionEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

/// The fetch sub-event describing one request/response cycle
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FetchEvent {
    pub request: Option<RequestInfo>,
    pub response: Option<ResponseInfo>,
    /// Elapsed wall time in milliseconds
    pub wall_time: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestInfo {
    pub method: Option<String>,
    pub url: Option<String>,
    pub headers: HashMap<String, String>,
    pub cf: Option<CfMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponseInfo {
    pub status: Option<u16>,
    pub headers: HashMap<String, String>,
}

/// Geo and edge metadata attached to the request by the platform
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CfMetadata {
    pub http_protocol: Option<String>,
    pub as_organization: Option<String>,
    pub asn: Option<u64>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub continent: Option<String>,
    pub postal_code: Option<String>,
    /// Latitude/longitude arrive as strings and are parsed during conversion
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub colo: Option<String>,
    pub region_code: Option<String>,
    pub ip: Option<String>,
    pub ray: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_full_event() {
        let event: TailEvent = serde_json::from_value(json!({
            "scriptName": "edge-router",
            "rayId": "8a1b2c3d4e5f",
            "logs": [
                {"level": "warn", "message": ["slow origin", {"ms": 1200}], "timestamp": 1700000000123i64}
            ],
            "exceptions": [
                {"name": "TypeError", "message": "x is not a function", "timestamp": 1700000000456i64}
            ],
            "event": {
                "request": {
                    "method": "GET",
                    "url": "https://www.example.com/index.html?x=1",
                    "headers": {"host": "www.example.com", "CF-Connecting-IP": "203.0.113.7"},
                    "cf": {
                        "httpProtocol": "HTTP/2",
                        "asn": 13335,
                        "city": "Berlin",
                        "latitude": "52.52000",
                        "colo": "TXL"
                    }
                },
                "response": {"status": 200, "headers": {"CF-Cache-Status": "HIT"}},
                "wallTime": 42.5
            }
        }))
        .unwrap();

        assert_eq!(event.script_name.as_deref(), Some("edge-router"));
        assert_eq!(event.logs.len(), 1);
        assert_eq!(event.exceptions.len(), 1);
        let fetch = event.event.unwrap();
        assert_eq!(fetch.wall_time, Some(42.5));
        let cf = fetch.request.unwrap().cf.unwrap();
        assert_eq!(cf.asn, Some(13335));
        assert_eq!(cf.latitude.as_deref(), Some("52.52000"));
    }

    #[test]
    fn test_deserialize_minimal_event() {
        let event: TailEvent = serde_json::from_value(json!({})).unwrap();
        assert!(event.script_name.is_none());
        assert!(event.logs.is_empty());
        assert!(event.exceptions.is_empty());
        assert!(event.event.is_none());
    }
}
