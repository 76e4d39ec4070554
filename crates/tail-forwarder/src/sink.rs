// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Delivery of canonical log records to the ingestion endpoint.
//!
//! One chunk becomes one JSON-array POST with bearer-token auth. Delivery is
//! best-effort and at-most-once: failures are reported to the caller for
//! logging but never retried or re-queued.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::debug;

use crate::record::LogRecord;

#[derive(Debug, thiserror::Error)]
pub enum ShippingError {
    #[error("Failed to prepare payload: {0}")]
    Payload(String),

    #[error("Failed to ship to destination ({0:?}): {1}")]
    Destination(Option<StatusCode>, String),
}

/// Client for the log-ingestion HTTP endpoint
#[derive(Debug, Clone)]
pub struct LogsApi {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl LogsApi {
    pub fn new(
        endpoint: String,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(LogsApi {
            client,
            endpoint,
            api_key,
        })
    }

    /// Ship one chunk of records as a single JSON-array POST. Any 2xx
    /// response counts as delivered.
    pub async fn ship(&self, records: &[LogRecord]) -> Result<(), ShippingError> {
        let body =
            serde_json::to_vec(records).map_err(|err| ShippingError::Payload(err.to_string()))?;

        let result = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .bearer_auth(&self.api_key)
            .body(body)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!("Shipped {} log records", records.len());
                Ok(())
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                Err(ShippingError::Destination(Some(status), body))
            }
            Err(err) => Err(ShippingError::Destination(None, err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{severity, LogRecord, CATEGORY_CONSOLE};

    fn test_record() -> LogRecord {
        LogRecord {
            timestamp: 1700000000123,
            application_name: "cloudflare-workers".to_string(),
            subsystem_name: Some("edge-router".to_string()),
            computer_name: Some("edge-router".to_string()),
            severity: severity::INFO,
            text: "hello".to_string(),
            category: CATEGORY_CONSOLE,
            class_name: Some("worker".to_string()),
            method_name: Some("log".to_string()),
            thread_id: Some("8a1b2c3d4e5f".to_string()),
        }
    }

    #[tokio::test]
    async fn test_ship_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/logs/v1")
            .match_header("authorization", "Bearer mock-api-key")
            .match_header("content-type", "application/json")
            .with_status(200)
            .create_async()
            .await;

        let api = LogsApi::new(
            format!("{}/logs/v1", server.url()),
            "mock-api-key".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();

        api.ship(&[test_record()]).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_ship_sends_json_array() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/logs/v1")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!([{
                "applicationName": "cloudflare-workers",
                "category": "console",
                "severity": 3,
                "text": "hello"
            }])))
            .with_status(200)
            .create_async()
            .await;

        let api = LogsApi::new(
            format!("{}/logs/v1", server.url()),
            "mock-api-key".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();

        api.ship(&[test_record()]).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_ship_non_2xx_is_a_destination_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/logs/v1")
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let api = LogsApi::new(
            format!("{}/logs/v1", server.url()),
            "mock-api-key".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();

        match api.ship(&[test_record()]).await {
            Err(ShippingError::Destination(Some(status), body)) => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(body, "overloaded");
            }
            other => panic!("expected destination error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ship_transport_error_is_a_destination_error() {
        // nothing listens on this port locally
        let api = LogsApi::new(
            "http://127.0.0.1:9/logs/v1".to_string(),
            "mock-api-key".to_string(),
            Duration::from_millis(200),
        )
        .unwrap();

        match api.ship(&[test_record()]).await {
            Err(ShippingError::Destination(None, _)) => {}
            other => panic!("expected transport error, got {other:?}"),
        }
    }
}
