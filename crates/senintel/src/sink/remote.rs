// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::constants::LOG_COLLECTION_PATH;
use crate::entry::LogEntry;
use crate::error::DeliveryError;
use crate::sink::Sink;
use async_trait::async_trait;
use tracing::debug;

/// Posts each batch as one JSON array to `<collector>/log`.
///
/// There is no retry: a failed POST loses the batch.
#[derive(Debug, Clone)]
pub struct RemoteHttpSink {
    client: reqwest::Client,
    url: String,
}

impl RemoteHttpSink {
    /// `collection_url` is the collector base URL, without the `/log` suffix.
    #[must_use]
    pub fn new(client: reqwest::Client, collection_url: &str) -> Self {
        Self {
            client,
            url: format!(
                "{}{LOG_COLLECTION_PATH}",
                collection_url.trim_end_matches('/')
            ),
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Sink for RemoteHttpSink {
    async fn deliver(&self, entries: Vec<LogEntry>) -> Result<(), DeliveryError> {
        if entries.is_empty() {
            return Ok(());
        }

        let resp = self
            .client
            .post(&self.url)
            .json(&entries)
            .send()
            .await
            .map_err(DeliveryError::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DeliveryError::Status(status));
        }

        debug!("Posted {} entries to {}", entries.len(), self.url);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("collector {}", self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Context;
    use mockito::{Matcher, Server};
    use reqwest::StatusCode;

    fn entries(count: usize) -> Vec<LogEntry> {
        (0..count)
            .map(|n| LogEntry::new("info", format!("message {n}"), "billing", Context::new()))
            .collect()
    }

    #[test]
    fn test_new_appends_log_path() {
        let sink = RemoteHttpSink::new(reqwest::Client::new(), "http://collector:9000/");
        assert_eq!(sink.url(), "http://collector:9000/log");
        assert_eq!(sink.describe(), "collector http://collector:9000/log");
    }

    #[tokio::test]
    async fn test_deliver_posts_json_array() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/log")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Regex(
                r#"^\[\{.*"message":"message 0","app":"billing".*"message":"message 1","app":"billing".*\}\]$"#
                    .to_string(),
            ))
            .with_status(200)
            .create_async()
            .await;

        let sink = RemoteHttpSink::new(reqwest::Client::new(), &server.url());
        sink.deliver(entries(2)).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_deliver_reports_error_status() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/log")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let sink = RemoteHttpSink::new(reqwest::Client::new(), &server.url());
        let result = sink.deliver(entries(3)).await;

        assert!(matches!(
            result,
            Err(DeliveryError::Status(StatusCode::SERVICE_UNAVAILABLE))
        ));
        // dropped, not retried
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_deliver_reports_transport_error() {
        let sink = RemoteHttpSink::new(reqwest::Client::new(), "http://127.0.0.1:1");
        assert!(matches!(
            sink.deliver(entries(1)).await,
            Err(DeliveryError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_deliver_empty_batch_sends_nothing() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/log")
            .expect(0)
            .create_async()
            .await;

        let sink = RemoteHttpSink::new(reqwest::Client::new(), &server.url());
        sink.deliver(Vec::new()).await.unwrap();

        mock.assert_async().await;
    }
}
