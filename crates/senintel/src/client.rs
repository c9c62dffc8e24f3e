// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The public client: structured logging plus request helpers that log
//! their own outcome.

use crate::buffer::EntryBuffer;
use crate::config::{ClientConfig, Mode, ResolvedConfig};
use crate::entry::{now_millis, Context, LogEntry};
use crate::error::{ConfigError, RequestError};
use crate::flusher::{FlushStatus, LogFlusher};
use crate::handshake::{self, HandshakeStatus};
use crate::http::build_client;
use crate::sink::{LocalFileSink, RemoteHttpSink, Sink};
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Telemetry client bound to one application and one delivery mode.
///
/// Construction validates the configuration and runs the startup handshake;
/// a client that exists is ready to log. The periodic flush loop is stopped
/// by [`Client::shutdown`] or when the client is dropped.
pub struct Client {
    config: ResolvedConfig,
    http: reqwest::Client,
    buffer: Arc<EntryBuffer>,
    flusher: LogFlusher,
    handshake: HandshakeStatus,
    cancel: CancellationToken,
    flush_loop: Mutex<Option<JoinHandle<()>>>,
}

impl Client {
    /// Creates a client delivering to the sink matching `config.mode`.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let resolved = config.resolve()?;
        let http = build_client(resolved.request_timeout)?;
        let handshake = handshake::run(&resolved, &http).await?;
        let sink = default_sink(&resolved, &http)?;
        Ok(Self::start(resolved, http, sink, handshake))
    }

    /// Creates a client delivering to a caller-supplied sink.
    ///
    /// The configuration and handshake rules are the same as for
    /// [`Client::new`]; only the delivery target differs.
    pub async fn with_sink(config: ClientConfig, sink: Arc<dyn Sink>) -> Result<Self, ConfigError> {
        let resolved = config.resolve()?;
        let http = build_client(resolved.request_timeout)?;
        let handshake = handshake::run(&resolved, &http).await?;
        Ok(Self::start(resolved, http, sink, handshake))
    }

    fn start(
        config: ResolvedConfig,
        http: reqwest::Client,
        sink: Arc<dyn Sink>,
        handshake: HandshakeStatus,
    ) -> Self {
        let buffer = Arc::new(EntryBuffer::new(config.max_buffer_size));
        let flusher = LogFlusher::new(
            Arc::clone(&buffer),
            sink,
            config.max_in_flight_flushes,
            Handle::current(),
        );
        let cancel = CancellationToken::new();
        let flush_loop = flusher.spawn_flush_loop(config.flush_interval, cancel.clone());

        debug!(
            "Client for {} started, flushing to {} every {} ms",
            config.app,
            flusher.sink().describe(),
            config.flush_interval.as_millis()
        );

        Self {
            config,
            http,
            buffer,
            flusher,
            handshake,
            cancel,
            flush_loop: Mutex::new(Some(flush_loop)),
        }
    }

    /// Buffers an entry. Flushes in the background once the buffer is full.
    ///
    /// After [`Client::shutdown`] there is no timer left, so every entry
    /// triggers a flush of its own. Never blocks on delivery and never fails.
    pub fn log(&self, kind: &str, message: impl Into<String>, context: Context) {
        let entry = LogEntry::new(kind, message, self.config.app.as_str(), context);
        if self.buffer.push(entry) || self.cancel.is_cancelled() {
            self.flusher.flush();
        }
    }

    /// Drains the buffer to the sink in the background.
    pub fn flush(&self) -> FlushStatus {
        self.flusher.flush()
    }

    /// Stops the flush loop, waits for in-flight deliveries and delivers
    /// whatever is still buffered.
    ///
    /// The client stays usable afterwards; see [`Client::log`].
    pub async fn shutdown(&self) -> FlushStatus {
        self.cancel.cancel();
        let flush_loop = self
            .flush_loop
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = flush_loop {
            let _ = handle.await;
        }
        self.flusher.flush_and_wait().await
    }

    /// `GET <endpoint><path>` with `params` appended as query pairs.
    pub async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, RequestError> {
        self.request(Method::GET, path, |req| req.query(params))
            .await
    }

    /// `POST <endpoint><path>` with `body` sent as JSON.
    pub async fn post<B>(&self, path: &str, body: &B) -> Result<Value, RequestError>
    where
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, path, |req| req.json(body)).await
    }

    /// `PUT <endpoint><path>` with `body` sent as JSON.
    pub async fn put<B>(&self, path: &str, body: &B) -> Result<Value, RequestError>
    where
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, path, |req| req.json(body)).await
    }

    /// `DELETE <endpoint><path>`.
    pub async fn delete(&self, path: &str) -> Result<Value, RequestError> {
        self.request(Method::DELETE, path, |req| req).await
    }

    // Every call buffers exactly one entry: `info` with the status on
    // success, `error` with the cause on failure. The response status is
    // recorded, not judged; only transport and decoding errors fail.
    async fn request<F>(
        &self,
        method: Method,
        path: &str,
        configure: F,
    ) -> Result<Value, RequestError>
    where
        F: FnOnce(RequestBuilder) -> RequestBuilder,
    {
        let time = Instant::now();

        let result = async {
            let url = format!("{}{path}", self.config.endpoint);
            let url = reqwest::Url::parse(&url).map_err(|e| RequestError::InvalidUrl {
                url,
                reason: e.to_string(),
            })?;
            let resp = configure(self.http.request(method.clone(), url))
                .send()
                .await
                .map_err(RequestError::Transport)?;
            let status = resp.status();
            let body = resp.json::<Value>().await.map_err(RequestError::Decode)?;
            Ok::<_, RequestError>((status, body))
        }
        .await;

        let duration = u64::try_from(time.elapsed().as_millis()).unwrap_or(u64::MAX);
        let mut context = Context::new();

        match result {
            Ok((status, body)) => {
                context.insert("status".to_string(), Value::from(status.as_u16()));
                context.insert("duration".to_string(), Value::from(duration));
                context.insert("timestamp".to_string(), Value::from(now_millis()));
                self.log("info", format!("HTTP {method} {path}"), context);
                Ok(body)
            }
            Err(e) => {
                context.insert("error".to_string(), Value::from(e.to_string()));
                context.insert("duration".to_string(), Value::from(duration));
                self.log("error", format!("HTTP {method} {path} failed"), context);
                Err(e)
            }
        }
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    #[must_use]
    pub fn app(&self) -> &str {
        &self.config.app
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Resolved log file, in local mode.
    #[must_use]
    pub fn local_log_path(&self) -> Option<&Path> {
        self.config.local_log_path.as_deref()
    }

    /// What the startup handshake confirmed.
    #[must_use]
    pub fn handshake(&self) -> &HandshakeStatus {
        &self.handshake
    }

    /// Number of entries waiting for the next flush.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn default_sink(
    config: &ResolvedConfig,
    http: &reqwest::Client,
) -> Result<Arc<dyn Sink>, ConfigError> {
    match config.mode {
        Mode::Local => {
            let path = config
                .local_log_path
                .clone()
                .ok_or(ConfigError::MissingSetting("local_log_path"))?;
            Ok(Arc::new(LocalFileSink::new(path)))
        }
        Mode::Server => {
            let url = config
                .log_collection_url
                .as_deref()
                .ok_or(ConfigError::MissingSetting("log_collection_url"))?;
            Ok(Arc::new(RemoteHttpSink::new(http.clone(), url)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn test_new_rejects_invalid_mode_without_side_effects() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("logs");
        let config = ClientConfig {
            mode: "hybrid".to_string(),
            local_log_path: Some(target.to_string_lossy().into_owned()),
            ..Default::default()
        };

        let result = Client::new(config).await;

        assert!(matches!(result, Err(ConfigError::InvalidMode { .. })));
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_new_local_exposes_resolved_path() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::local("billing", Some(dir.path().to_string_lossy().into_owned()));

        let client = Client::new(config).await.unwrap();

        let expected = dir.path().join("SenIntel.json");
        assert_eq!(client.mode(), Mode::Local);
        assert_eq!(client.app(), "billing");
        assert_eq!(client.local_log_path(), Some(expected.as_path()));
        assert_eq!(
            client.handshake(),
            &HandshakeStatus::Local { path: expected }
        );
    }

    #[tokio::test]
    async fn test_new_server_fails_when_ping_fails() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/ping")
            .with_status(500)
            .create_async()
            .await;

        let result =
            Client::new(ClientConfig::server(server.url(), "billing", server.url())).await;

        assert!(matches!(
            result,
            Err(ConfigError::ServerUnreachable { .. })
        ));
    }

    #[tokio::test]
    async fn test_log_below_threshold_stays_buffered() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::local("billing", Some(dir.path().to_string_lossy().into_owned()));
        let client = Client::new(config).await.unwrap();

        for n in 0..9 {
            client.log("info", format!("message {n}"), Context::new());
        }
        assert_eq!(client.pending(), 9);

        client.log("info", "message 9", Context::new());
        assert_eq!(client.pending(), 0);
    }

    #[tokio::test]
    async fn test_log_after_shutdown_flushes_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::local("billing", Some(dir.path().to_string_lossy().into_owned()));
        let client = Client::new(config).await.unwrap();

        client.shutdown().await;
        client.log("info", "late", Context::new());

        assert_eq!(client.pending(), 0);
        assert_eq!(client.shutdown().await, FlushStatus::Empty);
        let written = std::fs::read_to_string(client.local_log_path().unwrap()).unwrap();
        assert!(written.contains("\"message\":\"late\""), "{written}");
    }

    #[tokio::test]
    async fn test_request_with_invalid_url_logs_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::local("billing", Some(dir.path().to_string_lossy().into_owned()));
        let client = Client::new(config).await.unwrap();

        let result = client.get("/x", &[]).await;

        assert!(matches!(result, Err(RequestError::InvalidUrl { .. })));
        assert_eq!(client.pending(), 1);
    }
}
