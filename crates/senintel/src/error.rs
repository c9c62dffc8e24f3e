// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use reqwest::StatusCode;
use std::path::PathBuf;

/// Errors raised while constructing a client. Always fatal, never retried.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid mode \"{value}\". Expected one of: local, server.")]
    InvalidMode { value: String },

    #[error("Missing required setting: {0}")]
    MissingSetting(&'static str),

    #[error("Invalid setting {name}: {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    #[error("SenIntel could not be configured: {path}: {source}")]
    LocalSetup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("SenIntel could not be configured: {endpoint} is unreachable: {reason}")]
    ServerUnreachable { endpoint: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Errors raised by a sink while delivering a batch.
///
/// These never reach the caller of `log()`; the flusher reports and drops them.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize entries: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Log file {0} does not hold a JSON array")]
    Corrupt(PathBuf),

    #[error("Failed to reach log collector: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Log collector answered {0}")]
    Status(StatusCode),

    #[error("Delivery task failed: {0}")]
    Task(String),
}

/// Errors returned by the façade request helpers.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Invalid request URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Response body is not valid JSON: {0}")]
    Decode(#[source] reqwest::Error),
}
