// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! HTTP client construction shared by the handshake, the remote sink and the
//! request helpers.

use crate::error::ConfigError;
use core::time::Duration;

/// Builds the reqwest client used by a [`crate::Client`].
///
/// Proxies configured through the standard `HTTPS_PROXY`/`HTTP_PROXY`
/// variables are picked up by reqwest itself.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        // Detect dead connections to the collector between flushes
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}
