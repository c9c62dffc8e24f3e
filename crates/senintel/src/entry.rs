// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// Structured metadata attached to an entry.
pub type Context = Map<String, Value>;

/// A single log record. Entries are not modified after creation.
///
/// Serialized as `{"timestamp", "type", "message", "app", "context"}`, which
/// is both the local file layout and the remote wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    timestamp: u64,
    #[serde(rename = "type")]
    kind: String,
    message: String,
    app: String,
    #[serde(default)]
    context: Context,
}

impl LogEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn new(
        kind: impl Into<String>,
        message: impl Into<String>,
        app: impl Into<String>,
        context: Context,
    ) -> Self {
        Self {
            timestamp: now_millis(),
            kind: kind.into(),
            message: message.into(),
            app: app.into(),
            context,
        }
    }

    /// Milliseconds since the Unix epoch at creation.
    #[must_use]
    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    /// Severity or category tag, e.g. `info` or `error`.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn app(&self) -> &str {
        &self.app
    }

    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }
}

/// Milliseconds since the Unix epoch, or 0 if the clock is before it.
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or_default()
}
