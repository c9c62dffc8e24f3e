// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Fixed values of the client.

/// Interval between time-based flushes, in milliseconds.
pub const FLUSH_INTERVAL_MS: u64 = 5_000;

/// Buffer length that triggers an eager flush.
pub const MAX_BUFFER_SIZE: usize = 10;

/// Number of deliveries allowed to run at the same time per client.
///
/// A trigger that finds every slot taken leaves the buffer in place; the
/// entries go out with the next trigger.
pub const MAX_IN_FLIGHT_FLUSHES: usize = 1;

/// Timeout applied to façade requests, the startup ping and remote deliveries.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// File name used whenever the configured local path denotes a directory.
pub const LOG_FILE_NAME: &str = "SenIntel.json";

/// Directory, relative to the working directory, used when no local path is configured.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Path appended to the log-collection URL for batch delivery.
pub const LOG_COLLECTION_PATH: &str = "/log";

/// Path appended to the client endpoint for the startup liveness probe.
pub const PING_PATH: &str = "/ping";
