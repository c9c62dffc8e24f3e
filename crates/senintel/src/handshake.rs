// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Startup checks run once before a client accepts entries.
//!
//! - local mode: create the parent directory if needed, create the log file
//!   holding `[]` if needed (an existing one must already hold a JSON array),
//!   then check the file can be opened for writing.
//! - server mode: `GET <endpoint>/ping` must answer with a 2xx status.
//!
//! Any failure is a [`ConfigError`]; nothing is retried.

use crate::config::{Mode, ResolvedConfig};
use crate::constants::PING_PATH;
use crate::error::ConfigError;
use serde::de::IgnoredAny;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Outcome of a successful handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeStatus {
    /// Entries will be written to this file.
    Local { path: PathBuf },
    /// The endpoint answered its liveness probe.
    Server { endpoint: String },
}

/// Runs the handshake matching the configured mode.
pub async fn run(
    config: &ResolvedConfig,
    client: &reqwest::Client,
) -> Result<HandshakeStatus, ConfigError> {
    match (config.mode, &config.local_log_path) {
        (Mode::Local, Some(path)) => {
            prepare_local_file(path)?;
            info!("Configured successfully in {} mode", Mode::Local);
            info!("Logs will be written to: {}", path.display());
            Ok(HandshakeStatus::Local { path: path.clone() })
        }
        (Mode::Local, None) => Err(ConfigError::MissingSetting("local_log_path")),
        (Mode::Server, _) => {
            probe_server(client, &config.endpoint).await?;
            info!("Configured successfully in {} mode", Mode::Server);
            Ok(HandshakeStatus::Server {
                endpoint: config.endpoint.clone(),
            })
        }
    }
}

/// Makes sure `path` exists, holds a JSON array and is writable.
///
/// An existing empty file is accepted; the first delivery writes the array.
pub fn prepare_local_file(path: &Path) -> Result<(), ConfigError> {
    let setup_error = |source| ConfigError::LocalSetup {
        path: path.to_path_buf(),
        source,
    };

    if let Some(dir) = path.parent() {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(setup_error)?;
        }
    }

    if path.exists() {
        let contents = fs::read_to_string(path).map_err(setup_error)?;
        if !contents.trim().is_empty()
            && serde_json::from_str::<Vec<IgnoredAny>>(&contents).is_err()
        {
            return Err(setup_error(io::Error::new(
                io::ErrorKind::InvalidData,
                "existing file does not hold a JSON array",
            )));
        }
    } else {
        fs::write(path, "[]").map_err(setup_error)?;
    }

    // Opening for append checks write permission without touching the contents
    OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(setup_error)?;

    Ok(())
}

/// Issues the liveness probe against `endpoint`.
pub async fn probe_server(client: &reqwest::Client, endpoint: &str) -> Result<(), ConfigError> {
    let url = format!("{}{PING_PATH}", endpoint.trim_end_matches('/'));
    let unreachable = |reason: String| ConfigError::ServerUnreachable {
        endpoint: endpoint.to_string(),
        reason,
    };

    let resp = client
        .get(&url)
        .send()
        .await
        .map_err(|e| unreachable(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(unreachable(format!("HTTP {status}")));
    }
    Ok(())
}
