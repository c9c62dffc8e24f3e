// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Resolution of the local log file location.

use crate::constants::{DEFAULT_LOG_DIR, LOG_FILE_NAME};
use std::io;
use std::path::{Path, PathBuf};

/// Computes the absolute path of the local log file.
///
/// - no path (or an empty one): `<cwd>/logs/SenIntel.json`
/// - an existing directory: `<dir>/SenIntel.json`
/// - a path ending in `.json`: used as is, the file need not exist
/// - anything else: taken as a directory still to be created, so
///   `<path>/SenIntel.json`
///
/// The last rule means an extensionless file name that does not exist yet is
/// never treated as a file. Only the existence and type of the path are
/// inspected; nothing is written.
pub fn resolve_log_path(user_path: Option<&str>) -> io::Result<PathBuf> {
    let Some(user_path) = user_path.filter(|p| !p.is_empty()) else {
        return Ok(std::env::current_dir()?
            .join(DEFAULT_LOG_DIR)
            .join(LOG_FILE_NAME));
    };

    let full_path = std::path::absolute(Path::new(user_path))?;

    if full_path.is_dir() {
        return Ok(full_path.join(LOG_FILE_NAME));
    }

    if full_path.to_string_lossy().ends_with(".json") {
        Ok(full_path)
    } else {
        Ok(full_path.join(LOG_FILE_NAME))
    }
}
