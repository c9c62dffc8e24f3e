// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::entry::LogEntry;
use crate::error::DeliveryError;
use crate::sink::Sink;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError};
use tokio::sync::Mutex;
use tracing::debug;

type WriteLock = Arc<Mutex<()>>;

static WRITE_LOCKS: OnceLock<std::sync::Mutex<HashMap<PathBuf, WriteLock>>> = OnceLock::new();
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Appends batches to a file holding a single JSON array.
///
/// Each delivery reads the array, extends it and writes it back through a
/// temporary file that is renamed over the original, so readers never see a
/// truncated array. Deliveries to the same path are serialized across every
/// sink in the process, so clients sharing a log file do not overwrite each
/// other.
#[derive(Debug)]
pub struct LocalFileSink {
    path: PathBuf,
    write_lock: WriteLock,
}

impl LocalFileSink {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        let write_lock = write_lock_for(&path);
        Self { path, write_lock }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Sink for LocalFileSink {
    async fn deliver(&self, entries: Vec<LogEntry>) -> Result<(), DeliveryError> {
        if entries.is_empty() {
            return Ok(());
        }

        let _guard = self.write_lock.lock().await;
        let path = self.path.clone();
        let count = entries.len();

        tokio::task::spawn_blocking(move || append_entries(&path, &entries))
            .await
            .map_err(|e| DeliveryError::Task(e.to_string()))??;

        debug!("Wrote {count} entries to {}", self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

fn append_entries(path: &Path, entries: &[LogEntry]) -> Result<(), DeliveryError> {
    let mut existing = read_array(path)?;
    existing.reserve(entries.len());
    for entry in entries {
        existing.push(serde_json::to_value(entry)?);
    }

    let tmp_path = tmp_path_for(path);
    {
        let mut file = fs::File::create(&tmp_path)?;
        serde_json::to_writer(&mut file, &existing)?;
        file.flush()?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

// A file removed after startup is recreated rather than failing every flush.
fn read_array(path: &Path) -> Result<Vec<Value>, DeliveryError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str::<Vec<Value>>(&contents).map_err(|_| DeliveryError::Corrupt(path.to_path_buf()))
}

// Keyed by the canonical path, so two spellings of the same file share a lock.
fn write_lock_for(path: &Path) -> WriteLock {
    let key = lock_key(path);
    let mut locks = WRITE_LOCKS
        .get_or_init(Default::default)
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    Arc::clone(locks.entry(key).or_default())
}

fn lock_key(path: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(dir), Some(name)) => fs::canonicalize(dir)
            .map(|dir| dir.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(format!(
        ".{}.{}.tmp",
        std::process::id(),
        TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    path.with_file_name(name)
}
