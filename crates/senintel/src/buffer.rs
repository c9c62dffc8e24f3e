// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! In-memory queue of entries waiting to be flushed.
//!
//! The buffer is appended to by `log()` and emptied by the flusher. A drain
//! swaps the whole sequence out under the lock and leaves an empty one in
//! its place, so entries logged while a batch is being delivered start the
//! next batch instead of racing with the drained one.

use crate::entry::LogEntry;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
pub struct EntryBuffer {
    entries: Mutex<Vec<LogEntry>>,
    max_size: usize,
}

impl EntryBuffer {
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: Mutex::new(Vec::with_capacity(max_size)),
            max_size,
        }
    }

    /// Appends an entry. Returns `true` when the buffer has reached its
    /// threshold and should be flushed.
    pub fn push(&self, entry: LogEntry) -> bool {
        let mut entries = self.lock();
        entries.push(entry);
        entries.len() >= self.max_size
    }

    /// Takes every buffered entry, in insertion order, leaving the buffer empty.
    pub fn drain(&self) -> Vec<LogEntry> {
        let mut entries = self.lock();
        std::mem::replace(&mut *entries, Vec::with_capacity(self.max_size))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    #[must_use]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    // A panic while holding the lock cannot leave the Vec half-written.
    fn lock(&self) -> MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
