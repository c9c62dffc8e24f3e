// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Flush scheduling: drains the buffer and hands batches to the sink.
//!
//! A flush is triggered either eagerly, when `log()` fills the buffer, or by
//! the periodic loop started with [`LogFlusher::spawn_flush_loop`]. Both go
//! through [`LogFlusher::flush`], which returns as soon as the delivery task
//! is spawned.
//!
//! Deliveries are gated by a semaphore. A trigger that finds no free slot
//! does not drain the buffer, so nothing is lost while a slow sink is busy;
//! the entries simply ride along with the next trigger.

use crate::buffer::EntryBuffer;
use crate::entry::LogEntry;
use crate::sink::Sink;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

/// Result of a flush trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushStatus {
    /// Nothing was buffered; no I/O was attempted.
    Empty,
    /// Every delivery slot was taken; the buffer was left untouched.
    Busy,
    /// This many entries were drained and handed to the sink.
    Dispatched(usize),
}

#[derive(Clone)]
pub struct LogFlusher {
    buffer: Arc<EntryBuffer>,
    sink: Arc<dyn Sink>,
    permits: Arc<Semaphore>,
    max_in_flight: u32,
    runtime: Handle,
}

impl LogFlusher {
    #[must_use]
    pub fn new(
        buffer: Arc<EntryBuffer>,
        sink: Arc<dyn Sink>,
        max_in_flight: usize,
        runtime: Handle,
    ) -> Self {
        let max_in_flight = u32::try_from(max_in_flight.max(1)).unwrap_or(u32::MAX);
        Self {
            buffer,
            sink,
            permits: Arc::new(Semaphore::new(max_in_flight as usize)),
            max_in_flight,
            runtime,
        }
    }

    /// Drains the buffer and delivers it in the background.
    pub fn flush(&self) -> FlushStatus {
        if self.buffer.is_empty() {
            return FlushStatus::Empty;
        }

        let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() else {
            debug!(
                "Delivery to {} still in flight, keeping {} entries buffered",
                self.sink.describe(),
                self.buffer.len()
            );
            return FlushStatus::Busy;
        };

        let batch = self.buffer.drain();
        if batch.is_empty() {
            return FlushStatus::Empty;
        }

        let count = batch.len();
        let sink = Arc::clone(&self.sink);
        self.runtime.spawn(async move {
            deliver(sink.as_ref(), batch).await;
            drop(permit);
        });

        FlushStatus::Dispatched(count)
    }

    /// Waits for in-flight deliveries, then delivers whatever is buffered and
    /// waits for that too.
    pub async fn flush_and_wait(&self) -> FlushStatus {
        let Ok(_permits) = self.permits.acquire_many(self.max_in_flight).await else {
            return FlushStatus::Busy;
        };

        let batch = self.buffer.drain();
        if batch.is_empty() {
            return FlushStatus::Empty;
        }

        let count = batch.len();
        deliver(self.sink.as_ref(), batch).await;
        FlushStatus::Dispatched(count)
    }

    /// Spawns the periodic flush loop. It runs until `cancel` fires.
    pub fn spawn_flush_loop(&self, period: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let flusher = self.clone();
        self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await; // discard first tick, which is instantaneous

            loop {
                tokio::select! {
                    () = cancel.cancelled() => {
                        debug!("Flush loop stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        flusher.flush();
                    }
                }
            }
        })
    }

    #[must_use]
    pub fn sink(&self) -> &Arc<dyn Sink> {
        &self.sink
    }
}

async fn deliver(sink: &dyn Sink, batch: Vec<LogEntry>) {
    let count = batch.len();
    let time = Instant::now();
    match sink.deliver(batch).await {
        Ok(()) => debug!(
            "Flushed {count} entries to {} in {} ms",
            sink.describe(),
            time.elapsed().as_millis()
        ),
        Err(e) => error!(
            "Dropped {count} entries, delivery to {} failed: {e}",
            sink.describe()
        ),
    }
}
