// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Delivery targets for flushed batches.
//!
//! The flusher only knows the [`Sink`] capability. The client picks the
//! implementation matching its mode: [`local::LocalFileSink`] or
//! [`remote::RemoteHttpSink`]. Hosts needing stronger guarantees (retries,
//! a persistent queue) can supply their own implementation.

use crate::entry::LogEntry;
use crate::error::DeliveryError;
use async_trait::async_trait;

pub mod local;
pub mod remote;

pub use local::LocalFileSink;
pub use remote::RemoteHttpSink;

#[async_trait]
pub trait Sink: Send + Sync {
    /// Records a batch of entries, preserving their order.
    ///
    /// An error means the whole batch was not recorded. The flusher does not
    /// retry it.
    async fn deliver(&self, entries: Vec<LogEntry>) -> Result<(), DeliveryError>;

    /// Short description of the target, used in diagnostics.
    fn describe(&self) -> String;
}
