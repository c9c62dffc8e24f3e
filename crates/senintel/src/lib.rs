// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! # SenIntel
//!
//! An embedded telemetry client. Applications hand it structured log entries
//! and it delivers them, in batches and off the caller's path, either to a
//! local JSON file or to a remote collection endpoint.
//!
//! ## Pipeline
//!
//! ```text
//!   Client::log()  ──>  EntryBuffer  ──(threshold | timer)──>  LogFlusher
//!                                                                  │
//!                                                                  v
//!                                                     Sink::deliver(batch)
//!                                                      ├── LocalFileSink
//!                                                      └── RemoteHttpSink
//! ```
//!
//! - [`config`]: client configuration and delivery mode validation
//! - [`path`]: resolution of the local log file location
//! - [`buffer`] and [`flusher`]: in-memory batching and flush scheduling
//! - [`sink`]: the delivery capability and its two implementations
//! - [`handshake`]: startup checks that the selected sink is usable
//! - [`client`]: the public façade (`log`, `get`, `post`, `put`, `delete`)

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod buffer;
pub mod client;
pub mod config;
pub mod constants;
pub mod entry;
pub mod error;
pub mod flusher;
pub mod handshake;
pub mod http;
pub mod logger;
pub mod path;
pub mod sink;

pub use client::Client;
pub use config::{ClientConfig, Mode};
pub use entry::LogEntry;
pub use error::{ConfigError, DeliveryError, RequestError};
pub use flusher::FlushStatus;
pub use sink::Sink;
